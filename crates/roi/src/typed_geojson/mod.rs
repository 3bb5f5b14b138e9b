use std::marker::PhantomData;

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::region::RegionKind;
use crate::types::Color;

/// Foreign member of an archive collection holding its region count
pub const REGION_COUNT_MEMBER: &str = "region_count";

/// Properties stored with every region feature of an archive
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
#[schemars(description = "Properties of a region feature")]
pub struct RegionProperties {
    #[schemars(description = "Region kind; inferred from the geometry when absent")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RegionKind>,
    #[schemars(description = "1-based Z position, 0 for any slice")]
    #[serde(default)]
    pub z: u32,
    #[schemars(description = "1-based channel, 0 for any channel")]
    #[serde(default)]
    pub c: u32,
    #[schemars(description = "1-based frame, 0 for any frame")]
    #[serde(default)]
    pub t: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[schemars(description = "Unique export label within the archive")]
    #[serde(default)]
    pub label: String,
    #[schemars(description = "Exact [x, y, width, height] of rectangles and ovals")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<[f64; 4]>,
    #[schemars(description = "Control vertices of a spline-fitted path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_vertices: Option<Vec<[f64; 2]>>,
}

/// Region archive document
pub type RegionGeoJson = TypedGeoJson<RegionProperties>;

/// A GeoJSON Feature whose properties deserialize into `P`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TypedFeature<P> {
    #[serde(flatten)]
    pub feature: Feature,
    #[serde(skip)]
    _properties: PhantomData<P>,
}

impl<P> TypedFeature<P>
where
    P: Serialize + DeserializeOwned,
{
    pub fn new(geometry: Option<Geometry>, properties: &P) -> serde_json::Result<Self> {
        let properties = match serde_json::to_value(properties)? {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        };
        Ok(Self::from_feature(Feature {
            bbox: None,
            geometry,
            id: None,
            properties,
            foreign_members: None,
        }))
    }

    /// Typed properties, `None` when the feature has none
    pub fn properties(&self) -> serde_json::Result<Option<P>> {
        self.feature
            .properties
            .as_ref()
            .map(|p| serde_json::from_value(serde_json::Value::Object(p.clone())))
            .transpose()
    }
}

impl<P> TypedFeature<P> {
    pub fn from_feature(feature: Feature) -> Self {
        Self {
            feature,
            _properties: PhantomData,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.feature.geometry.as_ref()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TypedFeatureCollection<P> {
    pub bbox: Option<Vec<f64>>,
    pub features: Vec<TypedFeature<P>>,
    pub foreign_members: Option<JsonObject>,
}

impl<P> TypedFeatureCollection<P> {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[TypedFeature<P>] {
        &self.features
    }

    /// Region count recorded in the foreign members
    pub fn region_count(&self) -> Option<usize> {
        self.foreign_members
            .as_ref()
            .and_then(|foreign| foreign.get(REGION_COUNT_MEMBER))
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
    }
}

#[derive(Debug, Clone)]
pub enum TypedGeoJson<P> {
    Geometry(Geometry),
    Feature(TypedFeature<P>),
    FeatureCollection(TypedFeatureCollection<P>),
}

impl<P> TypedGeoJson<P> {
    pub fn as_feature_collection(&self) -> Option<&TypedFeatureCollection<P>> {
        match self {
            TypedGeoJson::FeatureCollection(fc) => Some(fc),
            _ => None,
        }
    }

    /// Every feature of the document: none for a bare geometry, one for a
    /// single feature
    pub fn into_features(self) -> Vec<TypedFeature<P>> {
        match self {
            TypedGeoJson::Geometry(_) => Vec::new(),
            TypedGeoJson::Feature(feature) => vec![feature],
            TypedGeoJson::FeatureCollection(fc) => fc.features,
        }
    }
}

impl<P> From<GeoJson> for TypedGeoJson<P> {
    fn from(value: GeoJson) -> Self {
        match value {
            GeoJson::Geometry(geometry) => TypedGeoJson::Geometry(geometry),
            GeoJson::Feature(feature) => TypedGeoJson::Feature(TypedFeature::from_feature(feature)),
            GeoJson::FeatureCollection(fc) => TypedGeoJson::FeatureCollection(TypedFeatureCollection {
                bbox: fc.bbox,
                features: fc.features.into_iter().map(TypedFeature::from_feature).collect(),
                foreign_members: fc.foreign_members,
            }),
        }
    }
}

impl<P> From<TypedGeoJson<P>> for GeoJson {
    fn from(value: TypedGeoJson<P>) -> Self {
        match value {
            TypedGeoJson::Geometry(geometry) => GeoJson::Geometry(geometry),
            TypedGeoJson::Feature(feature) => GeoJson::Feature(feature.feature),
            TypedGeoJson::FeatureCollection(fc) => GeoJson::FeatureCollection(FeatureCollection {
                bbox: fc.bbox,
                features: fc.features.into_iter().map(|f| f.feature).collect(),
                foreign_members: fc.foreign_members,
            }),
        }
    }
}
