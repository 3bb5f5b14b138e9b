use std::collections::HashSet;
use std::path::{Path as FsPath, PathBuf};

use geo_types::{Coord, LineString, MultiPolygon, Polygon, coord};
use geojson::{GeoJson, Geometry, Value};
use tracing::debug;

use crate::collection::RoiCollection;
use crate::error::{Result, RoiError};
use crate::region::{Path, Region, RegionKind, Shape, open_ring, points_bounds};
use crate::traits::RegionGeometry;
use crate::typed_geojson::{
    REGION_COUNT_MEMBER, RegionGeoJson, RegionProperties, TypedFeature, TypedFeatureCollection, TypedGeoJson,
};
use crate::types::{SlicePosition, Style};

const ARCHIVE_EXTENSION: &str = "geojson";

type Position = Vec<f64>;

fn position(c: Coord<f64>) -> Position {
    vec![c.x, c.y]
}

/// Always appends the first vertex, also when the path already ends on it,
/// so that [`open_coords_of`] can drop exactly one vertex on load.
fn closed_ring(points: &[Coord<f64>]) -> Vec<Position> {
    let mut ring: Vec<Position> = points.iter().copied().map(position).collect();
    if let Some(first) = points.first() {
        ring.push(position(*first));
    }
    ring
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| closed_ring(open_ring(ring)))
        .collect()
}

fn coord_of(p: &[f64]) -> Result<Coord<f64>> {
    match p {
        [x, y, ..] => Ok(coord! { x: *x, y: *y }),
        _ => Err(RoiError::Archive(format!("position {p:?} has fewer than two components"))),
    }
}

fn coords_of(positions: &[Position]) -> Result<Vec<Coord<f64>>> {
    positions.iter().map(|p| coord_of(p)).collect()
}

/// Ring vertices without the closing repeat
fn open_coords_of(ring: &[Position]) -> Result<Vec<Coord<f64>>> {
    let mut coords = coords_of(ring)?;
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    Ok(coords)
}

fn polygon_of(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| coords_of(ring).map(LineString::from));
    let exterior = rings
        .next()
        .transpose()?
        .ok_or_else(|| RoiError::Archive("polygon without exterior ring".to_string()))?;
    Ok(Polygon::new(exterior, rings.collect::<Result<Vec<_>>>()?))
}

fn outer_ring(value: &Value) -> Result<Vec<Coord<f64>>> {
    match value {
        Value::Polygon(rings) => rings
            .first()
            .map(|ring| open_coords_of(ring))
            .unwrap_or_else(|| Err(RoiError::Archive("polygon without exterior ring".to_string()))),
        other => Err(RoiError::Archive(format!("expected a Polygon geometry, found {}", other.type_name()))),
    }
}

fn line_coords(value: &Value) -> Result<Vec<Coord<f64>>> {
    match value {
        Value::LineString(positions) => coords_of(positions),
        other => Err(RoiError::Archive(format!(
            "expected a LineString geometry, found {}",
            other.type_name()
        ))),
    }
}

/// Unique export labels: the region name, or its index when unnamed, with a
/// trailing `.roi` removed and ` n` appended to repeats
pub fn export_labels(regions: &[Region]) -> Vec<String> {
    let mut taken = HashSet::new();
    regions
        .iter()
        .enumerate()
        .map(|(index, region)| {
            let base = region.name.clone().unwrap_or_else(|| index.to_string());
            let base = base.strip_suffix(".roi").map(str::to_string).unwrap_or(base);
            let mut label = base.clone();
            let mut n = 1;
            while taken.contains(&label) {
                label = format!("{base} {n}");
                n += 1;
            }
            taken.insert(label.clone());
            label
        })
        .collect()
}

fn encode(region: &Region, label: String) -> (Geometry, RegionProperties) {
    let mut properties = RegionProperties {
        kind: Some(region.kind()),
        z: region.position.z.raw(),
        c: region.position.c.raw(),
        t: region.position.t.raw(),
        name: region.name.clone(),
        fill_color: region.style.fill_color,
        stroke_color: region.style.stroke_color,
        stroke_width: region.style.stroke_width,
        label,
        ..RegionProperties::default()
    };

    let value = match &region.shape {
        Shape::Rectangle(rect) | Shape::Oval(rect) => {
            properties.rect = Some([rect.min().x, rect.min().y, rect.width(), rect.height()]);
            Value::Polygon(vec![closed_ring(&region.boundary())])
        }
        Shape::Line(line) => Value::LineString(vec![position(line.start), position(line.end)]),
        Shape::Composite(area) => Value::MultiPolygon(area.iter().map(polygon_rings).collect()),
        Shape::Point(points) => Value::MultiPoint(points.iter().map(|p| position(p.0)).collect()),
        shape => {
            let path = shape.path().cloned().unwrap_or_default();
            if path.is_spline_fit() {
                properties.control_vertices = Some(path.vertices.iter().map(|c| [c.x, c.y]).collect());
            }
            if shape.kind().is_area() {
                Value::Polygon(vec![closed_ring(path.points())])
            } else {
                Value::LineString(path.points().iter().copied().map(position).collect())
            }
        }
    };
    (Geometry::new(value), properties)
}

fn infer_kind(value: &Value) -> Result<RegionKind> {
    match value {
        Value::Polygon(_) => Ok(RegionKind::Polygon),
        Value::LineString(positions) if positions.len() == 2 => Ok(RegionKind::Line),
        Value::LineString(_) => Ok(RegionKind::Polyline),
        Value::MultiPolygon(_) => Ok(RegionKind::CompositeShape),
        Value::Point(_) | Value::MultiPoint(_) => Ok(RegionKind::Point),
        other => Err(RoiError::Archive(format!("unsupported geometry {}", other.type_name()))),
    }
}

fn decode_path(value: &Value, properties: &RegionProperties, area: bool) -> Result<Path> {
    let points = if area { outer_ring(value)? } else { line_coords(value)? };
    Ok(match &properties.control_vertices {
        Some(control) => Path {
            vertices: control.iter().map(|&[x, y]| coord! { x: x, y: y }).collect(),
            spline: Some(points),
        },
        None => Path::new(points),
    })
}

fn decode_shape(value: &Value, properties: &RegionProperties) -> Result<Shape> {
    let kind = match properties.kind {
        Some(kind) => kind,
        None => infer_kind(value)?,
    };
    let parametric = || -> Result<(f64, f64, f64, f64)> {
        match properties.rect {
            Some([x, y, w, h]) => Ok((x, y, w, h)),
            None => {
                let bounds = points_bounds(&outer_ring(value)?);
                Ok((bounds.min().x, bounds.min().y, bounds.width(), bounds.height()))
            }
        }
    };

    Ok(match kind {
        RegionKind::Rectangle => {
            let (x, y, w, h) = parametric()?;
            Shape::rectangle(x, y, w, h)
        }
        RegionKind::Oval => {
            let (x, y, w, h) = parametric()?;
            Shape::oval(x, y, w, h)
        }
        RegionKind::Polygon => Shape::Polygon(decode_path(value, properties, true)?),
        RegionKind::FreehandPolygon => Shape::FreehandPolygon(decode_path(value, properties, true)?),
        RegionKind::TracedPolygon => Shape::TracedPolygon(decode_path(value, properties, true)?),
        RegionKind::Polyline => Shape::Polyline(decode_path(value, properties, false)?),
        RegionKind::Freeline => Shape::Freeline(decode_path(value, properties, false)?),
        RegionKind::Angle => Shape::Angle(decode_path(value, properties, false)?),
        RegionKind::Line => match line_coords(value)?.as_slice() {
            &[start, end] => Shape::line(start.x, start.y, end.x, end.y),
            coords => {
                return Err(RoiError::Archive(format!("line with {} vertices", coords.len())));
            }
        },
        RegionKind::CompositeShape => match value {
            Value::MultiPolygon(polygons) => Shape::Composite(MultiPolygon::new(
                polygons.iter().map(|rings| polygon_of(rings)).collect::<Result<_>>()?,
            )),
            Value::Polygon(rings) => Shape::Composite(MultiPolygon::new(vec![polygon_of(rings)?])),
            other => {
                return Err(RoiError::Archive(format!(
                    "composite shape stored as {}",
                    other.type_name()
                )));
            }
        },
        RegionKind::Point => match value {
            Value::MultiPoint(positions) => {
                let coords = coords_of(positions)?;
                Shape::points(&coords.iter().map(|c| (c.x, c.y)).collect::<Vec<_>>())
            }
            Value::Point(p) => {
                let c = coord_of(p)?;
                Shape::points(&[(c.x, c.y)])
            }
            other => return Err(RoiError::Archive(format!("points stored as {}", other.type_name()))),
        },
    })
}

fn decode(feature: &TypedFeature<RegionProperties>) -> Result<Region> {
    let properties = feature.properties()?.unwrap_or_default();
    let geometry = feature
        .geometry()
        .ok_or_else(|| RoiError::Archive(format!("feature '{}' has no geometry", properties.label)))?;
    let shape = decode_shape(&geometry.value, &properties)?;
    let mut region = Region::new(shape)
        .with_position(SlicePosition::new(properties.z, properties.c, properties.t))
        .with_style(Style {
            fill_color: properties.fill_color,
            stroke_color: properties.stroke_color,
            stroke_width: properties.stroke_width,
        });
    region.name = properties.name;
    Ok(region)
}

impl RoiCollection {
    /// Archive document: a single feature for a one-region collection,
    /// otherwise a feature collection
    pub fn to_typed_geojson(&self) -> Result<RegionGeoJson> {
        let labels = export_labels(self.regions());
        let mut features = Vec::with_capacity(self.len());
        for (region, label) in self.iter().zip(labels) {
            let (geometry, properties) = encode(region, label);
            features.push(TypedFeature::new(Some(geometry), &properties)?);
        }

        if features.len() == 1 {
            if let Some(feature) = features.pop() {
                return Ok(TypedGeoJson::Feature(feature));
            }
        }
        let mut foreign_members = serde_json::Map::new();
        foreign_members.insert(
            REGION_COUNT_MEMBER.to_string(),
            serde_json::Value::Number(serde_json::Number::from(features.len())),
        );
        Ok(TypedGeoJson::FeatureCollection(TypedFeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }))
    }

    pub fn to_geojson(&self) -> Result<GeoJson> {
        Ok(self.to_typed_geojson()?.into())
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson()?)?)
    }

    /// Writes `{name}.geojson` into `dir` and returns its path
    pub fn save(&self, dir: impl AsRef<FsPath>, name: &str) -> Result<PathBuf> {
        let path = dir.as_ref().join(format!("{name}.{ARCHIVE_EXTENSION}"));
        std::fs::write(&path, self.to_geojson_string()?)?;
        debug!(path = %path.display(), regions = self.len(), "Saved region archive");
        Ok(path)
    }

    /// Reads an archive holding either a single feature or a collection
    pub fn load(path: impl AsRef<FsPath>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let collection = Self::from_geojson_str(&text)?;
        debug!(path = %path.as_ref().display(), regions = collection.len(), "Loaded region archive");
        Ok(collection)
    }

    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let document: RegionGeoJson = text.parse::<GeoJson>()?.into();
        if let TypedGeoJson::Geometry(_) = document {
            return Err(RoiError::Archive("bare geometry without region properties".to_string()));
        }
        let expected = document.as_feature_collection().and_then(|fc| fc.region_count());
        let regions = document
            .into_features()
            .iter()
            .map(decode)
            .collect::<Result<Vec<_>>>()?;
        if let Some(expected) = expected.filter(|&n| n != regions.len()) {
            return Err(RoiError::Archive(format!(
                "archive declares {expected} regions but holds {}",
                regions.len()
            )));
        }
        Ok(regions.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn labels_are_unique() {
        let regions = vec![
            Region::new(Shape::rectangle(0.0, 0.0, 1.0, 1.0)).with_name("cell.roi"),
            Region::new(Shape::rectangle(0.0, 0.0, 1.0, 1.0)).with_name("cell"),
            Region::new(Shape::rectangle(0.0, 0.0, 1.0, 1.0)),
            Region::new(Shape::rectangle(0.0, 0.0, 1.0, 1.0)).with_name("cell"),
            Region::new(Shape::rectangle(0.0, 0.0, 1.0, 1.0)).with_name("2"),
        ];
        assert_eq!(export_labels(&regions), vec!["cell", "cell 1", "2", "cell 2", "2 1"]);
    }

    #[test]
    fn single_region_is_a_feature() {
        let collection: RoiCollection = vec![Region::new(Shape::oval(1.0, 2.0, 3.0, 4.0))].into();
        assert!(matches!(collection.to_geojson().unwrap(), GeoJson::Feature(_)));

        let pair: RoiCollection = vec![
            Region::new(Shape::oval(1.0, 2.0, 3.0, 4.0)),
            Region::new(Shape::line(0.0, 0.0, 1.0, 1.0)),
        ]
        .into();
        match pair.to_typed_geojson().unwrap() {
            TypedGeoJson::FeatureCollection(fc) => assert_eq!(fc.region_count(), Some(2)),
            other => panic!("expected a feature collection, got {other:?}"),
        }
    }

    #[test]
    fn attributes_survive_a_round_trip() {
        let mut spline = Path::from_xy(&[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]);
        spline.spline = Some(vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 5.0, y: 4.0 }, coord! { x: 10.0, y: 0.0 }]);
        let collection: RoiCollection = vec![
            Region::new(Shape::rectangle(1.5, 2.5, 3.0, 4.0))
                .with_name("box")
                .with_fill_color(Color::rgb(10, 20, 30))
                .with_stroke_width(2.0)
                .at(1, 2, 3),
            Region::new(Shape::Polyline(spline.clone())),
            Region::new(Shape::polygon(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)])).at(0, 1, 0),
            Region::new(Shape::points(&[(1.0, 1.0), (2.0, 3.0)])),
        ]
        .into();
        let text = collection.to_geojson_string().unwrap();
        let loaded = RoiCollection::from_geojson_str(&text).unwrap();
        assert_eq!(loaded.len(), 4);

        let boxed = loaded.get(0).unwrap();
        assert_eq!(boxed.shape, Shape::rectangle(1.5, 2.5, 3.0, 4.0));
        assert_eq!(boxed.name.as_deref(), Some("box"));
        assert_eq!(boxed.position, SlicePosition::new(1, 2, 3));
        assert_eq!(boxed.style.fill_color, Some(Color::rgb(10, 20, 30)));
        assert_eq!(boxed.style.stroke_width, Some(2.0));

        assert_eq!(loaded.get(1).unwrap().shape, Shape::Polyline(spline));
        assert_eq!(loaded.get(2).unwrap().shape, Shape::polygon(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]));
        assert_eq!(loaded.get(2).unwrap().position, SlicePosition::new(0, 1, 0));
        assert_eq!(loaded.get(3).unwrap().kind(), RegionKind::Point);
    }

    #[test]
    fn kind_is_inferred_from_geometry() {
        let text = r#"{
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": [[0, 0], [3, 4]] },
            "properties": { "z": 2 }
        }"#;
        let loaded = RoiCollection::from_geojson_str(text).unwrap();
        let region = loaded.get(0).unwrap();
        assert_eq!(region.shape, Shape::line(0.0, 0.0, 3.0, 4.0));
        assert_eq!(region.position, SlicePosition::new(2, 0, 0));
    }

    #[test]
    fn malformed_archives_are_rejected() {
        let bare = r#"{ "type": "Point", "coordinates": [1, 2] }"#;
        assert!(matches!(RoiCollection::from_geojson_str(bare), Err(RoiError::Archive(_))));

        let bad_line = r#"{
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1], [2, 2]] },
            "properties": { "kind": "line" }
        }"#;
        assert!(matches!(RoiCollection::from_geojson_str(bad_line), Err(RoiError::Archive(_))));
    }
}
