use geo_types::coord;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::debug;

use crate::algorithms::{InvalidOutlineBehavior, OutlineMode};
use crate::collection::RoiCollection;
use crate::error::Result;
use crate::traits::CollectionProcessor;

fn default_scale() -> f64 {
    1.0
}

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoiCommand {
    /// Merge all regions into their union
    LogicalOr,

    /// Replace all regions by their common intersection
    LogicalAnd,

    /// Replace all regions by their symmetric difference
    LogicalXor,

    /// Re-derive every region's outline
    Outline {
        mode: OutlineMode,
        #[serde(default)]
        on_error: InvalidOutlineBehavior,
    },

    /// Move the collection to the origin and subtract the smallest pinned slice index
    Crop {
        #[serde(default)]
        xy: bool,
        #[serde(default)]
        z: bool,
        #[serde(default)]
        c: bool,
        #[serde(default)]
        t: bool,
    },

    /// Make every region visible on all slices
    Flatten,

    /// Split multi-part composite shapes into one region per part
    SplitAll,

    Scale {
        #[serde(default = "default_scale")]
        #[schemars(range(min = 0.0))]
        sx: f64,
        #[serde(default = "default_scale")]
        #[schemars(range(min = 0.0))]
        sy: f64,
        #[serde(default)]
        centered: bool,
    },

    /// Rotate by `angle` degrees about (`cx`, `cy`)
    Rotate {
        angle: f64,
        #[serde(default)]
        cx: f64,
        #[serde(default)]
        cy: f64,
    },

    Translate {
        #[serde(default)]
        dx: f64,
        #[serde(default)]
        dy: f64,
    },
}

impl RoiCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RoiCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::LogicalOr => "Merge all area regions into a single region covering their union",
            Self::LogicalAnd => "Replace all area regions by the area they have in common",
            Self::LogicalXor => "Replace all area regions by the area covered an odd number of times",
            Self::Outline { .. } => "Replace every region by an outline derived with the given mode",
            Self::Crop { .. } => "Move regions to the origin and subtract the smallest pinned slice index",
            Self::Flatten => "Remove slice positions so every region is visible everywhere",
            Self::SplitAll => "Split composite shapes made of disjoint parts into separate regions",
            Self::Scale { .. } => "Scale every region, about the origin or its own center",
            Self::Rotate { .. } => "Rotate every region about a center point",
            Self::Translate { .. } => "Move every region by a fixed offset",
        }
    }

    /// Get parameter requirements for the command
    pub fn parameters_info(&self) -> Vec<(&'static str, &'static str, bool)> {
        match self {
            Self::LogicalOr | Self::LogicalAnd | Self::LogicalXor | Self::Flatten | Self::SplitAll => vec![],
            Self::Outline { .. } => vec![
                ("mode", "Outline algorithm, e.g. convex_hull or minimum_bounding_rectangle", true),
                ("on_error", "error, keep_original or skip", false),
            ],
            Self::Crop { .. } => vec![
                ("xy", "Move the bounds to the origin", false),
                ("z", "Renumber Z positions", false),
                ("c", "Renumber channel positions", false),
                ("t", "Renumber frame positions", false),
            ],
            Self::Scale { .. } => vec![
                ("sx", "Horizontal factor", false),
                ("sy", "Vertical factor", false),
                ("centered", "Scale each region about its own center", false),
            ],
            Self::Rotate { .. } => vec![
                ("angle", "Angle in degrees", true),
                ("cx", "Center x", false),
                ("cy", "Center y", false),
            ],
            Self::Translate { .. } => vec![("dx", "Horizontal offset", false), ("dy", "Vertical offset", false)],
        }
    }

    /// Runs the command against `collection`
    pub fn apply(&self, collection: &mut RoiCollection) -> Result<()> {
        debug!(command = %self, regions = collection.len(), "Applying command");
        match *self {
            Self::LogicalOr => collection.logical_or(),
            Self::LogicalAnd => collection.logical_and(),
            Self::LogicalXor => collection.logical_xor(),
            Self::Outline { mode, on_error } => collection.outline(mode, on_error)?,
            Self::Crop { xy, z, c, t } => collection.crop(xy, z, c, t),
            Self::Flatten => collection.flatten(),
            Self::SplitAll => collection.split_all(),
            Self::Scale { sx, sy, centered } => *collection = collection.scale(sx, sy, centered),
            Self::Rotate { angle, cx, cy } => *collection = collection.rotate(angle, coord! { x: cx, y: cy }),
            Self::Translate { dx, dy } => collection.translate(dx, dy),
        }
        Ok(())
    }
}

impl CollectionProcessor for RoiCommand {
    fn process(&self, collection: &mut RoiCollection) -> Result<()> {
        self.apply(collection)
    }

    fn name(&self) -> &str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Region, Shape};
    use crate::traits::RegionGeometry;

    #[test]
    fn commands_parse_from_tagged_json() {
        let command: RoiCommand =
            serde_json::from_str(r#"{ "type": "outline", "params": { "mode": "convex_hull" } }"#).unwrap();
        assert_eq!(
            command,
            RoiCommand::Outline {
                mode: OutlineMode::ConvexHull,
                on_error: InvalidOutlineBehavior::Error,
            }
        );
        let command: RoiCommand = serde_json::from_str(r#"{ "type": "flatten" }"#).unwrap();
        assert_eq!(command, RoiCommand::Flatten);
        let command: RoiCommand = serde_json::from_str(r#"{ "type": "scale", "params": { "sx": 2.0 } }"#).unwrap();
        assert_eq!(command, RoiCommand::Scale { sx: 2.0, sy: 1.0, centered: false });
    }

    #[test]
    fn names_are_snake_case() {
        assert!(RoiCommand::command_names().contains(&"logical_or"));
        assert!(RoiCommand::command_names().contains(&"split_all"));
        assert_eq!("logical_xor".parse::<RoiCommand>().unwrap(), RoiCommand::LogicalXor);
        assert_eq!(RoiCommand::Translate { dx: 1.0, dy: 1.0 }.name(), "translate");
        assert!(RoiCommand::schema().schema.subschemas.is_some());
    }

    #[test]
    fn scale_replaces_the_collection() {
        let mut collection: RoiCollection = vec![Region::new(Shape::rectangle(1.0, 1.0, 2.0, 2.0))].into();
        RoiCommand::Scale { sx: 2.0, sy: 3.0, centered: false }
            .apply(&mut collection)
            .unwrap();
        assert_eq!(collection.get(0).unwrap().bounds().max().x, 6.0);
        assert_eq!(collection.get(0).unwrap().bounds().max().y, 9.0);
    }
}
