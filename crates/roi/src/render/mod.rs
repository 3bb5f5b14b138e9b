//! Slice-aware rasterization of a collection.
//!
//! Regions are drawn in collection order onto every plane they are visible
//! in, so later regions paint over earlier ones.

pub mod labels;
pub mod raster;

use geo_types::{Rect, coord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Result, RoiError};
use crate::types::{AxisIgnore, Color};

/// Extra space around the collection bounds when sizing a canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Margin {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Margin {
    pub fn uniform(value: f64) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    /// The area inside the margin around `bounds`, rejected when empty or
    /// not finite
    pub fn inside_area(&self, bounds: Rect<f64>) -> Result<Rect<f64>> {
        let x = bounds.min().x - self.left;
        let y = bounds.min().y - self.top;
        let width = bounds.width() + self.left + self.right;
        let height = bounds.height() + self.top + self.bottom;
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return Err(RoiError::InvalidMargin(format!("{self:?} produces a non-finite area")));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(RoiError::InvalidMargin(format!(
                "{self:?} produces an empty area of {width}x{height}"
            )));
        }
        Ok(Rect::new(coord! { x: x, y: y }, coord! { x: x + width, y: y + height }))
    }
}

/// Options for binary mask rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MaskOptions {
    pub fill: bool,
    pub outline: bool,
    pub line_width: u32,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            fill: true,
            outline: false,
            line_width: 1,
        }
    }
}

/// Whether a fill or outline is drawn for a region
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrawMode {
    Always,
    /// Only when the region defines its own color
    IfAvailable,
    Never,
}

impl DrawMode {
    pub fn should_draw(self, own: Option<Color>) -> bool {
        match self {
            Self::Always => true,
            Self::IfAvailable => own.is_some(),
            Self::Never => false,
        }
    }

    /// The color to draw with, if any: the region's own, else `default`
    pub fn resolve(self, own: Option<Color>, default: Color) -> Option<Color> {
        self.should_draw(own).then(|| own.unwrap_or(default))
    }
}

/// Options for RGB composite rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RenderOptions {
    pub ignore: AxisIgnore,
    pub fill: DrawMode,
    pub outline: DrawMode,
    pub default_line_width: u32,
    pub default_fill_color: Color,
    pub default_line_color: Color,
    pub draw_labels: bool,
    pub label_color: Color,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ignore: AxisIgnore::NONE,
            fill: DrawMode::IfAvailable,
            outline: DrawMode::Always,
            default_line_width: 1,
            default_fill_color: Color::RED,
            default_line_color: Color::YELLOW,
            draw_labels: false,
            label_color: Color::WHITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_expands_bounds() {
        let bounds = Rect::new(coord! { x: 10.0, y: 10.0 }, coord! { x: 20.0, y: 30.0 });
        let area = Margin { left: 2.0, top: 1.0, right: 3.0, bottom: 4.0 }.inside_area(bounds).unwrap();
        assert_eq!(area.min(), coord! { x: 8.0, y: 9.0 });
        assert_eq!(area.width(), 15.0);
        assert_eq!(area.height(), 25.0);
    }

    #[test]
    fn degenerate_margins_are_rejected() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });
        assert!(matches!(Margin::uniform(-5.0).inside_area(bounds), Err(RoiError::InvalidMargin(_))));
        assert!(matches!(Margin::uniform(f64::NAN).inside_area(bounds), Err(RoiError::InvalidMargin(_))));
    }

    #[test]
    fn draw_modes() {
        assert!(DrawMode::Always.should_draw(None));
        assert!(!DrawMode::IfAvailable.should_draw(None));
        assert_eq!(DrawMode::IfAvailable.resolve(Some(Color::BLACK), Color::RED), Some(Color::BLACK));
        assert_eq!(DrawMode::Always.resolve(None, Color::RED), Some(Color::RED));
        assert_eq!(DrawMode::Never.resolve(Some(Color::BLACK), Color::RED), None);
    }
}
