//! Per-region outline re-derivation.
//!
//! Each mode turns one region into a replacement shape. Failures are handled
//! per region according to an [`InvalidOutlineBehavior`] policy.

use std::f64::consts::{FRAC_PI_8, PI};

use geo::BooleanOps;
use geo_types::{Coord, Line, MultiPolygon, Polygon, coord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::{debug, warn};

use crate::algorithms::calipers::{convex_hull, minimum_bounding_rectangle};
use crate::algorithms::fitting::{delete_spline, fit_circle, fit_ellipse, fit_spline};
use crate::algorithms::simplification::simplify_area;
use crate::collection::RoiCollection;
use crate::error::{Result, RoiError};
use crate::region::{Path, Region, Shape, closed_polygon, distance, rect_corners};
use crate::traits::RegionGeometry;

/// Outline algorithm applied to every region
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutlineMode {
    /// Boundary points as an open polygon
    #[default]
    Polygon,
    /// Boundary points with the first point repeated at the end
    ClosedPolygon,
    ConvexHull,
    /// Axis-aligned bounding box as a 4-point polygon
    BoundingRectangle,
    /// Minimum-area rotated bounding rectangle
    MinimumBoundingRectangle,
    /// Midline of the minimum bounding rectangle along its longer side
    OrientedLine,
    FitCircle,
    FitEllipse,
    FitSpline,
    /// Spline resampled at one-pixel spacing
    FitSplineStraighten,
    DeleteFitSpline,
    AreaToLine,
    LineToArea,
}

/// What to do with a region whose outline cannot be computed
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvalidOutlineBehavior {
    /// Fail the whole operation, leaving the collection unchanged
    #[default]
    Error,
    KeepOriginal,
    Skip,
}

enum Outcome {
    Derived(Region),
    Keep,
    Drop,
}

impl RoiCollection {
    /// Replaces every region by its outline under `mode`.
    ///
    /// Under [`InvalidOutlineBehavior::Error`] the first failing region aborts
    /// the operation and the collection is left as it was.
    pub fn outline(&mut self, mode: OutlineMode, on_error: InvalidOutlineBehavior) -> Result<()> {
        let mut outcomes = Vec::with_capacity(self.len());
        for (index, region) in self.iter().enumerate() {
            let outcome = match outline_region(region, mode) {
                Ok(shape) => Outcome::Derived(Region::derived_from(shape, region)),
                Err(err) => match on_error {
                    InvalidOutlineBehavior::Error => {
                        return Err(RoiError::Outline {
                            index,
                            mode,
                            reason: err.to_string(),
                        });
                    }
                    InvalidOutlineBehavior::KeepOriginal => {
                        warn!(index, %mode, error = %err, "Outline failed, keeping original region");
                        Outcome::Keep
                    }
                    InvalidOutlineBehavior::Skip => {
                        warn!(index, %mode, error = %err, "Outline failed, dropping region");
                        Outcome::Drop
                    }
                },
            };
            outcomes.push(outcome);
        }

        let regions = self
            .take_regions()
            .into_iter()
            .zip(outcomes)
            .filter_map(|(region, outcome)| match outcome {
                Outcome::Derived(derived) => Some(derived),
                Outcome::Keep => Some(region),
                Outcome::Drop => None,
            })
            .collect();
        debug!(%mode, "Outlined regions");
        self.replace_all(regions);
        Ok(())
    }
}

/// Computes the outline of a single region
pub fn outline_region(region: &Region, mode: OutlineMode) -> Result<Shape> {
    let shape = &region.shape;
    match mode {
        OutlineMode::Polygon => Ok(Shape::Polygon(Path::new(non_empty_boundary(shape)?))),
        OutlineMode::ClosedPolygon => {
            let mut points = non_empty_boundary(shape)?;
            if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                if first != last {
                    points.push(first);
                }
            }
            Ok(Shape::Polygon(Path::new(points)))
        }
        OutlineMode::ConvexHull => {
            let hull = convex_hull(&shape.boundary());
            if hull.len() < 3 {
                return Err(RoiError::GeometricComputation(format!(
                    "convex hull needs 3 non-collinear points, got {}",
                    hull.len()
                )));
            }
            Ok(Shape::Polygon(Path::new(hull)))
        }
        OutlineMode::BoundingRectangle => Ok(Shape::Polygon(Path::new(rect_corners(&shape.bounds()).to_vec()))),
        OutlineMode::MinimumBoundingRectangle => {
            let corners = minimum_bounding_rectangle(&non_empty_boundary(shape)?);
            Ok(Shape::Polygon(Path::new(corners.to_vec())))
        }
        OutlineMode::OrientedLine => {
            let [c1, c2, c3, c4] = minimum_bounding_rectangle(&non_empty_boundary(shape)?);
            let mid = |a: Coord<f64>, b: Coord<f64>| coord! { x: (a.x + b.x) / 2.0, y: (a.y + b.y) / 2.0 };
            let line = if distance(c1, c2) <= distance(c2, c3) {
                Line::new(mid(c1, c2), mid(c3, c4))
            } else {
                Line::new(mid(c2, c3), mid(c4, c1))
            };
            Ok(Shape::Line(line))
        }
        OutlineMode::FitCircle => fit_circle(shape),
        OutlineMode::FitEllipse => fit_ellipse(shape),
        OutlineMode::FitSpline => fit_spline(shape, false),
        OutlineMode::FitSplineStraighten => fit_spline(shape, true),
        OutlineMode::DeleteFitSpline => delete_spline(shape),
        OutlineMode::AreaToLine => area_to_line(shape),
        OutlineMode::LineToArea => {
            if !shape.kind().is_line() {
                return Err(unsupported(shape, "line to area"));
            }
            let width = region.style.stroke_width.unwrap_or(1.0).max(1.0);
            Ok(simplify_area(line_footprint(&shape.boundary(), width)))
        }
    }
}

fn unsupported(shape: &Shape, operation: &str) -> RoiError {
    RoiError::UnsupportedKind {
        kind: shape.kind().to_string(),
        operation: operation.to_string(),
    }
}

fn non_empty_boundary(shape: &Shape) -> Result<Vec<Coord<f64>>> {
    let points = shape.boundary();
    if points.is_empty() {
        return Err(RoiError::GeometricComputation("region has no boundary points".to_string()));
    }
    Ok(points)
}

/// Closed boundary path of an area region
fn area_to_line(shape: &Shape) -> Result<Shape> {
    if !shape.kind().is_area() || matches!(shape, Shape::Composite(_)) {
        return Err(unsupported(shape, "area to line"));
    }
    let mut points = non_empty_boundary(shape)?;
    points.push(points[0]);
    let freehand = match shape {
        Shape::Oval(_) | Shape::FreehandPolygon(_) | Shape::TracedPolygon(_) => true,
        _ => shape.path().is_some_and(Path::is_spline_fit),
    };
    let path = Path::new(points);
    Ok(if freehand { Shape::Freeline(path) } else { Shape::Polyline(path) })
}

/// Area covered by stroking the path with a pen of the given width: one quad
/// per segment plus an octagonal joint at every vertex
pub fn line_footprint(points: &[Coord<f64>], width: f64) -> MultiPolygon<f64> {
    let half = width / 2.0;
    let mut pieces: Vec<Polygon<f64>> = points.iter().map(|&p| octagon(p, half)).collect();
    for segment in points.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        let length = distance(a, b);
        if length == 0.0 {
            continue;
        }
        let normal = coord! { x: -(b.y - a.y) / length * half, y: (b.x - a.x) / length * half };
        pieces.push(closed_polygon(&[a + normal, b + normal, b - normal, a - normal]));
    }
    pieces
        .into_iter()
        .map(|piece| MultiPolygon::new(vec![piece]))
        .reduce(|acc, piece| acc.union(&piece))
        .unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

fn octagon(center: Coord<f64>, radius: f64) -> Polygon<f64> {
    let vertices: Vec<Coord<f64>> = (0..8)
        .map(|k| {
            let angle = FRAC_PI_8 + k as f64 * PI / 4.0;
            coord! { x: center.x + radius * angle.cos(), y: center.y + radius * angle.sin() }
        })
        .collect();
    closed_polygon(&vertices)
}
