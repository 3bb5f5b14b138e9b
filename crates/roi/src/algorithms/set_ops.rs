//! Boolean set algebra over the regions of a collection.
//!
//! Every operation is destructive: on success the collection holds a single
//! region built from the combined shape, carrying the attributes of the first
//! region that contributed to it.

use geo::{BooleanOps, Contains};
use geo_types::{MultiPoint, MultiPolygon, Point};
use tracing::{debug, warn};

use crate::algorithms::outline::line_footprint;
use crate::algorithms::simplification::simplify_area;
use crate::collection::RoiCollection;
use crate::region::{Region, RegionKind, Shape};
use crate::traits::RegionGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOperation {
    Union,
    Intersection,
    SymmetricDifference,
}

impl SetOperation {
    fn apply(self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        match self {
            Self::Union => a.union(b),
            Self::Intersection => a.intersection(b),
            Self::SymmetricDifference => a.xor(b),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Union => "or",
            Self::Intersection => "and",
            Self::SymmetricDifference => "xor",
        }
    }
}

/// Area of a region for set algebra; line kinds are widened to their stroke
/// footprint when `widen_lines` is set
fn operand(region: &Region, widen_lines: bool) -> Option<MultiPolygon<f64>> {
    if widen_lines && region.is_line() {
        let width = region.style.stroke_width.unwrap_or(1.0).max(1.0);
        return Some(line_footprint(&region.boundary(), width));
    }
    region.area_shape()
}

impl RoiCollection {
    /// Folds `operation` over every region with an area, left to right.
    /// Returns the combined shape and the index of the first contributor.
    fn fold_shapes(&self, operation: SetOperation, widen_lines: bool) -> Option<(MultiPolygon<f64>, usize)> {
        let mut folded: Option<(MultiPolygon<f64>, usize)> = None;
        for (index, region) in self.iter().enumerate() {
            let Some(shape) = operand(region, widen_lines) else {
                warn!(index, kind = %region.kind(), operation = operation.name(), "Skipping region without area");
                continue;
            };
            folded = Some(match folded {
                None => (shape, index),
                Some((acc, first)) => (operation.apply(&acc, &shape), first),
            });
        }
        folded
    }

    fn replace_with_area(&mut self, operation: SetOperation, widen_lines: bool) {
        let Some((shape, first)) = self.fold_shapes(operation, widen_lines) else {
            debug!(operation = operation.name(), "No region with an area, collection left unchanged");
            return;
        };
        let result = Region::derived_from(simplify_area(shape), &self.regions()[first]);
        debug!(operation = operation.name(), kind = %result.kind(), "Combined regions");
        self.replace_all(vec![result]);
    }

    /// Replaces the collection by the union of its regions.
    ///
    /// A collection made only of points merges into one multi-point region.
    /// Line-like regions contribute their stroke footprint.
    pub fn logical_or(&mut self) {
        if self.is_empty() {
            return;
        }
        if self.contains_only_kind(RegionKind::Point) {
            let points: Vec<Point<f64>> = self
                .iter()
                .filter_map(|region| match &region.shape {
                    Shape::Point(points) => Some(points.0.iter().copied()),
                    _ => None,
                })
                .flatten()
                .collect();
            debug!(points = points.len(), "Merging point regions");
            let merged = Region::derived_from(Shape::Point(MultiPoint::new(points)), &self.regions()[0]);
            self.replace_all(vec![merged]);
            return;
        }
        self.replace_with_area(SetOperation::Union, true);
    }

    /// Replaces the collection by the intersection of its area regions.
    ///
    /// Line-like regions have no area and are left out of the fold, so they
    /// never empty the intersection. With exactly one point region present, the result is the subset of
    /// its points lying inside the intersection.
    pub fn logical_and(&mut self) {
        let point_regions: Vec<usize> = self
            .iter()
            .enumerate()
            .filter(|(_, region)| region.kind() == RegionKind::Point)
            .map(|(index, _)| index)
            .collect();

        let [point_index] = point_regions.as_slice() else {
            self.replace_with_area(SetOperation::Intersection, false);
            return;
        };

        let Some((shape, _)) = self.fold_shapes(SetOperation::Intersection, false) else {
            debug!("No region with an area, collection left unchanged");
            return;
        };
        let source = &self.regions()[*point_index];
        let inside: Vec<Point<f64>> = match &source.shape {
            Shape::Point(points) => points
                .iter()
                .filter(|point| shape.iter().any(|polygon| polygon.contains(*point)))
                .copied()
                .collect(),
            _ => Vec::new(),
        };
        debug!(points = inside.len(), "Points inside intersection");
        let result = Region::derived_from(Shape::Point(MultiPoint::new(inside)), source);
        self.replace_all(vec![result]);
    }

    /// Replaces the collection by the symmetric difference of its area regions
    pub fn logical_xor(&mut self) {
        self.replace_with_area(SetOperation::SymmetricDifference, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Region {
        Region::new(Shape::rectangle(x, y, w, h))
    }

    #[test]
    fn xor_of_overlapping_squares() {
        let mut collection: RoiCollection = vec![rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 0.0, 10.0, 10.0)].into();
        collection.logical_xor();
        assert_eq!(collection.len(), 1);
        assert!((collection.regions()[0].area() - 100.0).abs() < 1e-9);
        assert_eq!(collection.regions()[0].kind(), RegionKind::CompositeShape);
    }

    #[test]
    fn points_only_union_merges_points() {
        let mut collection: RoiCollection = vec![
            Region::new(Shape::points(&[(1.0, 1.0)])).with_name("first"),
            Region::new(Shape::points(&[(2.0, 2.0), (3.0, 3.0)])),
        ]
        .into();
        collection.logical_or();
        assert_eq!(collection.len(), 1);
        let region = &collection.regions()[0];
        assert_eq!(region.name.as_deref(), Some("first"));
        match &region.shape {
            Shape::Point(points) => assert_eq!(points.0.len(), 3),
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn union_widens_lines() {
        let mut collection: RoiCollection = vec![
            rect(0.0, 0.0, 10.0, 10.0),
            Region::new(Shape::line(20.0, 5.0, 30.0, 5.0)).with_stroke_width(2.0),
        ]
        .into();
        collection.logical_or();
        let region = &collection.regions()[0];
        assert!(region.area() > 100.0 + 19.0);
        assert!(region.bounds().max().x >= 30.0);
    }

    #[test]
    fn and_keeps_points_inside_intersection() {
        let mut collection: RoiCollection = vec![
            rect(0.0, 0.0, 10.0, 10.0),
            Region::new(Shape::points(&[(5.0, 5.0), (12.0, 5.0), (7.0, 7.0)])).with_name("spots"),
            rect(4.0, 4.0, 10.0, 10.0),
        ]
        .into();
        collection.logical_and();
        assert_eq!(collection.len(), 1);
        let region = &collection.regions()[0];
        assert_eq!(region.name.as_deref(), Some("spots"));
        match &region.shape {
            Shape::Point(points) => assert_eq!(points.0.len(), 2),
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn and_skips_regions_without_area() {
        let mut collection: RoiCollection = vec![
            rect(0.0, 0.0, 10.0, 10.0),
            Region::new(Shape::line(0.0, 0.0, 50.0, 50.0)),
            rect(5.0, 5.0, 10.0, 10.0),
        ]
        .into();
        collection.logical_and();
        assert_eq!(collection.len(), 1);
        assert!((collection.regions()[0].area() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn only_lines_leave_intersection_unchanged() {
        let mut collection: RoiCollection = vec![Region::new(Shape::line(0.0, 0.0, 5.0, 5.0))].into();
        collection.logical_and();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.regions()[0].kind(), RegionKind::Line);
    }
}
