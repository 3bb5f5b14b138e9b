use proptest::prelude::*;
use roi::{
    InvalidOutlineBehavior, OutlineMode, Region, RegionGeometry, RegionKind, RoiCollection, Shape, SlicePosition,
};

fn rotated_square(side: f64, degrees: f64) -> Vec<(f64, f64)> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let half = side / 2.0;
    [(-half, -half), (half, -half), (half, half), (-half, half)]
        .iter()
        .map(|&(x, y)| (50.0 + x * cos - y * sin, 50.0 + x * sin + y * cos))
        .collect()
}

fn position() -> impl Strategy<Value = SlicePosition> {
    (0u32..3, 0u32..3, 0u32..3).prop_map(|(z, c, t)| SlicePosition::new(z, c, t))
}

fn rectangle() -> impl Strategy<Value = Region> {
    (-50.0f64..50.0, -50.0f64..50.0, 0.0f64..30.0, 0.0f64..30.0, position())
        .prop_map(|(x, y, w, h, position)| Region::new(Shape::rectangle(x, y, w, h)).with_position(position))
}

proptest! {
    #[test]
    fn minimum_bounding_rectangle_of_rotated_square(side in 1.0f64..100.0, degrees in 0.0f64..90.0) {
        let mut collection: RoiCollection = vec![Region::new(Shape::polygon(&rotated_square(side, degrees)))].into();
        collection.outline(OutlineMode::MinimumBoundingRectangle, InvalidOutlineBehavior::Error).unwrap();
        let region = collection.get(0).unwrap();
        prop_assert_eq!(region.boundary().len(), 4);
        prop_assert!((region.area() - side * side).abs() <= 1e-6 * side * side);
    }

    #[test]
    fn bounding_rectangle_keeps_bounds(points in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 3..12)) {
        let source = Region::new(Shape::polygon(&points));
        let expected = source.bounds();
        let mut collection: RoiCollection = vec![source].into();
        collection.outline(OutlineMode::BoundingRectangle, InvalidOutlineBehavior::Error).unwrap();
        let region = collection.get(0).unwrap();
        prop_assert_eq!(region.kind(), RegionKind::Polygon);
        let corners = region.boundary();
        prop_assert_eq!(corners.len(), 4);
        for pair in corners.windows(2) {
            prop_assert!(pair[0].x == pair[1].x || pair[0].y == pair[1].y);
        }
        prop_assert_eq!(region.bounds(), expected);
    }

    #[test]
    fn grouping_partitions_the_collection(regions in prop::collection::vec(rectangle(), 0..20)) {
        let collection: RoiCollection = regions.into_iter().collect();
        let full = collection.group_by_position(true, true, true);
        prop_assert_eq!(full.values().map(Vec::len).sum::<usize>(), collection.len());

        for (z, c, t) in [(true, true, false), (true, false, false), (false, false, false)] {
            let coarse = collection.group_by_position(z, c, t);
            prop_assert!(coarse.len() <= full.len());
            prop_assert_eq!(coarse.values().map(Vec::len).sum::<usize>(), collection.len());
        }
    }

    #[test]
    fn bounds_grow_monotonically(regions in prop::collection::vec(rectangle(), 1..20)) {
        let mut collection = RoiCollection::new();
        let mut previous: Option<(f64, f64)> = None;
        for region in regions {
            let own = region.bounds();
            collection.add(region);
            let bounds = collection.bounds();
            if collection.len() == 1 {
                prop_assert_eq!(bounds, own);
            }
            if let Some((width, height)) = previous {
                prop_assert!(bounds.width() >= width && bounds.height() >= height);
            }
            previous = Some((bounds.width(), bounds.height()));
        }
    }
}

#[test]
fn empty_collection_has_zero_bounds() {
    let bounds = RoiCollection::new().bounds();
    assert_eq!((bounds.min().x, bounds.min().y, bounds.width(), bounds.height()), (0.0, 0.0, 0.0, 0.0));
}

#[test]
fn outline_policy_is_applied_per_region() {
    let regions = vec![
        Region::new(Shape::rectangle(0.0, 0.0, 4.0, 4.0)),
        Region::new(Shape::line(0.0, 0.0, 10.0, 0.0)),
        Region::new(Shape::oval(0.0, 0.0, 6.0, 6.0)),
    ];

    let mut keep: RoiCollection = regions.clone().into();
    keep.outline(OutlineMode::AreaToLine, InvalidOutlineBehavior::KeepOriginal).unwrap();
    assert_eq!(keep.len(), 3);
    assert_eq!(keep.get(1).unwrap().kind(), RegionKind::Line);

    let mut skip: RoiCollection = regions.clone().into();
    skip.outline(OutlineMode::AreaToLine, InvalidOutlineBehavior::Skip).unwrap();
    assert_eq!(skip.len(), 2);
    assert!(skip.iter().all(|region| region.is_line()));

    let mut strict: RoiCollection = regions.into();
    assert!(strict.outline(OutlineMode::AreaToLine, InvalidOutlineBehavior::Error).is_err());
    assert_eq!(strict.get(0).unwrap().kind(), RegionKind::Rectangle);
}
