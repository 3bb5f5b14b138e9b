use proptest::prelude::*;
use roi::{Region, RegionGeometry, RegionKind, RoiCollection, Shape};

fn overlapping_pair() -> RoiCollection {
    vec![
        Region::new(Shape::rectangle(10.0, 10.0, 10.0, 10.0)),
        Region::new(Shape::rectangle(15.0, 15.0, 10.0, 10.0)),
    ]
    .into()
}

fn assert_bounds(region: &Region, min: (f64, f64), max: (f64, f64)) {
    let bounds = region.bounds();
    assert!((bounds.min().x - min.0).abs() < 1e-9 && (bounds.min().y - min.1).abs() < 1e-9);
    assert!((bounds.max().x - max.0).abs() < 1e-9 && (bounds.max().y - max.1).abs() < 1e-9);
}

#[test]
fn intersection_of_overlapping_squares() {
    let mut collection = overlapping_pair();
    collection.logical_and();
    assert_eq!(collection.len(), 1);
    let region = collection.get(0).unwrap();
    assert_bounds(region, (15.0, 15.0), (20.0, 20.0));
    assert!((region.area() - 25.0).abs() < 1e-9);
}

#[test]
fn union_of_overlapping_squares() {
    let mut collection = overlapping_pair();
    collection.logical_or();
    assert_eq!(collection.len(), 1);
    let region = collection.get(0).unwrap();
    assert_bounds(region, (10.0, 10.0), (25.0, 25.0));
    assert!((region.area() - 175.0).abs() < 1e-9);
}

#[test]
fn union_keeps_first_region_attributes() {
    let mut collection: RoiCollection = vec![
        Region::new(Shape::rectangle(0.0, 0.0, 5.0, 5.0)).with_name("first").at(2, 0, 0),
        Region::new(Shape::rectangle(3.0, 0.0, 5.0, 5.0)).with_name("second").at(3, 0, 0),
    ]
    .into();
    collection.logical_or();
    let region = collection.get(0).unwrap();
    assert_eq!(region.name.as_deref(), Some("first"));
    assert_eq!(region.position.z.raw(), 2);
}

#[test]
fn intersection_with_a_point_region_keeps_contained_points() {
    let mut collection: RoiCollection = vec![
        Region::new(Shape::rectangle(0.0, 0.0, 10.0, 10.0)),
        Region::new(Shape::points(&[(2.0, 2.0), (20.0, 20.0), (8.0, 1.0)])),
        Region::new(Shape::rectangle(5.0, 0.0, 10.0, 10.0)),
    ]
    .into();
    collection.logical_and();
    assert_eq!(collection.len(), 1);
    let region = collection.get(0).unwrap();
    assert_eq!(region.kind(), RegionKind::Point);
    assert_eq!(region.boundary().len(), 1);
}

#[test]
fn points_merge_under_union() {
    let mut collection: RoiCollection = vec![
        Region::new(Shape::points(&[(1.0, 1.0)])),
        Region::new(Shape::points(&[(2.0, 2.0), (3.0, 3.0)])),
    ]
    .into();
    collection.logical_or();
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.get(0).unwrap().boundary().len(), 3);
}

// Regions without an area do not take part in the fold and leave no trace
// in the result.
#[test]
fn regions_without_area_are_skipped() {
    let mut collection: RoiCollection = vec![
        Region::new(Shape::line(0.0, 0.0, 100.0, 100.0)),
        Region::new(Shape::rectangle(10.0, 10.0, 10.0, 10.0)),
        Region::new(Shape::rectangle(15.0, 15.0, 10.0, 10.0)),
    ]
    .into();
    collection.logical_and();
    assert_eq!(collection.len(), 1);
    assert!((collection.get(0).unwrap().area() - 25.0).abs() < 1e-9);
}

proptest! {
    #[test]
    fn disjoint_squares(
        w1 in 1.0f64..50.0,
        h1 in 1.0f64..50.0,
        w2 in 1.0f64..50.0,
        h2 in 1.0f64..50.0,
        gap in 1.0f64..20.0,
    ) {
        let pair: RoiCollection = vec![
            Region::new(Shape::rectangle(0.0, 0.0, w1, h1)),
            Region::new(Shape::rectangle(w1 + gap, 0.0, w2, h2)),
        ]
        .into();

        let mut and = pair.clone();
        and.logical_and();
        prop_assert_eq!(and.len(), 1);
        prop_assert!(and.get(0).unwrap().area().abs() < 1e-9);

        let mut or = pair.clone();
        or.logical_or();
        prop_assert_eq!(or.len(), 1);
        let largest = (w1 * h1).max(w2 * h2);
        prop_assert!(or.get(0).unwrap().area() >= largest - 1e-6);
    }
}
