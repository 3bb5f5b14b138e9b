use geo::Simplify;
use geo_types::{Coord, LineString, MultiPolygon, Rect};

use crate::region::{Path, Shape, open_ring, points_bounds};

const COLLINEAR_EPSILON: f64 = 1e-9;

/// Converts the result of a set operation into the simplest equivalent shape:
/// an axis-aligned rectangle, a plain polygon, or the composite itself
pub fn simplify_area(shape: MultiPolygon<f64>) -> Shape {
    match shape.0.as_slice() {
        [polygon] if polygon.interiors().is_empty() => {
            let ring = remove_collinear(open_ring(polygon.exterior()));
            match axis_aligned_rect(&ring) {
                Some(rect) => Shape::Rectangle(rect),
                None => Shape::Polygon(Path::new(ring)),
            }
        }
        _ => Shape::Composite(shape),
    }
}

/// Douglas-Peucker thinning of a vertex path
pub fn thin_path(points: &[Coord<f64>], closed: bool, tolerance: f64) -> Vec<Coord<f64>> {
    let mut coords = points.to_vec();
    if closed {
        if let Some(&first) = points.first() {
            coords.push(first);
        }
    }
    let simplified = LineString::new(coords).simplify(&tolerance);
    if closed {
        open_ring(&simplified).to_vec()
    } else {
        simplified.0
    }
}

/// Drops repeated vertices and vertices lying on the segment between their
/// neighbours of a closed ring
pub fn remove_collinear(ring: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut points: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
    for &c in ring {
        if points.last() != Some(&c) {
            points.push(c);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    let mut changed = true;
    while changed && points.len() > 3 {
        changed = false;
        let n = points.len();
        for i in 0..n {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            let cur = points[i];
            let cross = (cur.x - prev.x) * (next.y - prev.y) - (cur.y - prev.y) * (next.x - prev.x);
            if cross.abs() <= COLLINEAR_EPSILON {
                points.remove(i);
                changed = true;
                break;
            }
        }
    }
    points
}

fn axis_aligned_rect(ring: &[Coord<f64>]) -> Option<Rect<f64>> {
    if ring.len() != 4 {
        return None;
    }
    let rect = points_bounds(ring);
    let (min, max) = (rect.min(), rect.max());
    let on_corner = |c: &Coord<f64>| (c.x == min.x || c.x == max.x) && (c.y == min.y || c.y == max.y);
    let edges_axis_aligned = (0..4).all(|i| {
        let (a, b) = (ring[i], ring[(i + 1) % 4]);
        a.x == b.x || a.y == b.y
    });
    (ring.iter().all(on_corner) && edges_axis_aligned && rect.width() > 0.0 && rect.height() > 0.0).then_some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Polygon, coord, polygon};

    #[test]
    fn single_rectangle_ring_becomes_rectangle() {
        let square: Polygon<f64> = polygon![
            (x: 15.0, y: 15.0), (x: 17.5, y: 15.0), (x: 20.0, y: 15.0),
            (x: 20.0, y: 20.0), (x: 15.0, y: 20.0),
        ];
        match simplify_area(MultiPolygon::new(vec![square])) {
            Shape::Rectangle(rect) => {
                assert_eq!(rect.min(), coord! { x: 15.0, y: 15.0 });
                assert_eq!(rect.max(), coord! { x: 20.0, y: 20.0 });
            }
            other => panic!("expected rectangle, got {other:?}"),
        }
    }

    #[test]
    fn l_shape_stays_polygon_and_multi_stays_composite() {
        let l_shape: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0),
            (x: 1.0, y: 1.0), (x: 1.0, y: 2.0), (x: 0.0, y: 2.0),
        ];
        assert!(matches!(simplify_area(MultiPolygon::new(vec![l_shape.clone()])), Shape::Polygon(_)));

        let other: Polygon<f64> = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0)];
        assert!(matches!(
            simplify_area(MultiPolygon::new(vec![l_shape, other])),
            Shape::Composite(_)
        ));
    }

    #[test]
    fn thinning_keeps_closed_rings_open() {
        let ring: Vec<Coord<f64>> = (0..40)
            .map(|i| {
                let t = i as f64 / 40.0 * std::f64::consts::TAU;
                coord! { x: 10.0 * t.cos(), y: 10.0 * t.sin() }
            })
            .collect();
        let thinned = thin_path(&ring, true, 1.0);
        assert!(thinned.len() < ring.len());
        assert!(thinned.len() >= 3);
        assert_ne!(thinned.first(), thinned.last());
    }
}
