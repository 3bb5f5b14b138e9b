//! Minimum-area bounding rectangle by rotating calipers over the convex hull.
//!
//! The refinement runs a fixed two passes: the first pass works on the hull,
//! the second on the rectangle produced by the first.

use std::f64::consts::FRAC_PI_2;

use geo::ConvexHull;
use geo_types::{Coord, MultiPoint, Point, coord};
use tracing::trace;

use crate::region::{open_ring, points_bounds, rect_corners};

const PASSES: usize = 2;

/// Convex hull vertices, counter-clockwise and without the closing vertex
pub fn convex_hull(points: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let hull = MultiPoint::new(points.iter().map(|&c| Point::from(c)).collect()).convex_hull();
    open_ring(hull.exterior()).to_vec()
}

/// Signed distance from `p` to the line through `a` and `b`
pub fn perp_dist(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    ((b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)) / (b.x - a.x).hypot(b.y - a.y)
}

/// Signed projection of `p - a` onto the direction from `a` to `b`
pub fn par_dist(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    ((b.x - a.x) * (p.x - a.x) + (p.y - a.y) * (b.y - a.y)) / (b.x - a.x).hypot(b.y - a.y)
}

/// Corners of the minimum-area rectangle enclosing `points`.
///
/// Falls back to the axis-aligned bounding rectangle when the hull is
/// degenerate or the computation produces non-finite values.
pub fn minimum_bounding_rectangle(points: &[Coord<f64>]) -> [Coord<f64>; 4] {
    rotating_calipers(points).unwrap_or_else(|| {
        trace!(points = points.len(), "Falling back to axis-aligned bounds");
        rect_corners(&points_bounds(points))
    })
}

fn rotating_calipers(points: &[Coord<f64>]) -> Option<[Coord<f64>; 4]> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }
    let mut polygon = hull;
    let mut corners = None;
    for _ in 0..PASSES {
        let rect = calipers_pass(&polygon)?;
        polygon = rect.to_vec();
        corners = Some(rect);
    }
    corners
}

struct Candidate {
    edge_start: usize,
    edge_end: usize,
    farthest: usize,
    h_min: f64,
    h_max: f64,
}

fn calipers_pass(xp: &[Coord<f64>]) -> Option<[Coord<f64>; 4]> {
    let np = xp.len();
    let bounds = points_bounds(xp);
    let mut min_area = 2.0 * bounds.width() * bounds.height();
    let mut best: Option<Candidate> = None;

    for i in 0..np {
        let i2 = (i + 1) % np;

        let mut max_ld = 0.0;
        let mut farthest = None;
        for (j, &p) in xp.iter().enumerate() {
            let d = perp_dist(xp[i], xp[i2], p).abs();
            if max_ld < d {
                max_ld = d;
                farthest = Some(j);
            }
        }
        // A degenerate edge makes every distance NaN
        let farthest = farthest?;

        let (mut h_min, mut h_max) = (0.0f64, 0.0f64);
        for &p in xp {
            let hd = par_dist(xp[i], xp[i2], p);
            h_min = h_min.min(hd);
            h_max = h_max.max(hd);
        }

        let area = max_ld * (h_max - h_min);
        if min_area > area {
            min_area = area;
            best = Some(Candidate {
                edge_start: i,
                edge_end: i2,
                farthest,
                h_min,
                h_max,
            });
        }
    }

    let Candidate { edge_start, edge_end, farthest, h_min, h_max } = best?;
    let (a, b) = (xp[edge_start], xp[edge_end]);
    let pd = perp_dist(a, b, xp[farthest]);
    let pair_angle = (b.y - a.y).atan2(b.x - a.x);
    let min_angle = pair_angle + FRAC_PI_2;
    let along = coord! { x: pair_angle.cos(), y: pair_angle.sin() };
    let across = coord! { x: min_angle.cos(), y: min_angle.sin() };

    let n0 = a + along * h_max;
    let n1 = n0 + across * pd;
    let n2 = n1 + along * (h_min - h_max);
    let n3 = n2 - across * pd;
    let corners = [n0, n1, n2, n3];
    corners.iter().all(|c| c.x.is_finite() && c.y.is_finite()).then_some(corners)
}

/// Smallest caliper width of a convex polygon: the minimum over hull edges of
/// the farthest vertex distance from that edge
pub fn min_caliper_width(hull: &[Coord<f64>]) -> f64 {
    let n = hull.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .filter_map(|i| {
            let (a, b) = (hull[i], hull[(i + 1) % n]);
            let width = hull
                .iter()
                .map(|&p| perp_dist(a, b, p).abs())
                .fold(f64::NAN, f64::max);
            width.is_finite().then_some(width)
        })
        .fold(f64::INFINITY, f64::min)
}

/// Largest distance between two vertices with the angle of that pair in
/// degrees, measured counter-clockwise with the y axis pointing up
pub fn max_caliper(hull: &[Coord<f64>]) -> (f64, f64) {
    let mut best = (0.0, 0.0);
    for (i, &a) in hull.iter().enumerate() {
        for &b in &hull[i + 1..] {
            let d = (b.x - a.x).hypot(b.y - a.y);
            if d > best.0 {
                let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
                let angle = (left.y - right.y).atan2(right.x - left.x).to_degrees().rem_euclid(180.0);
                best = (d, angle);
            }
        }
    }
    best
}
