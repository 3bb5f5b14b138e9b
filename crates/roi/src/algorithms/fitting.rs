//! Curve fitting: circles, ellipses and Catmull-Rom splines.

use std::f64::consts::{PI, TAU};

use geo_types::{Coord, LineString, coord};
use tracing::trace;

use crate::algorithms::simplification::thin_path;
use crate::error::{Result, RoiError};
use crate::region::{Path, Shape, ellipse_perimeter, open_ring, path_length};
use crate::traits::RegionGeometry;

const CIRCLE_MAX_ITERATIONS: usize = 20;
const CIRCLE_EPSILON: f64 = 1e-12;
const SPLINE_THINNING_TOLERANCE: f64 = 1.0;
const MIN_SPLINE_SAMPLES: usize = 100;
/// Absorbs rounding in accumulated arc length
const RESAMPLE_SLACK: f64 = 1e-9;

/// Fits a circle, returned as an oval with integral bounds.
///
/// Area regions get the circle of equal area centered on their centroid.
/// Other regions get an algebraic least-squares fit through their points,
/// solved with Newton's method.
pub fn fit_circle(shape: &Shape) -> Result<Shape> {
    if shape.kind().is_area() {
        let area = shape.area();
        if area <= 0.0 {
            return Err(RoiError::GeometricComputation("cannot fit a circle to an empty area".to_string()));
        }
        let center = shape.centroid();
        let r = (area / PI).sqrt();
        let d = (2.0 * r).round();
        return Ok(Shape::oval((center.x - r).round(), (center.y - r).round(), d, d));
    }

    let points = shape.boundary();
    let (center, r) = algebraic_circle(&points)?;
    let d = (2.0 * r).round();
    Ok(Shape::oval((center.x - r).round(), (center.y - r).round(), d, d))
}

fn algebraic_circle(points: &[Coord<f64>]) -> Result<(Coord<f64>, f64)> {
    let n = points.len();
    if n < 3 {
        return Err(RoiError::GeometricComputation(format!("circle fit needs 3 points, got {n}")));
    }
    let nf = n as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / nf;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / nf;

    let (mut mxx, mut myy, mut mxy, mut mxz, mut myz, mut mzz) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for p in points {
        let x = p.x - mean_x;
        let y = p.y - mean_y;
        let z = x * x + y * y;
        mxy += x * y;
        mxx += x * x;
        myy += y * y;
        mxz += x * z;
        myz += y * z;
        mzz += z * z;
    }
    let (mxx, myy, mxy, mxz, myz, mzz) = (mxx / nf, myy / nf, mxy / nf, mxz / nf, myz / nf, mzz / nf);

    // Characteristic polynomial coefficients
    let mz = mxx + myy;
    let cov_xy = mxx * myy - mxy * mxy;
    let mxz2 = mxz * mxz;
    let myz2 = myz * myz;
    let a2 = 4.0 * cov_xy - 3.0 * mz * mz - mzz;
    let a1 = mzz * mz + 4.0 * cov_xy * mz - mxz2 - myz2 - mz * mz * mz;
    let a0 = mxz2 * myy + myz2 * mxx - mzz * cov_xy - 2.0 * mxz * myz * mxy + mz * mz * cov_xy;
    let a22 = a2 + a2;

    let mut x_new = 0.0f64;
    let mut y_new = 1e20f64;
    for iteration in 1..=CIRCLE_MAX_ITERATIONS {
        let y_old = y_new;
        y_new = a0 + x_new * (a1 + x_new * (a2 + 4.0 * x_new * x_new));
        if y_new.abs() > y_old.abs() {
            trace!(iteration, "Newton step went the wrong way");
            x_new = 0.0;
            break;
        }
        let dy = a1 + x_new * (a22 + 16.0 * x_new * x_new);
        let x_old = x_new;
        x_new = x_old - y_new / dy;
        if ((x_new - x_old) / x_new).abs() < CIRCLE_EPSILON {
            break;
        }
        if iteration >= CIRCLE_MAX_ITERATIONS || x_new < 0.0 {
            x_new = 0.0;
        }
    }

    let det = x_new * x_new - x_new * mz + cov_xy;
    let cx = (mxz * (myy - x_new) - myz * mxy) / (2.0 * det);
    let cy = (myz * (mxx - x_new) - mxz * mxy) / (2.0 * det);
    let radius = (cx * cx + cy * cy + mz + 2.0 * x_new).sqrt();
    if !radius.is_finite() {
        return Err(RoiError::GeometricComputation("circle fit did not converge".to_string()));
    }
    Ok((coord! { x: cx + mean_x, y: cy + mean_y }, radius))
}

/// Raw polygon moments: area, first moments and second moments
#[derive(Debug, Default, Clone, Copy)]
struct Moments {
    area: f64,
    sx: f64,
    sy: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

impl Moments {
    fn of_ring(ring: &[Coord<f64>]) -> Self {
        let mut m = Moments::default();
        let n = ring.len();
        for i in 0..n {
            let (p, q) = (ring[i], ring[(i + 1) % n]);
            let cross = p.x * q.y - q.x * p.y;
            m.area += cross / 2.0;
            m.sx += cross * (p.x + q.x) / 6.0;
            m.sy += cross * (p.y + q.y) / 6.0;
            m.sxx += cross * (p.x * p.x + p.x * q.x + q.x * q.x) / 12.0;
            m.syy += cross * (p.y * p.y + p.y * q.y + q.y * q.y) / 12.0;
            m.sxy += cross * (p.x * q.y + 2.0 * p.x * p.y + 2.0 * q.x * q.y + q.x * p.y) / 24.0;
        }
        m
    }

    fn scaled(self, sign: f64) -> Self {
        Self {
            area: self.area * sign,
            sx: self.sx * sign,
            sy: self.sy * sign,
            sxx: self.sxx * sign,
            syy: self.syy * sign,
            sxy: self.sxy * sign,
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            area: self.area + other.area,
            sx: self.sx + other.sx,
            sy: self.sy + other.sy,
            sxx: self.sxx + other.sxx,
            syy: self.syy + other.syy,
            sxy: self.sxy + other.sxy,
        }
    }
}

/// Ellipse with the same area, centroid and second moments as an area
/// region, sampled as a freehand polygon
pub fn fit_ellipse(shape: &Shape) -> Result<Shape> {
    let Some(area) = shape.area_shape() else {
        return Err(RoiError::UnsupportedKind {
            kind: shape.kind().to_string(),
            operation: "fit ellipse".to_string(),
        });
    };

    let mut total = Moments::default();
    for polygon in &area {
        let exterior = Moments::of_ring(open_ring(polygon.exterior()));
        total = total.add(exterior.scaled(exterior.area.signum()));
        for interior in polygon.interiors() {
            let hole = Moments::of_ring(open_ring(interior));
            total = total.add(hole.scaled(-hole.area.signum()));
        }
    }
    if !(total.area > 0.0) {
        return Err(RoiError::GeometricComputation("cannot fit an ellipse to an empty area".to_string()));
    }

    let cx = total.sx / total.area;
    let cy = total.sy / total.area;
    let mu20 = total.sxx / total.area - cx * cx;
    let mu02 = total.syy / total.area - cy * cy;
    let mu11 = total.sxy / total.area - cx * cy;

    let mean = (mu20 + mu02) / 2.0;
    let spread = (((mu20 - mu02) / 2.0).powi(2) + mu11 * mu11).sqrt();
    let semi_major = 2.0 * (mean + spread).sqrt();
    let semi_minor = 2.0 * (mean - spread).max(0.0).sqrt();
    let theta = 0.5 * (2.0 * mu11).atan2(mu20 - mu02);
    if !(semi_major.is_finite() && semi_minor > 0.0) {
        return Err(RoiError::GeometricComputation("degenerate ellipse".to_string()));
    }

    Ok(Shape::FreehandPolygon(Path::new(ellipse_points(
        coord! { x: cx, y: cy },
        semi_major,
        semi_minor,
        theta,
    ))))
}

fn ellipse_points(center: Coord<f64>, a: f64, b: f64, theta: f64) -> Vec<Coord<f64>> {
    let n = (ellipse_perimeter(a, b).ceil() as usize).clamp(32, 4096);
    let (sin_t, cos_t) = theta.sin_cos();
    (0..n)
        .map(|i| {
            let (sin_p, cos_p) = (TAU * i as f64 / n as f64).sin_cos();
            let (u, v) = (a * cos_p, b * sin_p);
            coord! { x: center.x + u * cos_t - v * sin_t, y: center.y + u * sin_t + v * cos_t }
        })
        .collect()
}

/// Fits a Catmull-Rom spline through the vertices of a polygon or polyline.
///
/// Hand-drawn paths are thinned first and become their segmented
/// counterparts. With `straighten`, the curve is densely sampled and then
/// resampled at one-pixel spacing.
pub fn fit_spline(shape: &Shape, straighten: bool) -> Result<Shape> {
    let (path, closed) = match shape {
        Shape::Polygon(path) | Shape::FreehandPolygon(path) | Shape::TracedPolygon(path) => (path, true),
        Shape::Polyline(path) | Shape::Freeline(path) => (path, false),
        other => {
            return Err(RoiError::UnsupportedKind {
                kind: other.kind().to_string(),
                operation: "fit spline".to_string(),
            });
        }
    };

    let hand_drawn = matches!(shape, Shape::FreehandPolygon(_) | Shape::TracedPolygon(_) | Shape::Freeline(_));
    let thinned = hand_drawn && path.vertices.len() > 3;
    let vertices = if thinned {
        thin_path(&path.vertices, closed, SPLINE_THINNING_TOLERANCE)
    } else {
        path.vertices.clone()
    };
    let required = if closed { 3 } else { 2 };
    if vertices.len() < required {
        return Err(RoiError::GeometricComputation(format!(
            "spline needs {required} vertices, got {}",
            vertices.len()
        )));
    }

    let length = path_length(&vertices, closed);
    let spline = if straighten {
        let samples = MIN_SPLINE_SAMPLES.max((2.0 * length) as usize);
        resample(&catmull_rom(&vertices, closed, samples), 1.0)
    } else {
        let samples = MIN_SPLINE_SAMPLES.max((length / 2.0) as usize);
        catmull_rom(&vertices, closed, samples)
    };
    trace!(vertices = vertices.len(), samples = spline.len(), straighten, "Fitted spline");

    let fitted = Path { vertices, spline: Some(spline) };
    Ok(match shape {
        Shape::FreehandPolygon(_) if !thinned => Shape::FreehandPolygon(fitted),
        Shape::TracedPolygon(_) if !thinned => Shape::TracedPolygon(fitted),
        Shape::Freeline(_) if !thinned => Shape::Freeline(fitted),
        _ if closed => Shape::Polygon(fitted),
        _ => Shape::Polyline(fitted),
    })
}

/// Drops a fitted spline, keeping the control vertices
pub fn delete_spline(shape: &Shape) -> Result<Shape> {
    let strip = |path: &Path| Path::new(path.vertices.clone());
    Ok(match shape {
        Shape::Polygon(path) => Shape::Polygon(strip(path)),
        Shape::FreehandPolygon(path) => Shape::FreehandPolygon(strip(path)),
        Shape::TracedPolygon(path) => Shape::TracedPolygon(strip(path)),
        Shape::Polyline(path) => Shape::Polyline(strip(path)),
        Shape::Freeline(path) => Shape::Freeline(strip(path)),
        Shape::Angle(path) => Shape::Angle(strip(path)),
        other => {
            return Err(RoiError::UnsupportedKind {
                kind: other.kind().to_string(),
                operation: "delete spline".to_string(),
            });
        }
    })
}

/// Uniform Catmull-Rom curve through `points` sampled at `samples` points.
/// Closed curves wrap around; open curves duplicate their end points.
pub fn catmull_rom(points: &[Coord<f64>], closed: bool, samples: usize) -> Vec<Coord<f64>> {
    let n = points.len();
    if n < 2 || samples < 2 {
        return points.to_vec();
    }
    let segments = if closed { n } else { n - 1 };
    let at = |i: isize| -> Coord<f64> {
        if closed {
            points[i.rem_euclid(n as isize) as usize]
        } else {
            points[i.clamp(0, n as isize - 1) as usize]
        }
    };
    let divisor = if closed { samples } else { samples - 1 };

    (0..samples)
        .map(|k| {
            let u = k as f64 * segments as f64 / divisor as f64;
            let segment = (u.floor() as usize).min(segments - 1);
            let t = u - segment as f64;
            let i = segment as isize;
            let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
            let t2 = t * t;
            let t3 = t2 * t;
            let blend = |a: f64, b: f64, c: f64, d: f64| {
                0.5 * (2.0 * b + (c - a) * t + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2 + (3.0 * b - a - 3.0 * c + d) * t3)
            };
            coord! { x: blend(p0.x, p1.x, p2.x, p3.x), y: blend(p0.y, p1.y, p2.y, p3.y) }
        })
        .collect()
}

/// Points along the polyline at fixed arc-length spacing, starting at the
/// first point
pub fn resample(points: &[Coord<f64>], spacing: f64) -> Vec<Coord<f64>> {
    use geo::{EuclideanLength, LineInterpolatePoint};

    let line = LineString::from(points.to_vec());
    let length = line.euclidean_length();
    if points.len() < 2 || length <= 0.0 || spacing <= 0.0 {
        return points.to_vec();
    }
    let steps = (length / spacing + RESAMPLE_SLACK).floor() as usize;
    (0..=steps)
        .filter_map(|i| line.line_interpolate_point((i as f64 * spacing / length).min(1.0)))
        .map(|p| p.0)
        .collect()
}
