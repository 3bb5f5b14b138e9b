use std::f64::consts::PI;

use geo_types::{Coord, coord};
use image::ImageBuffer;

use crate::algorithms::calipers::{convex_hull, max_caliper, min_caliper_width};
use crate::canvas::Calibration;
use crate::error::{Result, RoiError};
use crate::region::{Region, closed_polygon};
use crate::traits::{Intensity, RegionGeometry};

/// Every statistic the measurement engine can report for one region on one
/// plane. Lengths and positions are calibrated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionStatistics {
    pub pixel_count: usize,
    pub area: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub x: f64,
    pub y: f64,
    pub xm: f64,
    pub ym: f64,
    pub perimeter: f64,
    pub bx: f64,
    pub by: f64,
    pub width: f64,
    pub height: f64,
    pub major: f64,
    pub minor: f64,
    pub angle: f64,
    pub circularity: f64,
    pub aspect_ratio: f64,
    pub roundness: f64,
    pub solidity: f64,
    pub feret: f64,
    pub feret_angle: f64,
    pub min_feret: f64,
    pub integrated_density: f64,
    pub raw_integrated_density: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    /// 1-based channel, slice and frame the region was measured on
    pub channel: f64,
    pub slice: f64,
    pub frame: f64,
}

impl RegionStatistics {
    /// Measures `region` on `plane`. A pixel belongs to the region when its
    /// center lies inside it.
    pub fn compute<P: Intensity>(
        region: &Region,
        plane: &ImageBuffer<P, Vec<P::Subpixel>>,
        calibration: &Calibration,
    ) -> Result<Self> {
        if !region.shape.is_finite() {
            return Err(RoiError::GeometricComputation(format!(
                "{} region has non-finite coordinates",
                region.kind()
            )));
        }
        let (pw, ph) = (calibration.pixel_width, calibration.pixel_height);
        let line_width = region.style.stroke_width.unwrap_or(1.0).max(1.0);
        let pixels = region.shape.pixels(line_width, plane.width(), plane.height());
        let values: Vec<f64> = pixels.iter().map(|&(x, y)| plane.get_pixel(x, y).intensity()).collect();

        let mut stats = Self {
            pixel_count: pixels.len(),
            area: pixels.len() as f64 * pw * ph,
            ..Self::default()
        };
        stats.intensity(&values);
        stats.positions(region, &pixels, &values, pw, ph);
        stats.ellipse(&pixels, pw);
        stats.shape(region, pw, ph);
        stats.integrated_density = stats.area * stats.mean;
        Ok(stats)
    }

    fn intensity(&mut self, values: &[f64]) {
        let n = values.len();
        if n == 0 {
            for field in [&mut self.mean, &mut self.min, &mut self.max, &mut self.median] {
                *field = f64::NAN;
            }
            self.skewness = f64::NAN;
            self.kurtosis = f64::NAN;
            return;
        }
        let nf = n as f64;
        let sum: f64 = values.iter().sum();
        let mean = sum / nf;
        self.raw_integrated_density = sum;
        self.mean = mean;
        self.min = values.iter().copied().fold(f64::INFINITY, f64::min);
        self.max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), v| {
            let d = v - mean;
            (m2 + d * d, m3 + d * d * d, m4 + d * d * d * d)
        });
        self.std_dev = if n > 1 { (m2 / (nf - 1.0)).sqrt() } else { 0.0 };

        let variance = m2 / nf;
        let sd = variance.sqrt();
        self.skewness = (m3 / nf) / (variance * sd);
        self.kurtosis = (m4 / nf) / (variance * variance) - 3.0;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        self.median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
    }

    fn positions(&mut self, region: &Region, pixels: &[(u32, u32)], values: &[f64], pw: f64, ph: f64) {
        let centroid = if pixels.is_empty() {
            region.centroid()
        } else {
            let n = pixels.len() as f64;
            let (sx, sy) = pixels
                .iter()
                .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64 + 0.5, sy + y as f64 + 0.5));
            coord! { x: sx / n, y: sy / n }
        };
        self.x = centroid.x * pw;
        self.y = centroid.y * ph;

        let total: f64 = values.iter().sum();
        let (xm, ym) = if total != 0.0 {
            let (sx, sy) = pixels.iter().zip(values).fold((0.0, 0.0), |(sx, sy), (&(x, y), v)| {
                (sx + (x as f64 + 0.5) * v, sy + (y as f64 + 0.5) * v)
            });
            (sx / total, sy / total)
        } else {
            (centroid.x, centroid.y)
        };
        self.xm = xm * pw;
        self.ym = ym * ph;

        let bounds = region.bounds();
        self.bx = bounds.min().x * pw;
        self.by = bounds.min().y * ph;
        self.width = bounds.width() * pw;
        self.height = bounds.height() * ph;
        self.perimeter = region.length() * pw;
    }

    /// Ellipse with the same second moments as the pixel set
    fn ellipse(&mut self, pixels: &[(u32, u32)], pw: f64) {
        if pixels.is_empty() {
            self.major = f64::NAN;
            self.minor = f64::NAN;
            self.angle = f64::NAN;
            return;
        }
        let n = pixels.len() as f64;
        let (sx, sy) = pixels
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
        let (cx, cy) = (sx / n, sy / n);
        let (mut mu20, mut mu02, mut mu11) = (0.0, 0.0, 0.0);
        for &(x, y) in pixels {
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            mu20 += dx * dx;
            mu02 += dy * dy;
            mu11 += dx * dy;
        }
        // each pixel is a unit square, not a point
        let mu20 = mu20 / n + 1.0 / 12.0;
        let mu02 = mu02 / n + 1.0 / 12.0;
        let mu11 = mu11 / n;

        let mean = (mu20 + mu02) / 2.0;
        let spread = (((mu20 - mu02) / 2.0).powi(2) + mu11 * mu11).sqrt();
        self.major = 4.0 * (mean + spread).sqrt() * pw;
        self.minor = 4.0 * (mean - spread).max(0.0).sqrt() * pw;
        let theta = 0.5 * (2.0 * mu11).atan2(mu20 - mu02);
        // y points down in the image, angles are reported counter-clockwise
        self.angle = (-theta).to_degrees().rem_euclid(180.0);
    }

    fn shape(&mut self, region: &Region, pw: f64, ph: f64) {
        use geo::Area;

        self.circularity = if self.perimeter > 0.0 {
            (4.0 * PI * self.area / (self.perimeter * self.perimeter)).min(1.0)
        } else {
            0.0
        };
        self.aspect_ratio = self.major / self.minor;
        self.roundness = 4.0 * self.area / (PI * self.major * self.major);

        let scaled: Vec<Coord<f64>> = region
            .boundary()
            .iter()
            .map(|c| coord! { x: c.x * pw, y: c.y * ph })
            .collect();
        let hull = convex_hull(&scaled);
        let hull_area = if hull.len() >= 3 { closed_polygon(&hull).unsigned_area() } else { 0.0 };
        self.solidity = if hull_area > 0.0 {
            region.area() * pw * ph / hull_area
        } else {
            f64::NAN
        };

        let caliper_points = if hull.len() >= 2 { &hull } else { &scaled };
        let (feret, feret_angle) = max_caliper(caliper_points);
        self.feret = feret;
        self.feret_angle = feret_angle;
        self.min_feret = min_caliper_width(&hull);
    }
}
