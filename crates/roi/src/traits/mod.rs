use geo_types::{Coord, MultiPolygon, Rect};
use image::{ImageBuffer, Luma, Pixel, Rgb};

use crate::collection::RoiCollection;
use crate::error::Result;

/// Capability set shared by every region geometry
pub trait RegionGeometry {
    /// Axis-aligned bounds; degenerate geometries yield a zero-size rect
    fn bounds(&self) -> Rect<f64>;

    /// Whether the coordinate lies inside the region
    fn contains(&self, coord: Coord<f64>) -> bool;

    /// Boundary vertices in drawing order. Area kinds are implicitly closed.
    fn boundary(&self) -> Vec<Coord<f64>>;

    /// The planar area covered by the region, `None` for lines and points
    fn area_shape(&self) -> Option<MultiPolygon<f64>>;

    fn area(&self) -> f64 {
        use geo::Area;
        self.area_shape().map(|shape| shape.unsigned_area()).unwrap_or(0.0)
    }

    /// Perimeter for area kinds, path length for lines
    fn length(&self) -> f64;

    /// Centroid of the region contour
    fn centroid(&self) -> Coord<f64>;
}

/// Rasterization onto a single image plane
pub trait Drawable {
    /// Paints every pixel whose center lies inside the region
    fn fill<P: Pixel + 'static>(&self, image: &mut ImageBuffer<P, Vec<P::Subpixel>>, value: P, line_width: u32);

    /// Paints the region boundary with the given line width
    fn stroke<P: Pixel + 'static>(&self, image: &mut ImageBuffer<P, Vec<P::Subpixel>>, value: P, line_width: u32);
}

/// Reads a pixel as a single intensity value for measurement
pub trait Intensity: Pixel {
    fn intensity(&self) -> f64;
}

impl Intensity for Luma<u8> {
    fn intensity(&self) -> f64 {
        self.0[0] as f64
    }
}

impl Intensity for Luma<u16> {
    fn intensity(&self) -> f64 {
        self.0[0] as f64
    }
}

impl Intensity for Luma<f32> {
    fn intensity(&self) -> f64 {
        self.0[0] as f64
    }
}

impl Intensity for Rgb<u8> {
    // Unweighted channel mean
    fn intensity(&self) -> f64 {
        let [r, g, b] = self.0;
        (r as f64 + g as f64 + b as f64) / 3.0
    }
}

/// One step of a collection pipeline
pub trait CollectionProcessor: Send + Sync {
    fn process(&self, collection: &mut RoiCollection) -> Result<()>;

    /// Short name used in logs and pipeline summaries
    fn name(&self) -> &str;
}
