use geo::{AffineOps, AffineTransform};
use geo_types::{Coord, coord};
use tracing::debug;

use crate::collection::RoiCollection;
use crate::region::{Path, Region, Shape, oval_vertices, rect_corners};
use crate::traits::RegionGeometry;

impl RoiCollection {
    /// Scaled copy of the collection. With `centered`, each region scales
    /// about its own bounds center, otherwise about the origin.
    pub fn scale(&self, sx: f64, sy: f64, centered: bool) -> RoiCollection {
        debug!(sx, sy, centered, regions = self.len(), "Scaling collection");
        self.iter()
            .map(|region| {
                let origin = if centered { region.bounds().center() } else { coord! { x: 0.0, y: 0.0 } };
                let transform = AffineTransform::scale(sx, sy, origin);
                Region::derived_from(region.shape.map_coords(|c| transform.apply(c)), region)
            })
            .collect()
    }

    /// Copy of the collection rotated by `angle` degrees about `center`.
    /// Rectangles become polygons and ovals become freehand polygons.
    pub fn rotate(&self, angle: f64, center: Coord<f64>) -> RoiCollection {
        debug!(angle, x = center.x, y = center.y, regions = self.len(), "Rotating collection");
        let transform = AffineTransform::rotate(angle, center);
        self.iter()
            .map(|region| Region::derived_from(rotate_shape(&region.shape, &transform), region))
            .collect()
    }

    /// Moves every region in place
    pub fn translate(&mut self, dx: f64, dy: f64) {
        debug!(dx, dy, regions = self.len(), "Translating collection");
        for region in self.iter_mut() {
            region.shape = region.shape.map_coords(|c| coord! { x: c.x + dx, y: c.y + dy });
        }
    }
}

fn rotate_shape(shape: &Shape, transform: &AffineTransform<f64>) -> Shape {
    let apply = |points: Vec<Coord<f64>>| -> Vec<Coord<f64>> {
        points.into_iter().map(|c| transform.apply(c)).collect()
    };
    match shape {
        Shape::Rectangle(rect) => Shape::Polygon(Path::new(apply(rect_corners(rect).to_vec()))),
        Shape::Oval(rect) => Shape::FreehandPolygon(Path::new(apply(oval_vertices(rect)))),
        Shape::Composite(area) => Shape::Composite(area.affine_transform(transform)),
        other => other.map_coords(|c| transform.apply(c)),
    }
}
