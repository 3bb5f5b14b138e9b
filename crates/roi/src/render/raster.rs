use geo_types::Coord;
use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use tracing::{debug, trace};

use crate::canvas::{Hyperstack, SliceExtents};
use crate::collection::RoiCollection;
use crate::error::{Result, RoiError};
use crate::region::{Region, Shape, open_ring};
use crate::render::labels::{draw_label, region_label};
use crate::render::{Margin, MaskOptions, RenderOptions};
use crate::traits::{Drawable, RegionGeometry};
use crate::types::{AxisIgnore, Color, SliceIndex};

const MASK_VALUE: Luma<u8> = Luma([255]);

/// HSV scaling applied to regions outside the highlight set
const DIM_HUE: f32 = 0.8;
const DIM_SATURATION: f32 = 1.0;
const DIM_VALUE: f32 = 0.5;

impl Shape {
    /// Paths drawn by a stroke; area rings are closed
    fn stroke_paths(&self) -> Vec<Vec<Coord<f64>>> {
        let close = |mut ring: Vec<Coord<f64>>| {
            if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
                if first != last {
                    ring.push(first);
                }
            }
            ring
        };
        match self {
            Self::Composite(area) => area
                .iter()
                .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
                .map(|ring| close(open_ring(ring).to_vec()))
                .collect(),
            Self::Point(_) => Vec::new(),
            shape if shape.kind().is_area() => vec![close(shape.boundary())],
            shape => vec![shape.boundary()],
        }
    }
}

impl Drawable for Shape {
    fn fill<P: Pixel + 'static>(&self, image: &mut ImageBuffer<P, Vec<P::Subpixel>>, value: P, line_width: u32) {
        if self.kind().is_line() {
            self.stroke(image, value, line_width.max(1));
            return;
        }
        for (x, y) in self.pixels(line_width as f64, image.width(), image.height()) {
            image.put_pixel(x, y, value);
        }
    }

    fn stroke<P: Pixel + 'static>(&self, image: &mut ImageBuffer<P, Vec<P::Subpixel>>, value: P, line_width: u32) {
        if let Self::Point(_) = self {
            for (x, y) in self.pixels(1.0, image.width(), image.height()) {
                image.put_pixel(x, y, value);
            }
            return;
        }
        for path in self.stroke_paths() {
            for segment in path.windows(2) {
                stroke_segment(image, segment[0], segment[1], value, line_width);
            }
        }
    }
}

fn stroke_segment<P: Pixel + 'static>(
    image: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    a: Coord<f64>,
    b: Coord<f64>,
    value: P,
    line_width: u32,
) {
    if line_width <= 1 {
        draw_line_segment_mut(image, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), value);
        return;
    }

    let half = line_width as f64 / 2.0;
    let length = (b.x - a.x).hypot(b.y - a.y);
    if length > 0.0 {
        let (nx, ny) = (-(b.y - a.y) / length * half, (b.x - a.x) / length * half);
        let corner = |c: Coord<f64>, sign: f64| Point::new((c.x + sign * nx).round() as i32, (c.y + sign * ny).round() as i32);
        let quad = [corner(a, 1.0), corner(b, 1.0), corner(b, -1.0), corner(a, -1.0)];
        // imageproc rejects polygons whose first and last points coincide
        if quad[0] != quad[3] {
            draw_polygon_mut(image, &quad, value);
        }
    }
    let radius = half.round() as i32;
    for c in [a, b] {
        draw_filled_circle_mut(image, (c.x.round() as i32, c.y.round() as i32), radius, value);
    }
}

/// Draws one region with the colors resolved from `opts`
fn draw_region(image: &mut RgbImage, region: &Region, opts: &RenderOptions, dimmed: bool) {
    let shade = |color: Color| {
        if dimmed { color.scale_hsv(DIM_HUE, DIM_SATURATION, DIM_VALUE) } else { color }
    };
    let line_width = region.style.line_width_or(opts.default_line_width);
    if let Some(color) = opts.fill.resolve(region.style.fill_color, opts.default_fill_color) {
        region.shape.fill(image, shade(color).to_rgb(), line_width);
    }
    if let Some(color) = opts.outline.resolve(region.style.stroke_color, opts.default_line_color) {
        region.shape.stroke(image, shade(color).to_rgb(), line_width);
    }
}

impl RoiCollection {
    /// Draws the regions visible on `slice` onto a single mask plane
    pub fn draw_mask_for_slice(&self, plane: &mut GrayImage, slice: SliceIndex, opts: &MaskOptions) {
        for (_, region) in self.visible_in(slice, AxisIgnore::NONE) {
            if opts.fill {
                region.shape.fill(plane, MASK_VALUE, opts.line_width);
            }
            if opts.outline {
                region.shape.stroke(plane, MASK_VALUE, opts.line_width);
            }
        }
    }

    /// Draws every plane of a mask canvas
    pub fn draw_mask(&self, canvas: &mut Hyperstack<Luma<u8>>, opts: &MaskOptions) -> Result<()> {
        for slice in canvas.extents().indices() {
            trace!(z = slice.z, c = slice.c, t = slice.t, "Drawing mask slice");
            let plane = canvas.plane_mut(slice)?;
            self.draw_mask_for_slice(plane, slice, opts);
        }
        Ok(())
    }

    /// Mask canvas covering the collection bounds plus `margin`, with one
    /// plane per pinned slice
    pub fn to_mask(&self, margin: &Margin, opts: &MaskOptions) -> Result<Hyperstack<Luma<u8>>> {
        let (width, height) = canvas_size(self, margin)?;
        self.to_mask_sized(width, height, self.slice_extents(), opts)
    }

    pub fn to_mask_sized(
        &self,
        width: u32,
        height: u32,
        extents: SliceExtents,
        opts: &MaskOptions,
    ) -> Result<Hyperstack<Luma<u8>>> {
        let mut canvas = Hyperstack::new(width, height, extents)?;
        self.draw_mask(&mut canvas, opts)?;
        debug!(width, height, planes = extents.plane_count(), "Rendered mask");
        Ok(canvas)
    }

    /// Single mask plane for one slice
    pub fn mask_for_slice(&self, width: u32, height: u32, slice: SliceIndex, opts: &MaskOptions) -> Result<GrayImage> {
        if width == 0 || height == 0 {
            return Err(RoiError::InvalidCanvas(format!("size {width}x{height} is empty")));
        }
        let mut plane = GrayImage::new(width, height);
        self.draw_mask_for_slice(&mut plane, slice, opts);
        Ok(plane)
    }

    /// Draws every plane of an RGB canvas
    pub fn draw(&self, canvas: &mut Hyperstack<Rgb<u8>>, opts: &RenderOptions) -> Result<()> {
        for slice in canvas.extents().indices() {
            trace!(z = slice.z, c = slice.c, t = slice.t, "Drawing RGB slice");
            let plane = canvas.plane_mut(slice)?;
            self.draw_slice(plane, slice, opts, &[]);
        }
        Ok(())
    }

    /// RGB rendering of all regions onto one plane, ignoring their slice
    /// positions
    pub fn to_rgb(&self, margin: &Margin, opts: &RenderOptions) -> Result<RgbImage> {
        let (width, height) = canvas_size(self, margin)?;
        let mut canvas = Hyperstack::<Rgb<u8>>::new(width, height, SliceExtents::SINGLE)?;
        let opts = RenderOptions {
            ignore: AxisIgnore::ALL,
            ..*opts
        };
        self.draw(&mut canvas, &opts)?;
        debug!(width, height, "Rendered RGB composite");
        canvas
            .into_planes()
            .into_iter()
            .next()
            .ok_or_else(|| RoiError::InvalidCanvas("canvas has no plane".to_string()))
    }

    /// Draws the regions visible on `slice`. Regions listed in `highlighted`
    /// are drawn last, on top of the others, which are dimmed.
    pub fn draw_slice(&self, image: &mut RgbImage, slice: SliceIndex, opts: &RenderOptions, highlighted: &[usize]) {
        let dimmed = !highlighted.is_empty();
        for (index, region) in self.visible_in(slice, opts.ignore) {
            if highlighted.contains(&index) {
                continue;
            }
            draw_region(image, region, opts, dimmed);
            if opts.draw_labels {
                draw_label(image, &region_label(index, region), region.centroid(), opts.label_color);
            }
        }
        for &index in highlighted {
            let Some(region) = self.get(index) else {
                continue;
            };
            draw_region(image, region, opts, false);
            if opts.draw_labels {
                draw_label(image, &region_label(index, region), region.centroid(), opts.label_color);
            }
        }
    }
}

fn canvas_size(collection: &RoiCollection, margin: &Margin) -> Result<(u32, u32)> {
    let area = margin.inside_area(collection.bounds())?;
    let (width, height) = (area.max().x.ceil(), area.max().y.ceil());
    if width < 1.0 || height < 1.0 {
        return Err(RoiError::InvalidMargin(format!(
            "{margin:?} produces a canvas of {width}x{height}"
        )));
    }
    Ok((width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_strokes_cover_the_pen_width() {
        let mut image = GrayImage::new(30, 30);
        Shape::line(5.0, 15.0, 25.0, 15.0).stroke(&mut image, MASK_VALUE, 5);
        assert_eq!(image.get_pixel(15, 13)[0], 255);
        assert_eq!(image.get_pixel(15, 17)[0], 255);
        assert_eq!(image.get_pixel(15, 20)[0], 0);
    }

    #[test]
    fn empty_collection_needs_a_margin() {
        let collection = RoiCollection::new();
        assert!(matches!(
            collection.to_mask(&Margin::default(), &MaskOptions::default()),
            Err(RoiError::InvalidMargin(_))
        ));
        let mask = collection.to_mask(&Margin::uniform(2.0), &MaskOptions::default()).unwrap();
        assert_eq!((mask.width(), mask.height()), (2, 2));
    }

    #[test]
    fn highlighted_regions_are_drawn_on_top() {
        let collection: RoiCollection = vec![
            Region::new(Shape::rectangle(0.0, 0.0, 10.0, 10.0)).with_fill_color(Color::rgb(0, 0, 200)),
            Region::new(Shape::rectangle(5.0, 5.0, 10.0, 10.0)).with_fill_color(Color::rgb(0, 200, 0)),
        ]
        .into();
        let opts = RenderOptions {
            outline: crate::render::DrawMode::Never,
            ..RenderOptions::default()
        };
        let mut image = RgbImage::new(20, 20);
        collection.draw_slice(&mut image, SliceIndex::default(), &opts, &[0]);
        // the highlighted first region covers the overlap at full brightness
        assert_eq!(*image.get_pixel(7, 7), Rgb([0, 0, 200]));
        // the other region is dimmed
        assert_eq!(image.get_pixel(12, 12)[1], 100);
    }

    #[test]
    fn to_rgb_ignores_positions() {
        let collection: RoiCollection =
            vec![Region::new(Shape::rectangle(0.0, 0.0, 4.0, 4.0)).with_fill_color(Color::RED).at(3, 0, 0)].into();
        let image = collection.to_rgb(&Margin::default(), &RenderOptions::default()).unwrap();
        assert_eq!(*image.get_pixel(1, 1), Rgb([255, 0, 0]));
    }
}
