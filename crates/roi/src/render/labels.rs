use ab_glyph::{FontRef, PxScale};
use geo_types::Coord;
use image::RgbImage;
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::warn;

use crate::region::Region;
use crate::types::Color;

const LABEL_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

/// Label height in pixels
pub const LABEL_SCALE: f32 = 12.0;

/// Text drawn for a region: its name, or its collection index when unnamed
pub fn region_label(index: usize, region: &Region) -> String {
    region.name.clone().unwrap_or_else(|| index.to_string())
}

fn label_font() -> Option<FontRef<'static>> {
    match FontRef::try_from_slice(LABEL_FONT) {
        Ok(font) => Some(font),
        Err(err) => {
            warn!(%err, "Label font could not be parsed, skipping labels");
            None
        }
    }
}

/// Pixel size of a rendered label
pub fn label_size(text: &str) -> (u32, u32) {
    match label_font() {
        Some(font) => text_size(PxScale::from(LABEL_SCALE), &font, text),
        None => (0, 0),
    }
}

/// Draws `text` centered on `center`; pixels outside the image are clipped
pub fn draw_label(image: &mut RgbImage, text: &str, center: Coord<f64>, color: Color) {
    let Some(font) = label_font() else {
        return;
    };
    let scale = PxScale::from(LABEL_SCALE);
    let (width, height) = text_size(scale, &font, text);
    let x = center.x.round() as i32 - width as i32 / 2;
    let y = center.y.round() as i32 - height as i32 / 2;
    draw_text_mut(image, color.to_rgb(), x, y, scale, &font, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Shape;
    use geo_types::coord;

    #[test]
    fn names_take_precedence_over_indices() {
        let unnamed = Region::new(Shape::rectangle(0.0, 0.0, 1.0, 1.0));
        assert_eq!(region_label(3, &unnamed), "3");
        assert_eq!(region_label(3, &unnamed.with_name("nucleus")), "nucleus");
    }

    #[test]
    fn longer_labels_are_wider() {
        let (short, height) = label_size("7");
        let (long, _) = label_size("nucleus");
        assert!(short > 0 && height > 0);
        assert!(long > short);
    }

    #[test]
    fn label_is_drawn_around_center_and_clipped() {
        let mut image = RgbImage::new(40, 40);
        draw_label(&mut image, "8", coord! { x: 20.0, y: 20.0 }, Color::WHITE);
        let lit: Vec<(u32, u32)> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != [0, 0, 0])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(x, y)| (10..30).contains(&x) && (10..30).contains(&y)));

        let mut corner = RgbImage::new(4, 4);
        draw_label(&mut corner, "88", coord! { x: 0.0, y: 0.0 }, Color::WHITE);
        assert!(corner.pixels().any(|p| p.0 != [0, 0, 0]));
    }
}
