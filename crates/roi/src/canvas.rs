use std::fmt;
use std::ops::{Deref, DerefMut};

use image::{ImageBuffer, Pixel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, RoiError};
use crate::types::SliceIndex;

/// Opaque lookup key identifying the canvas a region was drawn on.
///
/// Keys are assigned by the caller; the engine only compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanvasKey(pub u64);

/// Number of slices along each of the Z/C/T axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SliceExtents {
    pub z: usize,
    pub c: usize,
    pub t: usize,
}

impl SliceExtents {
    pub const SINGLE: SliceExtents = SliceExtents { z: 1, c: 1, t: 1 };

    pub fn new(z: usize, c: usize, t: usize) -> Self {
        Self { z, c, t }
    }

    pub fn plane_count(&self) -> usize {
        self.z * self.c * self.t
    }

    pub fn contains(&self, index: SliceIndex) -> bool {
        index.z < self.z && index.c < self.c && index.t < self.t
    }

    /// Every slice index, Z outermost and T innermost
    pub fn indices(self) -> impl Iterator<Item = SliceIndex> {
        (0..self.z).flat_map(move |z| {
            (0..self.c).flat_map(move |c| (0..self.t).map(move |t| SliceIndex::new(z, c, t)))
        })
    }
}

impl Default for SliceExtents {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// Pixel-to-physical scale of a canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Calibration {
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub unit: String,
}

impl Calibration {
    pub fn is_scaled(&self) -> bool {
        self.pixel_width != 1.0 || self.pixel_height != 1.0
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixel_width: 1.0,
            pixel_height: 1.0,
            unit: "pixel".to_string(),
        }
    }
}

/// A stack of equally sized image planes addressed by (Z, C, T).
///
/// Planes are stored channel-fastest: `c + z * C + t * C * Z`.
#[derive(Clone)]
pub struct Hyperstack<P: Pixel> {
    width: u32,
    height: u32,
    extents: SliceExtents,
    planes: Vec<ImageBuffer<P, Vec<P::Subpixel>>>,
    calibration: Calibration,
    current: SliceIndex,
    key: Option<CanvasKey>,
}

impl<P: Pixel> Hyperstack<P> {
    /// Creates a zero-filled canvas
    pub fn new(width: u32, height: u32, extents: SliceExtents) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RoiError::InvalidCanvas(format!("size {width}x{height} is empty")));
        }
        if extents.plane_count() == 0 {
            return Err(RoiError::InvalidCanvas(format!(
                "slice extents z={}, c={}, t={} contain no plane",
                extents.z, extents.c, extents.t
            )));
        }
        let planes = (0..extents.plane_count())
            .map(|_| ImageBuffer::new(width, height))
            .collect();
        Ok(Self {
            width,
            height,
            extents,
            planes,
            calibration: Calibration::default(),
            current: SliceIndex::default(),
            key: None,
        })
    }

    /// Wraps a single 2D image
    pub fn from_plane(plane: ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: plane.width(),
            height: plane.height(),
            extents: SliceExtents::SINGLE,
            planes: vec![plane],
            calibration: Calibration::default(),
            current: SliceIndex::default(),
            key: None,
        }
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_key(mut self, key: CanvasKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn extents(&self) -> SliceExtents {
        self.extents
    }

    pub fn key(&self) -> Option<CanvasKey> {
        self.key
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Replaces the calibration; `None` resets to raw pixel units
    pub fn set_calibration(&mut self, calibration: Option<Calibration>) {
        self.calibration = calibration.unwrap_or_default();
    }

    pub fn current_slice(&self) -> SliceIndex {
        self.current
    }

    pub fn set_current_slice(&mut self, index: SliceIndex) -> Result<()> {
        self.plane_index(index)?;
        trace!(z = index.z, c = index.c, t = index.t, "Current slice changed");
        self.current = index;
        Ok(())
    }

    fn plane_index(&self, index: SliceIndex) -> Result<usize> {
        if !self.extents.contains(index) {
            return Err(RoiError::SliceOutOfRange {
                z: index.z,
                c: index.c,
                t: index.t,
            });
        }
        let SliceExtents { z: nz, c: nc, .. } = self.extents;
        Ok(index.c + index.z * nc + index.t * nc * nz)
    }

    pub fn plane(&self, index: SliceIndex) -> Result<&ImageBuffer<P, Vec<P::Subpixel>>> {
        let i = self.plane_index(index)?;
        Ok(&self.planes[i])
    }

    pub fn plane_mut(&mut self, index: SliceIndex) -> Result<&mut ImageBuffer<P, Vec<P::Subpixel>>> {
        let i = self.plane_index(index)?;
        Ok(&mut self.planes[i])
    }

    /// The plane selected by the current slice pointer
    pub fn current_plane(&self) -> &ImageBuffer<P, Vec<P::Subpixel>> {
        // The current pointer is only ever set through `set_current_slice`
        let SliceExtents { z: nz, c: nc, .. } = self.extents;
        let i = self.current.c + self.current.z * nc + self.current.t * nc * nz;
        &self.planes[i]
    }

    pub fn get_pixel(&self, index: SliceIndex, x: u32, y: u32) -> Result<P> {
        let plane = self.plane(index)?;
        plane
            .get_pixel_checked(x, y)
            .copied()
            .ok_or_else(|| RoiError::InvalidCanvas(format!("pixel ({x}, {y}) outside {}x{}", self.width, self.height)))
    }

    pub fn put_pixel(&mut self, index: SliceIndex, x: u32, y: u32, value: P) -> Result<()> {
        let (width, height) = (self.width, self.height);
        let plane = self.plane_mut(index)?;
        match plane.get_pixel_mut_checked(x, y) {
            Some(pixel) => {
                *pixel = value;
                Ok(())
            }
            None => Err(RoiError::InvalidCanvas(format!("pixel ({x}, {y}) outside {width}x{height}"))),
        }
    }

    /// Planes with their slice index, Z outermost and T innermost
    pub fn planes(&self) -> impl Iterator<Item = (SliceIndex, &ImageBuffer<P, Vec<P::Subpixel>>)> {
        self.extents
            .indices()
            .filter_map(move |index| self.plane(index).ok().map(|plane| (index, plane)))
    }

    pub fn into_planes(self) -> Vec<ImageBuffer<P, Vec<P::Subpixel>>> {
        self.planes
    }

    /// Borrows the canvas so that the slice pointer and calibration are
    /// restored when the guard goes out of scope
    pub fn scoped(&mut self) -> CanvasStateGuard<'_, P> {
        CanvasStateGuard {
            slice: self.current,
            calibration: self.calibration.clone(),
            canvas: self,
        }
    }
}

impl<P: Pixel> fmt::Debug for Hyperstack<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hyperstack")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("extents", &self.extents)
            .field("calibration", &self.calibration)
            .field("current", &self.current)
            .field("key", &self.key)
            .finish()
    }
}

/// Restores the slice pointer and calibration of a canvas on drop
pub struct CanvasStateGuard<'a, P: Pixel> {
    canvas: &'a mut Hyperstack<P>,
    slice: SliceIndex,
    calibration: Calibration,
}

impl<P: Pixel> Deref for CanvasStateGuard<'_, P> {
    type Target = Hyperstack<P>;

    fn deref(&self) -> &Self::Target {
        self.canvas
    }
}

impl<P: Pixel> DerefMut for CanvasStateGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.canvas
    }
}

impl<P: Pixel> Drop for CanvasStateGuard<'_, P> {
    fn drop(&mut self) {
        trace!("Restoring canvas slice pointer and calibration");
        self.canvas.current = self.slice;
        self.canvas.calibration = std::mem::take(&mut self.calibration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn planes_are_addressed_channel_fastest() {
        let mut canvas = Hyperstack::<Luma<u8>>::new(4, 4, SliceExtents::new(2, 3, 2)).unwrap();
        canvas.put_pixel(SliceIndex::new(1, 2, 1), 0, 0, Luma([9])).unwrap();
        assert_eq!(canvas.plane_index(SliceIndex::new(1, 2, 1)).unwrap(), 2 + 3 + 6);
        assert_eq!(canvas.get_pixel(SliceIndex::new(1, 2, 1), 0, 0).unwrap(), Luma([9]));
        assert_eq!(canvas.get_pixel(SliceIndex::new(0, 2, 1), 0, 0).unwrap(), Luma([0]));
        assert!(canvas.plane(SliceIndex::new(2, 0, 0)).is_err());
    }

    #[test]
    fn empty_canvas_is_rejected() {
        assert!(Hyperstack::<Luma<u8>>::new(0, 4, SliceExtents::SINGLE).is_err());
        assert!(Hyperstack::<Luma<u8>>::new(4, 4, SliceExtents::new(0, 1, 1)).is_err());
    }

    #[test]
    fn guard_restores_state() {
        let calibration = Calibration {
            pixel_width: 0.5,
            pixel_height: 0.5,
            unit: "um".to_string(),
        };
        let mut canvas = Hyperstack::<Luma<u8>>::new(2, 2, SliceExtents::new(3, 1, 1))
            .unwrap()
            .with_calibration(calibration.clone());
        {
            let mut guard = canvas.scoped();
            guard.set_current_slice(SliceIndex::new(2, 0, 0)).unwrap();
            guard.set_calibration(None);
            assert!(!guard.calibration().is_scaled());
        }
        assert_eq!(canvas.current_slice(), SliceIndex::default());
        assert_eq!(canvas.calibration(), &calibration);
    }

    #[test]
    fn slice_indices_iterate_z_outermost() {
        let order: Vec<_> = SliceExtents::new(2, 1, 2).indices().collect();
        assert_eq!(
            order,
            vec![
                SliceIndex::new(0, 0, 0),
                SliceIndex::new(0, 0, 1),
                SliceIndex::new(1, 0, 0),
                SliceIndex::new(1, 0, 1),
            ]
        );
    }
}
