use std::collections::BTreeMap;

use geo_types::{Coord, Rect, coord};
use image::{Luma, Pixel};
use tracing::debug;

use crate::canvas::{CanvasKey, Hyperstack, SliceExtents};
use crate::error::Result;
use crate::region::{Path, Region, RegionKind, Shape, open_ring, zero_rect};
use crate::traits::RegionGeometry;
use crate::types::{AxisIgnore, AxisPosition, SliceIndex, SlicePosition};

/// Ordered, duplicate-tolerant collection of regions.
///
/// Destructive operations (set algebra, outline, crop, flatten) build the new
/// region list and swap it in; indices or references taken before such a call
/// are stale afterwards.
#[derive(Debug, Clone, Default)]
pub struct RoiCollection {
    regions: Vec<Region>,
}

impl RoiCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub fn add_all(&mut self, regions: impl IntoIterator<Item = Region>) {
        self.regions.extend(regions);
    }

    pub fn remove(&mut self, index: usize) -> Option<Region> {
        (index < self.regions.len()).then(|| self.regions.remove(index))
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Region> {
        self.regions.get_mut(index)
    }

    /// Index of this exact region instance (identity, not equality)
    pub fn index_of(&self, region: &Region) -> Option<usize> {
        self.regions.iter().position(|r| std::ptr::eq(r, region))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Region> {
        self.regions.iter_mut()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    /// Swaps in a rebuilt region list
    pub(crate) fn replace_all(&mut self, regions: Vec<Region>) {
        debug!(before = self.regions.len(), after = regions.len(), "Replacing collection contents");
        self.regions = regions;
    }

    pub(crate) fn take_regions(&mut self) -> Vec<Region> {
        std::mem::take(&mut self.regions)
    }

    /// Appends deep copies of every region in `other`
    pub fn merge_with(&mut self, other: &RoiCollection) {
        self.regions.extend(other.regions.iter().cloned());
    }

    /// Groups regions by the flagged position axes; unflagged axes are keyed
    /// as `Any`
    pub fn group_by_position(&self, per_z: bool, per_c: bool, per_t: bool) -> BTreeMap<SlicePosition, Vec<&Region>> {
        let mut groups: BTreeMap<SlicePosition, Vec<&Region>> = BTreeMap::new();
        for region in &self.regions {
            let key = SlicePosition {
                z: if per_z { region.position.z } else { AxisPosition::Any },
                c: if per_c { region.position.c } else { AxisPosition::Any },
                t: if per_t { region.position.t } else { AxisPosition::Any },
            };
            groups.entry(key).or_default().push(region);
        }
        groups
    }

    /// Groups regions by the canvas they are associated with
    pub fn group_by_canvas(&self) -> BTreeMap<Option<CanvasKey>, Vec<&Region>> {
        let mut groups: BTreeMap<Option<CanvasKey>, Vec<&Region>> = BTreeMap::new();
        for region in &self.regions {
            groups.entry(region.canvas()).or_default().push(region);
        }
        groups
    }

    /// Union of all region bounds; a zero rect at the origin when empty
    pub fn bounds(&self) -> Rect<f64> {
        self.regions
            .iter()
            .map(|region| region.bounds())
            .reduce(|acc, b| {
                Rect::new(
                    coord! { x: acc.min().x.min(b.min().x), y: acc.min().y.min(b.min().y) },
                    coord! { x: acc.max().x.max(b.max().x), y: acc.max().y.max(b.max().y) },
                )
            })
            .unwrap_or_else(zero_rect)
    }

    /// Moves the collection so its bounds start at the origin (`xy`), and
    /// subtracts the smallest pinned index from every pinned index on the
    /// flagged axes. The smallest index itself lands on 0, which is the
    /// wildcard. Wildcard positions are never altered.
    pub fn crop(&mut self, xy: bool, z: bool, c: bool, t: bool) {
        let origin = self.bounds().min();
        let min_pinned = |enabled: bool, axis: fn(&SlicePosition) -> AxisPosition| -> Option<u32> {
            if !enabled {
                return None;
            }
            self.regions
                .iter()
                .filter_map(|r| match axis(&r.position) {
                    AxisPosition::Index(index) => Some(index),
                    AxisPosition::Any => None,
                })
                .min()
        };
        let min_z = min_pinned(z, |p| p.z);
        let min_c = min_pinned(c, |p| p.c);
        let min_t = min_pinned(t, |p| p.t);

        let shift = |position: AxisPosition, min: Option<u32>| match (position, min) {
            (AxisPosition::Index(index), Some(min)) => AxisPosition::from_raw(index - min),
            (position, _) => position,
        };

        let regions = self
            .take_regions()
            .into_iter()
            .map(|mut region| {
                if xy {
                    region.shape = region
                        .shape
                        .map_coords(|p| coord! { x: p.x - origin.x, y: p.y - origin.y });
                }
                region.position = SlicePosition {
                    z: shift(region.position.z, min_z),
                    c: shift(region.position.c, min_c),
                    t: shift(region.position.t, min_t),
                };
                region
            })
            .collect();
        debug!(xy, z, c, t, "Cropping collection");
        self.replace_all(regions);
    }

    /// Makes every region visible on all slices
    pub fn flatten(&mut self) {
        let regions = self
            .take_regions()
            .into_iter()
            .map(|mut region| {
                region.position = SlicePosition::ANY;
                region
            })
            .collect();
        self.replace_all(regions);
    }

    /// Replaces every multi-part composite by one region per part, appended
    /// at the end
    pub fn split_all(&mut self) {
        let mut kept = Vec::with_capacity(self.regions.len());
        let mut parts = Vec::new();
        for region in self.take_regions() {
            match &region.shape {
                Shape::Composite(shape) if shape.0.len() > 1 => {
                    parts.extend(shape.iter().map(|polygon| {
                        let part = if polygon.interiors().is_empty() {
                            Shape::Polygon(Path::new(open_ring(polygon.exterior()).to_vec()))
                        } else {
                            Shape::Composite(geo_types::MultiPolygon::new(vec![polygon.clone()]))
                        };
                        Region::derived_from(part, &region)
                    }));
                }
                _ => kept.push(region),
            }
        }
        debug!(parts = parts.len(), "Split composite regions");
        kept.extend(parts);
        self.replace_all(kept);
    }

    pub fn count_of_kind(&self, kind: RegionKind) -> usize {
        self.regions.iter().filter(|r| r.kind() == kind).count()
    }

    /// True when every region is of `kind` (vacuously true when empty)
    pub fn contains_only_kind(&self, kind: RegionKind) -> bool {
        self.count_of_kind(kind) == self.len()
    }

    fn common_position(&self, axis: fn(&SlicePosition) -> AxisPosition) -> AxisPosition {
        let mut positions = self.regions.iter().map(|r| axis(&r.position));
        let Some(first) = positions.next() else {
            return AxisPosition::Any;
        };
        if positions.all(|p| p == first) { first } else { AxisPosition::Any }
    }

    /// Channel shared by all regions, `Any` if they differ
    pub fn channel_position(&self) -> AxisPosition {
        self.common_position(|p| p.c)
    }

    /// Z slice shared by all regions, `Any` if they differ
    pub fn stack_position(&self) -> AxisPosition {
        self.common_position(|p| p.z)
    }

    /// Frame shared by all regions, `Any` if they differ
    pub fn frame_position(&self) -> AxisPosition {
        self.common_position(|p| p.t)
    }

    /// Highest pinned index per axis, at least 1
    pub fn slice_extents(&self) -> SliceExtents {
        self.regions.iter().fold(SliceExtents::SINGLE, |acc, r| SliceExtents {
            z: acc.z.max(r.position.z.raw() as usize),
            c: acc.c.max(r.position.c.raw() as usize),
            t: acc.t.max(r.position.t.raw() as usize),
        })
    }

    /// Zero canvas reaching the furthest region extent on X/Y and the highest
    /// pinned index on Z/C/T
    pub fn create_blank_canvas<P: Pixel>(&self) -> Result<Hyperstack<P>> {
        let (width, height) = self.regions.iter().fold((1u32, 1u32), |(w, h), r| {
            let max = r.bounds().max();
            (w.max(max.x.ceil().max(0.0) as u32), h.max(max.y.ceil().max(0.0) as u32))
        });
        Hyperstack::new(width, height, self.slice_extents())
    }

    /// Single-plane blank canvas used for measurement without a reference
    /// image
    pub fn synthetic_canvas(&self) -> Result<Hyperstack<Luma<u8>>> {
        let bounds = self.bounds();
        let width = bounds.min().x.max(0.0) + bounds.width();
        let height = bounds.min().y.max(0.0) + bounds.height();
        Hyperstack::new(
            (width.ceil() as u32).max(1),
            (height.ceil() as u32).max(1),
            SliceExtents::SINGLE,
        )
    }

    pub fn region_centroid(region: &Region) -> Coord<f64> {
        region.centroid()
    }

    /// Visibility of a region at a zero-based slice index
    pub fn is_visible_in(region: &Region, slice: SliceIndex, ignore: AxisIgnore) -> bool {
        region.position.is_visible_in(slice, ignore)
    }

    /// Regions visible at the given slice, with their collection index
    pub fn visible_in(&self, slice: SliceIndex, ignore: AxisIgnore) -> impl Iterator<Item = (usize, &Region)> {
        self.regions
            .iter()
            .enumerate()
            .filter(move |(_, region)| Self::is_visible_in(region, slice, ignore))
    }
}

impl From<Vec<Region>> for RoiCollection {
    fn from(regions: Vec<Region>) -> Self {
        Self { regions }
    }
}

impl FromIterator<Region> for RoiCollection {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        Self {
            regions: iter.into_iter().collect(),
        }
    }
}

impl Extend<Region> for RoiCollection {
    fn extend<I: IntoIterator<Item = Region>>(&mut self, iter: I) {
        self.regions.extend(iter);
    }
}

impl IntoIterator for RoiCollection {
    type Item = Region;
    type IntoIter = std::vec::IntoIter<Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}

impl<'a> IntoIterator for &'a RoiCollection {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Region {
        Region::new(Shape::rectangle(x, y, w, h))
    }

    #[test]
    fn empty_bounds_is_zero_box() {
        let collection = RoiCollection::new();
        assert_eq!(collection.bounds(), zero_rect());
        assert!(collection.contains_only_kind(RegionKind::Point));
    }

    #[test]
    fn crop_aligns_to_origin_and_subtracts_minimum_index() {
        let mut collection = RoiCollection::from(vec![
            rect(10.0, 20.0, 5.0, 5.0).at(3, 0, 2),
            rect(12.0, 22.0, 5.0, 5.0).at(5, 4, 0),
        ]);
        collection.crop(true, true, true, false);

        assert_eq!(collection.bounds().min(), coord! { x: 0.0, y: 0.0 });
        let first = &collection.regions()[0];
        let second = &collection.regions()[1];
        // the lowest z lands on the wildcard, c=0 stays a wildcard
        assert_eq!(first.position, SlicePosition::new(0, 0, 2));
        assert_eq!(second.position, SlicePosition::new(2, 0, 0));
    }

    #[test]
    fn crop_shifts_only_flagged_axes() {
        let mut collection = RoiCollection::from(vec![
            rect(4.0, 4.0, 2.0, 2.0).at(3, 2, 0),
            rect(8.0, 8.0, 2.0, 2.0).at(5, 6, 0),
        ]);
        collection.crop(false, true, false, false);

        assert_eq!(collection.bounds().min(), coord! { x: 4.0, y: 4.0 });
        assert_eq!(collection.regions()[0].position.z, AxisPosition::Any);
        assert_eq!(collection.regions()[1].position.z, AxisPosition::Index(2));
        assert_eq!(collection.regions()[0].position.c, AxisPosition::Index(2));
        assert_eq!(collection.regions()[1].position.c, AxisPosition::Index(6));
    }

    #[test]
    fn flatten_resets_positions() {
        let mut collection = RoiCollection::from(vec![rect(0.0, 0.0, 1.0, 1.0).at(1, 2, 3)]);
        collection.flatten();
        assert!(collection.regions()[0].position.is_any());
    }

    #[test]
    fn grouping_merges_unflagged_axes() {
        let collection = RoiCollection::from(vec![
            rect(0.0, 0.0, 1.0, 1.0).at(1, 1, 0),
            rect(0.0, 0.0, 1.0, 1.0).at(1, 2, 0),
            rect(0.0, 0.0, 1.0, 1.0).at(2, 1, 0),
        ]);
        assert_eq!(collection.group_by_position(true, true, true).len(), 3);
        let by_z = collection.group_by_position(true, false, false);
        assert_eq!(by_z.len(), 2);
        assert_eq!(by_z[&SlicePosition::new(1, 0, 0)].len(), 2);
    }

    #[test]
    fn common_axis_position() {
        let collection = RoiCollection::from(vec![
            rect(0.0, 0.0, 1.0, 1.0).at(2, 1, 0),
            rect(0.0, 0.0, 1.0, 1.0).at(3, 1, 0),
        ]);
        assert_eq!(collection.channel_position(), AxisPosition::Index(1));
        assert_eq!(collection.stack_position(), AxisPosition::Any);
        assert_eq!(collection.frame_position(), AxisPosition::Any);
        assert_eq!(RoiCollection::new().channel_position(), AxisPosition::Any);
    }

    #[test]
    fn blank_canvases_cover_regions() {
        let collection = RoiCollection::from(vec![
            rect(2.0, 3.0, 10.0, 5.0).at(2, 0, 3),
            rect(-4.0, 0.0, 2.0, 2.0),
        ]);
        let blank = collection.create_blank_canvas::<Luma<u8>>().unwrap();
        assert_eq!((blank.width(), blank.height()), (12, 8));
        assert_eq!(blank.extents(), SliceExtents::new(2, 1, 3));

        let synthetic = collection.synthetic_canvas().unwrap();
        assert_eq!((synthetic.width(), synthetic.height()), (16, 8));
    }

    #[test]
    fn merge_copies_without_canvas_keys() {
        let mut source = rect(0.0, 0.0, 1.0, 1.0);
        source.attach_canvas(CanvasKey(1));
        let other = RoiCollection::from(vec![source]);
        let mut collection = RoiCollection::new();
        collection.merge_with(&other);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.regions()[0].canvas(), None);
        assert_eq!(other.group_by_canvas().keys().collect::<Vec<_>>(), vec![&Some(CanvasKey(1))]);
    }
}
