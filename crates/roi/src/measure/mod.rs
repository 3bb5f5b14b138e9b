//! Per-region, per-slice statistics.
//!
//! A reference canvas is walked slice by slice; every region visible on a
//! slice contributes one row to the resulting [`ResultsTable`].

pub mod stats;
pub mod table;

use bitflags::bitflags;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::canvas::{Calibration, Hyperstack};
use crate::collection::RoiCollection;
use crate::error::Result;
use crate::region::Region;
use crate::render::labels::region_label;
use crate::traits::Intensity;
use crate::types::AxisIgnore;

pub use stats::RegionStatistics;
pub use table::{Cell, Column, ResultsTable};

bitflags! {
    /// Statistics selected for a measurement run
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Measurement: u32 {
        const AREA = 1;
        const MEAN = 1 << 1;
        const STD_DEV = 1 << 2;
        const MIN_MAX = 1 << 3;
        const MEDIAN = 1 << 4;
        const CENTROID = 1 << 5;
        const CENTER_OF_MASS = 1 << 6;
        const PERIMETER = 1 << 7;
        const BOUNDING_BOX = 1 << 8;
        const FIT_ELLIPSE = 1 << 9;
        const SHAPE_DESCRIPTORS = 1 << 10;
        const FERET = 1 << 11;
        const INTEGRATED_DENSITY = 1 << 12;
        const SKEWNESS = 1 << 13;
        const KURTOSIS = 1 << 14;
        const STACK_POSITION = 1 << 15;
    }
}

impl Default for Measurement {
    fn default() -> Self {
        Self::AREA | Self::MEAN | Self::MIN_MAX
    }
}

// Serialized as flag names joined by " | "
impl JsonSchema for Measurement {
    fn schema_name() -> String {
        "Measurement".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

type Extractor = fn(&RegionStatistics) -> f64;

/// Output columns in table order, with the flag that enables each
const COLUMNS: &[(&str, Measurement, Extractor)] = &[
    ("Area", Measurement::AREA, |s| s.area),
    ("Mean", Measurement::MEAN, |s| s.mean),
    ("StdDev", Measurement::STD_DEV, |s| s.std_dev),
    ("Min", Measurement::MIN_MAX, |s| s.min),
    ("Max", Measurement::MIN_MAX, |s| s.max),
    ("X", Measurement::CENTROID, |s| s.x),
    ("Y", Measurement::CENTROID, |s| s.y),
    ("XM", Measurement::CENTER_OF_MASS, |s| s.xm),
    ("YM", Measurement::CENTER_OF_MASS, |s| s.ym),
    ("Perim.", Measurement::PERIMETER, |s| s.perimeter),
    ("BX", Measurement::BOUNDING_BOX, |s| s.bx),
    ("BY", Measurement::BOUNDING_BOX, |s| s.by),
    ("Width", Measurement::BOUNDING_BOX, |s| s.width),
    ("Height", Measurement::BOUNDING_BOX, |s| s.height),
    ("Major", Measurement::FIT_ELLIPSE, |s| s.major),
    ("Minor", Measurement::FIT_ELLIPSE, |s| s.minor),
    ("Angle", Measurement::FIT_ELLIPSE, |s| s.angle),
    ("Circ.", Measurement::SHAPE_DESCRIPTORS, |s| s.circularity),
    ("Feret", Measurement::FERET, |s| s.feret),
    ("IntDen", Measurement::INTEGRATED_DENSITY, |s| s.integrated_density),
    ("Median", Measurement::MEDIAN, |s| s.median),
    ("Skew", Measurement::SKEWNESS, |s| s.skewness),
    ("Kurt", Measurement::KURTOSIS, |s| s.kurtosis),
    ("RawIntDen", Measurement::INTEGRATED_DENSITY, |s| s.raw_integrated_density),
    ("Ch", Measurement::STACK_POSITION, |s| s.channel),
    ("Slice", Measurement::STACK_POSITION, |s| s.slice),
    ("Frame", Measurement::STACK_POSITION, |s| s.frame),
    ("FeretAngle", Measurement::FERET, |s| s.feret_angle),
    ("MinFeret", Measurement::FERET, |s| s.min_feret),
    ("AR", Measurement::SHAPE_DESCRIPTORS, |s| s.aspect_ratio),
    ("Round", Measurement::SHAPE_DESCRIPTORS, |s| s.roundness),
    ("Solidity", Measurement::SHAPE_DESCRIPTORS, |s| s.solidity),
];

/// Options for a measurement run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MeasureOptions {
    pub measurements: Measurement,
    /// Leading `Name` column holding the region name, or its index when unnamed
    pub add_name: bool,
    /// When false, the canvas calibration is ignored and results are in pixels
    pub physical_units: bool,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            measurements: Measurement::default(),
            add_name: true,
            physical_units: true,
        }
    }
}

impl MeasureOptions {
    /// Column names produced by these options, in table order
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.add_name {
            names.push("Name");
        }
        names.extend(
            COLUMNS
                .iter()
                .filter(|(_, flag, _)| self.measurements.contains(*flag))
                .map(|(name, _, _)| *name),
        );
        names
    }
}

fn add_stats_row(table: &mut ResultsTable, label: String, stats: &RegionStatistics, opts: &MeasureOptions) {
    let mut row: Vec<(&str, Cell)> = Vec::with_capacity(COLUMNS.len() + 1);
    if opts.add_name {
        row.push(("Name", Cell::Text(label)));
    }
    row.extend(
        COLUMNS
            .iter()
            .filter(|(_, flag, _)| opts.measurements.contains(*flag))
            .map(|(name, _, extract)| (*name, Cell::Numeric(extract(stats)))),
    );
    table.add_row(row);
}

impl RoiCollection {
    /// Measures every region on every canvas slice it is visible in.
    ///
    /// The canvas slice pointer and calibration are restored before
    /// returning, also when a region fails to measure.
    pub fn measure<P: Intensity>(&self, canvas: &mut Hyperstack<P>, opts: &MeasureOptions) -> Result<ResultsTable> {
        let mut canvas = canvas.scoped();
        if !opts.physical_units {
            canvas.set_calibration(None);
        }

        let mut table = ResultsTable::new();
        for slice in canvas.extents().indices() {
            canvas.set_current_slice(slice)?;
            trace!(z = slice.z, c = slice.c, t = slice.t, "Measuring slice");
            for (index, region) in self.visible_in(slice, AxisIgnore::NONE) {
                let mut stats = RegionStatistics::compute(region, canvas.current_plane(), canvas.calibration())?;
                stats.channel = (slice.c + 1) as f64;
                stats.slice = (slice.z + 1) as f64;
                stats.frame = (slice.t + 1) as f64;
                add_stats_row(&mut table, region_label(index, region), &stats, opts);
            }
        }
        debug!(
            regions = self.len(),
            rows = table.row_count(),
            unit = %canvas.calibration().unit,
            "Measured collection"
        );
        Ok(table)
    }

    /// Measures each region once against a blank canvas covering the
    /// collection
    pub fn measure_blank(&self, opts: &MeasureOptions) -> Result<ResultsTable> {
        let canvas = self.synthetic_canvas()?;
        let mut table = ResultsTable::new();
        for (index, region) in self.iter().enumerate() {
            let mut stats = RegionStatistics::compute(region, canvas.current_plane(), &Calibration::default())?;
            stats.channel = 1.0;
            stats.slice = 1.0;
            stats.frame = 1.0;
            add_stats_row(&mut table, region_label(index, region), &stats, opts);
        }
        debug!(regions = self.len(), "Measured collection without reference canvas");
        Ok(table)
    }

    /// Single-row table for one region on the current slice of `canvas`.
    /// An unnamed region gets an empty `Name` cell.
    pub fn measure_region<P: Intensity>(
        region: &Region,
        canvas: &Hyperstack<P>,
        opts: &MeasureOptions,
    ) -> Result<ResultsTable> {
        let calibration = if opts.physical_units {
            canvas.calibration().clone()
        } else {
            Calibration::default()
        };
        let mut stats = RegionStatistics::compute(region, canvas.current_plane(), &calibration)?;
        let slice = canvas.current_slice();
        stats.channel = (slice.c + 1) as f64;
        stats.slice = (slice.z + 1) as f64;
        stats.frame = (slice.t + 1) as f64;
        let mut table = ResultsTable::new();
        add_stats_row(&mut table, region.name.clone().unwrap_or_default(), &stats, opts);
        Ok(table)
    }
}
