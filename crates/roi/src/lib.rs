//! # Region-of-Interest Collection Library
//!
//! An ordered collection of 2D regions (rectangles, ovals, polygons, lines,
//! points and composite shapes), each optionally pinned to a (Z, C, T)
//! position of an image hyperstack.
//!
//! ## Core Features
//!
//! - **Set algebra**: union, intersection and symmetric difference of regions
//! - **Outline modes**: convex hull, minimum bounding rectangle, circle,
//!   ellipse and spline fits, line/area conversion
//! - **Slice-aware rendering**: binary masks and RGB composites, with
//!   wildcard positions drawn on every slice
//! - **Measurement**: per-region, per-slice statistics into a results table
//! - **GeoJSON archives**: typed region features with position and style
//! - **Pipelines**: serializable commands applied in order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roi::{Margin, MaskOptions, Region, RoiCollection, Shape};
//!
//! let mut collection = RoiCollection::new();
//! collection.add(Region::new(Shape::rectangle(10.0, 10.0, 10.0, 10.0)).at(1, 0, 0));
//! collection.add(Region::new(Shape::rectangle(15.0, 15.0, 10.0, 10.0)).at(2, 0, 0));
//!
//! // Each region lands on its own Z plane
//! let mask = collection.to_mask(&Margin::default(), &MaskOptions::default())?;
//! assert_eq!(mask.extents().z, 2);
//!
//! collection.logical_and();
//! collection.save("out", "intersection")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Pipelines
//!
//! ```rust,no_run
//! use roi::{InvalidOutlineBehavior, OutlineMode, Pipeline, RoiCollection};
//!
//! let pipeline = Pipeline::builder()
//!     .flatten()
//!     .with_union()
//!     .with_outline(OutlineMode::ConvexHull, InvalidOutlineBehavior::Error)
//!     .build();
//!
//! let collection = RoiCollection::load("cells.geojson")?;
//! let hull = pipeline.process(&collection)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod region;
pub mod traits;
pub mod collection;
pub mod canvas;
pub mod algorithms;
pub mod render;
pub mod measure;
pub mod io;
pub mod typed_geojson;
pub mod command;
pub mod pipeline;

pub use error::{Result, RoiError};
pub use types::{AxisIgnore, AxisPosition, Color, SliceIndex, SlicePosition, Style};
pub use region::{Path, Region, RegionKind, Shape};
pub use traits::*;
pub use collection::RoiCollection;
pub use canvas::{Calibration, CanvasKey, CanvasStateGuard, Hyperstack, SliceExtents};
pub use algorithms::*;
pub use render::{DrawMode, Margin, MaskOptions, RenderOptions};
pub use measure::{Cell, Column, MeasureOptions, Measurement, RegionStatistics, ResultsTable};
pub use io::export_labels;
pub use command::RoiCommand;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
