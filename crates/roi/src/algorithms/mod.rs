pub mod calipers;
pub mod fitting;
pub mod outline;
pub mod set_ops;
pub mod simplification;
pub mod transform;

pub use calipers::{convex_hull, max_caliper, min_caliper_width, minimum_bounding_rectangle};
pub use fitting::{catmull_rom, delete_spline, fit_circle, fit_ellipse, fit_spline, resample};
pub use outline::{InvalidOutlineBehavior, OutlineMode, line_footprint, outline_region};
pub use simplification::{remove_collinear, simplify_area, thin_path};
