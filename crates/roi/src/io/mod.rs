pub mod geojson;

pub use self::geojson::export_labels;
