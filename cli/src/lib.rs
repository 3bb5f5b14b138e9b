use roi::{Margin, MaskOptions, MeasureOptions, RenderOptions, RoiCollection, RoiCommand};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Roi(#[from] roi::RoiError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Mask rendering settings of a job
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MaskSection {
    pub margin: Margin,
    pub options: MaskOptions,
}

/// RGB composite rendering settings of a job
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct RgbSection {
    pub margin: Margin,
    pub options: RenderOptions,
}

/// A batch job: load an archive, run commands over it, then write the
/// requested outputs into `output_dir`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RoiJob {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_job_name")]
    pub name: String,
    #[serde(default)]
    pub commands: Vec<RoiCommand>,
    #[serde(default)]
    pub mask: Option<MaskSection>,
    #[serde(default)]
    pub rgb: Option<RgbSection>,
    #[serde(default)]
    pub measure: Option<MeasureOptions>,
}

fn default_job_name() -> String {
    "regions".to_string()
}

/// Files written by [`RoiJob::run`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobOutputs {
    pub archive: PathBuf,
    pub masks: Vec<PathBuf>,
    pub rgb: Option<PathBuf>,
    pub measurements: Option<PathBuf>,
}

impl RoiJob {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load the job
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Run the job against the archive named by `input`
    pub fn run(&self) -> Result<JobOutputs, CliError> {
        let collection = RoiCollection::load(&self.input)?;
        info!("Loaded {} regions from {}", collection.len(), self.input.display());
        self.run_on(collection)
    }

    /// Run the job against an already loaded collection
    pub fn run_on(&self, mut collection: RoiCollection) -> Result<JobOutputs, CliError> {
        fs::create_dir_all(&self.output_dir)?;

        for command in &self.commands {
            info!("Applying '{}'", command);
            command.apply(&mut collection)?;
        }

        let mut outputs = JobOutputs {
            archive: collection.save(&self.output_dir, &self.name)?,
            ..JobOutputs::default()
        };

        if let Some(section) = &self.mask {
            let mask = collection.to_mask(&section.margin, &section.options)?;
            for (index, plane) in mask.planes() {
                let path = self.output_dir.join(format!(
                    "{}_mask_z{}_c{}_t{}.png",
                    self.name,
                    index.z + 1,
                    index.c + 1,
                    index.t + 1
                ));
                plane.save(&path)?;
                outputs.masks.push(path);
            }
        }

        if let Some(section) = &self.rgb {
            let image = collection.to_rgb(&section.margin, &section.options)?;
            let path = self.output_dir.join(format!("{}_rgb.png", self.name));
            image.save(&path)?;
            outputs.rgb = Some(path);
        }

        if let Some(options) = &self.measure {
            let table = collection.measure_blank(options)?;
            let path = self.output_dir.join(format!("{}_measurements.csv", self.name));
            table.write_csv(&path)?;
            outputs.measurements = Some(path);
        }

        info!("Job '{}' wrote {} files", self.name, outputs.file_count());
        Ok(outputs)
    }
}

impl JobOutputs {
    pub fn file_count(&self) -> usize {
        1 + self.masks.len() + usize::from(self.rgb.is_some()) + usize::from(self.measurements.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roi::{Region, Shape};

    const JOB: &str = r#"
input = "cells.geojson"
output_dir = "out"

[[commands]]
type = "logical_or"

[[commands]]
type = "outline"
params = { mode = "convex_hull" }

[mask]
options = { fill = true }

[measure]
measurements = "AREA | MEAN"
"#;

    #[test]
    fn parses_toml_job() {
        let job = RoiJob::from_toml(JOB).unwrap();
        assert_eq!(job.name, "regions");
        assert_eq!(job.commands.len(), 2);
        assert_eq!(job.commands[0], RoiCommand::LogicalOr);
        assert!(job.mask.is_some());
        assert!(job.rgb.is_none());
    }

    #[test]
    fn json_round_trip() {
        let job = RoiJob::from_toml(JOB).unwrap();
        let again = RoiJob::from_json(&job.to_json().unwrap()).unwrap();
        assert_eq!(job, again);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(RoiJob::from_file("job.yaml"), Err(CliError::UnsupportedFileFormat)));
    }

    #[test]
    fn runs_a_job_into_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = RoiJob::from_toml(JOB).unwrap();
        job.output_dir = dir.path().join("out");
        job.rgb = Some(RgbSection::default());

        let collection: RoiCollection = vec![
            Region::new(Shape::rectangle(0.0, 0.0, 10.0, 10.0)),
            Region::new(Shape::rectangle(5.0, 5.0, 10.0, 10.0)),
        ]
        .into();
        let outputs = job.run_on(collection).unwrap();

        assert_eq!(outputs.masks.len(), 1);
        assert_eq!(outputs.file_count(), 4);
        assert!(outputs.archive.exists());
        assert!(outputs.rgb.as_ref().is_some_and(|path| path.exists()));

        let csv = fs::read_to_string(outputs.measurements.unwrap()).unwrap();
        assert!(csv.starts_with("Name,Area,Mean"));
        assert_eq!(csv.lines().count(), 2);
    }
}
