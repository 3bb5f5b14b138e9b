pub mod builder;

use tracing::{debug, info};

use crate::collection::RoiCollection;
use crate::command::RoiCommand;
use crate::error::Result;
use crate::traits::CollectionProcessor;

/// An ordered list of collection operations
pub struct Pipeline {
    steps: Vec<Box<dyn CollectionProcessor>>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(steps: Vec<Box<dyn CollectionProcessor>>) -> Self {
        Self { steps }
    }

    /// Pipeline running the commands in order
    pub fn from_commands(commands: impl IntoIterator<Item = RoiCommand>) -> Self {
        Self::new(
            commands
                .into_iter()
                .map(|command| Box::new(command) as Box<dyn CollectionProcessor>)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Runs every step on a copy of `collection`; the input is untouched even
    /// when a step fails
    pub fn process(&self, collection: &RoiCollection) -> Result<RoiCollection> {
        let mut output = collection.clone();
        self.process_in_place(&mut output)?;
        Ok(output)
    }

    /// Runs every step on `collection`. A failing step stops the pipeline
    /// with the earlier steps already applied.
    pub fn process_in_place(&self, collection: &mut RoiCollection) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            debug!(step = index, name = step.name(), regions = collection.len(), "Running pipeline step");
            step.process(collection)?;
        }
        info!(steps = self.steps.len(), regions = collection.len(), "Pipeline finished");
        Ok(())
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        if self.steps.is_empty() {
            return "Pipeline: no steps".to_string();
        }
        format!("Pipeline: {} steps ({})", self.steps.len(), self.step_names().join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{InvalidOutlineBehavior, OutlineMode};
    use crate::error::RoiError;
    use crate::region::{Region, RegionKind, Shape};

    fn squares() -> RoiCollection {
        vec![
            Region::new(Shape::rectangle(0.0, 0.0, 10.0, 10.0)).at(3, 0, 0),
            Region::new(Shape::rectangle(5.0, 5.0, 10.0, 10.0)).at(4, 0, 0),
        ]
        .into()
    }

    #[test]
    fn commands_run_in_order() {
        let pipeline = Pipeline::from_commands([
            RoiCommand::Crop { xy: false, z: true, c: false, t: false },
            RoiCommand::Outline {
                mode: OutlineMode::BoundingRectangle,
                on_error: InvalidOutlineBehavior::Error,
            },
        ]);
        assert_eq!(pipeline.info(), "Pipeline: 2 steps (crop -> outline)");

        let input = squares();
        let output = pipeline.process(&input).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.contains_only_kind(RegionKind::Polygon));
        assert!(output.get(0).unwrap().position.z.is_any());
        assert_eq!(output.get(1).unwrap().position.z.raw(), 1);
        // the input is untouched
        assert_eq!(input.get(0).unwrap().position.z.raw(), 3);
    }

    struct Reject;

    impl CollectionProcessor for Reject {
        fn process(&self, _collection: &mut RoiCollection) -> Result<()> {
            Err(RoiError::GeometricComputation("rejected".to_string()))
        }

        fn name(&self) -> &str {
            "reject"
        }
    }

    #[test]
    fn failing_step_stops_the_pipeline() {
        let pipeline = Pipeline::new(vec![Box::new(RoiCommand::Flatten), Box::new(Reject), Box::new(RoiCommand::LogicalOr)]);
        let mut collection = squares();
        assert!(pipeline.process_in_place(&mut collection).is_err());
        assert_eq!(collection.len(), 2);
        assert!(collection.get(0).unwrap().position.is_any());
    }
}
