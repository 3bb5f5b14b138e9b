use crate::{
    algorithms::{InvalidOutlineBehavior, OutlineMode},
    command::RoiCommand,
    pipeline::Pipeline,
    traits::CollectionProcessor,
};

/// Builder for collection pipelines with a fluent API
pub struct PipelineBuilder {
    steps: Vec<Box<dyn CollectionProcessor>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a custom processing step
    pub fn add_step<P>(mut self, step: P) -> Self
    where
        P: CollectionProcessor + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn add_command(self, command: RoiCommand) -> Self {
        self.add_step(command)
    }

    pub fn with_outline(self, mode: OutlineMode, on_error: InvalidOutlineBehavior) -> Self {
        self.add_command(RoiCommand::Outline { mode, on_error })
    }

    pub fn with_union(self) -> Self {
        self.add_command(RoiCommand::LogicalOr)
    }

    pub fn with_intersection(self) -> Self {
        self.add_command(RoiCommand::LogicalAnd)
    }

    pub fn with_symmetric_difference(self) -> Self {
        self.add_command(RoiCommand::LogicalXor)
    }

    pub fn with_crop(self, xy: bool, z: bool, c: bool, t: bool) -> Self {
        self.add_command(RoiCommand::Crop { xy, z, c, t })
    }

    pub fn flatten(self) -> Self {
        self.add_command(RoiCommand::Flatten)
    }

    pub fn split_all(self) -> Self {
        self.add_command(RoiCommand::SplitAll)
    }

    pub fn build(self) -> Pipeline {
        Pipeline::new(self.steps)
    }

    /// Merge everything into one region and replace it by its convex hull
    pub fn build_union_hull() -> Pipeline {
        Self::new()
            .flatten()
            .with_union()
            .with_outline(OutlineMode::ConvexHull, InvalidOutlineBehavior::Error)
            .build()
    }

    /// Replace every region by its minimum bounding rectangle, skipping
    /// regions without one
    pub fn build_oriented_boxes() -> Pipeline {
        Self::new()
            .with_outline(OutlineMode::MinimumBoundingRectangle, InvalidOutlineBehavior::Skip)
            .build()
    }

    /// Move the collection to the origin on every axis
    pub fn build_cropped() -> Pipeline {
        Self::new().with_crop(true, true, true, true).build()
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::RoiCollection;
    use crate::region::{Region, RegionKind, Shape};
    use crate::traits::RegionGeometry;

    #[test]
    fn union_hull_preset() {
        let collection: RoiCollection = vec![
            Region::new(Shape::rectangle(0.0, 0.0, 10.0, 10.0)).at(1, 0, 0),
            Region::new(Shape::rectangle(20.0, 0.0, 10.0, 10.0)).at(2, 0, 0),
        ]
        .into();
        let pipeline = PipelineBuilder::build_union_hull();
        assert_eq!(pipeline.len(), 3);
        let output = pipeline.process(&collection).unwrap();
        assert_eq!(output.len(), 1);
        let hull = output.get(0).unwrap();
        assert_eq!(hull.kind(), RegionKind::Polygon);
        assert!((hull.area() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn builder_keeps_step_order() {
        let pipeline = PipelineBuilder::new().split_all().with_intersection().build();
        assert_eq!(pipeline.step_names(), vec!["split_all", "logical_and"]);
    }
}
