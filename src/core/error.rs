use thiserror::Error;

/// Reasons a single detection is rejected before it reaches the table engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("detection has no class label")]
    MissingLabel,

    #[error("detection is missing coordinate `{0}`")]
    MissingCoordinate(&'static str),

    #[error("coordinate `{name}` is not finite ({value})")]
    NonFiniteCoordinate { name: &'static str, value: f32 },

    #[error("confidence is not finite ({0})")]
    NonFiniteConfidence(f32),

    #[error("box is inverted: ({x0}, {y0}) .. ({x1}, {y1})")]
    InvertedBox { x0: f32, y0: f32, x1: f32, y1: f32 },
}
