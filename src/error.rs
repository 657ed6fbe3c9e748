// Error taxonomy for axis derivation

/// Failures that abort a derivation run.
///
/// Library functions return `anyhow::Result` and wrap these with per-dataset
/// context; callers that care about the kind can `downcast_ref::<AxisError>()`.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AxisError {
    /// An axis path does not land on an array, or X and Y disagree in length
    #[error("{0}")]
    Shape(String),

    /// A path expression could not be parsed
    #[error("Invalid path expression '{path}': {reason}")]
    Path { path: String, reason: String },

    /// Chart or dataset configuration is unusable
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AxisError {
    pub fn not_an_array(axis: &str) -> Self {
        AxisError::Shape(format!("The {} field is not part of an Array", axis))
    }

    pub fn length_mismatch(x_len: usize, y_len: usize) -> Self {
        AxisError::Shape(format!(
            "X and Y resolve to arrays of different lengths ({} vs {})",
            x_len, y_len
        ))
    }
}
