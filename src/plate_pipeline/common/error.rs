use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("{path}:{line}: {reason} (line: {content:?})")]
    Format {
        path: String,
        line: usize,
        content: String,
        reason: String,
    },

    #[error("{path}: missing header field '{field}'")]
    MissingHeader { path: String, field: &'static str },

    #[error("{path}: header '{field}' declares {declared} but the body sums to {actual}")]
    CountMismatch {
        path: String,
        field: &'static str,
        declared: u64,
        actual: u64,
    },

    #[error("Calibration missing in {path}: {reason}")]
    CalibrationMissing { path: String, reason: String },

    #[error("Ambiguous geometry: {0}")]
    GeometricAmbiguity(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalysisError {
    pub(crate) fn format(
        path: impl Into<String>,
        line: usize,
        content: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AnalysisError::Format {
            path: path.into(),
            line,
            content: content.into(),
            reason: reason.into(),
        }
    }

    /// Per-blob failures that downgrade to a suspicious flag instead of
    /// aborting the plate.
    pub fn is_geometric(&self) -> bool {
        matches!(self, AnalysisError::GeometricAmbiguity(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
