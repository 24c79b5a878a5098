//! Errors for the operations that cross the engine boundary (documents and
//! configuration). Geometry operations never fail; they return `None` or
//! leave their input unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config field '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported document version {0}")]
    Version(u32),

    #[error("too many {what}: limit is {limit}")]
    TooMany { what: &'static str, limit: usize },

    #[error("figure '{figure}' has a non-finite or out-of-range coordinate")]
    NonFinite { figure: String },

    #[error("duplicate {what} id '{id}'")]
    DuplicateId { what: &'static str, id: String },

    #[error("edge '{edge}' in figure '{figure}' references a missing node")]
    DanglingEdge { figure: String, edge: String },

    #[error("seam figure '{figure}' references missing parent '{parent}'")]
    OrphanSeam { figure: String, parent: String },

    #[error("figure '{figure}': {reason}")]
    InvalidFigure { figure: String, reason: String },
}

impl DocumentError {
    /// Stable machine-readable code for the bindings layer.
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::Json(_) | DocumentError::Version(_) => "invalid_document",
            DocumentError::TooMany { .. } => "out_of_range",
            DocumentError::NonFinite { .. } => "non_finite",
            DocumentError::DuplicateId { .. }
            | DocumentError::DanglingEdge { .. }
            | DocumentError::OrphanSeam { .. } => "invalid_id",
            DocumentError::InvalidFigure { .. } => "invalid_figure",
        }
    }
}
