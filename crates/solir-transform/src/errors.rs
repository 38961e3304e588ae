use solir_core::{IrError, Location, SourceLocationError, VerifyError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    /// Input outside the subset this backend lowers.
    #[error("Unsupported: {message} at {location}")]
    Unsupported { message: String, location: Location },

    #[error("Module verification failed: {0}")]
    Verification(#[from] VerifyError),

    /// A broken assumption inside the lowering itself.
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    #[error("Invalid source position: {0}")]
    Source(#[from] SourceLocationError),
}

impl TransformError {
    pub fn unsupported(message: impl Into<String>, location: &Location) -> Self {
        TransformError::Unsupported {
            message: message.into(),
            location: location.clone(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, TransformError::Unsupported { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
