use solir_transform::TransformError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The forwarded IR option vector was rejected. Lowering never ran.
    #[error("Configuration error: {0}")]
    Config(#[from] clap::Error),

    #[error(transparent)]
    Lowering(#[from] TransformError),

    /// A pass run by the pass manager failed, with the pass name as context.
    #[error("{0:#}")]
    Pass(anyhow::Error),

    #[error("Failed to print module: {0:#}")]
    Print(anyhow::Error),
}

impl Error {
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// The lowering error behind this failure, if any, including one raised inside a pass.
    pub fn transform_error(&self) -> Option<&TransformError> {
        match self {
            Error::Lowering(err) => Some(err),
            Error::Pass(err) => err.downcast_ref::<TransformError>(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
