//! Run-aborting errors.
//!
//! Anything that is a problem with one target becomes an `Event` instead;
//! the variants here stop the whole run.

use crate::progress::ProgressError;
use crate::schema::DownloadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatalError {
    /// A required remote resource could not be fetched at all.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A schema was fetched but is not usable.
    #[error("{message}")]
    Schema { message: String },

    /// The progress coordinator was misused.
    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error("{0}")]
    Config(String),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl FatalError {
    pub fn schema(message: impl Into<String>) -> Self {
        FatalError::Schema {
            message: message.into(),
        }
    }
}
