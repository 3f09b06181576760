//! Error taxonomy for the per-track pipeline.
//!
//! None of these escape a batch run: the pipeline folds every error into a
//! [`crate::pipeline::TrackOutcome`] so a bad track can never abort the
//! batch.

use thiserror::Error;

use crate::download::DownloadError;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("song not found: {0}")]
    NotFound(String),

    #[error("no playable download URL")]
    NoMediaUrl,

    #[error("network failure: {0}")]
    Network(String),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("database failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl From<saavn_api::ApiError> for TrackError {
    fn from(e: saavn_api::ApiError) -> Self {
        match e {
            saavn_api::ApiError::NotFound(what) | saavn_api::ApiError::Unsuccessful(what) => {
                TrackError::NotFound(what)
            }
            other => TrackError::Network(other.to_string()),
        }
    }
}

impl From<DownloadError> for TrackError {
    fn from(e: DownloadError) -> Self {
        TrackError::Network(e.to_string())
    }
}
