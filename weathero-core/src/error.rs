use std::{sync::Arc, time::Duration};

use thiserror::Error;

use crate::model::DataSet;

/// Errors surfaced by an [`ApiClient`](crate::api::ApiClient) while performing a request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not build request target: {0}")]
    Request(String),

    #[error("Bad response: {0}")]
    Response(String),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response")]
    Decode(#[from] serde_json::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure stored in a forecast channel.
///
/// Cloneable so that one transport failure can be published to every
/// requested channel as the same shared error.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(Arc<ApiError>),

    #[error("Response did not contain requested data set '{0}'")]
    DataNotFound(DataSet),

    /// The fetch task stopped (e.g. panicked) before producing a result.
    #[error("Forecast fetch ended without a result")]
    Interrupted,
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        FetchError::Api(Arc::new(err))
    }
}
