use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::constants::INVALID_DAYS_MESSAGE;

/// Failure to obtain a usable CAPE/SRH grid pair from the data provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0} dataset not found in catalog")]
    DatasetNotFound(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Decode(String),

    #[error("CAPE grid shape {cape:?} does not match SRH grid shape {srh:?}")]
    ShapeMismatch {
        cape: (usize, usize),
        srh: (usize, usize),
    },

    #[error("Grid fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn upstream(error: anyhow::Error) -> Self {
        Self::Upstream(format!("{error:#}"))
    }

    pub fn decode(error: anyhow::Error) -> Self {
        Self::Decode(format!("{error:#}"))
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", INVALID_DAYS_MESSAGE)]
    InvalidDays,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidDays => StatusCode::BAD_REQUEST,
            Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({
                "error": self.to_string()
            })),
        )
            .into_response()
    }
}
