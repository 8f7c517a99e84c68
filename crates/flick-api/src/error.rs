use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flick_catalog::CatalogError;
use flick_types::api::ErrorBody;
use thiserror::Error;
use tracing::error;

/// Caller-visible failure kinds. Storage and upstream causes are logged and
/// replaced by a generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Catalog(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Validation(_) | Self::Unauthenticated | Self::NotFound(_) => self.to_string(),
            Self::Storage(e) => {
                error!("Storage failure: {:#}", e);
                "failed to access storage".to_string()
            }
            Self::Catalog(e) => {
                error!("Catalog failure: {}", e);
                "failed to fetch catalog data".to_string()
            }
            Self::Internal(e) => {
                error!("Internal failure: {}", e);
                "internal server error".to_string()
            }
        };

        (self.status(), Json(ErrorBody { error: message })).into_response()
    }
}
