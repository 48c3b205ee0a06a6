use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Store service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum StoreServiceError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("invalid session")]
    InvalidSession,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("conflict")]
    Conflict,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl StoreServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvalidSession => "INVALID_SESSION",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::Conflict => "CONFLICT",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for StoreServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotAuthenticated | Self::InvalidSession => StatusCode::UNAUTHORIZED,
            Self::InvalidQuantity => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
