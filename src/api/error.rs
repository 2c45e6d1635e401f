use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use super::types::RelayerResponse;

/// Failures surfaced by the HTTP layer. The display text is the message the
/// client sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayerError {
    #[error("Relayer service is not configured")]
    NotConfigured,
    #[error("Invalid secret hash")]
    InvalidSecretHash,
    #[error("Invalid secret hash format")]
    InvalidSecretHashFormat,
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Invalid recipient address")]
    InvalidRecipient,
    #[error("Invalid recipient address format")]
    InvalidRecipientFormat,
    #[error("Invalid address")]
    InvalidAddress,
    /// Body unreadable, or submission failed with an already mapped message
    #[error("{0}")]
    Withdrawal(String),
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Export failed")]
    Export,
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl RelayerError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayerError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            RelayerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RelayerError::Export => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(RelayerResponse::failure(self.to_string()))).into_response()
    }
}

pub type RelayerResult<T> = Result<T, RelayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayerError::NotConfigured.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(RelayerError::InvalidAmount.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayerError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(RelayerError::Export.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(RelayerError::Export.to_string(), "Export failed");
    }
}
