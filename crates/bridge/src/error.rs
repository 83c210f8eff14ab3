//! Bridge error types.

use thiserror::Error;

use crate::actions::ActionResponse;

/// Errors raised by backend clients (transport, status, decoding).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for backend client calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Request-level errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("locale is missing from request")]
    MissingLocale,

    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl BridgeError {
    /// Wrap a backend failure with the name of the operation that issued it.
    pub fn backend(operation: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| BridgeError::Backend { operation, source }
    }

    /// Status code reported to the storefront for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::MissingLocale => 400,
            BridgeError::BadRequest(_) => 400,
            BridgeError::NotFound => 404,
            BridgeError::Backend { .. } => 500,
        }
    }

    /// Convert the error into an action response.
    ///
    /// Backend details are logged, not returned.
    pub fn into_response(self) -> ActionResponse {
        let status_code = self.status_code();

        let message = match &self {
            BridgeError::Backend { operation, source } => {
                tracing::error!(operation = %operation, error = %source, "backend query failed");
                format!("{operation} failed")
            }
            _ => self.to_string(),
        };

        ActionResponse::json(status_code, &serde_json::json!({ "error": message }))
    }
}

/// Result type alias using BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;
