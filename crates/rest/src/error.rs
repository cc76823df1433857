//! Error types for the TableData HTTP API.
//!
//! Every handler returns [`RestResult`]. Errors render as a JSON body of the
//! form `{"error": "<message>"}` with the status below.
//!
//! # Error Mapping
//!
//! | Source | HTTP Status |
//! |--------|-------------|
//! | Unknown table | 404 |
//! | Malformed request parameters | 400 |
//! | `RequestError` (sort column out of range, not orderable, bad direction) | 400 |
//! | `MissingSelect`, `InvalidColumnName`, `ParameterCollision`, `ColumnNotSelected` | 400 |
//! | Other `ConfigurationError`s (broken table definition) | 500 |
//! | `DataAccessError` | 500 (generic message, cause logged) |
//! | Failed health check | 503 |

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tabledata_persistence::error::{ConfigurationError, TableError};
use tracing::error;

/// Message returned to clients when the database fails.
pub const DATA_ACCESS_MESSAGE: &str = "the database could not complete the request";

/// The primary error type for REST API operations.
#[derive(Debug)]
pub enum RestError {
    /// No table is registered under the requested name (HTTP 404).
    NotFound {
        /// The requested table name.
        table: String,
    },

    /// The request itself is malformed or asks for something invalid (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// The backend cannot serve queries right now (HTTP 503).
    ServiceUnavailable {
        /// Error message.
        message: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        RestError::BadRequest {
            message: message.into(),
        }
    }

    /// Returns the HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::NotFound { table } => write!(f, "unknown table: {}", table),
            RestError::BadRequest { message } => write!(f, "bad request: {}", message),
            RestError::ServiceUnavailable { message } => {
                write!(f, "service unavailable: {}", message)
            }
            RestError::InternalError { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            RestError::NotFound { table } => format!("unknown table: {}", table),
            RestError::BadRequest { message }
            | RestError::ServiceUnavailable { message }
            | RestError::InternalError { message } => message,
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<TableError> for RestError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Configuration(e) => e.into(),
            TableError::Request(e) => RestError::bad_request(e.to_string()),
            TableError::DataAccess(e) => {
                error!(error = %e, "data access failed");
                RestError::InternalError {
                    message: DATA_ACCESS_MESSAGE.to_string(),
                }
            }
        }
    }
}

impl From<ConfigurationError> for RestError {
    fn from(err: ConfigurationError) -> Self {
        match err {
            ConfigurationError::MissingSelect
            | ConfigurationError::InvalidColumnName { .. }
            | ConfigurationError::ParameterCollision { .. }
            | ConfigurationError::ColumnNotSelected { .. } => RestError::bad_request(err.to_string()),
            ConfigurationError::MissingFrom
            | ConfigurationError::InvalidFragment { .. }
            | ConfigurationError::UnboundPlaceholder { .. }
            | ConfigurationError::UnusedParameter { .. } => {
                error!(error = %err, "table definition is invalid");
                RestError::InternalError {
                    message: err.to_string(),
                }
            }
        }
    }
}

/// Result type for REST operations.
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tabledata_persistence::error::{DataAccessError, RequestError};

    #[test]
    fn test_not_found_status() {
        let err = RestError::NotFound {
            table: "users".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "unknown table: users");
    }

    #[test]
    fn test_request_errors_are_bad_request() {
        let err: RestError = TableError::from(RequestError::NotOrderable {
            column: "password".to_string(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_request_shaped_configuration_errors_are_bad_request() {
        for err in [
            ConfigurationError::MissingSelect,
            ConfigurationError::InvalidColumnName {
                name: "1; drop".to_string(),
            },
            ConfigurationError::ColumnNotSelected {
                column: "email".to_string(),
            },
        ] {
            assert_eq!(RestError::from(err).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_descriptor_errors_are_internal() {
        let err: RestError = ConfigurationError::UnboundPlaceholder {
            name: "since".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_data_access_message_is_generic() {
        let err: RestError = TableError::from(DataAccessError::QueryFailed {
            backend_name: "sqlite".to_string(),
            message: "no such table: secret_users".to_string(),
            source: None,
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("secret_users"));
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = RestError::bad_request("start must not be negative").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "start must not be negative" }));
    }
}
