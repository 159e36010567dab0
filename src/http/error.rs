//! API error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::graph::QueryError;
use crate::gremlin::{ErrorKind, GremlinError};

/// Errors returned by API handlers, rendered as `{"status":"error","message":...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(GremlinError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(e) => upstream_status(e),
        }
    }
}

/// Map an upstream failure to the status the caller sees.
pub fn upstream_status(err: &GremlinError) -> StatusCode {
    match err.kind() {
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::ConnectionClosed | ErrorKind::Connect | ErrorKind::Transport => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<GremlinError> for ApiError {
    fn from(err: GremlinError) -> Self {
        ApiError::Upstream(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::BadRequest(m) => m.clone(),
            ApiError::Upstream(e) => {
                tracing::error!(error = %e, status = %status, "Upstream request failed");
                e.to_string()
            }
        };
        (status, Json(json!({ "status": "error", "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_upstream_status_mapping() {
        assert_eq!(
            upstream_status(&GremlinError::Timeout(Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            upstream_status(&GremlinError::closed(None)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            upstream_status(&GremlinError::Server {
                code: 597,
                message: "bad script".into()
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_query_error_is_bad_request() {
        let err: ApiError = QueryError::EmptyLabel.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
