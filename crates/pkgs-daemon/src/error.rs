// SPDX-License-Identifier: MIT OR Apache-2.0
//! Projects `pkgs_error::Error` onto HTTP status codes (error-kind table).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pkgs_error::Error;
use serde_json::json;
use tracing::{error, warn};

/// Newtype so this crate can implement the foreign `IntoResponse` trait
/// for the foreign `pkgs_error::Error` type.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Forbidden(_) => StatusCode::FORBIDDEN,
        Error::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
        Error::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
        Error::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        Error::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Upstream(_) => StatusCode::BAD_GATEWAY,
        Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        match &self.0 {
            Error::Upstream(source) => error!(kind = self.0.kind(), error = %source, "blob layer call failed"),
            Error::Internal(msg) => error!(kind = self.0.kind(), message = %msg, "internal error"),
            other => warn!(kind = other.kind(), status = status.as_u16(), "request rejected"),
        }
        let body = Json(json!({ "error": self.0.to_string(), "kind": self.0.kind() }));
        (status, body).into_response()
    }
}
