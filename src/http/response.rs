//! Plain-text responses.
//!
//! # Responsibilities
//! - Build the 400 bodies handlers return for unparseable input
//!
//! # Design Decisions
//! - Error bodies end with a newline and carry `X-Content-Type-Options: nosniff`

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// `text/plain` error response with the given status.
pub fn plain_error(status: StatusCode, message: impl Into<String>) -> Response {
    let mut body = message.into();
    body.push('\n');

    (
        status,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        body,
    )
        .into_response()
}

/// 400 Bad Request with a plain-text message.
pub fn bad_request(message: impl Into<String>) -> Response {
    plain_error(StatusCode::BAD_REQUEST, message)
}
