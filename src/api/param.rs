//! Path parameter extraction without rejection.

use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

/// The single path parameter of a route, as text.
///
/// Never rejects: a segment that does not percent-decode to UTF-8 is kept in
/// its encoded form and fails in [`PathText::parse`], so the handler writes
/// the error response.
#[derive(Debug, Clone)]
pub struct PathText {
    /// Decoded text, or the raw segment if it could not be decoded.
    pub raw: String,
    decode_error: Option<String>,
}

impl PathText {
    /// Parse the text, returning the failure reason on error.
    pub fn parse<T>(&self) -> Result<T, String>
    where
        T: FromStr,
        T::Err: Display,
    {
        if let Some(reason) = &self.decode_error {
            return Err(reason.clone());
        }
        self.raw.parse::<T>().map_err(|e| e.to_string())
    }
}

impl<S> FromRequestParts<S> for PathText
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(raw)) => Ok(Self {
                raw,
                decode_error: None,
            }),
            Err(rejection) => {
                let raw = parts
                    .uri
                    .path()
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                Ok(Self {
                    raw,
                    decode_error: Some(rejection.body_text()),
                })
            }
        }
    }
}
