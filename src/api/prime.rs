use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::param::PathText;
use crate::compute::PrimeScan;
use crate::http::response::{bad_request, plain_error};
use crate::http::server::AppState;

/// `GET /isPrime/{number}`
///
/// The scan time-shares CPU slots with every other scan; there is no limit
/// on how long it may take.
pub async fn is_prime_handler(State(state): State<AppState>, number: PathText) -> Response {
    let n = match number.parse::<u64>() {
        Ok(n) => n,
        Err(reason) => {
            tracing::debug!(input = %number.raw, error = %reason, "Rejected primality input");
            return bad_request(format!("{:?} is not a number: {}", number.raw, reason));
        }
    };

    let start = Instant::now();
    match state.parallelism.run(PrimeScan::new(n)).await {
        Ok(prime) => {
            tracing::debug!(
                number = n,
                prime,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Primality check finished"
            );
            if prime {
                format!("{} is a prime number\n", n).into_response()
            } else {
                format!("{} is not prime number\n", n).into_response()
            }
        }
        Err(e) => {
            tracing::error!(number = n, error = %e, "Primality task failed");
            plain_error(StatusCode::INTERNAL_SERVER_ERROR, "primality check failed")
        }
    }
}
