pub mod max_procs;
pub mod param;
pub mod prime;

use axum::{
    routing::{get, post},
    Router,
};
use crate::http::server::AppState;
use self::max_procs::{get_max_procs, set_max_procs};
use self::prime::is_prime_handler;

/// Route table. Path parameters are passed through as raw text; each handler
/// validates its own input.
pub fn setup_api_router(state: AppState) -> Router {
    Router::new()
        .route("/isPrime/{number}", get(is_prime_handler))
        .route("/maxProcs", get(get_max_procs))
        .route("/maxProcs/{number}", post(set_max_procs))
        .with_state(state)
}
