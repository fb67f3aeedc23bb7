use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::api::param::PathText;
use crate::http::response::bad_request;
use crate::http::server::AppState;

/// `GET /maxProcs`: report the current limit and the processor count.
pub async fn get_max_procs(State(state): State<AppState>) -> String {
    format!(
        "Server is using {} CPUs and there are {} CPUs available\n",
        state.parallelism.current(),
        state.parallelism.available(),
    )
}

/// `POST /maxProcs/{number}`: swap the limit.
///
/// Values <= 1 leave the limit as it is; the response then reports the
/// unchanged value on both sides.
pub async fn set_max_procs(State(state): State<AppState>, number: PathText) -> Response {
    let requested = match number.parse::<i64>() {
        Ok(n) => n,
        Err(reason) => {
            tracing::debug!(input = %number.raw, error = %reason, "Rejected parallelism input");
            return bad_request(format!("{:?} is not a number", number.raw));
        }
    };

    let change = state.parallelism.set(requested);
    tracing::info!(
        requested,
        current = change.current,
        previous = change.previous,
        "Parallelism limit updated"
    );

    format!(
        "Server is now using {} CPUs, previously it was using {} CPUs\n",
        change.current, change.previous,
    )
    .into_response()
}
