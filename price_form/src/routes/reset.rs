use super::{page_response, session_view};
use crate::server::SharedState;
use axum::{extract::State, http::StatusCode, response::Response};
use tracing::instrument;

#[instrument(skip(state))]
pub async fn reset(State(state): State<SharedState>) -> Response {
    state.session.lock().reset();
    page_response(StatusCode::OK, &session_view(&state))
}
