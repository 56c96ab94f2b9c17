//! Version 1 of the HTTP API.

mod events;

use axum::Router;

use crate::state::AppState;

/// The event collection lives under `/events`; role, classification and
/// sub-resource scoped listings sit beside it at the version root.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/events", events::routes())
        .merge(events::scoped_routes())
}
