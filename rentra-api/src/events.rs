use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures_util::{Stream, StreamExt};
use rentra_booking::BookingError;
use rentra_core::authz::{AuthContext, Permission};
use tokio_stream::wrappers::BroadcastStream;

use crate::error::ApiError;
use crate::state::AppState;

/// Live booking events for back-office dashboards.
pub async fn stream(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    ctx.require(Permission::ViewReports)
        .map_err(BookingError::from)?;

    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|event| async move {
        match event {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(Event::default().data(data)))
            }
            // Lagged receivers skip dropped events and catch up.
            Err(_) => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
