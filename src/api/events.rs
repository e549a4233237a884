//! Server-sent event stream of widget data.

use crate::api::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

/// GET /events - Live widget event stream.
///
/// On connect every backend's refresh hook is kicked and the retained
/// snapshots are replayed, so a fresh viewer paints without waiting out a
/// publish interval. Live events follow as `{"type","data","timestamp"}`
/// frames. A viewer that falls behind the channel capacity loses the missed
/// events but keeps the stream.
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let connection_id = Uuid::new_v4();

    // Subscribe before snapshotting so nothing published in between is lost.
    let mut rx = state.hub.subscribe();
    let refreshed = state.lifecycle.refresh_all();
    let snapshots = state.hub.snapshots();

    tracing::info!(
        connection = %connection_id,
        refreshed,
        replayed = snapshots.len(),
        "SSE viewer connected"
    );

    let stream = async_stream::stream! {
        for snapshot in snapshots {
            if let Ok(frame) = serde_json::to_string(&snapshot.to_event()) {
                yield Ok(Event::default().data(frame));
            }
        }

        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(frame) => yield Ok(Event::default().data(frame)),
                    Err(e) => {
                        tracing::warn!(
                            connection = %connection_id,
                            error = %e,
                            "Failed to serialize widget event"
                        );
                    }
                },
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        connection = %connection_id,
                        missed,
                        "SSE viewer lagged, events dropped"
                    );
                }
                Err(RecvError::Closed) => {
                    tracing::info!(
                        connection = %connection_id,
                        "Event channel closed, ending stream"
                    );
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
