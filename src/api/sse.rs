//! Server-Sent Events support

use crate::transcript::SessionEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert a session's event stream to SSE, starting with an `init` snapshot
pub fn sse_stream(
    init: Value,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(Event::default().event("init").data(init.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_axum(event))),
        Err(e) => {
            // Client reconnects and gets a fresh init snapshot
            tracing::debug!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn session_event_to_axum(event: SessionEvent) -> Event {
    let (event_type, data) = match event {
        SessionEvent::Appended(message) => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SessionEvent::Cleared => ("cleared", json!({ "type": "cleared" })),
        SessionEvent::TurnStarted => ("turn_started", json!({ "type": "turn_started" })),
        SessionEvent::TurnFinished => ("turn_finished", json!({ "type": "turn_finished" })),
    };

    Event::default().event(event_type).data(data.to_string())
}
