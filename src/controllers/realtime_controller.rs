use std::{convert::Infallible, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;

/// Event payload: the emit time, plus the latest quote on `priceUpdated`
/// so dashboards can repaint without a second request.
fn payload(state: &AppState, name: &str) -> String {
    let mut body = json!({ "at": Utc::now().to_rfc3339() });

    if name == "priceUpdated" {
        if let Some(snap) = state.prices.cached() {
            body["usd"] = json!(snap.usd);
            body["brl"] = json!(snap.brl);
            body["change_24h"] = json!(snap.change_24h);
        }
    }

    body.to_string()
}

// GET /api/events
pub async fn sse_events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();
    tracing::debug!("[sse] client connected ({} listeners)", state.events_tx.receiver_count());

    let hello = stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("{}")) });

    let updates = stream::unfold((state, rx), |(state, mut rx)| async move {
        let evt = match rx.recv().await {
            Ok(name) => {
                let data = payload(&state, &name);
                Event::default().event(name).data(data)
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("[sse] listener lagged, {} events dropped", skipped);
                Event::default().event("resync").data(json!({ "skipped": skipped }).to_string())
            }
            // sender dropped: end the stream
            Err(RecvError::Closed) => return None,
        };

        Some((Ok::<_, Infallible>(evt), (state, rx)))
    });

    Sse::new(hello.chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    )
}
