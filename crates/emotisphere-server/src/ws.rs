//! Subscriber `WebSocket` connections.
//!
//! Each connection is one reader and one writer sharing a mailbox
//! registered with the hub. The writer drains the mailbox onto the
//! socket; the reader discards client frames and watches for close.
//!
//! Teardown runs in either direction. If the reader sees the client go
//! away, it unregisters, the hub closes the mailbox, and the writer sends
//! a close frame and exits. If the writer fails (or the hub drops a slow
//! subscriber), its drop guard cancels the reader, which then unregisters.
//! Both halves are joined before the socket is released.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use emotisphere_core::{HubHandle, Mailbox, Subscriber};
use emotisphere_types::{Envelope, SubscriberId};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Greeting placed in every new subscriber's mailbox ahead of broadcasts.
pub const GREETING: &str = "connected";

/// Upgrade to a `WebSocket` and serve it as a subscriber.
///
/// # Route
///
/// `GET /ws`
pub async fn subscribe(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket: WebSocket| async move {
        let (sink, stream) = socket.split();
        serve_connection(state.hub.clone(), sink, stream).await;
    })
}

/// Run one subscriber over an already-split socket until either side ends.
pub async fn serve_connection<W, R, E>(hub: HubHandle, sink: W, stream: R)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (subscriber, mailbox) = Subscriber::new();
    let id = subscriber.id();
    subscriber.try_deliver(Arc::new(Envelope::info(GREETING)));

    if !hub.register(subscriber).await {
        debug!(%id, "hub is shut down, dropping connection");
        return;
    }
    info!(%id, "subscriber connected");

    let cancel = CancellationToken::new();
    tokio::join!(
        write_loop(id, sink, mailbox, cancel.clone().drop_guard()),
        read_loop(id, stream, &hub, cancel),
    );

    info!(%id, "subscriber disconnected");
}

async fn write_loop<W>(id: SubscriberId, mut sink: W, mut mailbox: Mailbox, _guard: DropGuard)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    while let Some(envelope) = mailbox.recv().await {
        let json = match serde_json::to_string(&*envelope) {
            Ok(j) => j,
            Err(e) => {
                warn!(%id, "failed to serialize envelope: {e}");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(json.into())).await {
            debug!(%id, error = %e, "write failed");
            return;
        }
    }

    // Mailbox closed by the hub.
    if let Err(e) = sink.send(Message::Close(None)).await {
        debug!(%id, error = %e, "close frame not sent");
    }
}

async fn read_loop<R, E>(id: SubscriberId, mut stream: R, hub: &HubHandle, cancel: CancellationToken)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            frame = stream.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(%id, error = %e, "read failed");
                    break;
                }
                // Client frames carry no meaning.
                Some(Ok(_)) => {}
            },
        }
    }
    hub.unregister(id).await;
}
