//! Pushing live snapshots over a WebSocket.

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{stream::SplitSink, SinkExt, Stream, StreamExt};
use serde::Serialize;

use crate::store::StoreResult;

/// Writes every snapshot to the socket as one JSON text frame until either
/// side goes away. A snapshot that fails to load is skipped.
pub async fn pump<S, T>(mut sink: SplitSink<WebSocket, WsMessage>, snapshots: S)
where
    S: Stream<Item = StoreResult<T>>,
    T: Serialize,
{
    let mut snapshots = std::pin::pin!(snapshots);
    while let Some(snapshot) = snapshots.next().await {
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "skipping snapshot");
                continue;
            }
        };

        let Ok(json) = serde_json::to_string(&snapshot) else {
            continue;
        };
        if sink.send(WsMessage::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Read-only feed: pushes snapshots and ignores anything the client sends
/// until it closes, then tears the subscription down.
pub async fn serve_feed<S, T>(socket: WebSocket, snapshots: S)
where
    S: Stream<Item = StoreResult<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let (sink, mut receiver) = socket.split();
    let mut pump_task = tokio::spawn(pump(sink, snapshots));

    loop {
        tokio::select! {
            _ = &mut pump_task => break,
            frame = receiver.next() => match frame {
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            },
        }
    }

    pump_task.abort();
}
