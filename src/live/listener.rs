//! Socket.IO client task feeding [`LiveFeed`].

use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::domain::occupancy::SlotUpdate;
use crate::live::LiveFeed;
use crate::live::protocol::{EnginePacket, SocketPacket, UPDATE_SLOTS};

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Websocket endpoint of a Socket.IO server given its base url.
pub fn socket_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}/socket.io/?EIO=4&transport=websocket")
}

/// Starts the listener on the current runtime.
pub fn spawn(url: &str, feed: LiveFeed) {
    let endpoint = socket_url(url);
    tokio::spawn(run(endpoint, feed));
}

/// Connects, listens until the connection drops, then reconnects forever.
pub async fn run(endpoint: String, feed: LiveFeed) {
    let mut delay = INITIAL_RECONNECT_DELAY;
    loop {
        match connect_async(endpoint.as_str()).await {
            Ok((stream, _response)) => {
                log::info!("Live feed connected to {endpoint}");
                delay = INITIAL_RECONNECT_DELAY;
                if let Err(err) = session(stream, &feed).await {
                    log::warn!("Live feed connection lost: {err}");
                }
                feed.set_connected(false);
            }
            Err(err) => log::warn!("Live feed connection to {endpoint} failed: {err}"),
        }

        log::info!("Reconnecting live feed in {}s", delay.as_secs());
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_RECONNECT_DELAY);
    }
}

async fn session<S>(
    stream: tokio_tungstenite::WebSocketStream<S>,
    feed: &LiveFeed,
) -> Result<(), tungstenite::Error>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = stream.split();

    while let Some(message) = stream.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Ping(data) => {
                sink.send(Message::Pong(data)).await?;
                continue;
            }
            Message::Close(_) => {
                log::info!("Live feed closed by server");
                return Ok(());
            }
            _ => continue,
        };

        let packet = match EnginePacket::decode(text.as_str()) {
            Ok(packet) => packet,
            Err(err) => {
                log::debug!("Ignoring live feed packet {text:?}: {err}");
                continue;
            }
        };

        match packet {
            EnginePacket::Open(handshake) => {
                log::debug!("Live feed session {}", handshake.sid);
                let connect = EnginePacket::Message(SocketPacket::Connect(None)).encode();
                sink.send(Message::Text(connect.into())).await?;
            }
            EnginePacket::Ping(data) => {
                let pong = EnginePacket::Pong(data).encode();
                sink.send(Message::Text(pong.into())).await?;
            }
            EnginePacket::Message(SocketPacket::Connect(_)) => feed.set_connected(true),
            EnginePacket::Message(SocketPacket::Event { name, args }) => {
                handle_event(feed, &name, args);
            }
            EnginePacket::Message(SocketPacket::ConnectError(data)) => {
                log::warn!("Live feed refused the connection: {data:?}");
                return Ok(());
            }
            EnginePacket::Message(SocketPacket::Disconnect) | EnginePacket::Close => {
                log::info!("Live feed disconnected by server");
                return Ok(());
            }
            EnginePacket::Pong(_) | EnginePacket::Noop => {}
        }
    }
    Ok(())
}

/// Applies `update_slots`; other events are ignored.
pub fn handle_event(feed: &LiveFeed, name: &str, args: Vec<Value>) -> bool {
    if name != UPDATE_SLOTS {
        log::debug!("Ignoring live event {name}");
        return false;
    }
    let Some(payload) = args.into_iter().next() else {
        log::debug!("Ignoring {name} without payload");
        return false;
    };
    match serde_json::from_value::<SlotUpdate>(payload) {
        Ok(update) => {
            feed.apply(update, Utc::now());
            true
        }
        Err(err) => {
            log::warn!("Malformed {name} payload: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn endpoint_from_http_url() {
        assert_eq!(
            socket_url("http://localhost:5000/"),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url("https://cams.example.com"),
            "wss://cams.example.com/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn update_event_replaces_free_slots() {
        let feed = LiveFeed::new();
        feed.apply(
            SlotUpdate {
                free_slots: vec![1, 2, 3],
                frame: Some("old".into()),
                frame_original: None,
            },
            Utc::now(),
        );

        assert!(handle_event(
            &feed,
            UPDATE_SLOTS,
            vec![json!({"free_slots": [5]})]
        ));
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.free_slots, vec![5]);
        assert_eq!(snapshot.frame.as_deref(), Some("old"));
    }

    #[test]
    fn other_events_are_ignored() {
        let feed = LiveFeed::new();
        assert!(!handle_event(&feed, "chat", vec![json!({"free_slots": [5]})]));
        assert!(!handle_event(&feed, UPDATE_SLOTS, vec![json!({"free_slots": "x"})]));
        assert_eq!(feed.snapshot().updates_received, 0);
    }
}
