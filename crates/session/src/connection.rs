//! Event stream connection manager
//!
//! `ConnectionLifecycle` is the pure bookkeeping (state, attempt counter,
//! reconnect scheduling). `ConnectionManager` wraps it around a real
//! WebSocket: it dials, owns the writer task, and decodes inbound frames.

use std::future::Future;
use std::time::Duration;

use futures::stream::{SplitStream, StreamExt};
use futures::SinkExt;
use maestro_protocol::{ClientMessage, ServerMessage};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::error::ConnectionError;
use crate::guidance::FrameSink;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type FrameReader = SplitStream<WsStream>;

const PAYLOAD_PREVIEW_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

// ---------------------------------------------------------------------------
// ConnectionLifecycle: pure state + backoff bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ConnectionLifecycle {
    state: ConnectionState,
    attempt: u64,
    backoff: Backoff,
}

impl ConnectionLifecycle {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            state: ConnectionState::Closed,
            attempt: 0,
            backoff,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    pub fn on_open(&mut self) {
        self.state = ConnectionState::Open;
        self.attempt = 0;
    }

    /// Record a lost (or failed) connection and return the delay before the
    /// next attempt. Returns `None` when the connection was already closed,
    /// so a transport error followed by a close schedules only one retry.
    pub fn on_loss(&mut self) -> Option<Duration> {
        if self.state == ConnectionState::Closed {
            return None;
        }
        self.state = ConnectionState::Closed;
        let delay = self.backoff.delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }

    /// Stop without scheduling anything.
    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
    }
}

// ---------------------------------------------------------------------------
// Inbound decoding
// ---------------------------------------------------------------------------

/// What one inbound WebSocket message means to the session
#[derive(Debug)]
pub enum Inbound {
    Frame(ServerMessage),
    /// Control frame, binary payload, or an undecodable text frame
    Skip,
    Closed,
}

pub fn decode(message: Message) -> Inbound {
    match message {
        Message::Text(text) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
            Ok(frame) => Inbound::Frame(frame),
            Err(e) => {
                warn!(
                    component = "connection",
                    event = "connection.frame.decode_failed",
                    error = %e,
                    payload_bytes = text.len(),
                    payload_preview = %truncate_for_log(text.as_str(), PAYLOAD_PREVIEW_CHARS),
                    "Dropping undecodable frame"
                );
                Inbound::Skip
            }
        },
        Message::Close(_) => Inbound::Closed,
        _ => Inbound::Skip,
    }
}

fn truncate_for_log(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

// ---------------------------------------------------------------------------
// ConnectionManager: the live socket
// ---------------------------------------------------------------------------

pub struct ConnectionManager {
    url: String,
    connect_timeout: Duration,
    lifecycle: ConnectionLifecycle,
    outbound_tx: Option<mpsc::UnboundedSender<String>>,
    writer: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, backoff: Backoff, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
            lifecycle: ConnectionLifecycle::new(backoff),
            outbound_tx: None,
            writer: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    pub fn attempt(&self) -> u64 {
        self.lifecycle.attempt()
    }

    /// Mark the connection as connecting and return the dial future.
    /// The future owns its inputs so the caller can keep using the manager
    /// while it is pending.
    pub fn connect(
        &mut self,
    ) -> impl Future<Output = Result<WsStream, ConnectionError>> + Send + 'static {
        self.lifecycle.begin_connect();
        let url = self.url.clone();
        let timeout = self.connect_timeout;
        info!(
            component = "connection",
            event = "connection.connecting",
            url = %url,
            attempt = self.lifecycle.attempt(),
            "Connecting to event stream"
        );
        async move {
            match tokio::time::timeout(timeout, connect_async(url.as_str())).await {
                Ok(Ok((stream, _response))) => Ok(stream),
                Ok(Err(e)) => Err(ConnectionError::Handshake(e)),
                Err(_) => Err(ConnectionError::Timeout(timeout)),
            }
        }
    }

    /// Take ownership of a freshly opened stream. Spawns the writer task and
    /// returns the read half.
    pub fn attach(&mut self, stream: WsStream) -> FrameReader {
        self.detach();
        let (mut sink, reader) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            while let Some(json) = rx.recv().await {
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    debug!(
                        component = "connection",
                        event = "connection.send.failed",
                        error = %e,
                        "WebSocket send failed"
                    );
                    return;
                }
            }
            let _ = sink.close().await;
        });

        self.outbound_tx = Some(tx);
        self.writer = Some(writer);
        self.lifecycle.on_open();
        info!(
            component = "connection",
            event = "connection.opened",
            url = %self.url,
            "Event stream connected"
        );
        reader
    }

    /// Handle a dropped stream or failed dial. Returns the reconnect delay,
    /// or `None` if a reconnect was already scheduled.
    pub fn on_loss(&mut self) -> Option<Duration> {
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
        self.outbound_tx = None;
        let delay = self.lifecycle.on_loss();
        if let Some(delay) = delay {
            warn!(
                component = "connection",
                event = "connection.lost",
                attempt = self.lifecycle.attempt(),
                delay_ms = delay.as_millis() as u64,
                "Event stream lost, reconnect scheduled"
            );
        }
        delay
    }

    /// Close for good: queued frames are flushed and nothing is rescheduled.
    pub fn close(&mut self) {
        self.detach();
        self.lifecycle.close();
    }

    fn detach(&mut self) {
        // Dropping the sender lets the writer drain and close the socket.
        self.outbound_tx = None;
        self.writer = None;
    }
}

impl FrameSink for ConnectionManager {
    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open && self.outbound_tx.is_some()
    }

    fn send_frame(&mut self, frame: &ClientMessage) {
        if !self.is_open() {
            return;
        }
        let Some(tx) = self.outbound_tx.as_ref() else {
            return;
        };
        match serde_json::to_string(frame) {
            Ok(json) => {
                let _ = tx.send(json);
            }
            Err(e) => warn!(
                component = "connection",
                event = "connection.send.serialize_failed",
                error = %e,
                "Failed to serialize client frame"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_resets_attempt_counter() {
        let mut lifecycle = ConnectionLifecycle::new(Backoff::default());
        lifecycle.begin_connect();
        lifecycle.on_loss();
        lifecycle.begin_connect();
        lifecycle.on_loss();
        assert_eq!(lifecycle.attempt(), 2);

        lifecycle.begin_connect();
        lifecycle.on_open();
        assert_eq!(lifecycle.state(), ConnectionState::Open);
        assert_eq!(lifecycle.attempt(), 0);

        assert_eq!(lifecycle.on_loss(), Some(Duration::from_millis(3_000)));
    }

    #[test]
    fn consecutive_drops_back_off_to_the_cap() {
        let mut lifecycle = ConnectionLifecycle::new(Backoff::default());
        lifecycle.begin_connect();
        lifecycle.on_open();

        let mut scheduled = Vec::new();
        for _ in 0..5 {
            let delay = lifecycle.on_loss().expect("reconnect scheduled");
            scheduled.push(delay.as_millis());
            // Timer fires, the redial fails before opening.
            lifecycle.begin_connect();
        }
        assert_eq!(scheduled, vec![3_000, 6_000, 12_000, 24_000, 30_000]);
    }

    #[test]
    fn error_then_close_schedules_once() {
        let mut lifecycle = ConnectionLifecycle::new(Backoff::default());
        lifecycle.begin_connect();
        lifecycle.on_open();

        assert!(lifecycle.on_loss().is_some());
        assert!(lifecycle.on_loss().is_none());
        assert_eq!(lifecycle.attempt(), 1);
    }

    #[test]
    fn close_schedules_nothing() {
        let mut lifecycle = ConnectionLifecycle::new(Backoff::default());
        lifecycle.begin_connect();
        lifecycle.on_open();
        lifecycle.close();
        assert_eq!(lifecycle.state(), ConnectionState::Closed);
        assert!(lifecycle.on_loss().is_none());
    }

    #[test]
    fn decode_classifies_messages() {
        let log = Message::Text(
            r#"{"type":"log","agent":"Developer","text":"hi"}"#.into(),
        );
        assert!(matches!(decode(log), Inbound::Frame(ServerMessage::Log(_))));

        let garbage = Message::Text("{not json".into());
        assert!(matches!(decode(garbage), Inbound::Skip));

        assert!(matches!(decode(Message::Ping(Vec::new().into())), Inbound::Skip));
        assert!(matches!(decode(Message::Close(None)), Inbound::Closed));
    }

    #[test]
    fn manager_drops_frames_while_not_open() {
        let mut manager = ConnectionManager::new(
            "ws://127.0.0.1:9/ws",
            Backoff::default(),
            Duration::from_secs(1),
        );
        assert_eq!(manager.state(), ConnectionState::Closed);
        assert!(!manager.is_open());
        manager.send_frame(&ClientMessage::guidance("p1", "ignored"));
        assert!(manager.on_loss().is_none());
    }
}
