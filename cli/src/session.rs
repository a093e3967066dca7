//! Websocket session host for the sync engine.
//!
//! DESIGN
//! ======
//! `Session` owns one [`SyncEngine`] and at most one live socket. It carries
//! out the engine's actions (encode and send, log presence and notices) and
//! feeds decoded relay frames back into it. A timer tick runs whenever the
//! socket is idle so batched stroke points and held cursor positions flush
//! on time.
//!
//! Reliability comes from reconnect-and-replay, not acks: when the socket
//! drops, the engine is told, the session reconnects with exponential
//! backoff, rejoins the room, and the relay replays its stroke log.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::time::Duration;

use canvas::engine::{Action, SyncConfig, SyncEngine};
use frames::{ClientMessage, ServerMessage, UserRecord, now_ms};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::error::CliError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const BACKOFF_MIN: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(10);
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// OPTIONS
// =============================================================================

/// Frame encoding used for outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Encoding {
    #[default]
    Json,
    Protobuf,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub ws_url: String,
    pub room_id: String,
    pub user: UserRecord,
    pub encoding: Encoding,
    /// Idle timer period driving `SyncEngine::tick`.
    pub tick: Duration,
    /// Give up after this many failed connects in a row. `None` retries forever.
    pub max_attempts: Option<u32>,
}

/// Derive the relay websocket URL from an HTTP base URL.
///
/// # Errors
///
/// Returns [`CliError::InvalidBaseUrl`] unless the scheme is http or https.
pub fn ws_url(base_url: &str) -> Result<String, CliError> {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/api/ws"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/api/ws"));
    }
    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

// =============================================================================
// BACKOFF
// =============================================================================

/// Exponential reconnect delay, doubling from one to ten seconds.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self { next: BACKOFF_MIN }
    }
}

impl Backoff {
    /// Delay to wait now; the following call returns double, up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(BACKOFF_MAX);
        delay
    }

    pub fn reset(&mut self) {
        self.next = BACKOFF_MIN;
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode an outbound message as a websocket frame.
///
/// # Errors
///
/// Returns [`CliError::Codec`] if serialization fails.
pub fn encode(encoding: Encoding, msg: &ClientMessage) -> Result<Message, CliError> {
    Ok(match encoding {
        Encoding::Json => Message::text(frames::to_json(msg)?),
        Encoding::Protobuf => Message::binary(frames::encode_message(msg)?),
    })
}

/// Decode a relay frame. Control frames yield `None`.
///
/// # Errors
///
/// Returns [`CliError::WsClosed`] for a close frame and [`CliError::Codec`]
/// for a payload that is not a relay message.
pub fn decode(frame: &Message) -> Result<Option<ServerMessage>, CliError> {
    match frame {
        Message::Text(text) => Ok(Some(frames::from_json(text.as_str())?)),
        Message::Binary(bytes) => Ok(Some(frames::decode_message(bytes)?)),
        Message::Close(_) => Err(CliError::WsClosed),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
    }
}

enum Wake {
    Frame(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    Tick,
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    engine: SyncEngine,
    opts: SessionOptions,
    stream: Option<WsStream>,
    backoff: Backoff,
}

impl Session {
    #[must_use]
    pub fn new(opts: SessionOptions) -> Self {
        let mut engine = SyncEngine::new(opts.user.clone(), &SyncConfig::default());
        // Not connected yet, so this only records the room.
        engine.join_room(opts.room_id.clone());
        Self { engine, opts, stream: None, backoff: Backoff::default() }
    }

    #[must_use]
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SyncEngine {
        &mut self.engine
    }

    /// Connect and join, retrying with backoff.
    ///
    /// # Errors
    ///
    /// Returns the last connect error once `max_attempts` is exhausted, or a
    /// [`CliError::ServerError`] if the relay refuses the join.
    pub async fn connect(&mut self) -> Result<(), CliError> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match self.try_connect().await {
                Ok(()) => {
                    self.backoff.reset();
                    return Ok(());
                }
                Err(err) if !err.is_disconnect() => return Err(err),
                Err(err) if self.opts.max_attempts.is_some_and(|max| attempt >= max) => return Err(err),
                Err(err) => {
                    self.drop_connection();
                    let delay = self.backoff.next_delay();
                    warn!(%err, attempt, delay_ms = delay.as_millis(), "connect failed; retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn try_connect(&mut self) -> Result<(), CliError> {
        let (stream, _) = connect_async(self.opts.ws_url.as_str()).await?;
        info!(url = %self.opts.ws_url, room = %self.opts.room_id, "connected");
        self.stream = Some(stream);

        let actions = self.engine.on_connected();
        self.apply(actions).await?;
        tokio::time::timeout(JOIN_TIMEOUT, self.await_joined()).await.map_err(|_| CliError::Timeout)?
    }

    async fn await_joined(&mut self) -> Result<(), CliError> {
        loop {
            let Some(msg) = self.recv().await? else {
                continue;
            };
            if let ServerMessage::RoomError { message } = &msg {
                return Err(CliError::ServerError { context: "join-room".to_owned(), message: message.clone() });
            }
            let joined = matches!(msg, ServerMessage::RoomJoined { .. });
            self.deliver(msg).await?;
            if joined && self.engine.is_joined() {
                info!(room = %self.opts.room_id, peers = self.engine.peers().count(), "joined room");
                return Ok(());
            }
        }
    }

    async fn recv(&mut self) -> Result<Option<ServerMessage>, CliError> {
        let stream = self.stream.as_mut().ok_or(CliError::WsClosed)?;
        let frame = stream.next().await.ok_or(CliError::WsClosed)??;
        decode(&frame)
    }

    async fn deliver(&mut self, msg: ServerMessage) -> Result<(), CliError> {
        let actions = self.engine.handle_server(msg, now_ms());
        self.apply(actions).await
    }

    /// Carry out engine actions.
    ///
    /// # Errors
    ///
    /// Returns a websocket error if a send fails.
    pub async fn apply(&mut self, actions: Vec<Action>) -> Result<(), CliError> {
        for action in actions {
            match action {
                Action::Send(msg) => self.send(&msg).await?,
                Action::RenderNeeded => debug!(strokes = self.engine.drawings().len(), "drawing set changed"),
                Action::PresenceChanged => debug!(peers = self.engine.peers().count(), "presence changed"),
                Action::Notify(message) => warn!(%message, "relay notice"),
            }
        }
        Ok(())
    }

    async fn send(&mut self, msg: &ClientMessage) -> Result<(), CliError> {
        let Some(stream) = self.stream.as_mut() else {
            debug!(event = msg.event(), "offline; message not sent");
            return Ok(());
        };
        stream.send(encode(self.opts.encoding, msg)?).await?;
        Ok(())
    }

    /// Like [`Self::apply`], but a lost connection is re-established.
    ///
    /// # Errors
    ///
    /// Returns any error that is not a disconnect, or the reconnect failure.
    pub async fn dispatch(&mut self, actions: Vec<Action>) -> Result<(), CliError> {
        match self.apply(actions).await {
            Err(err) if err.is_disconnect() => self.reconnect(err).await,
            other => other,
        }
    }

    /// Wait for one relay message or one tick, whichever comes first.
    ///
    /// Returns the message handled, or `None` for a tick, a control frame or
    /// an undecodable frame.
    ///
    /// # Errors
    ///
    /// Returns a disconnect error if the socket closed or failed.
    pub async fn step(&mut self) -> Result<Option<ServerMessage>, CliError> {
        let stream = self.stream.as_mut().ok_or(CliError::WsClosed)?;
        let wake = tokio::select! {
            frame = stream.next() => Wake::Frame(frame),
            () = tokio::time::sleep(self.opts.tick) => Wake::Tick,
        };

        match wake {
            Wake::Tick => {
                let actions = self.engine.tick(now_ms());
                self.apply(actions).await?;
                Ok(None)
            }
            Wake::Frame(frame) => {
                let frame = frame.ok_or(CliError::WsClosed)??;
                let msg = match decode(&frame) {
                    Ok(Some(msg)) => msg,
                    Ok(None) => return Ok(None),
                    Err(CliError::Codec(err)) => {
                        warn!(%err, "undecodable relay frame");
                        return Ok(None);
                    }
                    Err(err) => return Err(err),
                };
                self.deliver(msg.clone()).await?;
                Ok(Some(msg))
            }
        }
    }

    /// Keep the session serviced for `duration`, reconnecting if needed.
    /// Returns the relay messages handled meanwhile.
    ///
    /// # Errors
    ///
    /// Returns any error that is not a disconnect, or the reconnect failure.
    pub async fn pause(&mut self, duration: Duration) -> Result<Vec<ServerMessage>, CliError> {
        let deadline = Instant::now() + duration;
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            match self.step().await {
                Ok(Some(msg)) => seen.push(msg),
                Ok(None) => {}
                Err(err) if err.is_disconnect() => self.reconnect(err).await?,
                Err(err) => return Err(err),
            }
        }
        Ok(seen)
    }

    /// Handle a lost connection and connect again.
    ///
    /// # Errors
    ///
    /// Returns the connect failure once retries are exhausted.
    pub async fn reconnect(&mut self, cause: CliError) -> Result<(), CliError> {
        warn!(%cause, "connection lost");
        self.drop_connection();
        self.connect().await
    }

    fn drop_connection(&mut self) {
        self.stream = None;
        // Disconnected engine emits no sends.
        for action in self.engine.on_disconnected() {
            debug!(?action, "while disconnecting");
        }
    }

    /// Leave the room and close the socket.
    ///
    /// # Errors
    ///
    /// Returns a websocket error if the leave or close frame cannot be sent.
    pub async fn close(&mut self) -> Result<(), CliError> {
        let actions = self.engine.leave_room();
        self.apply(actions).await?;
        if let Some(mut stream) = self.stream.take() {
            stream.close(None).await?;
        }
        Ok(())
    }
}
