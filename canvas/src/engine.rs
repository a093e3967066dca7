//! Client sync engine: one whiteboard session for one user.
//!
//! DESIGN
//! ======
//! `SyncEngine` is pure state. The host feeds it pointer samples, timer
//! ticks, connection changes and decoded relay messages; every call returns
//! the [`Action`]s the host must carry out (send a frame, redraw, refresh
//! presence, show a notice). The engine never performs I/O and takes the
//! current time as an argument, so it runs unchanged under a websocket
//! client, a test harness or a browser shim.
//!
//! Sends are gated on being connected and joined. While that gate is closed
//! the active stroke keeps growing locally and the encoder is marked to open
//! with a full message once the relay accepts us again. Strokes finished
//! while offline are remembered and re-sent as full messages on the next
//! `room-joined`; the relay ignores any it already holds.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::{BTreeMap, BTreeSet};

use frames::{ClientMessage, DrawingData, Point, ServerMessage, StrokeStyle, Tool, UserRecord};
use uuid::Uuid;

use crate::consts::{BATCH_INTERVAL_MS, CURSOR_INTERVAL_MS, HISTORY_LIMIT, MAX_BATCH, MIN_POINT_DISTANCE};
use crate::doc::DrawingSet;
use crate::encoder::StrokeEncoder;
use crate::history::History;
use crate::sampler::PointSampler;
use crate::throttle::CursorThrottle;

// =============================================================================
// TYPES
// =============================================================================

/// Work returned to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send this message to the relay.
    Send(ClientMessage),
    /// The drawing set changed; redraw.
    RenderNeeded,
    /// Peers or their cursors changed.
    PresenceChanged,
    /// Show a message to the user.
    Notify(String),
}

/// Transport state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
}

/// Tuning knobs for sampling and send cadence.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub min_point_distance: f64,
    pub batch_interval_ms: i64,
    pub max_batch: usize,
    pub cursor_interval_ms: i64,
    pub history_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_point_distance: MIN_POINT_DISTANCE,
            batch_interval_ms: BATCH_INTERVAL_MS,
            max_batch: MAX_BATCH,
            cursor_interval_ms: CURSOR_INTERVAL_MS,
            history_limit: HISTORY_LIMIT,
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

pub struct SyncEngine {
    user: UserRecord,
    room_id: Option<String>,
    /// Set on `room-joined` for the current room, cleared on disconnect.
    joined: bool,
    status: ConnectionStatus,
    style: StrokeStyle,
    drawings: DrawingSet,
    history: History,
    /// Other users in the room, by id.
    peers: BTreeMap<String, UserRecord>,
    sampler: PointSampler,
    encoder: StrokeEncoder,
    cursor: CursorThrottle,
    /// Id of the stroke being drawn.
    active: Option<String>,
    /// Own finished strokes whose last messages could not be sent.
    unsynced: BTreeSet<String>,
}

impl SyncEngine {
    #[must_use]
    pub fn new(user: UserRecord, config: &SyncConfig) -> Self {
        Self {
            user,
            room_id: None,
            joined: false,
            status: ConnectionStatus::Disconnected,
            style: StrokeStyle::default(),
            drawings: DrawingSet::new(),
            history: History::new(config.history_limit),
            peers: BTreeMap::new(),
            sampler: PointSampler::new(config.min_point_distance),
            encoder: StrokeEncoder::new(config.max_batch, config.batch_interval_ms),
            cursor: CursorThrottle::new(config.cursor_interval_ms),
            active: None,
            unsynced: BTreeSet::new(),
        }
    }

    fn can_send(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.joined && self.room_id.is_some()
    }

    fn send_stroke(&mut self, msg: DrawingData, actions: &mut Vec<Action>) {
        if self.can_send() {
            actions.push(Action::Send(ClientMessage::DrawingData(msg)));
        } else {
            self.encoder.force_full();
        }
    }

    fn sendable_room(&self) -> Option<String> {
        if self.can_send() { self.room_id.clone() } else { None }
    }

    fn join_message(&self) -> Option<Action> {
        let room_id = self.room_id.clone()?;
        Some(Action::Send(ClientMessage::JoinRoom { room_id, user: self.user.clone() }))
    }

    /// Drop everything tied to the current room.
    fn reset_room(&mut self) {
        self.joined = false;
        self.drawings.clear();
        self.history.clear();
        self.peers.clear();
        self.unsynced.clear();
        self.cursor.reset();
    }

    // --- Session lifecycle ---

    /// Enter `room_id`, leaving the current room first if it differs.
    pub fn join_room(&mut self, room_id: impl Into<String>) -> Vec<Action> {
        let room_id = room_id.into();
        let mut actions = Vec::new();

        if self.room_id.as_deref() == Some(room_id.as_str()) {
            if self.joined {
                return actions;
            }
        } else if self.room_id.is_some() {
            actions.extend(self.leave_room());
        }

        self.room_id = Some(room_id);
        if self.status == ConnectionStatus::Connected {
            actions.extend(self.join_message());
        }
        actions
    }

    /// Leave the current room. Finishes any stroke in progress first.
    pub fn leave_room(&mut self) -> Vec<Action> {
        let mut actions = self.end_stroke();
        let Some(room_id) = self.room_id.take() else {
            return actions;
        };

        if self.status == ConnectionStatus::Connected && self.joined {
            actions.push(Action::Send(ClientMessage::LeaveRoom { room_id, user_id: self.user.id.clone() }));
        }
        self.reset_room();
        actions.push(Action::RenderNeeded);
        actions.push(Action::PresenceChanged);
        actions
    }

    /// The transport (re)connected. Rejoins the current room, which makes
    /// the relay replay its stroke log.
    pub fn on_connected(&mut self) -> Vec<Action> {
        self.status = ConnectionStatus::Connected;
        self.joined = false;
        self.join_message().into_iter().collect()
    }

    /// The transport dropped. Drawing continues locally.
    pub fn on_disconnected(&mut self) -> Vec<Action> {
        self.status = ConnectionStatus::Disconnected;
        self.joined = false;
        self.encoder.force_full();
        self.cursor.reset();
        if self.peers.is_empty() {
            return Vec::new();
        }
        self.peers.clear();
        vec![Action::PresenceChanged]
    }

    // --- Stroke authoring ---

    /// Start a stroke at `point` with the current style.
    ///
    /// Tools that do not draw (eyedropper, pan) and calls made outside a room
    /// return nothing.
    pub fn begin_stroke(&mut self, point: Point, now: i64) -> Vec<Action> {
        if !self.style.tool.creates_stroke() {
            return Vec::new();
        }
        let mut actions = self.end_stroke();
        let Some(room_id) = self.room_id.clone() else {
            return actions;
        };

        let id = Uuid::new_v4().to_string();
        let record = DrawingData::new(id.clone(), room_id, self.user.id.clone(), &self.style, point, now);
        let opening = self.encoder.begin(&record, now);

        self.sampler.start(point);
        self.history.push(id.clone());
        self.drawings.insert_local(record);
        self.active = Some(id);

        self.send_stroke(opening, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Feed a pointer sample to the active stroke.
    pub fn extend_stroke(&mut self, point: Point, now: i64) -> Vec<Action> {
        let Some(id) = self.active.as_deref() else {
            return Vec::new();
        };
        let accepted = self.sampler.accept(point);
        if accepted.is_empty() {
            return Vec::new();
        }
        let Some(record) = self.drawings.get_mut(id) else {
            return Vec::new();
        };
        record.points.extend(accepted);
        record.timestamp = now;

        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.flush_stroke(now));
        actions
    }

    fn flush_stroke(&mut self, now: i64) -> Option<Action> {
        if !self.can_send() {
            return None;
        }
        let record = self.drawings.get(self.active.as_deref()?)?;
        let msg = self.encoder.poll(record, now)?;
        Some(Action::Send(ClientMessage::DrawingData(msg)))
    }

    /// Finish the active stroke, flushing anything still buffered.
    pub fn end_stroke(&mut self) -> Vec<Action> {
        let Some(id) = self.active.take() else {
            return Vec::new();
        };
        self.sampler.reset();
        let Some(record) = self.drawings.get(&id) else {
            self.encoder.abandon();
            return Vec::new();
        };

        if !self.can_send() {
            self.encoder.abandon();
            self.unsynced.insert(id);
            return Vec::new();
        }
        self.encoder
            .finish(record)
            .into_iter()
            .map(|msg| Action::Send(ClientMessage::DrawingData(msg)))
            .collect()
    }

    /// Switch tools. A stroke in progress ends here.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let actions = self.end_stroke();
        self.style.tool = tool;
        actions
    }

    /// Replace the style used for new strokes. Changing the tool ends a
    /// stroke in progress; other attributes apply from the next stroke.
    pub fn set_style(&mut self, style: StrokeStyle) -> Vec<Action> {
        let actions = if style.tool == self.style.tool { Vec::new() } else { self.end_stroke() };
        self.style = style;
        actions
    }

    /// Report the local pointer position. Throttled; see [`Self::tick`].
    pub fn move_cursor(&mut self, point: Point, now: i64) -> Vec<Action> {
        if !self.can_send() {
            return Vec::new();
        }
        self.cursor.offer(point, now).and_then(|p| self.cursor_message(p)).into_iter().collect()
    }

    fn cursor_message(&self, point: Point) -> Option<Action> {
        Some(Action::Send(ClientMessage::UserCursor {
            room_id: self.sendable_room()?,
            user_id: self.user.id.clone(),
            point,
        }))
    }

    /// Timer hook: flush batched stroke points and held cursor positions.
    pub fn tick(&mut self, now: i64) -> Vec<Action> {
        let mut actions: Vec<Action> = self.flush_stroke(now).into_iter().collect();
        if self.can_send() {
            actions.extend(self.cursor.tick(now).and_then(|p| self.cursor_message(p)));
        }
        actions
    }

    // --- History ---

    /// Hide the user's most recent visible stroke.
    pub fn undo(&mut self) -> Vec<Action> {
        let mut actions = self.end_stroke();
        let Some(drawing_id) = self.history.undo() else {
            return actions;
        };
        self.drawings.set_deleted(&drawing_id, true);
        if let Some(room_id) = self.sendable_room() {
            actions.push(Action::Send(ClientMessage::UndoCanvas { room_id, user_id: self.user.id.clone(), drawing_id }));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Show the most recently undone stroke again.
    pub fn redo(&mut self) -> Vec<Action> {
        let mut actions = self.end_stroke();
        let Some(drawing_id) = self.history.redo() else {
            return actions;
        };
        self.drawings.set_deleted(&drawing_id, false);
        if let Some(room_id) = self.sendable_room() {
            actions.push(Action::Send(ClientMessage::RedoCanvas { room_id, user_id: self.user.id.clone(), drawing_id }));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Clear the room for everyone. Refused while offline, since a local-only
    /// clear would never reach the relay's log.
    pub fn clear_canvas(&mut self) -> Vec<Action> {
        let Some(room_id) = self.sendable_room() else {
            return vec![Action::Notify("not connected to a room".to_owned())];
        };
        self.active = None;
        self.sampler.reset();
        self.encoder.abandon();
        self.drawings.clear();
        self.history.clear();
        self.unsynced.clear();
        vec![Action::Send(ClientMessage::ClearCanvas { room_id }), Action::RenderNeeded]
    }

    // --- Inbound ---

    /// Apply one message from the relay.
    pub fn handle_server(&mut self, msg: ServerMessage, now: i64) -> Vec<Action> {
        match msg {
            ServerMessage::RoomJoined { room_id, users } => self.on_room_joined(&room_id, users, now),
            ServerMessage::RoomError { message } => vec![Action::Notify(message)],
            ServerMessage::UserJoined { user } => {
                if user.id == self.user.id {
                    return Vec::new();
                }
                self.peers.insert(user.id.clone(), user);
                vec![Action::PresenceChanged]
            }
            ServerMessage::UserLeft { user_id } => {
                if self.peers.remove(&user_id).is_none() {
                    return Vec::new();
                }
                vec![Action::PresenceChanged]
            }
            ServerMessage::UserCursor { user_id, point } => {
                let Some(peer) = self.peers.get_mut(&user_id) else {
                    return Vec::new();
                };
                peer.cursor = Some(point);
                vec![Action::PresenceChanged]
            }
            ServerMessage::DrawingData(data) => {
                if self.drawings.apply_remote(&data, &self.user.id).changed() {
                    vec![Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            ServerMessage::CanvasClear => self.on_canvas_clear(),
            ServerMessage::CanvasUndo { user_id, drawing_id } => self.on_remote_history(&user_id, &drawing_id, true),
            ServerMessage::CanvasRedo { user_id, drawing_id } => self.on_remote_history(&user_id, &drawing_id, false),
        }
    }

    fn on_room_joined(&mut self, room_id: &str, users: Vec<UserRecord>, now: i64) -> Vec<Action> {
        if self.room_id.as_deref() != Some(room_id) {
            tracing::debug!(%room_id, "ignoring room-joined for a room we are not in");
            return Vec::new();
        }
        self.joined = true;
        self.peers = users.into_iter().filter(|u| u.id != self.user.id).map(|u| (u.id.clone(), u)).collect();

        // Peers' strokes come back in the replay; anything the relay no
        // longer holds (cleared or expired while we were away) must go.
        let own = self.user.id.as_str();
        let active = self.active.as_deref();
        let unsynced = &self.unsynced;
        let dropped = self
            .drawings
            .retain(|d| d.user_id == own || active == Some(d.id.as_str()) || unsynced.contains(&d.id));

        let mut actions = vec![Action::PresenceChanged];
        if dropped > 0 {
            tracing::debug!(%room_id, dropped, "dropped peer strokes ahead of replay");
            actions.push(Action::RenderNeeded);
        }
        for id in std::mem::take(&mut self.unsynced) {
            if let Some(record) = self.drawings.get(&id) {
                actions.push(Action::Send(ClientMessage::DrawingData(record.full())));
            }
        }
        self.encoder.force_full();
        actions.extend(self.flush_stroke(now));
        actions
    }

    /// A clear from the relay wipes everything except the stroke still
    /// being drawn, which restarts with a full message.
    fn on_canvas_clear(&mut self) -> Vec<Action> {
        let kept = self.active.as_deref().and_then(|id| self.drawings.remove(id));
        self.drawings.clear();
        self.history.clear();
        self.unsynced.clear();
        if let Some(record) = kept {
            self.drawings.insert_local(record);
            self.encoder.force_full();
        }
        vec![Action::RenderNeeded]
    }

    fn on_remote_history(&mut self, user_id: &str, drawing_id: &str, deleted: bool) -> Vec<Action> {
        if user_id == self.user.id {
            return Vec::new();
        }
        if self.drawings.set_deleted(drawing_id, deleted) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    #[must_use]
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    #[must_use]
    pub fn drawings(&self) -> &DrawingSet {
        &self.drawings
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Other users in the room, ordered by id.
    #[must_use]
    pub fn peers(&self) -> impl Iterator<Item = &UserRecord> {
        self.peers.values()
    }

    /// The stroke currently being drawn.
    #[must_use]
    pub fn active_stroke(&self) -> Option<&DrawingData> {
        self.drawings.get(self.active.as_deref()?)
    }
}
