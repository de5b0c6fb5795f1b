//! Registry actor - owns all shared chat state and processes commands.
//!
//! The RegistryActor is the single owner of the known-room set and the
//! connected-session index. It receives commands via an mpsc channel and
//! processes them sequentially in one task, so no other synchronization
//! is needed around the maps. Commands from one connection arrive in the
//! order that connection sent them, which keeps a session's broadcasts
//! ordered against its own join/leave.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel send failures are logged but don't panic

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, trace, warn};

use banter_core::{RoomName, SessionId};

use super::commands::{RegistryCommand, RegistryError, SessionInfo};

// ============================================================================
// Resource Limits
// ============================================================================

/// Maximum number of concurrently connected sessions.
pub const MAX_SESSIONS: usize = 1024;

// ============================================================================
// Session State
// ============================================================================

/// Registry-owned state for one connected session.
///
/// `current_room` is only ever mutated by commands from the owning
/// connection; the actor's serialization makes it safe for broadcasters
/// to read.
#[derive(Debug)]
struct SessionEntry {
    /// Display name; defaults to the decimal form of the id
    name: String,

    /// Current room, `None` while in the lobby
    current_room: Option<RoomName>,

    /// Bounded queue to the session's writer task
    outbound: mpsc::Sender<String>,

    /// When the session connected (for disconnect logging)
    connected_at: DateTime<Utc>,
}

// ============================================================================
// Registry Actor
// ============================================================================

/// The registry actor - owns the room set and the session index.
///
/// Implements the actor pattern: receives commands via mpsc channel and
/// processes them sequentially. Broadcast fan-out uses `try_send` on each
/// recipient's bounded outbound queue, so a stalled recipient never
/// blocks the actor or the rest of the room.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Connected sessions, keyed by server-assigned id
    sessions: HashMap<SessionId, SessionEntry>,

    /// Known room names. Rooms persist for the process lifetime once
    /// created; they are never removed when their last member leaves.
    rooms: HashSet<RoomName>,
}

impl RegistryActor {
    /// Creates a new registry actor reading commands from `receiver`.
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>) -> Self {
        Self {
            receiver,
            sessions: HashMap::new(),
            rooms: HashSet::new(),
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    /// This is the main entry point - call this in a spawned task.
    pub async fn run(mut self) {
        info!("Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            sessions = self.sessions.len(),
            rooms = self.rooms.len(),
            "Registry actor stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Register {
                id,
                outbound,
                respond_to,
            } => {
                let result = self.handle_register(id, outbound);
                // Ignore send error - client may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::SetName {
                id,
                name,
                respond_to,
            } => {
                let result = self.handle_set_name(id, name);
                let _ = respond_to.send(result);
            }
            RegistryCommand::CreateRoom {
                id,
                room,
                respond_to,
            } => {
                let result = self.handle_create_room(id, room);
                let _ = respond_to.send(result);
            }
            RegistryCommand::JoinRoom {
                id,
                room,
                respond_to,
            } => {
                let result = self.handle_join_room(id, room);
                let _ = respond_to.send(result);
            }
            RegistryCommand::LeaveRoom { id, respond_to } => {
                self.handle_leave_room(id);
                let _ = respond_to.send(());
            }
            RegistryCommand::Broadcast { from, room, line } => {
                self.handle_broadcast(from, &room, &line);
            }
            RegistryCommand::GetSession { id, respond_to } => {
                let _ = respond_to.send(self.handle_get_session(id));
            }
            RegistryCommand::Unregister { id } => {
                self.handle_unregister(id);
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    /// Handles session registration.
    fn handle_register(
        &mut self,
        id: SessionId,
        outbound: mpsc::Sender<String>,
    ) -> Result<(), RegistryError> {
        if self.sessions.len() >= MAX_SESSIONS {
            warn!(
                session = %id,
                current = self.sessions.len(),
                max = MAX_SESSIONS,
                "Registry is full, rejecting registration"
            );
            return Err(RegistryError::RegistryFull { max: MAX_SESSIONS });
        }

        if self.sessions.contains_key(&id) {
            debug!(session = %id, "Session already exists, rejecting registration");
            return Err(RegistryError::SessionAlreadyExists(id));
        }

        self.sessions.insert(
            id,
            SessionEntry {
                name: id.default_name(),
                current_room: None,
                outbound,
                connected_at: Utc::now(),
            },
        );

        info!(
            session = %id,
            total_sessions = self.sessions.len(),
            "Session registered"
        );

        Ok(())
    }

    /// Handles a display-name change.
    fn handle_set_name(&mut self, id: SessionId, name: String) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }

        let entry = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::SessionNotFound(id))?;

        debug!(session = %id, old = %entry.name, new = %name, "Display name changed");
        entry.name = name;

        Ok(())
    }

    /// Handles room creation.
    ///
    /// Marks the room known and moves the creator into it in one step.
    fn handle_create_room(&mut self, id: SessionId, room: RoomName) -> Result<(), RegistryError> {
        if room.is_empty() {
            return Err(RegistryError::InvalidName);
        }

        if self.rooms.contains(&room) {
            return Err(RegistryError::RoomAlreadyExists(room));
        }

        let entry = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::SessionNotFound(id))?;

        entry.current_room = Some(room.clone());
        self.rooms.insert(room.clone());

        info!(
            session = %id,
            room = %room,
            total_rooms = self.rooms.len(),
            "Room created"
        );

        Ok(())
    }

    /// Handles joining an existing room.
    fn handle_join_room(&mut self, id: SessionId, room: RoomName) -> Result<(), RegistryError> {
        if room.is_empty() {
            return Err(RegistryError::InvalidName);
        }

        if !self.rooms.contains(&room) {
            return Err(RegistryError::RoomNotFound(room));
        }

        let entry = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::SessionNotFound(id))?;

        entry.current_room = Some(room.clone());

        info!(session = %id, room = %room, "Room joined");

        Ok(())
    }

    /// Handles returning a session to the lobby. Unconditional.
    fn handle_leave_room(&mut self, id: SessionId) {
        if let Some(entry) = self.sessions.get_mut(&id) {
            if let Some(room) = entry.current_room.take() {
                info!(session = %id, room = %room, "Room left");
            }
        }
    }

    /// Handles chat fan-out to a room.
    ///
    /// Delivers the line to every registered session whose current room
    /// matches, excluding the sender. Delivery is `try_send` against each
    /// recipient's bounded queue: a full queue drops that recipient's
    /// copy (overflow policy: drop newest), a closed queue belongs to a
    /// session that is already going away. Neither outcome affects the
    /// sender or the remaining recipients.
    fn handle_broadcast(&mut self, from: SessionId, room: &RoomName, line: &str) {
        let mut delivered = 0usize;

        for (sid, entry) in &self.sessions {
            if *sid == from || entry.current_room.as_ref() != Some(room) {
                continue;
            }

            match entry.outbound.try_send(line.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        session = %sid,
                        room = %room,
                        "Outbound queue full, dropping chat line"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(session = %sid, "Outbound queue closed, skipping recipient");
                }
            }
        }

        trace!(from = %from, room = %room, delivered, "Broadcast relayed");
    }

    /// Handles a session state query.
    fn handle_get_session(&self, id: SessionId) -> Option<SessionInfo> {
        self.sessions.get(&id).map(|entry| SessionInfo {
            id,
            name: entry.name.clone(),
            current_room: entry.current_room.clone(),
            connected_at: entry.connected_at,
        })
    }

    /// Handles removal of a disconnected session. Idempotent.
    fn handle_unregister(&mut self, id: SessionId) {
        if let Some(entry) = self.sessions.remove(&id) {
            let connected_secs = Utc::now()
                .signed_duration_since(entry.connected_at)
                .num_seconds();

            info!(
                session = %id,
                name = %entry.name,
                connected_secs,
                remaining_sessions = self.sessions.len(),
                "Session unregistered"
            );
        }
    }

    // ========================================================================
    // Accessors (for testing)
    // ========================================================================

    /// Returns the number of sessions currently registered.
    #[cfg(test)]
    fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Returns the number of known rooms.
    #[cfg(test)]
    fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
