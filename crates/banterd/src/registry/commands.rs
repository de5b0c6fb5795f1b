//! Registry actor commands and errors.
//!
//! This module defines the message types for communicating with the
//! `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations
//! - `SessionInfo`: Read-only view of a session returned by queries
//!
//! All types are designed for async message passing and follow the
//! panic-free policy.

use banter_core::{RoomName, SessionId};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Request/response commands carry a oneshot channel for the result;
/// fire-and-forget commands (`Broadcast`, `Unregister`) carry none.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Register a newly accepted connection.
    ///
    /// The display name defaults to the decimal form of the id.
    ///
    /// # Errors
    /// - `RegistryError::SessionAlreadyExists` if the id is taken
    /// - `RegistryError::RegistryFull` if at maximum capacity
    Register {
        /// Server-assigned session id
        id: SessionId,
        /// Bounded queue to the session's writer task
        outbound: mpsc::Sender<String>,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Change a session's display name.
    ///
    /// # Errors
    /// - `RegistryError::InvalidName` if the name is empty
    /// - `RegistryError::SessionNotFound` if the session doesn't exist
    SetName {
        /// Session whose name changes
        id: SessionId,
        /// New display name (raw command remainder, may be empty)
        name: String,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Create a room and move the caller into it.
    ///
    /// Marking the room known and updating the caller's membership happen
    /// in one command, so the pair is atomic from the caller's point of
    /// view.
    ///
    /// # Errors
    /// - `RegistryError::InvalidName` if the name is empty
    /// - `RegistryError::RoomAlreadyExists` if the name is known
    /// - `RegistryError::SessionNotFound` if the session doesn't exist
    CreateRoom {
        /// Creating session
        id: SessionId,
        /// Name of the new room
        room: RoomName,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Move the caller into an existing room.
    ///
    /// # Errors
    /// - `RegistryError::InvalidName` if the name is empty
    /// - `RegistryError::RoomNotFound` if the name is unknown
    /// - `RegistryError::SessionNotFound` if the session doesn't exist
    JoinRoom {
        /// Joining session
        id: SessionId,
        /// Name of the room to join
        room: RoomName,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Return the caller to the lobby. Unconditional; no failure mode.
    LeaveRoom {
        /// Leaving session
        id: SessionId,
        /// Acknowledged once the membership change is applied
        respond_to: oneshot::Sender<()>,
    },

    /// Relay a chat line to every other current member of a room.
    ///
    /// Fire-and-forget: the sender gets no reply, and delivery to each
    /// recipient is best-effort against its bounded outbound queue.
    Broadcast {
        /// Sending session (excluded from delivery)
        from: SessionId,
        /// Room to fan out to
        room: RoomName,
        /// Raw chat line, without terminator
        line: String,
    },

    /// Query a session's current state.
    ///
    /// Returns `None` if the session doesn't exist.
    GetSession {
        /// Session to look up
        id: SessionId,
        /// Channel to send the result
        respond_to: oneshot::Sender<Option<SessionInfo>>,
    },

    /// Remove a disconnected session. Fire-and-forget and idempotent.
    Unregister {
        /// Session to remove
        id: SessionId,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// An empty name was given to a naming command.
    #[error("empty name")]
    InvalidName,

    /// The room name is already known.
    #[error("room already exists: {0}")]
    RoomAlreadyExists(RoomName),

    /// The room name is not known.
    #[error("room not found: {0}")]
    RoomNotFound(RoomName),

    /// The requested session was not found.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// A session with this id already exists.
    #[error("session already exists: {0}")]
    SessionAlreadyExists(SessionId),

    /// The registry has reached its maximum session capacity.
    #[error("registry is full (max: {max} sessions)")]
    RegistryFull {
        /// Maximum number of sessions allowed
        max: usize,
    },

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

// ============================================================================
// Session Views
// ============================================================================

/// Read-only snapshot of a session, returned by `GetSession`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session id
    pub id: SessionId,
    /// Current display name
    pub name: String,
    /// Current room, `None` while in the lobby
    pub current_room: Option<RoomName>,
    /// When the session connected
    pub connected_at: DateTime<Utc>,
}
