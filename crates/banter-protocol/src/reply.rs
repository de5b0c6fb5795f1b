//! Server reply lines.
//!
//! Every reply the daemon sends is one of these fixed text lines,
//! written with a trailing `\n`. Relayed chat lines are not replies;
//! they pass through verbatim.

use std::fmt;

/// A fixed server-to-client reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledges `quit`; the connection closes right after.
    Bye,

    /// `set username` succeeded.
    UsernameChanged,

    /// `set username` with an empty name.
    UsernameRejected,

    /// `create-room` succeeded; the sender is now in the room.
    RoomCreated,

    /// `create-room` for a name that is already known.
    RoomExists,

    /// `create-room` with an empty name.
    RoomCreateFailed,

    /// `join-room` succeeded; the sender is now in the room.
    RoomJoined,

    /// `join-room` for an unknown (or empty) name.
    RoomNotFound,

    /// `!leave-room`; the sender is back in the lobby.
    RoomLeft,
}

impl Reply {
    /// The exact wire text of this reply, without the terminator.
    pub fn as_line(&self) -> &'static str {
        match self {
            Self::Bye => "Bye!",
            Self::UsernameChanged => "Username changed!",
            Self::UsernameRejected => "Failed to change username!",
            Self::RoomCreated => "Room created!",
            Self::RoomExists => "This Room already exists!",
            Self::RoomCreateFailed => "Failed to create room!",
            Self::RoomJoined => "Room joined!",
            Self::RoomNotFound => "Room not found!",
            Self::RoomLeft => "You left the room!",
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_line())
    }
}
