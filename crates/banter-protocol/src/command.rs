//! Client command parsing.
//!
//! A session is in one of two states — lobby (no current room) or
//! in-room — and each state has its own parse table. Matching is literal
//! prefix matching, not tokenization: the argument is the raw remainder
//! after the fixed prefix, which may be empty or contain spaces. The
//! remainder is validated by the registry, not here, so the caller can
//! map each failure to the right reply line.

use banter_core::RoomName;

/// Prefix for the display-name command. The trailing space is part of
/// the prefix: `set username` with no space after it matches nothing.
const SET_USERNAME_PREFIX: &str = "set username ";

/// Prefix for room creation.
const CREATE_ROOM_PREFIX: &str = "create-room ";

/// Prefix for joining an existing room.
const JOIN_ROOM_PREFIX: &str = "join-room ";

/// Exact line that closes the connection from the lobby.
const QUIT_LINE: &str = "quit";

/// Exact line that returns an in-room session to the lobby.
const LEAVE_ROOM_LINE: &str = "!leave-room";

/// A command recognized while the session is in the lobby.
///
/// Anything that parses to `None` is silently ignored — the lobby emits
/// no error replies for unrecognized input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyCommand {
    /// Close the connection (`quit`, exact match).
    Quit,

    /// Change the display name (`set username <name>`).
    ///
    /// The name is the raw remainder and may be empty; the registry
    /// rejects empty names.
    SetUsername(String),

    /// Create a room and enter it (`create-room <name>`).
    CreateRoom(RoomName),

    /// Join an existing room (`join-room <name>`).
    JoinRoom(RoomName),
}

impl LobbyCommand {
    /// Parses one lobby-state line, already stripped of its terminator.
    ///
    /// Returns `None` for anything outside the command table.
    pub fn parse(line: &str) -> Option<Self> {
        if line == QUIT_LINE {
            return Some(Self::Quit);
        }
        if let Some(name) = line.strip_prefix(SET_USERNAME_PREFIX) {
            return Some(Self::SetUsername(name.to_string()));
        }
        if let Some(room) = line.strip_prefix(CREATE_ROOM_PREFIX) {
            return Some(Self::CreateRoom(RoomName::from(room)));
        }
        if let Some(room) = line.strip_prefix(JOIN_ROOM_PREFIX) {
            return Some(Self::JoinRoom(RoomName::from(room)));
        }
        None
    }
}

/// Input while the session is in a room.
///
/// Total: every line is either the leave command or a chat line to relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomInput<'a> {
    /// Return to the lobby (`!leave-room`, exact match).
    Leave,

    /// Any other line, relayed verbatim to the room.
    ///
    /// Note that `quit` is NOT special in a room — it relays like any
    /// other chat line.
    Chat(&'a str),
}

impl<'a> RoomInput<'a> {
    /// Parses one in-room line, already stripped of its terminator.
    pub fn parse(line: &'a str) -> Self {
        if line == LEAVE_ROOM_LINE {
            Self::Leave
        } else {
            Self::Chat(line)
        }
    }
}
