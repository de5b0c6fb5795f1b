//! Banter Protocol - Line protocol for the chat relay
//!
//! This crate provides parsing for the newline-delimited text protocol
//! spoken between clients and the daemon: lobby commands, in-room input,
//! and the fixed server reply lines.
//!
//! The protocol has no framing beyond the line terminator and no
//! structured encoding; commands are matched by literal prefix and the
//! argument is everything after the prefix, embedded spaces included.

pub mod command;
pub mod reply;

pub use command::{LobbyCommand, RoomInput};
pub use reply::Reply;
