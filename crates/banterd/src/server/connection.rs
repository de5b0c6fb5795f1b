//! Connection handler for individual client connections.
//!
//! Each client connection gets its own `ConnectionHandler` that:
//! - Registers the session with the registry
//! - Reads newline-delimited text lines
//! - Interprets each line against the session's state (lobby / in-room)
//! - Queues replies on the session's outbound queue
//!
//! The socket write half is owned by a separate writer task fed by the
//! bounded outbound queue; replies and relayed chat lines travel the same
//! queue, so each recipient sees them in FIFO order, and the write half
//! is closed exactly once when the writer task drops it.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Connection errors are logged and result in graceful disconnect

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use banter_core::{RoomName, SessionId};
use banter_protocol::{LobbyCommand, Reply, RoomInput};

use crate::registry::{RegistryError, RegistryHandle};

/// Capacity of a session's outbound queue.
///
/// A full queue means the peer has stopped reading; broadcast fan-out
/// drops lines for that session rather than stalling the room.
pub const OUTBOUND_BUFFER: usize = 64;

/// Maximum accepted length of one inbound line, terminator included.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Connection handler for a single client.
///
/// Manages the read side of the connection: the line loop, command
/// interpretation, and registry bookkeeping from registration through
/// unregistration.
pub struct ConnectionHandler {
    /// Server-assigned session id
    id: SessionId,

    /// Buffered reader for incoming lines
    reader: BufReader<OwnedReadHalf>,

    /// Send side of the session's outbound queue
    outbound: mpsc::Sender<String>,

    /// Handle to the room/session registry
    registry: RegistryHandle,

    /// Parse-state mirror of the registry's current-room value.
    ///
    /// Both copies are only ever mutated through this session's own
    /// commands, so they cannot diverge.
    current_room: Option<RoomName>,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `id` - Server-assigned session id
    /// * `reader` - Read half of the TCP stream
    /// * `outbound` - Send side of the session's writer queue
    /// * `registry` - Handle to the registry
    pub fn new(
        id: SessionId,
        reader: OwnedReadHalf,
        outbound: mpsc::Sender<String>,
        registry: RegistryHandle,
    ) -> Self {
        Self {
            id,
            reader: BufReader::new(reader),
            outbound,
            registry,
            current_room: None,
        }
    }

    /// Runs the connection handler.
    ///
    /// This is the main entry point - registers the session, processes
    /// lines until the connection ends, then unregisters. Dropping the
    /// handler releases its outbound sender, letting the writer task
    /// drain any final reply and close the socket.
    pub async fn run(mut self) {
        if let Err(e) = self
            .registry
            .register(self.id, self.outbound.clone())
            .await
        {
            warn!(session = %self.id, error = %e, "Rejecting connection");
            return;
        }

        info!(session = %self.id, "Client connected");

        match self.process_lines().await {
            Ok(()) => debug!(session = %self.id, "Client disconnected"),
            Err(e) => info!(session = %self.id, error = %e, "Connection closed"),
        }

        self.registry.unregister(self.id).await;
    }

    /// Main line processing loop.
    ///
    /// Reads and interprets lines until the client quits, the peer closes
    /// the connection, or an unrecoverable error occurs.
    async fn process_lines(&mut self) -> Result<(), ConnectionError> {
        loop {
            let line = match self.read_line().await? {
                Some(line) => line,
                None => return Ok(()),
            };

            match self.current_room.clone() {
                None => {
                    if self.handle_lobby_line(&line).await? == Flow::Quit {
                        return Ok(());
                    }
                }
                Some(room) => self.handle_room_line(room, &line).await?,
            }
        }
    }

    /// Interprets one lobby-state line.
    ///
    /// Unrecognized lines are silently ignored - the lobby emits no error
    /// replies.
    async fn handle_lobby_line(&mut self, line: &str) -> Result<Flow, ConnectionError> {
        match LobbyCommand::parse(line) {
            None => {}

            Some(LobbyCommand::Quit) => {
                self.send_line(Reply::Bye.as_line()).await?;
                debug!(session = %self.id, "Client quit");
                return Ok(Flow::Quit);
            }

            Some(LobbyCommand::SetUsername(name)) => {
                let reply = match self.registry.set_name(self.id, name).await {
                    Ok(()) => Reply::UsernameChanged,
                    Err(RegistryError::InvalidName) => Reply::UsernameRejected,
                    Err(e) => return Err(ConnectionError::Registry(e)),
                };
                self.send_line(reply.as_line()).await?;
            }

            Some(LobbyCommand::CreateRoom(room)) => {
                let reply = match self.registry.create_room(self.id, room.clone()).await {
                    Ok(()) => {
                        self.current_room = Some(room);
                        Reply::RoomCreated
                    }
                    Err(RegistryError::RoomAlreadyExists(_)) => Reply::RoomExists,
                    Err(RegistryError::InvalidName) => Reply::RoomCreateFailed,
                    Err(e) => return Err(ConnectionError::Registry(e)),
                };
                self.send_line(reply.as_line()).await?;
            }

            Some(LobbyCommand::JoinRoom(room)) => {
                let reply = match self.registry.join_room(self.id, room.clone()).await {
                    Ok(()) => {
                        self.current_room = Some(room);
                        Reply::RoomJoined
                    }
                    // An empty name was never created, so the observable
                    // failure is the same as an unknown room.
                    Err(RegistryError::RoomNotFound(_) | RegistryError::InvalidName) => {
                        Reply::RoomNotFound
                    }
                    Err(e) => return Err(ConnectionError::Registry(e)),
                };
                self.send_line(reply.as_line()).await?;
            }
        }

        Ok(Flow::Continue)
    }

    /// Interprets one in-room line.
    async fn handle_room_line(
        &mut self,
        room: RoomName,
        line: &str,
    ) -> Result<(), ConnectionError> {
        match RoomInput::parse(line) {
            RoomInput::Leave => {
                self.registry
                    .leave_room(self.id)
                    .await
                    .map_err(ConnectionError::Registry)?;
                self.current_room = None;
                self.send_line(Reply::RoomLeft.as_line()).await
            }
            RoomInput::Chat(text) => {
                self.registry
                    .broadcast(self.id, room, text.to_string())
                    .await;
                Ok(())
            }
        }
    }

    /// Reads a single line from the client.
    ///
    /// Returns `Ok(None)` at end of stream. A final unterminated partial
    /// line is returned as-is; the following read reports the EOF.
    async fn read_line(&mut self) -> Result<Option<String>, ConnectionError> {
        let mut line = String::new();

        let bytes_read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| ConnectionError::Io(e.to_string()))?;

        if bytes_read == 0 {
            return Ok(None);
        }

        if line.len() > MAX_LINE_BYTES {
            return Err(ConnectionError::LineTooLong {
                size: line.len(),
                max: MAX_LINE_BYTES,
            });
        }

        // Strip the terminator: one \n, and one \r before it if present
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }

        Ok(Some(line))
    }

    /// Queues a reply line for the writer task.
    ///
    /// Awaits queue space: backpressure on a session's own replies only
    /// slows that session down.
    async fn send_line(&self, line: &str) -> Result<(), ConnectionError> {
        self.outbound
            .send(line.to_string())
            .await
            .map_err(|_| ConnectionError::OutboundClosed)
    }
}

/// Loop control for the lobby interpreter.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Spawns the writer task for one connection.
///
/// The task exclusively owns the socket write half. It drains the
/// outbound queue, writing each line with a trailing `\n` and flushing,
/// and exits when the queue closes (handler done and unregistered) or on
/// write error. Dropping the write half closes it exactly once.
pub fn spawn_writer(id: SessionId, write_half: OwnedWriteHalf, mut rx: mpsc::Receiver<String>) {
    tokio::spawn(async move {
        let mut writer = BufWriter::new(write_half);

        while let Some(line) = rx.recv().await {
            let result = async {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                Ok::<(), std::io::Error>(())
            }
            .await;

            if let Err(e) = result {
                debug!(session = %id, error = %e, "Write failed, stopping writer");
                break;
            }
        }

        debug!(session = %id, "Writer task stopped");
    });
}

/// Errors that can occur during connection handling.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Line too long: {size} bytes (max: {max})")]
    LineTooLong { size: usize, max: usize },

    #[error("Outbound queue closed")]
    OutboundClosed,

    #[error("Registry error: {0}")]
    Registry(#[from] crate::registry::RegistryError),
}
