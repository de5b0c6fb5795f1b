//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending
//! commands to the registry actor. Each connection task holds a clone.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use tokio::sync::{mpsc, oneshot};

use banter_core::{RoomName, SessionId};

use super::commands::{RegistryCommand, RegistryError, SessionInfo};

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with the registry actor.
///
/// This is a cheap-to-clone handle that can be shared across tasks.
/// All methods are async and communicate with the actor via channels.
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Creates a new registry handle around the actor's command channel.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Registers a newly accepted connection.
    ///
    /// `outbound` is the send side of the session's bounded writer queue.
    ///
    /// # Errors
    ///
    /// - `RegistryError::SessionAlreadyExists` if the id is taken
    /// - `RegistryError::RegistryFull` if the registry is at capacity
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn register(
        &self,
        id: SessionId,
        outbound: mpsc::Sender<String>,
    ) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Register {
                id,
                outbound,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Changes a session's display name.
    ///
    /// # Errors
    ///
    /// - `RegistryError::InvalidName` if the name is empty
    /// - `RegistryError::SessionNotFound` if the session doesn't exist
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn set_name(&self, id: SessionId, name: String) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::SetName {
                id,
                name,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Creates a room and moves the caller into it.
    ///
    /// # Errors
    ///
    /// - `RegistryError::InvalidName` if the name is empty
    /// - `RegistryError::RoomAlreadyExists` if the name is known
    /// - `RegistryError::SessionNotFound` if the session doesn't exist
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn create_room(&self, id: SessionId, room: RoomName) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::CreateRoom {
                id,
                room,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Moves the caller into an existing room.
    ///
    /// # Errors
    ///
    /// - `RegistryError::InvalidName` if the name is empty
    /// - `RegistryError::RoomNotFound` if the name is unknown
    /// - `RegistryError::SessionNotFound` if the session doesn't exist
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn join_room(&self, id: SessionId, room: RoomName) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::JoinRoom {
                id,
                room,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Returns the caller to the lobby. Unconditional; no failure mode
    /// beyond the actor being gone.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn leave_room(&self, id: SessionId) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::LeaveRoom { id, respond_to: tx })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Relays a chat line to every other current member of `room`.
    ///
    /// Fire-and-forget: send errors are ignored (the actor may be
    /// shutting down, in which case the connection is about to end too).
    pub async fn broadcast(&self, from: SessionId, room: RoomName, line: String) {
        let _ = self
            .sender
            .send(RegistryCommand::Broadcast { from, room, line })
            .await;
    }

    /// Queries a session's current state.
    ///
    /// Returns `None` if the session doesn't exist or if communication
    /// with the actor fails.
    pub async fn get_session(&self, id: SessionId) -> Option<SessionInfo> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::GetSession { id, respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()?
    }

    /// Removes a disconnected session. Fire-and-forget and idempotent.
    pub async fn unregister(&self, id: SessionId) {
        let _ = self.sender.send(RegistryCommand::Unregister { id }).await;
    }

    /// Check if the actor is still running.
    ///
    /// Returns `true` if the command channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let handle = RegistryHandle::new(cmd_tx);
        (handle, cmd_rx)
    }

    #[tokio::test]
    async fn test_handle_is_clone() {
        let (handle, _rx) = create_test_handle();
        let _cloned = handle.clone();
        // Compiles = test passes
    }

    #[tokio::test]
    async fn test_register_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::Register { id, respond_to, .. }) = rx.recv().await {
                assert_eq!(id, SessionId::new(7));
                let _ = respond_to.send(Ok(()));
                return true;
            }
            false
        });

        let (out_tx, _out_rx) = mpsc::channel(16);
        let result = handle.register(SessionId::new(7), out_tx).await;
        assert!(result.is_ok());
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_register_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx); // Close the channel

        let (out_tx, _out_rx) = mpsc::channel(16);
        let result = handle.register(SessionId::new(1), out_tx).await;

        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_create_room_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::CreateRoom {
                id,
                room,
                respond_to,
            }) = rx.recv().await
            {
                assert_eq!(id, SessionId::new(1));
                assert_eq!(room.as_str(), "r1");
                let _ = respond_to.send(Err(RegistryError::RoomAlreadyExists(room)));
                return true;
            }
            false
        });

        let result = handle.create_room(SessionId::new(1), RoomName::from("r1")).await;
        assert!(matches!(result, Err(RegistryError::RoomAlreadyExists(_))));
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_leave_room_channel_closed() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.leave_room(SessionId::new(1)).await;
        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_broadcast_ignores_closed_channel() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        // Should not panic or error
        handle
            .broadcast(SessionId::new(1), RoomName::from("r1"), "hello".to_string())
            .await;
    }

    #[tokio::test]
    async fn test_get_session_returns_none_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.get_session(SessionId::new(1)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unregister_ignores_closed_channel() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        handle.unregister(SessionId::new(1)).await;
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (handle, rx) = create_test_handle();

        assert!(handle.is_connected());

        drop(rx);
        // Need to send to detect closure
        handle.unregister(SessionId::new(1)).await;

        assert!(!handle.is_connected());
    }
}
