//! Room and session registry using the Actor pattern.
//!
//! The registry is the process-wide authority over known rooms and the
//! connected-session index. It receives commands via a tokio mpsc channel
//! and processes them sequentially in a single task, which is the only
//! synchronization boundary around the shared maps: connection tasks
//! never touch them directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ConnectionHandler│────▶│  RegistryActor  │────▶│ outbound queues  │
//! └─────────────────┘     └─────────────────┘     └──────────────────┘
//!         │                       │                       │
//!         │   RegistryCommand     │   try_send fan-out    │
//!         │   (mpsc channel)      │   (bounded, per       │
//!         ▼                       ▼    session)           ▼
//!    create/join/leave       HashMap<SessionId,      writer task per
//!    broadcast/unregister    SessionEntry> +         connection
//!                            HashSet<RoomName>
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::mpsc;

mod actor;
mod commands;
mod handle;

pub use actor::{RegistryActor, MAX_SESSIONS};
pub use commands::{RegistryCommand, RegistryError, SessionInfo};
pub use handle::RegistryHandle;

/// Command channel buffer size
const COMMAND_BUFFER: usize = 100;

/// Spawn the registry actor and return a handle for interaction.
///
/// This function:
/// 1. Creates the command channel
/// 2. Spawns the RegistryActor on a tokio task
/// 3. Returns a RegistryHandle for client use
///
/// The actor runs until every handle clone is dropped.
///
/// # Example
///
/// ```no_run
/// use banterd::registry::spawn_registry;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry();
///
///     // Use handle to interact with registry
///     let info = handle.get_session(banter_core::SessionId::new(1)).await;
/// }
/// ```
pub fn spawn_registry() -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = RegistryActor::new(cmd_rx);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx)
}
