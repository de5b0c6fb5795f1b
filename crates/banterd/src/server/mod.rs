//! TCP server for the banter daemon.
//!
//! The server:
//! - Listens on a TCP socket for client connections
//! - Assigns each connection a monotonic session id
//! - Spawns a ConnectionHandler plus a writer task per client
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   ChatServer    │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ConnectionHandler│────▶│  RegistryHandle │
//! │  (per client)   │     │                 │
//! └─────────────────┘     └─────────────────┘
//!         │
//!         │ outbound queue
//!         ▼
//! ┌─────────────────┐
//! │   writer task   │
//! │  (per client)   │
//! └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Accept errors are logged and allow continued operation

mod connection;

pub use connection::{ConnectionError, ConnectionHandler, MAX_LINE_BYTES, OUTBOUND_BUFFER};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use banter_core::SessionId;

use crate::registry::RegistryHandle;

use self::connection::spawn_writer;

/// Default bind address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// TCP server for the banter daemon.
///
/// Accepts connections and hands each one to a connection handler.
pub struct ChatServer {
    /// Bound TCP listener
    listener: TcpListener,

    /// Handle to the room/session registry
    registry: RegistryHandle,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Monotonic session id source; the first connection gets 1
    session_counter: AtomicU64,
}

impl ChatServer {
    /// Binds the listener.
    ///
    /// A bind failure is fatal to the process: the caller logs it and
    /// exits rather than running degraded.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to bind, e.g. `0.0.0.0:8080`
    /// * `registry` - Handle to the registry
    /// * `cancel_token` - Token for graceful shutdown
    pub async fn bind(
        addr: &str,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            error: e.to_string(),
        })?;

        Ok(Self {
            listener,
            registry,
            cancel_token,
            session_counter: AtomicU64::new(1),
        })
    }

    /// Returns the bound local address (useful with an ephemeral port).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server.
    ///
    /// Accepts connections until the cancellation token is triggered.
    /// This method does not return until shutdown.
    pub async fn run(&self) {
        match self.local_addr() {
            Ok(addr) => info!(addr = %addr, "Chat server listening"),
            Err(_) => info!("Chat server listening"),
        }

        loop {
            tokio::select! {
                // Check for cancellation
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                // Accept new connection
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "Accepted connection");
                            self.handle_connection(stream);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }
            }
        }

        info!("Server stopped accepting connections");
    }

    /// Handles a new client connection by spawning its handler and
    /// writer tasks.
    fn handle_connection(&self, stream: TcpStream) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "Failed to set TCP_NODELAY");
        }

        let id = SessionId::new(self.session_counter.fetch_add(1, Ordering::Relaxed));
        let (read_half, write_half) = stream.into_split();

        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_BUFFER);
        spawn_writer(id, write_half, out_rx);

        let handler = ConnectionHandler::new(id, read_half, out_tx, self.registry.clone());
        tokio::spawn(handler.run());
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_addr() {
        assert_eq!(DEFAULT_BIND_ADDR, "0.0.0.0:8080");
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:8080".to_string(),
            error: "address in use".to_string(),
        };
        assert!(err.to_string().contains("0.0.0.0:8080"));
        assert!(err.to_string().contains("address in use"));
    }
}
