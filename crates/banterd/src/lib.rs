//! Banter Daemon - Room registry and chat relay server
//!
//! This crate provides the core infrastructure for the banter daemon:
//! - `registry` - Registry actor owning rooms and the connected-session index
//! - `server` - TCP server accepting client connections
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     banterd daemon                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │   ChatServer    │────▶│       RegistryActor         │    │
//! │  │ (TCP listener)  │     │  (rooms + session owner)    │    │
//! │  └────────┬────────┘     └──────────────┬──────────────┘    │
//! │           │ accept                      │ fan-out           │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │ConnectionHandler│     │  per-session outbound queue │    │
//! │  │ (per client)    │     │  (bounded, writer task)     │    │
//! │  └─────────────────┘     └─────────────────────────────┘    │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod registry;
pub mod server;
