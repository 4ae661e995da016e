//! Easel Server - WebSocket transport shell
//!
//! Binds the session core to the outside world:
//! - Handshake gate authorizing connection upgrades
//! - warp WebSocket endpoint and per-connection lifecycle
//! - Collaborator interfaces (identity provider, asset/container
//!   directory) with in-memory implementations
//! - Server configuration and demo dataset seeding

#![warn(unreachable_pub)]

pub mod config;
pub mod directory;
pub mod gate;
pub mod seed;
pub mod server;

// Re-exports for convenience
pub use config::{ConfigError, ServerConfig};
pub use directory::{
    AssetDirectory, IdentityProvider, MemoryDirectory, MemoryIdentity, MemoryMembership,
};
pub use gate::{HandshakeError, HandshakeGate, SessionTicket, UpgradeRequest};
pub use seed::SeedData;
pub use server::CollabServer;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
