//! Authoritative bomber game server: lobby admission, the deterministic
//! turn engine, and broadcast to connected players.

pub mod config;
pub mod connection;
pub mod engine;
pub mod lobby;
pub mod rng;
pub mod state;

pub use config::ServerConfig;
pub use engine::Engine;
