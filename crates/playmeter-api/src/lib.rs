//! Protocol types for playmeterd IPC
//!
//! This crate defines the stable API between playmeterd and clients:
//! - Shared data (session records, stats, terminal views, live readings)
//! - Commands (requests from clients) and responses
//! - Events (service -> clients)
//! - Versioning

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
