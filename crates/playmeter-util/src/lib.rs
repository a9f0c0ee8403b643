//! Shared utilities for playmeter
//!
//! This crate provides:
//! - ID types (TerminalId, RecordId, ClientId, JobId)
//! - Millisecond timestamps and the injectable `Clock`
//! - Duration formatting helpers
//! - Default paths for socket, data, and config

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
