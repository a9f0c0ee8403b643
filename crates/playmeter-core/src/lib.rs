//! Session engine for playmeterd
//!
//! This crate is the heart of playmeterd, containing:
//! - The terminal registry (Idle <-> Occupied)
//! - Billing of completed sessions at the hourly rate in effect at stop
//! - The append-only session history and its aggregate stats
//! - Live elapsed/cost readings with per-terminal cancelable schedules

pub mod billing;
mod engine;
mod events;
mod history;
mod registry;
mod settings;
pub mod stats;
mod ticker;

pub use engine::*;
pub use events::*;
pub use history::*;
pub use registry::*;
pub use settings::*;
pub use ticker::*;
