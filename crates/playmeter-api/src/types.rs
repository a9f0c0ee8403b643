//! Shared types for the playmeterd API

use playmeter_util::{RecordId, TerminalId, Timestamp};
use serde::{Deserialize, Serialize};

/// Milliseconds in one minute
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Finalized summary of one completed session.
///
/// Built once, at the moment a terminal goes idle, and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    id: RecordId,
    terminal_id: TerminalId,
    terminal_name: String,
    started_at: Timestamp,
    ended_at: Timestamp,
    duration_minutes: f64,
    cost: f64,
}

impl SessionRecord {
    /// Finalize a session with a fresh id.
    ///
    /// An `ended_at` before `started_at` is raised to `started_at`, yielding a
    /// zero-length record.
    pub fn finalize(
        terminal_id: TerminalId,
        terminal_name: impl Into<String>,
        started_at: Timestamp,
        ended_at: Timestamp,
        cost: f64,
    ) -> Self {
        let ended_at = ended_at.max(started_at);
        let duration_ms = ended_at.millis_since(started_at);

        Self {
            id: RecordId::new(),
            terminal_id,
            terminal_name: terminal_name.into(),
            started_at,
            ended_at,
            duration_minutes: duration_ms as f64 / MS_PER_MINUTE,
            cost,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn terminal_id(&self) -> TerminalId {
        self.terminal_id
    }

    pub fn terminal_name(&self) -> &str {
        &self.terminal_name
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn ended_at(&self) -> Timestamp {
        self.ended_at
    }

    pub fn duration_ms(&self) -> i64 {
        self.ended_at.millis_since(self.started_at)
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_minutes
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Check invariants of a record that came from outside (e.g. storage)
    pub fn is_consistent(&self) -> bool {
        if self.ended_at < self.started_at {
            return false;
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return false;
        }
        let expected = self.duration_ms() as f64 / MS_PER_MINUTE;
        (self.duration_minutes - expected).abs() <= expected.abs() * 1e-12 + 1e-9
    }
}

/// Aggregate statistics over the history
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: usize,
    pub total_revenue: f64,
}

/// Occupancy state of a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Idle,
    Occupied,
}

/// Display-only projection of a terminal at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    pub terminal_id: TerminalId,
    pub elapsed_ms: i64,
    pub projected_cost: f64,
}

impl LiveReading {
    pub fn idle(terminal_id: TerminalId) -> Self {
        Self {
            terminal_id,
            elapsed_ms: 0,
            projected_cost: 0.0,
        }
    }
}

/// View of a terminal for UI display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalView {
    pub terminal_id: TerminalId,
    pub name: String,
    pub state: TerminalState,
    pub started_at: Option<Timestamp>,
    pub elapsed_ms: i64,
    pub projected_cost: f64,
}

/// Full service state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStateSnapshot {
    pub api_version: u32,
    pub taken_at: Timestamp,
    pub hourly_rate: f64,
    pub currency: String,
    pub terminals: Vec<TerminalView>,
    pub active_terminals: usize,
    pub stats: Stats,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub store_ok: bool,
    pub image_editor_configured: bool,
}

/// An image carried as base64 with its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    /// Base64 (standard alphabet) encoded bytes
    pub data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Parse a `data:<mime>;base64,<data>` URL
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if mime_type.is_empty() || data.is_empty() {
            return None;
        }
        Some(Self::new(mime_type, data))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
