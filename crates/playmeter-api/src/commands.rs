//! Command types for the playmeterd protocol

use playmeter_util::{ClientId, TerminalId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{
    API_VERSION, HealthStatus, ImagePayload, ServiceStateSnapshot, SessionRecord, Stats,
    TerminalView,
};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    /// Start on an occupied terminal or stop on an idle one
    InvalidState,
    UnknownTerminal,
    ImageEditUnavailable,
    ImageEditFailed,
    InternalError,
}

/// Order of records in a history listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    /// Storage order
    #[default]
    OldestFirst,
    /// Display order of the session log
    NewestFirst,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Get the full service state
    GetState,

    /// List terminals with live projections
    ListTerminals,

    /// Start a session on an idle terminal
    StartSession { terminal_id: TerminalId },

    /// Stop the session on an occupied terminal and bill it
    StopSession { terminal_id: TerminalId },

    /// Change the hourly rate (negative input is clamped to zero)
    SetHourlyRate { rate: f64 },

    /// Get all finalized records. Oldest first unless asked otherwise.
    GetHistory {
        #[serde(default)]
        order: HistoryOrder,
    },

    /// Get aggregate statistics
    GetStats,

    /// Remove every finalized record
    ClearHistory,

    /// Ask the image service to edit an image
    EditImage {
        image: ImagePayload,
        instruction: String,
    },

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Get health status
    GetHealth,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    State(ServiceStateSnapshot),
    Terminals {
        terminals: Vec<TerminalView>,
    },
    SessionStarted {
        terminal_id: TerminalId,
        started_at: Timestamp,
    },
    SessionStopped(SessionRecord),
    HourlyRateSet {
        rate: f64,
    },
    History {
        records: Vec<SessionRecord>,
    },
    Stats(Stats),
    HistoryCleared {
        removed: usize,
    },
    ImageEdited(ImagePayload),
    Subscribed {
        client_id: ClientId,
    },
    Unsubscribed,
    Health(HealthStatus),
    Pong,
}
