//! Event types for playmeterd -> client streaming

use playmeter_util::{Clock, SystemClock, TerminalId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{API_VERSION, LiveReading, ServiceStateSnapshot, SessionRecord};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: SystemClock.now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full state snapshot, sent after every state-changing command
    StateChanged(ServiceStateSnapshot),

    /// A terminal became occupied
    SessionStarted {
        terminal_id: TerminalId,
        name: String,
        started_at: Timestamp,
    },

    /// A terminal went idle and its session was billed
    SessionEnded(SessionRecord),

    /// Live elapsed time and projected cost for occupied terminals
    Tick { readings: Vec<LiveReading> },

    /// Hourly rate changed
    HourlyRateChanged { rate: f64 },

    /// History was cleared
    HistoryCleared { removed: usize },

    /// Service is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_event_serialization() {
        let event = Event::new(EventPayload::Tick {
            readings: vec![LiveReading {
                terminal_id: TerminalId::new(1),
                elapsed_ms: 1_800_000,
                projected_cost: 25.0,
            }],
        });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.api_version, API_VERSION);
        match parsed.payload {
            EventPayload::Tick { readings } => {
                assert_eq!(readings.len(), 1);
                assert_eq!(readings[0].projected_cost, 25.0);
            }
            other => panic!("Expected Tick, got {:?}", other),
        }
    }
}
