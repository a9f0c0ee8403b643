//! Core events emitted by the engine

use playmeter_api::{EventPayload, SessionRecord};
use playmeter_util::{TerminalId, Timestamp};

use crate::HourlyRate;

/// Events emitted by the session engine
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A terminal became occupied
    SessionStarted {
        terminal_id: TerminalId,
        name: String,
        started_at: Timestamp,
    },

    /// A session was billed and appended to history
    SessionEnded(SessionRecord),

    HourlyRateChanged { rate: HourlyRate },

    HistoryCleared { removed: usize },
}

impl From<CoreEvent> for EventPayload {
    fn from(event: CoreEvent) -> Self {
        match event {
            CoreEvent::SessionStarted {
                terminal_id,
                name,
                started_at,
            } => EventPayload::SessionStarted {
                terminal_id,
                name,
                started_at,
            },
            CoreEvent::SessionEnded(record) => EventPayload::SessionEnded(record),
            CoreEvent::HourlyRateChanged { rate } => {
                EventPayload::HourlyRateChanged { rate: rate.get() }
            }
            CoreEvent::HistoryCleared { removed } => EventPayload::HistoryCleared { removed },
        }
    }
}
