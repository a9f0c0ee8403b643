//! Session engine

use playmeter_api::{
    API_VERSION, LiveReading, ServiceStateSnapshot, SessionRecord, Stats, TerminalState,
    TerminalView,
};
use playmeter_config::Config;
use playmeter_util::{Clock, TerminalId, Timestamp};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    CoreEvent, HistoryStore, HourlyRate, LiveTicker, RateSettings, RateSource, RegistryError,
    TerminalRegistry, billing, stats,
};

/// Rejected session transitions. A failed call changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Unknown terminal: {0}")]
    UnknownTerminal(TerminalId),

    #[error("Terminal {terminal_id} is {state:?}")]
    InvalidState {
        terminal_id: TerminalId,
        state: TerminalState,
    },
}

impl From<RegistryError> for SessionError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownTerminal(id) => SessionError::UnknownTerminal(id),
            RegistryError::AlreadyOccupied(terminal_id) => SessionError::InvalidState {
                terminal_id,
                state: TerminalState::Occupied,
            },
            RegistryError::NotOccupied(terminal_id) => SessionError::InvalidState {
                terminal_id,
                state: TerminalState::Idle,
            },
        }
    }
}

/// A session that has just begun
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSession {
    pub terminal_id: TerminalId,
    pub name: String,
    pub started_at: Timestamp,
}

impl From<StartedSession> for CoreEvent {
    fn from(started: StartedSession) -> Self {
        CoreEvent::SessionStarted {
            terminal_id: started.terminal_id,
            name: started.name,
            started_at: started.started_at,
        }
    }
}

/// Owns the terminals, the history, the billing settings and the live ticker
pub struct SessionEngine {
    registry: TerminalRegistry,
    history: HistoryStore,
    rates: RateSettings,
    ticker: LiveTicker,
    clock: Arc<dyn Clock>,
}

impl SessionEngine {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let registry = TerminalRegistry::new(
            config
                .terminals
                .iter()
                .map(|t| (t.id, t.name.clone())),
        );
        let rates = RateSettings::new(
            HourlyRate::new(config.billing.default_hourly_rate),
            config.billing.currency.clone(),
        );

        info!(
            terminal_count = registry.len(),
            hourly_rate = %rates.hourly_rate(),
            currency = rates.currency(),
            "Session engine initialized"
        );

        Self {
            registry,
            history: HistoryStore::new(),
            rates,
            ticker: LiveTicker::new(config.service.tick_interval),
            clock,
        }
    }

    /// Load persisted state. Every terminal restarts idle.
    pub fn restore(&mut self, rate: Option<f64>, records: Vec<SessionRecord>) {
        if let Some(rate) = rate {
            self.rates.set(rate);
        }
        self.history = HistoryStore::from_records(records);
        self.registry.reset();
        self.ticker.cancel_all();

        info!(
            hourly_rate = %self.rates.hourly_rate(),
            history_count = self.history.count(),
            "Persisted state restored"
        );
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn registry(&self) -> &TerminalRegistry {
        &self.registry
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn hourly_rate(&self) -> HourlyRate {
        self.rates.hourly_rate()
    }

    pub fn currency(&self) -> &str {
        self.rates.currency()
    }

    /// Occupy an idle terminal starting now
    pub fn start(&mut self, terminal_id: TerminalId) -> Result<StartedSession, SessionError> {
        let started_at = self.clock.now();
        self.registry.set_occupied(terminal_id, started_at)?;
        self.ticker.arm(terminal_id, started_at);

        let name = self
            .registry
            .get(terminal_id)
            .map(|t| t.name().to_string())
            .unwrap_or_default();

        info!(
            terminal_id = %terminal_id,
            name = %name,
            started_at = started_at.as_millis(),
            "Session started"
        );

        Ok(StartedSession {
            terminal_id,
            name,
            started_at,
        })
    }

    /// End the session on an occupied terminal and bill it at the current rate
    pub fn stop(&mut self, terminal_id: TerminalId) -> Result<SessionRecord, SessionError> {
        let name = match self.registry.get(terminal_id) {
            None => return Err(SessionError::UnknownTerminal(terminal_id)),
            Some(t) if !t.is_occupied() => {
                return Err(SessionError::InvalidState {
                    terminal_id,
                    state: t.state(),
                });
            }
            Some(t) => t.name().to_string(),
        };

        self.ticker.cancel(terminal_id);

        let ended_at = self.clock.now();
        let started_at = self.registry.set_idle(terminal_id)?;
        let duration_ms = ended_at.millis_since(started_at);
        let rate = self.rates.hourly_rate();
        let cost = billing::cost(duration_ms, rate);

        let record = SessionRecord::finalize(terminal_id, name, started_at, ended_at, cost);
        self.history.append(record.clone());

        info!(
            terminal_id = %terminal_id,
            record_id = %record.id(),
            duration_ms,
            hourly_rate = %rate,
            cost,
            "Session stopped"
        );

        Ok(record)
    }

    /// Replace the hourly rate. Running sessions are billed at whatever rate
    /// is in effect when they stop.
    pub fn set_hourly_rate(&mut self, input: f64) -> HourlyRate {
        let rate = self.rates.set(input);
        info!(hourly_rate = %rate, "Hourly rate changed");
        rate
    }

    /// Remove all history, returning how many records were removed
    pub fn clear_history(&mut self) -> usize {
        let removed = self.history.clear();
        info!(removed, "History cleared");
        removed
    }

    pub fn stats(&self) -> Stats {
        stats::compute(self.history.all())
    }

    /// Readings for every occupied terminal whose live schedule is due
    pub fn tick(&mut self) -> Vec<LiveReading> {
        let now = self.clock.now();
        let readings = self.ticker.due(now, &self.registry, &self.rates);
        if !readings.is_empty() {
            debug!(count = readings.len(), "Live tick");
        }
        readings
    }

    /// On-demand reading for one terminal
    pub fn reading(&self, terminal_id: TerminalId) -> Option<LiveReading> {
        let terminal = self.registry.get(terminal_id)?;
        Some(LiveTicker::read(terminal, self.clock.now(), &self.rates))
    }

    pub fn terminal_views(&self) -> Vec<TerminalView> {
        let now = self.clock.now();
        self.registry
            .iter()
            .map(|terminal| {
                let reading = LiveTicker::read(terminal, now, &self.rates);
                TerminalView {
                    terminal_id: terminal.id(),
                    name: terminal.name().to_string(),
                    state: terminal.state(),
                    started_at: terminal.started_at(),
                    elapsed_ms: reading.elapsed_ms,
                    projected_cost: reading.projected_cost,
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> ServiceStateSnapshot {
        ServiceStateSnapshot {
            api_version: API_VERSION,
            taken_at: self.clock.now(),
            hourly_rate: self.rates.hourly_rate().get(),
            currency: self.rates.currency().to_string(),
            terminals: self.terminal_views(),
            active_terminals: self.registry.occupied_count(),
            stats: self.stats(),
        }
    }

    #[cfg(test)]
    fn ticker(&self) -> &LiveTicker {
        &self.ticker
    }
}
