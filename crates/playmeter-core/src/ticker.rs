//! Live elapsed/cost readings for occupied terminals
//!
//! Each occupied terminal has at most one schedule, which remembers the
//! `started_at` it was armed for. A schedule whose terminal no longer has
//! that start is stale: it yields nothing and is dropped, so a tick that
//! comes due after its session ended does nothing.
//!
//! Readings are for display only. Final billing is computed by the engine at
//! stop time and never reads these values.

use playmeter_api::LiveReading;
use playmeter_util::{TerminalId, Timestamp};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::{RateSource, Terminal, TerminalRegistry, billing};

/// Default interval between live readings
pub const DEFAULT_TICK_CADENCE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct Schedule {
    started_at: Timestamp,
    next_due: Timestamp,
}

#[derive(Debug)]
pub struct LiveTicker {
    cadence_ms: i64,
    schedules: BTreeMap<TerminalId, Schedule>,
}

impl Default for LiveTicker {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_CADENCE)
    }
}

impl LiveTicker {
    pub fn new(cadence: Duration) -> Self {
        let cadence_ms = i64::try_from(cadence.as_millis()).unwrap_or(i64::MAX).max(1);
        Self {
            cadence_ms,
            schedules: BTreeMap::new(),
        }
    }

    /// Arm a schedule for a session that started at `started_at`, replacing
    /// any schedule the terminal already had
    pub fn arm(&mut self, terminal_id: TerminalId, started_at: Timestamp) {
        let replaced = self
            .schedules
            .insert(
                terminal_id,
                Schedule {
                    started_at,
                    next_due: started_at.saturating_add_millis(self.cadence_ms),
                },
            )
            .is_some();

        debug!(terminal_id = %terminal_id, replaced, "Live ticker armed");
    }

    /// Cancel the terminal's schedule. Returns whether one was armed.
    pub fn cancel(&mut self, terminal_id: TerminalId) -> bool {
        let cancelled = self.schedules.remove(&terminal_id).is_some();
        if cancelled {
            debug!(terminal_id = %terminal_id, "Live ticker cancelled");
        }
        cancelled
    }

    pub fn cancel_all(&mut self) {
        self.schedules.clear();
    }

    pub fn is_armed(&self, terminal_id: TerminalId) -> bool {
        self.schedules.contains_key(&terminal_id)
    }

    pub fn armed_count(&self) -> usize {
        self.schedules.len()
    }

    /// Readings for every schedule whose due time has passed. Each fired
    /// schedule advances to its next slot after `now`; schedules whose
    /// session is gone are dropped.
    pub fn due(
        &mut self,
        now: Timestamp,
        registry: &TerminalRegistry,
        rate: &dyn RateSource,
    ) -> Vec<LiveReading> {
        let mut readings = Vec::new();
        let mut stale = Vec::new();

        for (&terminal_id, schedule) in self.schedules.iter_mut() {
            if now < schedule.next_due {
                continue;
            }

            let terminal = match registry.get(terminal_id) {
                Some(t) if t.started_at() == Some(schedule.started_at) => t,
                _ => {
                    stale.push(terminal_id);
                    continue;
                }
            };

            readings.push(Self::read(terminal, now, rate));

            let behind = now.millis_since(schedule.next_due);
            let steps = behind / self.cadence_ms + 1;
            schedule.next_due = schedule
                .next_due
                .saturating_add_millis(steps.saturating_mul(self.cadence_ms));
        }

        for terminal_id in stale {
            self.schedules.remove(&terminal_id);
            debug!(terminal_id = %terminal_id, "Dropped schedule for ended session");
        }

        readings
    }

    /// Elapsed time and projected cost of `terminal` at `now`. Idle terminals
    /// read as zero.
    pub fn read(terminal: &Terminal, now: Timestamp, rate: &dyn RateSource) -> LiveReading {
        match terminal.started_at() {
            None => LiveReading::idle(terminal.id()),
            Some(started_at) => {
                let elapsed_ms = now.millis_since(started_at);
                LiveReading {
                    terminal_id: terminal.id(),
                    elapsed_ms,
                    projected_cost: billing::cost(elapsed_ms, rate.hourly_rate()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HourlyRate;

    const ID: TerminalId = TerminalId::new(1);

    fn registry() -> TerminalRegistry {
        TerminalRegistry::new(vec![
            (TerminalId::new(1), "Screen 1".to_string()),
            (TerminalId::new(2), "Screen 2".to_string()),
        ])
    }

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_read_occupied_and_idle() {
        let mut registry = registry();
        registry.set_occupied(ID, at(0)).unwrap();
        let rate = HourlyRate::new(60.0);

        let reading = LiveTicker::read(registry.get(ID).unwrap(), at(30 * 60_000), &rate);
        assert_eq!(reading.elapsed_ms, 30 * 60_000);
        assert!((reading.projected_cost - 30.0).abs() < 1e-9);

        let idle = LiveTicker::read(registry.get(TerminalId::new(2)).unwrap(), at(5_000), &rate);
        assert_eq!(idle, LiveReading::idle(TerminalId::new(2)));
    }

    #[test]
    fn test_rearmed_session_reads_from_new_start() {
        let mut registry = registry();
        let mut ticker = LiveTicker::default();
        let rate = HourlyRate::new(50.0);

        registry.set_occupied(ID, at(0)).unwrap();
        ticker.arm(ID, at(0));

        // Session ends and a new one starts on the same terminal
        assert!(ticker.cancel(ID));
        registry.set_idle(ID).unwrap();
        registry.set_occupied(ID, at(10_000)).unwrap();
        ticker.arm(ID, at(10_000));

        assert!(ticker.due(at(10_500), &registry, &rate).is_empty());
        let readings = ticker.due(at(12_000), &registry, &rate);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].elapsed_ms, 2_000);
    }

    #[test]
    fn test_cancelled_schedule_never_fires() {
        let mut registry = registry();
        let mut ticker = LiveTicker::default();
        let rate = HourlyRate::new(50.0);

        registry.set_occupied(ID, at(0)).unwrap();
        ticker.arm(ID, at(0));
        ticker.cancel(ID);

        assert!(ticker.due(at(5_000), &registry, &rate).is_empty());
        assert!(!ticker.cancel(ID));
    }

    #[test]
    fn test_schedule_armed_for_old_start_is_stale() {
        let mut registry = registry();
        let mut ticker = LiveTicker::default();
        let rate = HourlyRate::new(50.0);

        // Armed for a start the terminal no longer has
        ticker.arm(ID, at(0));
        registry.set_occupied(ID, at(3_000)).unwrap();

        assert!(ticker.due(at(4_000), &registry, &rate).is_empty());
        assert!(!ticker.is_armed(ID));
    }

    #[test]
    fn test_due_advances_by_cadence() {
        let mut registry = registry();
        let mut ticker = LiveTicker::new(Duration::from_secs(1));
        let rate = HourlyRate::new(50.0);

        registry.set_occupied(ID, at(0)).unwrap();
        ticker.arm(ID, at(0));

        assert!(ticker.due(at(500), &registry, &rate).is_empty());
        assert_eq!(ticker.due(at(1_000), &registry, &rate).len(), 1);
        assert!(ticker.due(at(1_500), &registry, &rate).is_empty());

        // Falling behind yields one reading, not a burst
        let readings = ticker.due(at(5_200), &registry, &rate);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].elapsed_ms, 5_200);
        assert!(ticker.due(at(5_900), &registry, &rate).is_empty());
        assert_eq!(ticker.due(at(6_000), &registry, &rate).len(), 1);
    }

    #[test]
    fn test_due_drops_schedules_for_ended_sessions() {
        let mut registry = registry();
        let mut ticker = LiveTicker::default();
        let rate = HourlyRate::new(50.0);

        registry.set_occupied(ID, at(0)).unwrap();
        ticker.arm(ID, at(0));
        registry.set_idle(ID).unwrap();

        assert!(ticker.due(at(2_000), &registry, &rate).is_empty());
        assert!(!ticker.is_armed(ID));
    }

    #[test]
    fn test_rearm_replaces_schedule() {
        let mut ticker = LiveTicker::default();

        ticker.arm(ID, at(0));
        ticker.arm(ID, at(0));

        assert!(ticker.is_armed(ID));
        assert_eq!(ticker.armed_count(), 1);
    }
}
