//! Aggregate statistics, recomputed from the history on every call

use playmeter_api::{SessionRecord, Stats};

pub fn compute(records: &[SessionRecord]) -> Stats {
    Stats {
        total_sessions: records.len(),
        total_revenue: records.iter().map(|r| r.cost()).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playmeter_util::{TerminalId, Timestamp};

    #[test]
    fn test_empty_history() {
        assert_eq!(compute(&[]), Stats::default());
    }

    #[test]
    fn test_totals() {
        let records: Vec<_> = [10.0, 2.5, 0.0]
            .into_iter()
            .enumerate()
            .map(|(i, cost)| {
                SessionRecord::finalize(
                    TerminalId::new(i as u32 + 1),
                    format!("Screen {}", i + 1),
                    Timestamp::EPOCH,
                    Timestamp::from_millis(60_000),
                    cost,
                )
            })
            .collect();

        let stats = compute(&records);
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_revenue, 12.5);
    }
}
