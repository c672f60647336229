//! Event tallies and logging for a sim run.

use std::collections::BTreeMap;

use riposte_core::CombatEvent;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Running tally of combat events.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventReport {
    counts: BTreeMap<&'static str, u64>,
    #[serde(skip)]
    json: bool,
}

impl EventReport {
    /// Empty report; `json` logs every event as a JSON line.
    #[must_use]
    pub fn new(json: bool) -> Self {
        Self {
            counts: BTreeMap::new(),
            json,
        }
    }

    /// Counts and logs one event.
    pub fn record(&mut self, event: &CombatEvent, now: f64) {
        *self.counts.entry(event.name()).or_insert(0) += 1;

        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => info!(target: "riposte::events", now, "{line}"),
                Err(e) => warn!("Failed to serialize event: {e}"),
            }
        } else {
            debug!(now, ?event, "{}", event.name());
        }
    }

    /// Number of events recorded under `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Total events recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Logs the tallies.
    pub fn summary(&self) {
        for (name, count) in &self.counts {
            info!("  {name}: {count}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riposte_common::ActorId;

    #[test]
    fn test_counts_by_name() {
        let mut report = EventReport::new(false);
        let actor = ActorId::from_raw(1);
        report.record(&CombatEvent::Death { actor }, 0.0);
        report.record(
            &CombatEvent::Hurt {
                actor,
                amount: 3.0,
                source: None,
            },
            0.0,
        );
        report.record(
            &CombatEvent::Hurt {
                actor,
                amount: 2.0,
                source: None,
            },
            0.1,
        );

        assert_eq!(report.count("hurt"), 2);
        assert_eq!(report.count("death"), 1);
        assert_eq!(report.count("parried"), 0);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_report_serializes_counts() {
        let mut report = EventReport::new(true);
        report.record(
            &CombatEvent::Death {
                actor: ActorId::from_raw(4),
            },
            1.0,
        );
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"counts":{"death":1}}"#);
    }
}
