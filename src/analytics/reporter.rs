//! History reporter: aggregates the prediction log for `liverisk history`.

use crate::analytics::logger::{self, PredictionLogEntry};

/// Summary of the prediction log.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySummary {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    /// Successful predictions rendered red.
    pub high_risk: usize,
    /// Mean risk over successful predictions, `None` if there were none.
    pub mean_risk: Option<f64>,
    pub mean_latency_ms: u64,
    /// Outcomes dropped as stale under the latest-submission-wins policy.
    pub discarded: usize,
}

impl HistorySummary {
    /// Share of successful predictions that were high risk, in percent.
    pub fn high_risk_pct(&self) -> f64 {
        if self.successes == 0 {
            0.0
        } else {
            (self.high_risk as f64 / self.successes as f64) * 100.0
        }
    }
}

/// Summarize the log, optionally limited to the last `days` days.
pub fn compute_summary(days: Option<u32>) -> (HistorySummary, Vec<PredictionLogEntry>) {
    let entries = logger::filter_since_days(logger::read_all_entries(), days);
    (build_summary(&entries), entries)
}

pub fn build_summary(entries: &[PredictionLogEntry]) -> HistorySummary {
    if entries.is_empty() {
        return HistorySummary::default();
    }

    let successes: Vec<f64> = entries.iter().filter_map(|e| e.risk_percentage).collect();
    let high_risk = entries
        .iter()
        .filter(|e| e.success && e.color == "red")
        .count();

    let mean_risk = if successes.is_empty() {
        None
    } else {
        Some(successes.iter().sum::<f64>() / successes.len() as f64)
    };

    let mean_latency_ms =
        entries.iter().map(|e| e.latency_ms).sum::<u64>() / entries.len() as u64;

    HistorySummary {
        total: entries.len(),
        successes: entries.iter().filter(|e| e.success).count(),
        failures: entries.iter().filter(|e| !e.success).count(),
        high_risk,
        mean_risk,
        mean_latency_ms,
        discarded: entries.iter().filter(|e| !e.applied).count(),
    }
}

/// The last `n` entries, newest first.
pub fn recent(entries: &[PredictionLogEntry], n: usize) -> Vec<&PredictionLogEntry> {
    entries.iter().rev().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(risk: Option<f64>, latency_ms: u64) -> PredictionLogEntry {
        PredictionLogEntry {
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            source: "cli".to_string(),
            endpoint: "http://127.0.0.1:8000/predict".to_string(),
            success: risk.is_some(),
            risk_percentage: risk,
            color: match risk {
                Some(r) if r <= 50.0 => "green".to_string(),
                _ => "red".to_string(),
            },
            error: risk.is_none().then(|| "Error en la API".to_string()),
            latency_ms,
            applied: true,
        }
    }

    #[test]
    fn empty_log_summary() {
        let summary = build_summary(&[]);
        assert_eq!(summary, HistorySummary::default());
        assert_eq!(summary.high_risk_pct(), 0.0);
    }

    #[test]
    fn summary_counts_outcomes() {
        let entries = vec![
            entry(Some(80.0), 100),
            entry(Some(20.0), 200),
            entry(None, 300),
            entry(Some(50.0), 400),
        ];
        let summary = build_summary(&entries);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.successes, 3);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.high_risk, 1);
        assert_eq!(summary.mean_risk, Some(50.0));
        assert_eq!(summary.mean_latency_ms, 250);
        assert!((summary.high_risk_pct() - 33.333).abs() < 0.01);
    }

    #[test]
    fn summary_counts_discarded() {
        let mut stale = entry(Some(10.0), 5);
        stale.applied = false;
        let summary = build_summary(&[stale, entry(Some(12.0), 5)]);
        assert_eq!(summary.discarded, 1);
    }

    #[test]
    fn recent_is_newest_first() {
        let entries = vec![entry(Some(1.0), 1), entry(Some(2.0), 2), entry(Some(3.0), 3)];
        let latest = recent(&entries, 2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].risk_percentage, Some(3.0));
        assert_eq!(latest[1].risk_percentage, Some(2.0));
    }
}
