use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::predict::Outcome;
use crate::render::ResultView;

// ---------------------------------------------------------------------------
// Prediction log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the prediction log (`~/.liverisk/predictions.jsonl`).
///
/// One line per settled prediction, whether it was rendered or discarded
/// as stale. Only the outcome is recorded; the clinical inputs are not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    pub timestamp: String,
    /// Where the prediction was triggered: `"cli"` or `"web"`.
    pub source: String,
    pub endpoint: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub risk_percentage: Option<f64>,
    /// Color the result was rendered in: `"red"` or `"green"`.
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    pub latency_ms: u64,
    /// Whether the outcome reached the output container.
    #[serde(default = "default_true")]
    pub applied: bool,
}

fn default_true() -> bool {
    true
}

impl PredictionLogEntry {
    pub fn from_outcome(source: &str, endpoint: &str, outcome: &Outcome) -> Self {
        let (success, risk_percentage, error) = match &outcome.view {
            ResultView::Prediction(resp) => (true, Some(resp.risk_percentage), None),
            ResultView::Error(message) => (false, None, Some(message.clone())),
        };

        Self {
            timestamp: Utc::now().to_rfc3339(),
            source: source.to_string(),
            endpoint: endpoint.to_string(),
            success,
            risk_percentage,
            color: outcome.view.color().to_string(),
            error,
            latency_ms: outcome.latency_ms,
            applied: outcome.applied,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Log a settled prediction. Best-effort: failures are silently ignored.
pub fn log_prediction(source: &str, endpoint: &str, outcome: &Outcome) {
    let Some(path) = prediction_log_path() else {
        return;
    };
    let entry = PredictionLogEntry::from_outcome(source, endpoint, outcome);
    let _ = append_entry(&path, &entry);
}

pub fn append_entry(path: &Path, entry: &PredictionLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all entries from the prediction log.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries() -> Vec<PredictionLogEntry> {
    prediction_log_path()
        .map(|path| read_entries_from(&path))
        .unwrap_or_default()
}

pub fn read_entries_from(path: &Path) -> Vec<PredictionLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(std::result::Result::ok)
        .filter_map(|line| serde_json::from_str::<PredictionLogEntry>(&line).ok())
        .collect()
}

/// Keep only entries from the last `days` days (`None` keeps everything).
pub fn filter_since_days(
    entries: Vec<PredictionLogEntry>,
    days: Option<u32>,
) -> Vec<PredictionLogEntry> {
    let Some(days) = days else {
        return entries;
    };

    let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();

    entries
        .into_iter()
        .filter(|e| e.timestamp >= cutoff)
        .collect()
}

/// Return the path to the prediction log file.
pub fn prediction_log_path() -> Option<PathBuf> {
    crate::config::liverisk_home_dir().map(|dir| dir.join("predictions.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::protocol::{PredictionRequest, PredictionResponse};

    fn outcome(view: ResultView) -> Outcome {
        Outcome {
            generation: 1,
            request: PredictionRequest {
                age: Some(50),
                gender: "Male".to_string(),
                bmi: 25.0,
                alcohol_consumption: "None".to_string(),
                smoking_status: "Never".to_string(),
                hepatitis_b: 0,
                hepatitis_c: 0,
                liver_function_score: 50.0,
                alpha_fetoprotein_level: 5.0,
                cirrhosis_history: 0,
                family_history_cancer: 0,
                physical_activity_level: "High".to_string(),
                diabetes: 0,
            },
            view,
            applied: true,
            latency_ms: 42,
        }
    }

    #[test]
    fn entry_from_success() {
        let o = outcome(ResultView::Prediction(PredictionResponse {
            risk_percentage: 64.3,
            clinical_message: "Alerta".to_string(),
        }));
        let entry = PredictionLogEntry::from_outcome("cli", "http://x/predict", &o);
        assert!(entry.success);
        assert_eq!(entry.risk_percentage, Some(64.3));
        assert_eq!(entry.color, "red");
        assert_eq!(entry.error, None);
        assert_eq!(entry.latency_ms, 42);
    }

    #[test]
    fn entry_from_error() {
        let o = outcome(ResultView::Error("Error en la API".to_string()));
        let entry = PredictionLogEntry::from_outcome("web", "http://x/predict", &o);
        assert!(!entry.success);
        assert_eq!(entry.risk_percentage, None);
        assert_eq!(entry.error.as_deref(), Some("Error en la API"));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("risk_percentage"));
    }

    #[test]
    fn append_and_read_back_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("predictions.jsonl");

        let o = outcome(ResultView::Error("boom".to_string()));
        append_entry(&path, &PredictionLogEntry::from_outcome("cli", "e", &o)).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"not json\n")
            .unwrap();
        append_entry(&path, &PredictionLogEntry::from_outcome("web", "e", &o)).unwrap();

        let entries = read_entries_from(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, "cli");
        assert_eq!(entries[1].source, "web");
    }

    #[test]
    fn read_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_entries_from(&dir.path().join("absent.jsonl")).is_empty());
    }

    #[test]
    fn filter_since_days_drops_old_entries() {
        let o = outcome(ResultView::Error("x".to_string()));
        let recent = PredictionLogEntry::from_outcome("cli", "e", &o);
        let mut old = recent.clone();
        old.timestamp = (Utc::now() - chrono::Duration::days(10)).to_rfc3339();

        let kept = filter_since_days(vec![old.clone(), recent.clone()], Some(7));
        assert_eq!(kept, vec![recent.clone()]);
        assert_eq!(filter_since_days(vec![old, recent], None).len(), 2);
    }
}
