//! CLI command implementations for liverisk.
//!
//! Provides subcommand handlers for:
//! - `liverisk predict` — build a request from flags or a snapshot file and render the result
//! - `liverisk serve` — embedded form page
//! - `liverisk history` — prediction log summary and recent outcomes
//! - `liverisk health` — config sources, service reachability, log status
//! - `liverisk config show|init|set|reset` — configuration management

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::analytics::logger::{self, PredictionLogEntry};
use crate::analytics::reporter::{self, HistorySummary};
use crate::config;
use crate::form::{self, FormSnapshot};
use crate::predict::Predictor;
use crate::predict::client::HttpPredictionClient;
use crate::render::TerminalSink;
use crate::web::{self, WebContext};

/// Output format for history output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// liverisk predict
// ---------------------------------------------------------------------------

/// Form input for `liverisk predict`.
///
/// Values are raw text, coerced exactly like the form page coerces them.
/// Checkbox flags mark a field as checked.
#[derive(Debug, Default, Args)]
pub struct PredictArgs {
    /// Load the form from a TOML or JSON snapshot; flags override its values
    #[arg(long)]
    pub form: Option<PathBuf>,

    /// Age in years
    #[arg(long, allow_hyphen_values = true, required_unless_present = "form")]
    pub age: Option<String>,
    /// Male | Female
    #[arg(long, required_unless_present = "form")]
    pub gender: Option<String>,
    /// Body mass index
    #[arg(long, allow_hyphen_values = true, required_unless_present = "form")]
    pub bmi: Option<String>,
    /// None | Light | Moderate | Heavy
    #[arg(long, required_unless_present = "form")]
    pub alcohol_consumption: Option<String>,
    /// Never | Former | Current
    #[arg(long, required_unless_present = "form")]
    pub smoking_status: Option<String>,
    /// Liver function score
    #[arg(long, allow_hyphen_values = true, required_unless_present = "form")]
    pub liver_function_score: Option<String>,
    /// Alpha-fetoprotein level
    #[arg(long, allow_hyphen_values = true, required_unless_present = "form")]
    pub alpha_fetoprotein_level: Option<String>,
    /// Low | Moderate | High
    #[arg(long, required_unless_present = "form")]
    pub physical_activity_level: Option<String>,

    #[arg(long)]
    pub hepatitis_b: bool,
    #[arg(long)]
    pub hepatitis_c: bool,
    #[arg(long)]
    pub cirrhosis_history: bool,
    #[arg(long)]
    pub family_history_cancer: bool,
    #[arg(long)]
    pub diabetes: bool,

    /// Print the JSON request body instead of sending it
    #[arg(long)]
    pub print_request: bool,
}

impl PredictArgs {
    /// Assemble the form state: the snapshot file if given, then the flags
    /// on top. A checkbox the file leaves out is unchecked, as it is for a
    /// submitted HTML form.
    pub fn to_snapshot(&self) -> Result<FormSnapshot> {
        let mut snapshot = match &self.form {
            Some(path) => FormSnapshot::load(path)?,
            None => FormSnapshot::new(),
        };
        for id in form::CHECKBOX_FIELDS {
            if snapshot.field(id).is_none() {
                snapshot.set_checked(id, false);
            }
        }

        let values = [
            (form::AGE, &self.age),
            (form::GENDER, &self.gender),
            (form::BMI, &self.bmi),
            (form::ALCOHOL_CONSUMPTION, &self.alcohol_consumption),
            (form::SMOKING_STATUS, &self.smoking_status),
            (form::LIVER_FUNCTION_SCORE, &self.liver_function_score),
            (form::ALPHA_FETOPROTEIN_LEVEL, &self.alpha_fetoprotein_level),
            (form::PHYSICAL_ACTIVITY_LEVEL, &self.physical_activity_level),
        ];
        for (id, value) in values {
            if let Some(value) = value {
                snapshot.set_value(id, value.clone());
            }
        }

        let checks = [
            (form::HEPATITIS_B, self.hepatitis_b),
            (form::HEPATITIS_C, self.hepatitis_c),
            (form::CIRRHOSIS_HISTORY, self.cirrhosis_history),
            (form::FAMILY_HISTORY_CANCER, self.family_history_cancer),
            (form::DIABETES, self.diabetes),
        ];
        for (id, checked) in checks {
            if checked {
                snapshot.set_checked(id, true);
            }
        }

        Ok(snapshot)
    }
}

/// Run one prediction and print the rendered outcome.
pub fn run_predict(args: &PredictArgs) -> Result<()> {
    let snapshot = args.to_snapshot()?;
    let cfg = config::load();

    if args.print_request {
        let request = form::build_request(&snapshot)?;
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let client = HttpPredictionClient::from_config(&cfg.client);
    let predictor = Predictor::new(Arc::new(client), Arc::new(TerminalSink))
        .with_policy(cfg.client.race_policy);

    let outcome = predictor.predict(&snapshot)?;

    if cfg.logging.enabled {
        logger::log_prediction("cli", &cfg.client.endpoint, &outcome);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// liverisk serve
// ---------------------------------------------------------------------------

/// Serve the embedded form page until interrupted.
pub fn run_serve(addr: Option<&str>, no_open: bool) -> Result<()> {
    let cfg = config::load();
    let addr = addr.unwrap_or(&cfg.web.addr);

    let ctx = WebContext {
        service: Arc::new(HttpPredictionClient::from_config(&cfg.client)),
        endpoint: cfg.client.endpoint.clone(),
        log_predictions: cfg.logging.enabled,
    };

    web::serve(addr, cfg.web.open_browser && !no_open, &ctx)
}

// ---------------------------------------------------------------------------
// liverisk history
// ---------------------------------------------------------------------------

/// Show the prediction log summary and the most recent outcomes.
pub fn run_history(format: OutputFormat, days: Option<u32>, limit: usize) -> Result<()> {
    let (summary, entries) = reporter::compute_summary(days);

    if summary.total == 0 {
        println!(
            "{}",
            "No predictions logged yet. Run `liverisk predict` or `liverisk serve`.".yellow()
        );
        return Ok(());
    }

    let recent = reporter::recent(&entries, limit);

    match format {
        OutputFormat::Json => print_history_json(&summary, &recent)?,
        OutputFormat::Csv => print_history_csv(&recent),
        OutputFormat::Table => print_history_table(&summary, &recent),
    }

    Ok(())
}

fn print_history_table(summary: &HistorySummary, recent: &[&PredictionLogEntry]) {
    println!("{}", "liverisk Prediction History".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    println!("  {} {}", "Predictions:  ".bold(), summary.total);
    println!(
        "  {} {}  {} {}",
        "Succeeded:    ".bold(),
        summary.successes,
        "Failed:".bold(),
        summary.failures
    );
    println!(
        "  {} {} ({:.1}%)",
        "High risk:    ".bold(),
        summary.high_risk,
        summary.high_risk_pct()
    );
    if let Some(mean) = summary.mean_risk {
        println!("  {} {:.2}%", "Mean risk:    ".bold(), mean);
    }
    println!("  {} {}ms", "Mean latency: ".bold(), summary.mean_latency_ms);
    if summary.discarded > 0 {
        println!("  {} {}", "Discarded:    ".bold(), summary.discarded);
    }
    println!();

    println!("{}", "Recent Predictions".bold().cyan());
    println!(
        "  {:<20} {:<6} {:>8} {:>9}  Detail",
        "Time", "Source", "Risk", "Latency"
    );
    println!("  {}", "-".repeat(58));

    for entry in recent {
        let risk = entry
            .risk_percentage
            .map(|r| format!("{r:.2}%"))
            .unwrap_or_else(|| "-".to_string());
        let risk = format!("{risk:>8}");
        let risk = match entry.color.as_str() {
            "red" => risk.red(),
            _ => risk.green(),
        };
        let detail = entry.error.as_deref().unwrap_or("");
        println!(
            "  {:<20} {:<6} {} {:>7}ms  {}",
            truncate(&short_timestamp(&entry.timestamp), 20),
            entry.source,
            risk,
            entry.latency_ms,
            truncate(detail, 30).dimmed(),
        );
    }
}

fn print_history_json(summary: &HistorySummary, recent: &[&PredictionLogEntry]) -> Result<()> {
    let value = serde_json::json!({
        "total": summary.total,
        "successes": summary.successes,
        "failures": summary.failures,
        "high_risk": summary.high_risk,
        "high_risk_pct": summary.high_risk_pct(),
        "mean_risk": summary.mean_risk,
        "mean_latency_ms": summary.mean_latency_ms,
        "discarded": summary.discarded,
        "recent": recent,
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_history_csv(recent: &[&PredictionLogEntry]) {
    println!("timestamp,source,endpoint,success,risk_percentage,color,latency_ms,error");
    for e in recent {
        println!(
            "{},{},{},{},{},{},{},{}",
            e.timestamp,
            e.source,
            e.endpoint,
            e.success,
            e.risk_percentage.map(|r| r.to_string()).unwrap_or_default(),
            e.color,
            e.latency_ms,
            csv_field(e.error.as_deref().unwrap_or("")),
        );
    }
}

// ---------------------------------------------------------------------------
// liverisk health
// ---------------------------------------------------------------------------

pub fn run_health() -> Result<()> {
    println!("{}", "liverisk Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();

    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.liverisk/config.toml found"
        } else {
            "not found (run `liverisk config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".liverisk.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = HttpPredictionClient::from_config(&cfg.client);
    let reachable = client.is_reachable();
    let detail = if reachable {
        format!("reachable at {}", cfg.client.endpoint)
    } else {
        format!("not reachable at {}", cfg.client.endpoint)
    };
    print_health_item("Prediction service", reachable, &detail);

    let timeout = match cfg.client.timeout() {
        Some(t) => format!("{}ms", t.as_millis()),
        None => "none".to_string(),
    };
    print_health_item("Request timeout", true, &timeout);
    print_health_item("Race policy", true, &cfg.client.race_policy.to_string());

    let log_path = logger::prediction_log_path();
    let log_exists = log_path.as_ref().map(|p| p.exists()).unwrap_or(false);
    print_health_item(
        "Prediction log",
        log_exists || !cfg.logging.enabled,
        &if !cfg.logging.enabled {
            "disabled".to_string()
        } else if log_exists {
            format!("{} entries", logger::read_all_entries().len())
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// liverisk config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective liverisk Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.liverisk/config.toml", global_exists);
    print_source(".liverisk.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "LIVERISK_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.liverisk/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)
        .with_context(|| format!("failed to set config key '{key}'"))?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `2026-03-01T14:22:05.123+00:00` → `2026-03-01 14:22:05`.
fn short_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field if it contains a delimiter, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FieldSource;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("cáncer", 6), "cáncer");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_short_timestamp() {
        assert_eq!(
            short_timestamp("2026-03-01T14:22:05.123+00:00"),
            "2026-03-01 14:22:05"
        );
        assert_eq!(short_timestamp("garbage"), "garbage");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn predict_args_flags_build_full_form() {
        let args = PredictArgs {
            age: Some("58".to_string()),
            gender: Some("Male".to_string()),
            bmi: Some("26.2".to_string()),
            alcohol_consumption: Some("Light".to_string()),
            smoking_status: Some("Never".to_string()),
            liver_function_score: Some("55".to_string()),
            alpha_fetoprotein_level: Some("4.1".to_string()),
            physical_activity_level: Some("Moderate".to_string()),
            cirrhosis_history: true,
            ..PredictArgs::default()
        };

        let snapshot = args.to_snapshot().unwrap();
        let request = form::build_request(&snapshot).unwrap();
        assert_eq!(request.age, Some(58));
        assert_eq!(request.cirrhosis_history, 1);
        assert_eq!(request.diabetes, 0);
    }

    #[test]
    fn predict_args_flags_override_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patient.toml");
        std::fs::write(
            &path,
            r#"
age = 40
gender = "Female"
hepatitis_b = false
"#,
        )
        .unwrap();

        let args = PredictArgs {
            form: Some(path),
            age: Some("41".to_string()),
            hepatitis_b: true,
            ..PredictArgs::default()
        };

        let snapshot = args.to_snapshot().unwrap();
        assert_eq!(snapshot.value(form::AGE).as_deref(), Some("41"));
        assert_eq!(snapshot.value(form::GENDER).as_deref(), Some("Female"));
        assert_eq!(snapshot.checked(form::HEPATITIS_B), Some(true));
        assert_eq!(snapshot.checked(form::DIABETES), Some(false));
        assert_eq!(
            form::build_request(&snapshot).unwrap_err(),
            form::FormError::MissingElement(form::BMI.to_string())
        );
    }

    #[test]
    fn snapshot_file_without_unchecked_boxes_builds_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patient.toml");
        std::fs::write(
            &path,
            r#"
age = 63
gender = "Male"
bmi = 28.4
alcohol_consumption = "Moderate"
smoking_status = "Current"
liver_function_score = 38.5
alpha_fetoprotein_level = 22.1
physical_activity_level = "Low"
hepatitis_c = true
"#,
        )
        .unwrap();

        let args = PredictArgs {
            form: Some(path),
            ..PredictArgs::default()
        };

        let request = form::build_request(&args.to_snapshot().unwrap()).unwrap();
        assert_eq!(request.hepatitis_c, 1);
        assert_eq!(request.hepatitis_b, 0);
        assert_eq!(request.cirrhosis_history, 0);
        assert_eq!(request.family_history_cancer, 0);
        assert_eq!(request.diabetes, 0);
        assert_eq!(request.age, Some(63));
    }
}
