//! Result rendering for the output container.
//!
//! An outcome is either a [`PredictionResponse`] or an error description.
//! Both are turned into a [`ResultView`] and written to an [`OutputSink`],
//! which replaces whatever the container held before. Nothing is retained
//! between renders.

use std::sync::Mutex;

use colored::Colorize;

use crate::predict::client::ApiError;
use crate::predict::protocol::PredictionResponse;

/// Risk percentages strictly above this value are shown as high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 50.0;

/// Display color for a risk percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskColor {
    Red,
    Green,
}

impl RiskColor {
    /// `Red` above [`HIGH_RISK_THRESHOLD`], `Green` otherwise (including
    /// exactly 50 and `NaN`).
    pub fn for_percentage(risk_percentage: f64) -> Self {
        if risk_percentage > HIGH_RISK_THRESHOLD {
            Self::Red
        } else {
            Self::Green
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
        }
    }
}

impl std::fmt::Display for RiskColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the output container should show.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Prediction(PredictionResponse),
    Error(String),
}

impl ResultView {
    pub fn from_outcome(outcome: Result<PredictionResponse, ApiError>) -> Self {
        match outcome {
            Ok(resp) => Self::Prediction(resp),
            Err(e) => Self::Error(e.to_string()),
        }
    }

    pub fn color(&self) -> RiskColor {
        match self {
            Self::Prediction(resp) => RiskColor::for_percentage(resp.risk_percentage),
            Self::Error(_) => RiskColor::Red,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// Render a view as the HTML fragment placed inside `#result`.
pub fn to_html(view: &ResultView) -> String {
    match view {
        ResultView::Prediction(resp) => {
            let color = RiskColor::for_percentage(resp.risk_percentage);
            format!(
                "<h3>📊 Resultado de Predicción</h3>\n\
                 <p><strong>Riesgo de cáncer de hígado:</strong> \
                 <span style=\"font-size:1.6em; color:{color}; font-weight:bold;\">{}%</span></p>\n\
                 <p><strong>Acción clínica recomendada:</strong> {}</p>",
                format_percentage(resp.risk_percentage),
                html_escape(&resp.clinical_message),
            )
        }
        ResultView::Error(message) => {
            format!(
                "<p style=\"color:red;\">❌ Error: {}</p>",
                html_escape(message)
            )
        }
    }
}

/// Format a number the way a browser prints it: integral values without a
/// fractional part, no negative zero, `Infinity` instead of `inf`, and
/// exponent notation (`1e-7`, `1e+21`) below 1e-6 and from 1e21 up.
pub fn format_percentage(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 {
        format!("{value:e}").replacen('e', "e+", 1)
    } else if value.abs() < 1e-6 {
        format!("{value:e}")
    } else {
        value.to_string()
    }
}

/// Minimal HTML entity escaping for text from the service or the network.
fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Render a view for the terminal.
pub fn to_terminal(view: &ResultView) -> String {
    match view {
        ResultView::Prediction(resp) => {
            let pct = format!("{}%", format_percentage(resp.risk_percentage));
            let pct = match RiskColor::for_percentage(resp.risk_percentage) {
                RiskColor::Red => pct.red().bold(),
                RiskColor::Green => pct.green().bold(),
            };
            format!(
                "{}\n  {} {}\n  {} {}",
                "📊 Resultado de Predicción".bold().cyan(),
                "Riesgo de cáncer de hígado:".bold(),
                pct,
                "Acción clínica recomendada:".bold(),
                resp.clinical_message,
            )
        }
        ResultView::Error(message) => format!("❌ Error: {message}").red().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Output containers
// ---------------------------------------------------------------------------

/// Destination of a rendered outcome. Each call fully replaces the previous
/// contents.
pub trait OutputSink: Send + Sync {
    fn replace(&self, view: &ResultView);
}

/// In-memory stand-in for the page's `#result` element.
#[derive(Debug, Default)]
pub struct HtmlContainer {
    inner_html: Mutex<String>,
}

impl HtmlContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner_html(&self) -> String {
        self.inner_html
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl OutputSink for HtmlContainer {
    fn replace(&self, view: &ResultView) {
        let html = to_html(view);
        *self
            .inner_html
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = html;
    }
}

/// Prints each outcome to stdout.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn replace(&self, view: &ResultView) {
        println!("{}", to_terminal(view));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(risk: f64, message: &str) -> ResultView {
        ResultView::Prediction(PredictionResponse {
            risk_percentage: risk,
            clinical_message: message.to_string(),
        })
    }

    #[test]
    fn threshold_is_strictly_greater_than_fifty() {
        assert_eq!(RiskColor::for_percentage(51.0), RiskColor::Red);
        assert_eq!(RiskColor::for_percentage(50.0), RiskColor::Green);
        assert_eq!(RiskColor::for_percentage(50.01), RiskColor::Red);
        assert_eq!(RiskColor::for_percentage(f64::NAN), RiskColor::Green);
    }

    #[test]
    fn zero_risk_renders_green_with_message() {
        let html = to_html(&prediction(0.0, "No action needed"));
        assert!(html.contains("color:green"));
        assert!(html.contains(">0%</span>"));
        assert!(html.contains("No action needed"));
        assert!(html.starts_with("<h3>"));
    }

    #[test]
    fn high_risk_renders_red() {
        let html = to_html(&prediction(51.0, "Alerta: Cita clínica inmediata."));
        assert!(html.contains("color:red"));
        assert!(html.contains(">51%</span>"));
    }

    #[test]
    fn error_renders_single_red_line() {
        let html = to_html(&ResultView::Error("Failed to fetch".to_string()));
        assert_eq!(html, "<p style=\"color:red;\">❌ Error: Failed to fetch</p>");
    }

    #[test]
    fn status_error_renders_generic_message() {
        let view = ResultView::from_outcome(Err(ApiError::Status(500)));
        assert_eq!(
            to_html(&view),
            "<p style=\"color:red;\">❌ Error: Error en la API</p>"
        );
    }

    #[test]
    fn message_text_is_escaped() {
        let html = to_html(&prediction(10.0, "<b>ok</b> & \"fine\""));
        assert!(html.contains("&lt;b&gt;ok&lt;/b&gt; &amp; &quot;fine&quot;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn percentage_formatting_matches_browser() {
        assert_eq!(format_percentage(51.0), "51");
        assert_eq!(format_percentage(12.34), "12.34");
        assert_eq!(format_percentage(-0.0), "0");
        assert_eq!(format_percentage(f64::NAN), "NaN");
        assert_eq!(format_percentage(f64::INFINITY), "Infinity");
    }

    #[test]
    fn percentage_formatting_switches_to_exponent_at_browser_bounds() {
        assert_eq!(format_percentage(0.000001), "0.000001");
        assert_eq!(format_percentage(0.0000001), "1e-7");
        assert_eq!(format_percentage(-0.00000015), "-1.5e-7");
        assert_eq!(format_percentage(1e20), "100000000000000000000");
        assert_eq!(format_percentage(1e21), "1e+21");
        assert_eq!(format_percentage(-2.5e22), "-2.5e+22");
    }

    #[test]
    fn container_replaces_previous_content() {
        let container = HtmlContainer::new();
        assert_eq!(container.inner_html(), "");
        container.replace(&prediction(80.0, "first"));
        container.replace(&ResultView::Error("second".to_string()));
        let html = container.inner_html();
        assert!(html.contains("second"));
        assert!(!html.contains("first"));
    }

    #[test]
    fn terminal_rendering_contains_text() {
        let out = to_terminal(&prediction(23.5, "Recomendación de seguimiento/chequeos."));
        assert!(out.contains("23.5%"));
        assert!(out.contains("Recomendación de seguimiento/chequeos."));
        let err = to_terminal(&ResultView::Error("connection refused".to_string()));
        assert!(err.contains("❌ Error: connection refused"));
    }

    #[test]
    fn view_color_for_errors_is_red() {
        assert_eq!(ResultView::Error("x".to_string()).color(), RiskColor::Red);
        assert_eq!(prediction(5.0, "x").color(), RiskColor::Green);
    }
}
