//! Embedded form page for liverisk.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - `GET /` — the clinical input form with an empty `#result` container
//! - `POST /predict` — runs a prediction for the submitted form and returns
//!   the page with `#result` replaced by the rendered outcome
//!
//! Launched via `liverisk serve` (default: `http://127.0.0.1:9747`).

mod frontend;

use std::io::{Cursor, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analytics::logger;
use crate::form::FormSnapshot;
use crate::predict::Predictor;
use crate::predict::client::PredictionService;
use crate::render::HtmlContainer;

/// Everything a request handler needs.
pub struct WebContext {
    pub service: Arc<dyn PredictionService>,
    /// Endpoint the service talks to, recorded in the prediction log.
    pub endpoint: String,
    pub log_predictions: bool,
}

/// A handler's reply before it is turned into a `tiny_http` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            body,
        }
    }

    fn into_response(self) -> Result<Response<Cursor<Vec<u8>>>> {
        let header = Header::from_bytes("Content-Type", self.content_type)
            .map_err(|_| anyhow::anyhow!("invalid content type header"))?;
        Ok(Response::from_data(self.body.into_bytes())
            .with_header(header)
            .with_status_code(StatusCode(self.status)))
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the form page server on the given address.
///
/// Blocks the current thread and handles requests sequentially. A failing
/// request gets a 500 reply; the server keeps running.
pub fn serve(addr: &str, open: bool, ctx: &WebContext) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("liverisk form running at http://{addr}");
    println!("Predictions are sent to {}", ctx.endpoint);
    println!("Press Ctrl+C to stop.\n");

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let reply = match read_body(&method, request.as_reader()) {
            Ok(body) => dispatch(&method, &url, body.as_deref(), ctx),
            Err(reply) => reply,
        };
        let status = reply.status;

        match reply.into_response() {
            Ok(resp) => {
                let _ = request.respond(resp);
            }
            Err(e) => {
                let resp = Response::from_string(e.to_string()).with_status_code(StatusCode(500));
                let _ = request.respond(resp);
            }
        }

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

/// Read the body of a POST request. Other methods carry no body.
///
/// A body that is not UTF-8 or cannot be read is answered with a 400 here,
/// before any form parsing.
fn read_body(method: &Method, reader: &mut dyn Read) -> Result<Option<String>, Reply> {
    if !matches!(method, Method::Post) {
        return Ok(None);
    }

    let mut buf = String::new();
    match reader.read_to_string(&mut buf) {
        Ok(_) => Ok(Some(buf)),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(Reply::html(
            400,
            "<p>request body is not valid UTF-8</p>".to_string(),
        )),
        Err(e) => Err(Reply::html(
            400,
            format!("<p>failed to read request body: {e}</p>"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(method: &Method, url: &str, body: Option<&str>, ctx: &WebContext) -> Reply {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            Reply::html(200, frontend::render_page(None, ""))
        }
        (&Method::Post, "/predict") => handle_predict(body.unwrap_or(""), ctx),
        _ => Reply::json(404, r#"{"error": "not found"}"#.to_string()),
    }
}

/// `POST /predict` — run one prediction for the submitted form.
fn handle_predict(body: &str, ctx: &WebContext) -> Reply {
    let snapshot = FormSnapshot::from_form_body(body);
    let container = Arc::new(HtmlContainer::new());
    let predictor = Predictor::new(Arc::clone(&ctx.service), container.clone());

    match predictor.predict(&snapshot) {
        Ok(outcome) => {
            if ctx.log_predictions {
                logger::log_prediction("web", &ctx.endpoint, &outcome);
            }
            Reply::html(
                200,
                frontend::render_page(Some(&snapshot), &container.inner_html()),
            )
        }
        // The page always declares every field, so this only happens for
        // hand-crafted submissions.
        Err(e) => Reply::html(400, format!("<p>{e}</p>")),
    }
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
