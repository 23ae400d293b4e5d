/// HTTP client for the prediction service.
///
/// Posts a [`PredictionRequest`] as JSON to the configured `/predict`
/// endpoint using the synchronous `ureq` client and shape-checks the reply.
/// Every failure collapses into an [`ApiError`], which the renderer shows
/// through the single error path.
use std::time::Duration;

use thiserror::Error;

use super::protocol::{PredictionRequest, PredictionResponse};
use crate::config::schema::ClientConfig;

/// Failure of a prediction call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The service answered with a non-2xx status. The status is kept for
    /// logging but never shown to the user.
    #[error("Error en la API")]
    Status(u16),
    /// The request never completed (connection refused, DNS, timeout, I/O).
    #[error("{0}")]
    Transport(String),
    /// A 2xx reply whose body is not a well-formed prediction.
    #[error("invalid prediction response: {0}")]
    MalformedResponse(String),
}

/// Anything that can answer a prediction request.
pub trait PredictionService: Send + Sync {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ApiError>;
}

/// Synchronous HTTP prediction client.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpPredictionClient {
    /// Build a client for `endpoint`. `None` means no timeout at all: a hung
    /// service blocks only the worker waiting on it.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            endpoint: endpoint.into(),
            agent: builder.build(),
        }
    }

    /// Build a client from the resolved `[client]` config section.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.endpoint.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check whether anything is listening at the endpoint's host and port.
    ///
    /// Any HTTP answer counts, including 404 or 405: the goal is to tell
    /// "service down" apart from "service up".
    pub fn is_reachable(&self) -> bool {
        let result = ureq::get(&self.endpoint)
            .timeout(Duration::from_secs(3))
            .call();

        !matches!(result, Err(ureq::Error::Transport(_)))
    }
}

impl PredictionService for HttpPredictionClient {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ApiError> {
        let resp = match self.agent.post(&self.endpoint).send_json(request) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => return Err(ApiError::Status(code)),
            Err(other) => return Err(ApiError::Transport(other.to_string())),
        };

        if !(200..300).contains(&resp.status()) {
            return Err(ApiError::Status(resp.status()));
        }

        let body = resp
            .into_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        PredictionResponse::from_json(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}
