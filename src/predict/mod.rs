/// Predict operation: read the form, call the service, render the outcome.
///
/// [`Predictor::submit`] reads the form synchronously, then hands the HTTP
/// exchange to a worker thread and returns immediately. When the exchange
/// settles the worker writes the outcome to the output sink. Submissions
/// are never de-duplicated and in-flight requests cannot be cancelled.
///
/// # Concurrent submissions
///
/// Two submissions may race. What ends up in the container depends on the
/// [`RacePolicy`]:
///
/// - [`RacePolicy::LastResolvedWins`] (default): every outcome is written,
///   so whichever response settles last is shown, even if it belongs to the
///   older submission.
/// - [`RacePolicy::LatestSubmissionWins`]: each submission takes a
///   generation number and an outcome is written only if no newer
///   submission exists. Stale responses are discarded.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use serde::{Deserialize, Serialize};

pub mod client;
pub mod protocol;

use crate::form::{self, FieldSource, FormError};
use crate::render::{OutputSink, ResultView};
use client::PredictionService;
use protocol::PredictionRequest;

/// How outcomes of overlapping submissions are applied to the container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RacePolicy {
    #[default]
    LastResolvedWins,
    LatestSubmissionWins,
}

impl std::fmt::Display for RacePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastResolvedWins => write!(f, "last-resolved-wins"),
            Self::LatestSubmissionWins => write!(f, "latest-submission-wins"),
        }
    }
}

/// Result of one settled submission.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Generation number assigned at submit time (starts at 1).
    pub generation: u64,
    pub request: PredictionRequest,
    pub view: ResultView,
    /// Whether the view was written to the sink. `false` only when the
    /// policy discarded a stale response.
    pub applied: bool,
    pub latency_ms: u64,
}

/// A submission whose network exchange may still be in flight.
#[derive(Debug)]
pub struct Pending {
    generation: u64,
    handle: JoinHandle<Outcome>,
}

impl Pending {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_settled(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the exchange settles and the outcome has been rendered.
    pub fn wait(self) -> Outcome {
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Drives submissions from a form to a prediction service and an output
/// container.
pub struct Predictor {
    service: Arc<dyn PredictionService>,
    sink: Arc<dyn OutputSink>,
    policy: RacePolicy,
    generation: Arc<AtomicU64>,
    commit: Arc<Mutex<()>>,
}

impl Predictor {
    pub fn new(service: Arc<dyn PredictionService>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            service,
            sink,
            policy: RacePolicy::default(),
            generation: Arc::new(AtomicU64::new(0)),
            commit: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_policy(mut self, policy: RacePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RacePolicy {
        self.policy
    }

    /// Read the form and start the prediction without waiting for it.
    ///
    /// A missing form field aborts the submission here: nothing is sent and
    /// the container is left untouched.
    pub fn submit(&self, source: &impl FieldSource) -> Result<Pending, FormError> {
        let request = form::build_request(source)?;
        Ok(self.submit_request(request))
    }

    /// Start the prediction for an already-built request.
    pub fn submit_request(&self, request: PredictionRequest) -> Pending {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let service = Arc::clone(&self.service);
        let sink = Arc::clone(&self.sink);
        let latest = Arc::clone(&self.generation);
        let commit = Arc::clone(&self.commit);
        let policy = self.policy;

        let handle = thread::spawn(move || {
            let start = Instant::now();
            let view = ResultView::from_outcome(service.predict(&request));
            let latency_ms = start.elapsed().as_millis() as u64;

            let applied = {
                let _guard = commit.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let current = match policy {
                    RacePolicy::LastResolvedWins => true,
                    RacePolicy::LatestSubmissionWins => {
                        latest.load(Ordering::SeqCst) == generation
                    }
                };
                if current {
                    sink.replace(&view);
                }
                current
            };

            Outcome {
                generation,
                request,
                view,
                applied,
                latency_ms,
            }
        });

        Pending { generation, handle }
    }

    /// Submit and wait for the outcome.
    pub fn predict(&self, source: &impl FieldSource) -> Result<Outcome, FormError> {
        Ok(self.submit(source)?.wait())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormSnapshot;
    use crate::predict::client::ApiError;
    use crate::predict::protocol::PredictionResponse;
    use crate::render::HtmlContainer;

    struct FixedService(Result<PredictionResponse, ApiError>);

    impl PredictionService for FixedService {
        fn predict(&self, _request: &PredictionRequest) -> Result<PredictionResponse, ApiError> {
            self.0.clone()
        }
    }

    fn complete_form() -> FormSnapshot {
        let mut form = FormSnapshot::new();
        for id in form::VALUE_FIELDS {
            form.set_value(id, "1");
        }
        for id in form::CHECKBOX_FIELDS {
            form.set_checked(id, false);
        }
        form
    }

    #[test]
    fn predict_renders_success() {
        let container = Arc::new(HtmlContainer::new());
        let predictor = Predictor::new(
            Arc::new(FixedService(Ok(PredictionResponse {
                risk_percentage: 72.5,
                clinical_message: "Alerta".to_string(),
            }))),
            container.clone(),
        );

        let outcome = predictor.predict(&complete_form()).unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.generation, 1);
        assert!(container.inner_html().contains(">72.5%</span>"));
    }

    #[test]
    fn predict_renders_failure() {
        let container = Arc::new(HtmlContainer::new());
        let predictor = Predictor::new(
            Arc::new(FixedService(Err(ApiError::Status(503)))),
            container.clone(),
        );

        let outcome = predictor.predict(&complete_form()).unwrap();
        assert!(outcome.view.is_error());
        assert_eq!(
            container.inner_html(),
            "<p style=\"color:red;\">❌ Error: Error en la API</p>"
        );
    }

    #[test]
    fn missing_field_aborts_without_rendering() {
        let container = Arc::new(HtmlContainer::new());
        let predictor = Predictor::new(
            Arc::new(FixedService(Err(ApiError::Status(500)))),
            container.clone(),
        );

        let mut form = complete_form();
        form.remove(form::AGE);
        let err = predictor.submit(&form).unwrap_err();
        assert_eq!(err, FormError::MissingElement("age".to_string()));
        assert_eq!(container.inner_html(), "");
    }

    #[test]
    fn generations_increase_per_submission() {
        let predictor = Predictor::new(
            Arc::new(FixedService(Err(ApiError::Status(500)))),
            Arc::new(HtmlContainer::new()),
        );
        let first = predictor.submit(&complete_form()).unwrap();
        let second = predictor.submit(&complete_form()).unwrap();
        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
        first.wait();
        second.wait();
    }

    #[test]
    fn race_policy_display() {
        assert_eq!(RacePolicy::LastResolvedWins.to_string(), "last-resolved-wins");
        assert_eq!(
            RacePolicy::LatestSubmissionWins.to_string(),
            "latest-submission-wins"
        );
    }
}
