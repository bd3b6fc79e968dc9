//! Background expansion worker.
//!
//! Flushed buffer content goes to the expansion service off the input
//! thread: jobs in over one channel, results back over another. The owning
//! thread drains results with [`ExpansionWorker::try_recv`], typically after
//! the waker has nudged its event loop.

use crate::config::Settings;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Connection parameters for the expansion service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl From<&Settings> for ServiceConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            timeout_ms: settings.timeout_ms,
        }
    }
}

/// One flushed buffer awaiting expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionJob {
    /// Semantic tokens (or literal words) for POST /expand.
    Tokens(Vec<String>),
    /// Continuous phoneme string for POST /convert.
    Phonemes { ipa: String, lang: String },
}

/// Failure talking to the expansion service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service rejected credentials (HTTP {0})")]
    Auth(u16),
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("malformed service response: {0}")]
    Malformed(String),
}

pub type ExpansionResult = Result<String, ServiceError>;

#[derive(Deserialize)]
struct TextResponse {
    text: String,
}

/// Handle to the worker thread. Dropping it closes the job channel and the
/// thread exits on its own.
pub struct ExpansionWorker {
    jobs: Sender<ExpansionJob>,
    results: Receiver<ExpansionResult>,
}

impl ExpansionWorker {
    /// Spawns the worker. The optional waker runs on the worker thread
    /// right after each result is queued, so the owning thread can be
    /// prodded to call [`try_recv`](Self::try_recv).
    pub fn spawn(config: ServiceConfig, waker: Option<Box<dyn Fn() + Send + Sync>>) -> Self {
        let (job_tx, job_rx) = unbounded::<ExpansionJob>();
        let (result_tx, result_rx) = unbounded::<ExpansionResult>();

        thread::spawn(move || {
            let mut client = ServiceClient::new(config);
            while let Ok(job) = job_rx.recv() {
                let result = client.run(&job);
                if result_tx.send(result).is_err() {
                    break;
                }
                if let Some(ref wake) = waker {
                    wake();
                }
            }
            debug!("expansion worker stopped");
        });

        Self {
            jobs: job_tx,
            results: result_rx,
        }
    }

    pub fn submit(&self, job: ExpansionJob) {
        if self.jobs.send(job).is_err() {
            warn!("expansion worker is gone, job dropped");
        }
    }

    /// Non-blocking poll for the next finished result.
    pub fn try_recv(&self) -> Option<ExpansionResult> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

struct ServiceClient {
    config: ServiceConfig,
    http: Option<reqwest::blocking::Client>,
}

impl ServiceClient {
    fn new(config: ServiceConfig) -> Self {
        Self { config, http: None }
    }

    fn run(&mut self, job: &ExpansionJob) -> ExpansionResult {
        if self.config.endpoint.is_empty() {
            // No service configured: echo the input back as-is.
            return Ok(match job {
                ExpansionJob::Tokens(tokens) => tokens.join(" "),
                ExpansionJob::Phonemes { ipa, .. } => ipa.clone(),
            });
        }

        let (url, body) = match job {
            ExpansionJob::Tokens(tokens) => (
                format!("{}/expand", self.config.endpoint),
                serde_json::json!({ "tokens": tokens }),
            ),
            ExpansionJob::Phonemes { ipa, lang } => (
                format!("{}/convert", self.config.endpoint),
                serde_json::json!({ "ipa": ipa, "lang": lang }),
            ),
        };

        // The client is built on first use and kept for later requests.
        let http: &reqwest::blocking::Client = match &mut self.http {
            Some(http) => http,
            slot @ None => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(Duration::from_millis(self.config.timeout_ms))
                    .build()?;
                slot.insert(client)
            }
        };

        let mut request = http.post(&url).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }
        debug!("expansion request: {}", url);
        read_text(request.send()?)
    }
}

fn read_text(response: reqwest::blocking::Response) -> ExpansionResult {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ServiceError::Auth(status.as_u16()));
    }
    if !status.is_success() {
        return Err(ServiceError::Status(status.as_u16()));
    }
    let body = response.text()?;
    let parsed: TextResponse =
        serde_json::from_str(&body).map_err(|err| ServiceError::Malformed(err.to_string()))?;
    Ok(parsed.text)
}

/// One-shot GET /health, used at startup to report service availability.
pub fn health_check(config: &ServiceConfig) -> Result<(), ServiceError> {
    if config.endpoint.is_empty() {
        return Ok(());
    }
    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()?;
    let response = http.get(format!("{}/health", config.endpoint)).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(ServiceError::Status(status.as_u16()));
    }
    #[derive(Deserialize)]
    struct Health {
        status: String,
    }
    let body = response.text()?;
    let parsed: Health =
        serde_json::from_str(&body).map_err(|err| ServiceError::Malformed(err.to_string()))?;
    if parsed.status != "ok" {
        return Err(ServiceError::Malformed(format!(
            "unexpected health status {:?}",
            parsed.status
        )));
    }
    Ok(())
}
