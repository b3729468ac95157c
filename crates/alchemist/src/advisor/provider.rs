//! Advisor trait, configuration and the timeout-guarded call.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw header -> proposed canonical field (`None` = leave unmapped).
pub type Proposal = IndexMap<String, Option<String>>;

/// Configuration for advisory providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,

    /// How long a mapping call may take before its answer is ignored.
    pub timeout_ms: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            temperature: 0.1,
            timeout_ms: 5_000,
        }
    }
}

impl AdvisorConfig {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the response timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Response timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// An optional collaborator that proposes header mappings.
///
/// Implementations must be thread-safe (Send + Sync): calls run on a worker
/// thread so a slow provider can be abandoned.
pub trait HeaderAdvisor: Send + Sync {
    /// Propose a canonical field (or `None`) for each header.
    ///
    /// # Arguments
    /// * `headers` - Raw headers as they appear in the upload
    /// * `expected_fields` - Canonical field names of the target schema
    fn propose_mapping(&self, headers: &[String], expected_fields: &[String]) -> Result<Proposal>;

    /// Get the configuration for this advisor.
    fn config(&self) -> &AdvisorConfig;

    /// Get the name of this advisor (for logging/debugging).
    fn name(&self) -> &str;
}

/// Ask `advisor` for a proposal, waiting at most its configured timeout.
///
/// Returns `None` on timeout, error or panic in the advisor. A reply that
/// arrives after the timeout is dropped with the channel.
pub fn consult(
    advisor: Arc<dyn HeaderAdvisor>,
    headers: &[String],
    expected_fields: &[String],
) -> Option<Proposal> {
    let timeout = advisor.config().timeout();
    let name = advisor.name().to_string();
    let headers = headers.to_vec();
    let expected_fields = expected_fields.to_vec();
    let (tx, rx) = mpsc::channel();

    let spawned = thread::Builder::new()
        .name(format!("advisor-{}", name))
        .spawn(move || {
            let result = advisor.propose_mapping(&headers, &expected_fields);
            // The receiver is gone if we already timed out.
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        warn!("could not start advisor '{}': {}", name, e);
        return None;
    }

    match rx.recv_timeout(timeout) {
        Ok(Ok(proposal)) => {
            debug!("advisor '{}' proposed {} assignments", name, proposal.len());
            Some(proposal)
        }
        Ok(Err(e)) => {
            warn!("advisor '{}' failed: {}", name, e);
            None
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!("advisor '{}' did not answer within {:?}", name, timeout);
            None
        }
        Err(RecvTimeoutError::Disconnected) => {
            warn!("advisor '{}' stopped without answering", name);
            None
        }
    }
}
