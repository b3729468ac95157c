//! Mock advisor for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::error::{AlchemistError, Result};
use crate::schema::normalize;

use super::provider::{AdvisorConfig, HeaderAdvisor, Proposal};

/// What the mock does when asked for a mapping.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Map a header to the first field whose normalized name contains it or
    /// is contained by it.
    Containment,
    /// Return this proposal verbatim.
    Respond(Proposal),
    /// Fail with this message.
    Fail(String),
    /// Panic inside the call.
    Panic,
}

/// Mock advisor that returns predictable responses for testing.
pub struct MockAdvisor {
    config: AdvisorConfig,
    behavior: MockBehavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockAdvisor {
    /// Create a new mock using containment matching.
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Containment)
    }

    /// Create a mock with the given behavior.
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            config: AdvisorConfig::default(),
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that always answers with `proposal`.
    pub fn responding<K, V, I>(proposal: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, Option<V>)>,
    {
        let proposal = proposal
            .into_iter()
            .map(|(k, v)| (k.into(), v.map(Into::into)))
            .collect();
        Self::with_behavior(MockBehavior::Respond(proposal))
    }

    /// Mock that always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Fail(message.into()))
    }

    /// Mock that panics when called.
    pub fn panicking() -> Self {
        Self::with_behavior(MockBehavior::Panic)
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: AdvisorConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of times the mock was asked for a mapping.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderAdvisor for MockAdvisor {
    fn propose_mapping(&self, headers: &[String], expected_fields: &[String]) -> Result<Proposal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        match &self.behavior {
            MockBehavior::Containment => Ok(containment_proposal(headers, expected_fields)),
            MockBehavior::Respond(proposal) => Ok(proposal.clone()),
            MockBehavior::Fail(message) => Err(AlchemistError::Advisor(message.clone())),
            MockBehavior::Panic => panic!("mock advisor panicked"),
        }
    }

    fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn containment_proposal(headers: &[String], expected_fields: &[String]) -> Proposal {
    let fields: Vec<(String, &String)> = expected_fields.iter().map(|f| (normalize(f), f)).collect();
    headers
        .iter()
        .map(|header| {
            let key = normalize(header);
            let field = if key.is_empty() {
                None
            } else {
                fields
                    .iter()
                    .find(|(norm, _)| *norm == key || norm.contains(&key) || key.contains(norm.as_str()))
                    .map(|(_, field)| (*field).clone())
            };
            (header.clone(), field)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_containment() {
        let advisor = MockAdvisor::new();
        let proposal = advisor
            .propose_mapping(
                &strings(&["Worker Id", "skills list", "zzz", ""]),
                &strings(&["WorkerID", "Skills"]),
            )
            .unwrap();
        assert_eq!(proposal["Worker Id"].as_deref(), Some("WorkerID"));
        assert_eq!(proposal["skills list"].as_deref(), Some("Skills"));
        assert_eq!(proposal["zzz"], None);
        assert_eq!(proposal[""], None);
        assert_eq!(advisor.calls(), 1);
    }

    #[test]
    fn test_scripted_behaviors() {
        let advisor = MockAdvisor::responding([("a", Some("TaskID")), ("b", None::<&str>)]);
        let proposal = advisor.propose_mapping(&strings(&["a"]), &[]).unwrap();
        assert_eq!(proposal.len(), 2);

        let failing = MockAdvisor::failing("offline");
        assert!(failing.propose_mapping(&[], &[]).is_err());
    }
}
