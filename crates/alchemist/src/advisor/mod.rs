//! Optional advisory collaborator for header mapping.
//!
//! An advisor proposes header -> field assignments that the
//! [`HeaderMapper`](crate::inference::HeaderMapper) compares against its own
//! deterministic result. Alchemist works fully without one: calls are bounded
//! by a timeout, and any failure falls back to the deterministic mapping.
//!
//! # Supported Providers
//!
//! - **OpenAI** - any OpenAI-compatible chat endpoint (requires `OPENAI_API_KEY`,
//!   optional `OPENAI_API_BASE`)
//! - **Mock** - scripted answers, failures and delays for tests
//!
//! # Example
//!
//! ```no_run
//! use alchemist::{Alchemist, OpenAIAdvisor};
//!
//! let alchemist = Alchemist::new().with_advisor(OpenAIAdvisor::from_env().unwrap());
//! ```

mod mock;
mod openai;
mod prompts;
mod provider;

pub use mock::{MockAdvisor, MockBehavior};
pub use openai::OpenAIAdvisor;
pub use provider::{consult, AdvisorConfig, HeaderAdvisor, Proposal};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::*;

    fn args() -> (Vec<String>, Vec<String>) {
        (
            vec!["wid".to_string()],
            vec!["WorkerID".to_string(), "Skills".to_string()],
        )
    }

    #[test]
    fn test_consult_returns_proposal() {
        let (headers, fields) = args();
        let advisor: Arc<dyn HeaderAdvisor> =
            Arc::new(MockAdvisor::responding([("wid", Some("WorkerID"))]));
        let proposal = consult(advisor, &headers, &fields).unwrap();
        assert_eq!(proposal["wid"].as_deref(), Some("WorkerID"));
    }

    #[test]
    fn test_consult_times_out() {
        let (headers, fields) = args();
        let config = AdvisorConfig::default().with_timeout(Duration::from_millis(50));
        let advisor: Arc<dyn HeaderAdvisor> = Arc::new(
            MockAdvisor::responding([("wid", Some("WorkerID"))])
                .with_delay(Duration::from_secs(2))
                .with_config(config),
        );
        let started = Instant::now();
        assert!(consult(advisor, &headers, &fields).is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_consult_swallows_errors_and_panics() {
        let (headers, fields) = args();
        let failing: Arc<dyn HeaderAdvisor> = Arc::new(MockAdvisor::failing("offline"));
        assert!(consult(failing, &headers, &fields).is_none());

        let panicking: Arc<dyn HeaderAdvisor> = Arc::new(MockAdvisor::panicking());
        assert!(consult(panicking, &headers, &fields).is_none());
    }
}
