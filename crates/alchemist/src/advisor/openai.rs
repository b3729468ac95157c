//! OpenAI-compatible chat completions advisor.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AlchemistError, Result};

use super::prompts;
use super::provider::{AdvisorConfig, HeaderAdvisor, Proposal};

/// Default API base; override with `OPENAI_API_BASE`.
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Body of a fenced code block, with or without a `json` tag.
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").unwrap());

/// Advisor backed by an OpenAI-compatible endpoint.
pub struct OpenAIAdvisor {
    client: Client,
    api_key: String,
    api_base: String,
    config: AdvisorConfig,
}

impl OpenAIAdvisor {
    /// Create a new advisor with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, AdvisorConfig::default())
    }

    /// Create a new advisor with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: AdvisorConfig) -> Result<Self> {
        // The HTTP timeout only bounds the worker thread; callers stop
        // waiting at `config.timeout()` regardless.
        let client = Client::builder()
            .timeout(config.timeout() + Duration::from_secs(1))
            .build()
            .map_err(|e| AlchemistError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            config,
        })
    }

    /// Point the advisor at a different OpenAI-compatible endpoint.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Create from `OPENAI_API_KEY` and optional `OPENAI_API_BASE`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_config(AdvisorConfig::default())
    }

    /// Like [`from_env`](Self::from_env) with custom configuration.
    pub fn from_env_with_config(config: AdvisorConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            AlchemistError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        let advisor = Self::with_config(api_key, config)?;
        Ok(match std::env::var("OPENAI_API_BASE") {
            Ok(base) if !base.trim().is_empty() => advisor.with_api_base(base.trim()),
            _ => advisor,
        })
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| AlchemistError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }

    /// Send a message to the chat completions endpoint.
    fn send_message(&self, user_prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                {
                    "role": "system",
                    "content": prompts::system_prompt()
                },
                {
                    "role": "user",
                    "content": user_prompt
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| AlchemistError::Advisor(format!("API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(AlchemistError::Advisor(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: ChatResponse = response
            .json()
            .map_err(|e| AlchemistError::Advisor(format!("Failed to parse API response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AlchemistError::Advisor("No response from OpenAI".to_string()))
    }
}

impl HeaderAdvisor for OpenAIAdvisor {
    fn propose_mapping(&self, headers: &[String], expected_fields: &[String]) -> Result<Proposal> {
        let prompt = prompts::map_headers_prompt(headers, expected_fields);
        let reply = self.send_message(&prompt)?;
        parse_proposal(&reply)
    }

    fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Parse a model reply into a [`Proposal`].
///
/// Accepts bare JSON or JSON inside a fenced block. The reply must be an
/// object whose values are strings or null; empty strings count as null.
pub(crate) fn parse_proposal(reply: &str) -> Result<Proposal> {
    let body = FENCED_BLOCK
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map_or(reply, |m| m.as_str())
        .trim();

    let value: Value = serde_json::from_str(body)
        .map_err(|e| AlchemistError::Advisor(format!("Failed to parse advisor JSON: {}", e)))?;
    let Value::Object(entries) = value else {
        return Err(AlchemistError::Advisor("advisor reply is not a JSON object".to_string()));
    };

    entries
        .into_iter()
        .map(|(header, field)| match field {
            Value::Null => Ok((header, None)),
            Value::String(s) if s.trim().is_empty() => Ok((header, None)),
            Value::String(s) => Ok((header, Some(s.trim().to_string()))),
            other => Err(AlchemistError::Advisor(format!(
                "advisor mapped '{}' to non-string value {}",
                header, other
            ))),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_json() {
        let proposal = parse_proposal(r#"{"wid": "WorkerID", "notes": null}"#).unwrap();
        assert_eq!(proposal["wid"].as_deref(), Some("WorkerID"));
        assert_eq!(proposal["notes"], None);
        let keys: Vec<_> = proposal.keys().collect();
        assert_eq!(keys, vec!["wid", "notes"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "Here you go:\n```json\n{\"skill set\": \"Skills\", \"x\": \"\"}\n```\n";
        let proposal = parse_proposal(reply).unwrap();
        assert_eq!(proposal["skill set"].as_deref(), Some("Skills"));
        assert_eq!(proposal["x"], None);

        let untagged = parse_proposal("```\n{\"a\": \"TaskID\"}\n```").unwrap();
        assert_eq!(untagged["a"].as_deref(), Some("TaskID"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_proposal("not json").is_err());
        assert!(parse_proposal("[1, 2]").is_err());
        assert!(parse_proposal(r#"{"a": 3}"#).is_err());
        assert!(parse_proposal(r#"{"a": ["WorkerID"]}"#).is_err());
    }

    #[test]
    fn test_api_base_is_trimmed() {
        let advisor = OpenAIAdvisor::new("sk-test")
            .unwrap()
            .with_api_base("http://localhost:8080/v1/");
        assert_eq!(advisor.api_base, "http://localhost:8080/v1");
        assert_eq!(advisor.name(), "openai");
    }
}
