//! Ollama client for in-character reply generation.
//!
//! The LLM is a stateless external collaborator: the retrieval pipeline
//! produces a fully assembled prompt, and this client turns it into dialogue
//! text. Nothing in the core depends on it.

use crate::error::LlmError;

/// Configuration for the Ollama chat client.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model name to use.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            temperature: 0.7,
            max_tokens: 256,
            timeout_secs: 120,
        }
    }
}

/// Client for the Ollama REST API.
pub struct OllamaClient {
    config: OllamaConfig,
    agent: ureq::Agent,
}

impl OllamaClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OllamaConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build();
        Self { config, agent }
    }

    /// Probe the server to check availability.
    pub fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        matches!(self.agent.get(&url).call(), Ok(resp) if resp.status() == 200)
    }

    /// Generate a completion for the prompt.
    pub fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.base_url);
        let response = self
            .agent
            .post(&url)
            .send_json(serde_json::json!({
                "model": self.config.model,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "temperature": self.config.temperature,
                    "num_predict": self.config.max_tokens,
                },
            }))
            .map_err(|e| match e {
                ureq::Error::Transport(t) => LlmError::Unavailable {
                    url: format!("{} ({t})", self.config.base_url),
                },
                other => LlmError::RequestFailed { message: other.to_string() },
            })?;

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| LlmError::ParseError { message: e.to_string() })?;

        body["response"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| LlmError::ParseError {
                message: "response is missing the `response` field".into(),
            })
    }
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}
