//! Server Configuration

use std::time::Duration;

use agent_core::provider::GenerationOptions;
use agent_runtime::DEFAULT_FRAGMENT_DELAY;

/// Settings read from the environment (after `.env` is loaded)
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Generation options shared by every session
    pub generation: GenerationOptions,

    /// Pace of fragments on the chat socket
    pub fragment_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            generation: GenerationOptions::default(),
            fragment_delay: DEFAULT_FRAGMENT_DELAY,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(model) = lookup("LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            config.generation.model = model;
        }
        if let Some(max) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            config.generation.max_tokens = max;
        }
        if let Some(temp) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            config.generation.temperature = temp;
        }
        if let Some(ms) = lookup("STREAM_FRAGMENT_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.fragment_delay = Duration::from_millis(ms);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.generation.model, "gpt-3.5-turbo");
        assert_eq!(config.generation.max_tokens, 500);
        assert_eq!(config.fragment_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let env: HashMap<&str, &str> = [
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("LLM_MODEL", "llama3.2"),
            ("LLM_MAX_TOKENS", "lots"),
            ("LLM_TEMPERATURE", "0.2"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::from_lookup(|key| env.get(key).map(ToString::to_string));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.generation.model, "llama3.2");
        assert_eq!(config.generation.max_tokens, 500);
        assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
    }
}
