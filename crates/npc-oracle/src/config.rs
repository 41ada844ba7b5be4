//! Configuration for the Oracle: provider credentials and per-operation
//! timeouts (spec §4.5, §5: "Oracle calls block the calling worker up to
//! the timeout (15 s cognize, 30 s synthesize, 20 s transcribe)").

use std::time::Duration;

use crate::error::OracleError;

/// Default timeout for `cognize`.
pub const DEFAULT_COGNIZE_TIMEOUT: Duration = Duration::from_secs(15);
/// Default timeout for `synthesize`.
pub const DEFAULT_SYNTHESIZE_TIMEOUT: Duration = Duration::from_secs(30);
/// Default timeout for `transcribe`.
pub const DEFAULT_TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(20);

/// Complete Oracle configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub primary_backend: LlmBackendConfig,
    pub escalation_backend: Option<LlmBackendConfig>,
    pub tts_url: Option<String>,
    pub stt_url: Option<String>,
    pub templates_dir: String,
    pub cognize_timeout: Duration,
    pub synthesize_timeout: Duration,
    pub transcribe_timeout: Duration,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    pub backend_type: BackendType,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible API (works with `OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API (different request format).
    Anthropic,
}

impl OracleConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `LLM_DEFAULT_BACKEND`, `LLM_DEFAULT_API_URL`,
    /// `LLM_DEFAULT_API_KEY`, `LLM_DEFAULT_MODEL`.
    ///
    /// Optional: `LLM_ESCALATION_*` (same shape, for a second backend),
    /// `TTS_URL`, `STT_URL`, `TEMPLATES_DIR` (default `templates`),
    /// `COGNIZE_TIMEOUT_MS`, `SYNTHESIZE_TIMEOUT_MS`, `TRANSCRIBE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, OracleError> {
        let primary_backend = load_backend_config("LLM_DEFAULT")?;
        let escalation_backend = load_backend_config("LLM_ESCALATION").ok();

        let templates_dir =
            std::env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_owned());
        let tts_url = std::env::var("TTS_URL").ok();
        let stt_url = std::env::var("STT_URL").ok();

        Ok(Self {
            primary_backend,
            escalation_backend,
            tts_url,
            stt_url,
            templates_dir,
            cognize_timeout: duration_from_env("COGNIZE_TIMEOUT_MS", DEFAULT_COGNIZE_TIMEOUT)?,
            synthesize_timeout: duration_from_env(
                "SYNTHESIZE_TIMEOUT_MS",
                DEFAULT_SYNTHESIZE_TIMEOUT,
            )?,
            transcribe_timeout: duration_from_env(
                "TRANSCRIBE_TIMEOUT_MS",
                DEFAULT_TRANSCRIBE_TIMEOUT,
            )?,
        })
    }
}

fn duration_from_env(name: &str, default: Duration) -> Result<Duration, OracleError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Duration::from_millis)
            .map_err(|e| OracleError::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn env_var(name: &str) -> Result<String, OracleError> {
    std::env::var(name).map_err(|e| OracleError::Config(format!("missing required env var {name}: {e}")))
}

fn load_backend_config(prefix: &str) -> Result<LlmBackendConfig, OracleError> {
    let backend_str = env_var(&format!("{prefix}_BACKEND"))?;
    let api_url = env_var(&format!("{prefix}_API_URL"))?;
    let api_key = env_var(&format!("{prefix}_API_KEY"))?;
    let model = env_var(&format!("{prefix}_MODEL"))?;

    let backend_type = match backend_str.to_lowercase().as_str() {
        "openai" | "deepseek" | "ollama" => BackendType::OpenAi,
        "anthropic" | "claude" => BackendType::Anthropic,
        other => return Err(OracleError::Config(format!("unknown backend type: {other}"))),
    };

    Ok(LlmBackendConfig { backend_type, api_url, api_key, model })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_type_parsing() {
        let config = LlmBackendConfig {
            backend_type: BackendType::OpenAi,
            api_url: "https://api.openai.com/v1".to_owned(),
            api_key: "test-key".to_owned(),
            model: "gpt-5-nano".to_owned(),
        };
        assert_eq!(config.backend_type, BackendType::OpenAi);
    }

    #[test]
    fn default_timeouts_match_spec() {
        assert_eq!(DEFAULT_COGNIZE_TIMEOUT, Duration::from_secs(15));
        assert_eq!(DEFAULT_SYNTHESIZE_TIMEOUT, Duration::from_secs(30));
        assert_eq!(DEFAULT_TRANSCRIBE_TIMEOUT, Duration::from_secs(20));
    }
}
