//! The Oracle: the only component that performs LLM/TTS/STT provider I/O
//! (spec §4.5). Brain never calls a provider directly -- it assembles
//! context and calls [`Oracle::cognize`], which renders the prompt, calls
//! the backend (with fallback between primary and escalation backends),
//! parses and validates the response, and on any failure returns a
//! fallback frame so the interactive request still succeeds.

use std::time::{Duration, Instant};

use futures::Stream;
use npc_types::{CognitiveFrame, Mood};
use tracing::{debug, warn};

use crate::config::{LlmBackendConfig, OracleConfig};
use crate::error::OracleError;
use crate::llm::{create_backend, LlmBackend};
use crate::parse::parse_cognitive_frame;
use crate::prompt::PromptEngine;

/// Upper bound on a single `synthesize` audio chunk (spec §4.5: "chunked,
/// <= 16 KB per chunk").
pub const SYNTHESIZE_CHUNK_BYTES: usize = 16 * 1024;

/// Inputs to one [`Oracle::cognize`] call.
pub struct CognizeRequest {
    /// The Brain-assembled prompt context (personality, vitals, mood,
    /// memories, rumors, faction stance, goals, player utterance) as
    /// template data.
    pub context: serde_json::Value,
    /// The agent's current mood, used to build the fallback frame if
    /// cognition fails.
    pub current_mood: Mood,
}

pub struct Oracle {
    primary: LlmBackend,
    escalation: Option<LlmBackend>,
    prompt_engine: PromptEngine,
    client: reqwest::Client,
    tts_url: Option<String>,
    stt_url: Option<String>,
    cognize_timeout: Duration,
    synthesize_timeout: Duration,
    transcribe_timeout: Duration,
}

impl Oracle {
    /// Build an Oracle from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Template`] if the prompt templates cannot be
    /// loaded from `config.templates_dir`.
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let primary = create_backend(&config.primary_backend);
        let escalation = config.escalation_backend.as_ref().map(create_backend);
        let prompt_engine = PromptEngine::new(&config.templates_dir)?;

        Ok(Self {
            primary,
            escalation,
            prompt_engine,
            client: reqwest::Client::new(),
            tts_url: config.tts_url.clone(),
            stt_url: config.stt_url.clone(),
            cognize_timeout: config.cognize_timeout,
            synthesize_timeout: config.synthesize_timeout,
            transcribe_timeout: config.transcribe_timeout,
        })
    }

    /// `cognize(prompt) -> CognitiveFrame` (spec §4.5).
    ///
    /// Never fails: a timeout or malformed provider response is absorbed
    /// into a fallback frame derived from `request.current_mood` and a
    /// neutral dialogue, so the interactive request this call backs
    /// always succeeds.
    pub async fn cognize(&self, request: &CognizeRequest) -> CognitiveFrame {
        match tokio::time::timeout(self.cognize_timeout, self.cognize_inner(&request.context)).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(e)) => {
                warn!(error = %e, "cognize failed, returning fallback frame");
                CognitiveFrame::fallback(&request.current_mood)
            }
            Err(_) => {
                warn!(timeout_s = self.cognize_timeout.as_secs(), "cognize deadline exceeded, returning fallback frame");
                CognitiveFrame::fallback(&request.current_mood)
            }
        }
    }

    async fn cognize_inner(&self, context: &serde_json::Value) -> Result<CognitiveFrame, OracleError> {
        let prompt = self.prompt_engine.render(context)?;
        let start = Instant::now();
        let (raw, backend_name) = self.call_with_fallback(&prompt).await?;
        debug!(backend = backend_name, latency_ms = start.elapsed().as_millis(), "cognize backend responded");
        parse_cognitive_frame(&raw)
    }

    /// Try the primary backend, falling back to the escalation backend if
    /// configured and the primary fails (spec §4.5: "All retries and
    /// provider fall-back logic live here").
    async fn call_with_fallback(
        &self,
        prompt: &crate::prompt::RenderedPrompt,
    ) -> Result<(String, String), OracleError> {
        match self.primary.complete(prompt).await {
            Ok(response) => Ok((response, self.primary.name().to_owned())),
            Err(primary_err) => {
                warn!(backend = self.primary.name(), error = %primary_err, "primary backend failed");
                let Some(escalation) = &self.escalation else {
                    return Err(primary_err);
                };
                match escalation.complete(prompt).await {
                    Ok(response) => Ok((response, escalation.name().to_owned())),
                    Err(escalation_err) => {
                        warn!(backend = escalation.name(), error = %escalation_err, "escalation backend also failed");
                        Err(escalation_err)
                    }
                }
            }
        }
    }

    /// `synthesize(agentVoice, text, mood) -> audioStream` (spec §4.5):
    /// posts to the configured TTS endpoint and returns the resulting
    /// audio as a stream of chunks, each at most [`SYNTHESIZE_CHUNK_BYTES`].
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Config`] if no TTS endpoint is configured,
    /// or [`OracleError::Provider`] if the call fails or times out.
    pub async fn synthesize(
        &self,
        agent_voice: &str,
        text: &str,
        mood: &Mood,
    ) -> Result<impl Stream<Item = Result<Vec<u8>, OracleError>>, OracleError> {
        let Some(tts_url) = &self.tts_url else {
            return Err(OracleError::Config("no TTS endpoint configured".to_owned()));
        };

        let body = serde_json::json!({
            "voice": agent_voice,
            "text": text,
            "mood": mood.label,
            "arousal": mood.arousal,
            "valence": mood.valence,
        });

        let audio = tokio::time::timeout(self.synthesize_timeout, async {
            let bytes = self
                .client
                .post(tts_url)
                .json(&body)
                .send()
                .await
                .map_err(|e| OracleError::Provider(format!("TTS request failed: {e}")))?
                .bytes()
                .await
                .map_err(|e| OracleError::Provider(format!("TTS response read failed: {e}")))?;
            Ok::<Vec<u8>, OracleError>(bytes.to_vec())
        })
        .await
        .map_err(|_| OracleError::Provider("synthesize deadline exceeded".to_owned()))??;

        Ok(futures::stream::iter(chunk_audio(audio).into_iter().map(Ok)))
    }

    /// `transcribe(audio, lang) -> text` (spec §4.5).
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Config`] if no STT endpoint is configured,
    /// or [`OracleError::Provider`] if the call fails or times out.
    pub async fn transcribe(&self, audio: &[u8], lang: &str) -> Result<String, OracleError> {
        let Some(stt_url) = &self.stt_url else {
            return Err(OracleError::Config("no STT endpoint configured".to_owned()));
        };

        let part = reqwest::multipart::Part::bytes(audio.to_vec()).file_name("audio.raw");
        let form = reqwest::multipart::Form::new().text("lang", lang.to_owned()).part("audio", part);

        tokio::time::timeout(self.transcribe_timeout, async {
            let response = self
                .client
                .post(stt_url)
                .multipart(form)
                .send()
                .await
                .map_err(|e| OracleError::Provider(format!("STT request failed: {e}")))?;
            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| OracleError::Provider(format!("STT response parse failed: {e}")))?;
            json.get("text")
                .and_then(serde_json::Value::as_str)
                .map(ToOwned::to_owned)
                .ok_or_else(|| OracleError::Provider("STT response missing 'text'".to_owned()))
        })
        .await
        .map_err(|_| OracleError::Provider("transcribe deadline exceeded".to_owned()))?
    }
}

/// Split `audio` into chunks of at most [`SYNTHESIZE_CHUNK_BYTES`] bytes.
fn chunk_audio(audio: Vec<u8>) -> Vec<Vec<u8>> {
    if audio.is_empty() {
        return Vec::new();
    }
    audio.chunks(SYNTHESIZE_CHUNK_BYTES).map(<[u8]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_audio_respects_limit() {
        let data = vec![0u8; SYNTHESIZE_CHUNK_BYTES * 3 + 10];
        let chunks = chunk_audio(data);
        assert_eq!(chunks.len(), 4);
        for chunk in &chunks[..3] {
            assert_eq!(chunk.len(), SYNTHESIZE_CHUNK_BYTES);
        }
        assert_eq!(chunks[3].len(), 10);
    }

    #[test]
    fn chunk_audio_empty_input_yields_no_chunks() {
        assert!(chunk_audio(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn cognize_falls_back_when_templates_missing() {
        let config = OracleConfig {
            primary_backend: LlmBackendConfig {
                backend_type: crate::config::BackendType::OpenAi,
                api_url: "http://127.0.0.1:1".to_owned(),
                api_key: "test".to_owned(),
                model: "test".to_owned(),
            },
            escalation_backend: None,
            tts_url: None,
            stt_url: None,
            templates_dir: "/nonexistent/templates/dir".to_owned(),
            cognize_timeout: Duration::from_millis(50),
            synthesize_timeout: Duration::from_secs(1),
            transcribe_timeout: Duration::from_secs(1),
        };
        assert!(Oracle::new(&config).is_err());
    }
}
