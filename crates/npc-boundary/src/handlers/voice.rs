//! `/voice/generate/{id}` and `/speech/transcribe` handlers (spec §6,
//! §4.5): Oracle TTS/STT, the only handlers that stream or decode binary
//! payloads rather than pass JSON straight through.

use std::sync::Arc;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::StreamExt;
use npc_types::AgentId;
use serde::Serialize;
use validator::Validate;

use crate::dto::{TranscribeRequest, VoiceGenerateRequest};
use crate::error::BoundaryError;
use crate::state::AppState;

/// `POST /voice/generate/{id}`: `Oracle.synthesize(agentVoice, text, mood)`,
/// streamed back chunked at [`npc_oracle::SYNTHESIZE_CHUNK_BYTES`].
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<AgentId>,
    Json(body): Json<VoiceGenerateRequest>,
) -> Result<Response, BoundaryError> {
    body.validate()?;
    let simulation = state.simulation.lock().await;
    let agent_state = simulation
        .agents
        .get(&agent_id)
        .ok_or_else(|| BoundaryError::NotFound(format!("agent {agent_id}")))?;
    let voice = agent_state.agent.voice_fingerprint.clone().unwrap_or_else(|| agent_id.to_string());
    let mood = agent_state.agent.mood.clone();
    drop(simulation);

    let stream = state.oracle.synthesize(&voice, &body.text, &mood).await?;
    let body_stream = stream.map(|chunk| chunk.map(Bytes::from).map_err(std::io::Error::other));

    Ok((
        [(header::CONTENT_TYPE, "audio/opus")],
        Body::from_stream(body_stream),
    )
        .into_response())
}

/// Response for `/speech/transcribe`.
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// `POST /speech/transcribe`: decode base64 audio, `Oracle.transcribe`.
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, BoundaryError> {
    let audio = BASE64
        .decode(&body.audio_base64)
        .map_err(|e| BoundaryError::InvalidArgument(format!("invalid base64 audio: {e}")))?;
    let text = state.oracle.transcribe(&audio, &body.lang).await?;
    Ok(Json(TranscribeResponse { text }))
}
