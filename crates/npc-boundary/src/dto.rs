//! Request/response shapes for the HTTP surface (spec §6).
//!
//! Bodies that accept free-form client input are validated with
//! `validator` before they reach a handler's core-op call.

use npc_types::{AgentId, Personality, PlayerId, ZonePosition};
use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_trait() -> f64 {
    0.5
}

/// `POST /npc/init` body.
#[derive(Debug, Deserialize, Validate)]
pub struct InitAgentRequest {
    #[validate(length(min = 1, message = "role must not be empty"))]
    pub role: String,
    pub location: Option<ZonePosition>,
    #[serde(default)]
    pub personality: PersonalityInput,
    pub voice_fingerprint: Option<String>,
}

/// Personality overrides for agent creation; every trait defaults to
/// `0.5` (the midpoint of the soft-clamp range) if omitted.
#[derive(Debug, Deserialize)]
pub struct PersonalityInput {
    #[serde(default = "default_trait")]
    pub curiosity: f64,
    #[serde(default = "default_trait")]
    pub cooperation: f64,
    #[serde(default = "default_trait")]
    pub aggression: f64,
    #[serde(default = "default_trait")]
    pub risk_tolerance: f64,
    #[serde(default = "default_trait")]
    pub industriousness: f64,
    #[serde(default = "default_trait")]
    pub sociability: f64,
    #[serde(default = "default_trait")]
    pub honesty: f64,
    #[serde(default = "default_trait")]
    pub loyalty: f64,
    #[serde(default = "default_trait")]
    pub paranoia: f64,
}

impl Default for PersonalityInput {
    fn default() -> Self {
        Self {
            curiosity: default_trait(),
            cooperation: default_trait(),
            aggression: default_trait(),
            risk_tolerance: default_trait(),
            industriousness: default_trait(),
            sociability: default_trait(),
            honesty: default_trait(),
            loyalty: default_trait(),
            paranoia: default_trait(),
        }
    }
}

impl From<PersonalityInput> for Personality {
    fn from(input: PersonalityInput) -> Self {
        Self {
            curiosity: input.curiosity,
            cooperation: input.cooperation,
            aggression: input.aggression,
            risk_tolerance: input.risk_tolerance,
            industriousness: input.industriousness,
            sociability: input.sociability,
            honesty: input.honesty,
            loyalty: input.loyalty,
            paranoia: input.paranoia,
        }
    }
}

/// `POST /npc/init` response: the created agent's id.
#[derive(Debug, Serialize)]
pub struct InitAgentResponse {
    pub agent_id: AgentId,
}

/// `POST /npc/action` body.
#[derive(Debug, Deserialize, Validate)]
pub struct NpcActionRequest {
    pub player_id: PlayerId,
    #[validate(length(min = 1, message = "utterance must not be empty"))]
    pub utterance: String,
}

/// `POST /npc/action` response: the agent's spoken line and the hidden
/// cognitive frame fields a client is allowed to see.
#[derive(Debug, Serialize)]
pub struct NpcActionResponse {
    pub dialogue: String,
    pub intent: npc_types::Intent,
    pub urgency: f64,
    pub trust_delta: f64,
}

/// `GET /npc/list` query string.
#[derive(Debug, Deserialize, Default)]
pub struct ListAgentsQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// `GET /npc/memories/{agent}/{player}` query string.
#[derive(Debug, Deserialize, Default)]
pub struct MemoriesQuery {
    pub limit: Option<usize>,
}

/// `POST /memory/decay?hours=H` query string.
#[derive(Debug, Deserialize)]
pub struct DecayQuery {
    pub hours: f64,
}

/// `POST /world/start?time_scale=T&tick_interval=S` query string.
#[derive(Debug, Deserialize)]
pub struct StartQuery {
    pub time_scale: f64,
    pub tick_interval: u64,
}

/// `GET /world/events?limit=N` query string.
#[derive(Debug, Deserialize, Default)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// `POST /quest/generate/{agent}?player_id=` query string.
#[derive(Debug, Deserialize)]
pub struct QuestGenerateQuery {
    pub player_id: PlayerId,
}

/// `POST /territory/{t}/battle?attacker=` query string. Strengths default
/// to `1.0` (parity) when the caller does not supply them.
#[derive(Debug, Deserialize)]
pub struct BeginBattleQuery {
    pub attacker: npc_types::FactionId,
    #[serde(default = "default_battle_strength")]
    pub attacker_str: f64,
    #[serde(default = "default_battle_strength")]
    pub defender_str: f64,
}

fn default_battle_strength() -> f64 {
    1.0
}

/// `POST /traderoute/establish` body.
#[derive(Debug, Deserialize, Validate)]
pub struct EstablishRouteRequest {
    pub from: npc_types::TerritoryId,
    pub to: npc_types::TerritoryId,
    #[validate(length(min = 1, message = "goods must not be empty"))]
    pub goods: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub profit_margin: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub risk_level: f64,
}

/// `POST /traderoute/execute|disrupt|restore` body: the route to act on.
#[derive(Debug, Deserialize)]
pub struct RouteIdRequest {
    pub route: npc_types::TradeRouteId,
}

/// `POST /conversation/start` body.
#[derive(Debug, Deserialize, Validate)]
pub struct StartConversationRequest {
    pub player_id: PlayerId,
    #[validate(length(min = 1, message = "at least one NPC participant is required"))]
    pub npc_ids: Vec<AgentId>,
    pub location: Option<ZonePosition>,
}

/// `POST /conversation/message` body.
#[derive(Debug, Deserialize, Validate)]
pub struct ConversationMessageRequest {
    pub group: npc_types::GroupId,
    #[validate(length(min = 1, message = "utterance must not be empty"))]
    pub utterance: String,
}

/// `POST /conversation/add-npc` / `/remove-npc` body.
#[derive(Debug, Deserialize)]
pub struct ConversationRosterRequest {
    pub group: npc_types::GroupId,
    pub agent: AgentId,
}

/// `POST /conversation/end` body.
#[derive(Debug, Deserialize)]
pub struct EndConversationRequest {
    pub group: npc_types::GroupId,
}

/// `POST /voice/generate/{id}` body.
#[derive(Debug, Deserialize, Validate)]
pub struct VoiceGenerateRequest {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}

/// `POST /speech/transcribe` body. Audio travels as base64 over JSON since
/// every other Boundary body is JSON; a multipart variant is not exposed
/// here.
#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub audio_base64: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

fn default_lang() -> String {
    "en".to_owned()
}
