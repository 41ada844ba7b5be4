//! `GET /ws/game?player_id=&player_name=`: the bidirectional `WebSocket`
//! surface (spec §6). Every client frame is tagged `type` and, when it
//! carries a `request_id`, the matching server frame echoes it back.
//!
//! Frame handling reuses the REST handlers directly -- each `ClientFrame`
//! variant is dispatched by constructing the same extractor types
//! (`State`, `Path`, `Json`) those handlers already take, so the two
//! surfaces can never drift apart on business logic, only on framing.

use std::sync::Arc;

use axum::Json;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use npc_types::{AgentId, GroupId, PlayerId, ZonePosition};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dto::{
    ConversationMessageRequest, ConversationRosterRequest, EndConversationRequest, EventsQuery, NpcActionRequest,
    StartConversationRequest, TranscribeRequest, VoiceGenerateRequest,
};
use crate::error::BoundaryError;
use crate::handlers::{conversation, faction, npc, voice, world};
use crate::state::AppState;

/// `GET /ws/game?player_id=&player_name=` query string.
#[derive(Debug, Deserialize)]
pub struct GameSocketQuery {
    pub player_id: PlayerId,
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Ping,
    NpcAction {
        agent_id: AgentId,
        utterance: String,
    },
    NpcStatus {
        agent_id: AgentId,
    },
    VoiceGenerate {
        agent_id: AgentId,
        text: String,
    },
    SpeechTranscribe {
        audio_base64: String,
        #[serde(default = "default_lang")]
        lang: String,
    },
    SubscribeEvents,
    GetFactions,
    GetWorldEvents {
        limit: Option<usize>,
    },
    ConversationStart {
        npc_ids: Vec<AgentId>,
        location: Option<ZonePosition>,
    },
    ConversationMessage {
        group: GroupId,
        utterance: String,
    },
    ConversationEnd {
        group: GroupId,
    },
    ConversationAddNpc {
        group: GroupId,
        agent: AgentId,
    },
    ConversationRemoveNpc {
        group: GroupId,
        agent: AgentId,
    },
    UpdateLocation {
        position: ZonePosition,
    },
}

fn default_lang() -> String {
    "en".to_owned()
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    Pong,
    NpcResponse(crate::dto::NpcActionResponse),
    NpcStatus(npc_types::Agent),
    Transcription { text: String },
    VoiceReady { audio_base64: String },
    Factions(Vec<npc_types::Faction>),
    WorldEvents(Vec<npc_types::WorldEvent>),
    Conversation(npc_types::ConversationGroup),
    ConversationTurns(Vec<npc_types::GroupTurn>),
    Ack,
    WorldEvent(npc_types::WorldEvent),
    FactionUpdate(npc_types::Faction),
    QuestUpdate(npc_types::Quest),
    Error { kind: npc_types::ErrorKind, message: String },
}

/// Wraps a [`ServerFrame`] with the `request_id` it answers, when the
/// inbound frame carried one.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
    #[serde(flatten)]
    frame: ServerFrame,
}

/// `GET /ws/game`.
pub async fn game_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<GameSocketQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.player_id))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, player_id: PlayerId) {
    debug!(%player_id, "game socket connected");
    let mut events = state.events.subscribe();
    let mut subscribed = false;

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = dispatch(&state, player_id, &text, &mut subscribed).await
                            && socket.send(Message::Text(reply.into())).await.is_err()
                        {
                            debug!("game socket disconnected mid-send");
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("game socket closed");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("game socket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
            broadcast = events.recv(), if subscribed => {
                match broadcast {
                    Ok(message) => {
                        let frame = match message {
                            npc_events::OutboundMessage::WorldEvent(event) => ServerFrame::WorldEvent(event),
                            npc_events::OutboundMessage::FactionUpdate(faction) => ServerFrame::FactionUpdate(faction),
                            npc_events::OutboundMessage::QuestUpdate(quest) => ServerFrame::QuestUpdate(quest),
                        };
                        let envelope = Envelope { request_id: None, frame };
                        if let Ok(json) = serde_json::to_string(&envelope)
                            && socket.send(Message::Text(json.into())).await.is_err()
                        {
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "game socket lagged behind event bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                }
            }
        }
    }
}

/// Parse and dispatch one inbound frame, returning the JSON text to send
/// back (if any -- `subscribe_events` acknowledges once and then streams
/// via the broadcast branch instead).
async fn dispatch(state: &Arc<AppState>, player_id: PlayerId, text: &str, subscribed: &mut bool) -> Option<String> {
    #[derive(Deserialize)]
    struct Tagged {
        request_id: Option<String>,
    }
    let request_id: Option<String> = serde_json::from_str::<Tagged>(text).ok().and_then(|t| t.request_id);

    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            return Some(render(
                request_id.as_deref(),
                ServerFrame::Error { kind: npc_types::ErrorKind::InvalidArgument, message: e.to_string() },
            ));
        }
    };

    let result = run_frame(state, player_id, frame, subscribed).await;
    let server_frame = result.unwrap_or_else(|e| ServerFrame::Error { kind: e.kind(), message: e.to_string() });
    Some(render(request_id.as_deref(), server_frame))
}

fn render(request_id: Option<&str>, frame: ServerFrame) -> String {
    serde_json::to_string(&Envelope { request_id, frame }).unwrap_or_else(|_| "{}".to_owned())
}

async fn run_frame(
    state: &Arc<AppState>,
    player_id: PlayerId,
    frame: ClientFrame,
    subscribed: &mut bool,
) -> Result<ServerFrame, BoundaryError> {
    match frame {
        ClientFrame::Ping => Ok(ServerFrame::Pong),
        ClientFrame::NpcAction { agent_id, utterance } => {
            let Json(response) =
                npc::npc_action(State(state.clone()), Path(agent_id), Json(NpcActionRequest { player_id, utterance }))
                    .await?;
            Ok(ServerFrame::NpcResponse(response))
        }
        ClientFrame::NpcStatus { agent_id } => {
            let Json(agent) = npc::agent_status(State(state.clone()), Path(agent_id)).await?;
            Ok(ServerFrame::NpcStatus(agent))
        }
        ClientFrame::VoiceGenerate { agent_id, text } => {
            let response =
                voice::generate(State(state.clone()), Path(agent_id), Json(VoiceGenerateRequest { text })).await?;
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .map_err(|e| BoundaryError::InvalidArgument(e.to_string()))?;
            Ok(ServerFrame::VoiceReady { audio_base64: BASE64.encode(body) })
        }
        ClientFrame::SpeechTranscribe { audio_base64, lang } => {
            let Json(response) =
                voice::transcribe(State(state.clone()), Json(TranscribeRequest { audio_base64, lang })).await?;
            Ok(ServerFrame::Transcription { text: response.text })
        }
        ClientFrame::SubscribeEvents => {
            *subscribed = true;
            Ok(ServerFrame::Ack)
        }
        ClientFrame::GetFactions => {
            let Json(factions) = faction::list_factions(State(state.clone())).await;
            Ok(ServerFrame::Factions(factions))
        }
        ClientFrame::GetWorldEvents { limit } => {
            let Json(events) = world::world_events(State(state.clone()), Query(EventsQuery { limit })).await;
            Ok(ServerFrame::WorldEvents(events))
        }
        ClientFrame::ConversationStart { npc_ids, location } => {
            let Json(group) = conversation::start(
                State(state.clone()),
                Json(StartConversationRequest { player_id, npc_ids, location }),
            )
            .await?;
            Ok(ServerFrame::Conversation(group))
        }
        ClientFrame::ConversationMessage { group, utterance } => {
            let Json(turns) =
                conversation::message(State(state.clone()), Json(ConversationMessageRequest { group, utterance })).await?;
            Ok(ServerFrame::ConversationTurns(turns))
        }
        ClientFrame::ConversationEnd { group } => {
            let Json(closed) = conversation::end(State(state.clone()), Json(EndConversationRequest { group })).await?;
            Ok(ServerFrame::Conversation(closed))
        }
        ClientFrame::ConversationAddNpc { group, agent } => {
            conversation::add_npc(State(state.clone()), Json(ConversationRosterRequest { group, agent })).await?;
            Ok(ServerFrame::Ack)
        }
        ClientFrame::ConversationRemoveNpc { group, agent } => {
            conversation::remove_npc(State(state.clone()), Json(ConversationRosterRequest { group, agent })).await?;
            Ok(ServerFrame::Ack)
        }
        ClientFrame::UpdateLocation { position } => {
            conversation::update_player_location(State(state.clone()), Path(player_id), Json(position)).await;
            Ok(ServerFrame::Ack)
        }
    }
}
