//! Boundary error type and its `{error: {kind, message, retryable?}}`
//! response body (spec §6, §7).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use npc_types::ErrorKind;
use serde::Serialize;

/// A request-facing failure, tagged with the stable [`ErrorKind`] every
/// crate in the workspace agrees on.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// An operation named an agent, faction, territory, battle, trade
    /// route, quest, or group id this process has no record of.
    #[error("not found: {0}")]
    NotFound(String),

    /// An action was requested before its prerequisite state existed (spec
    /// §7: "action before init").
    #[error("uninitialized: {0}")]
    Uninitialized(String),

    /// Request validation failed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A conversation operation targeted a group that has already ended.
    #[error("group closed: {0}")]
    GroupClosed(String),

    /// A faction-engine operation failed.
    #[error("faction error: {0}")]
    Faction(#[from] npc_core::faction::FactionError),

    /// A group-orchestrator operation failed.
    #[error("group error: {0}")]
    Group(#[from] npc_core::group::GroupError),

    /// An agent-logic operation failed.
    #[error("agent error: {0}")]
    Agent(#[from] npc_agents::AgentError),

    /// An Oracle call failed outside the always-succeeds `cognize` path
    /// (synthesize/transcribe have no fallback frame to fall back to).
    #[error("oracle error: {0}")]
    Oracle(#[from] npc_oracle::OracleError),

    /// A manual or autorun tick could not be advanced.
    #[error("tick error: {0}")]
    Tick(#[from] npc_core::tick::TickError),
}

/// The wire shape of a failed response (spec §6: "Status & error body
/// shape: `{error: {kind, message, retryable?}}`").
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl BoundaryError {
    /// The stable kind tag this error maps to (spec §7's table).
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::AgentUnknown,
            Self::Uninitialized(_) => ErrorKind::AgentUninitialized,
            Self::InvalidArgument(_) | Self::Agent(_) => ErrorKind::InvalidArgument,
            Self::GroupClosed(_) | Self::Group(_) => ErrorKind::GroupClosed,
            Self::Faction(_) => ErrorKind::InvalidArgument,
            Self::Oracle(_) => ErrorKind::OracleTimeout,
            Self::Tick(_) => ErrorKind::InvalidArgument,
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::Faction(_) => StatusCode::NOT_FOUND,
            Self::Uninitialized(_) => StatusCode::CONFLICT,
            Self::InvalidArgument(_) | Self::Agent(_) | Self::Tick(_) => StatusCode::BAD_REQUEST,
            Self::GroupClosed(_) | Self::Group(_) => StatusCode::GONE,
            Self::Oracle(_) => StatusCode::BAD_GATEWAY,
        }
    }

    const fn retryable(&self) -> Option<bool> {
        match self {
            Self::Oracle(_) => Some(true),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for BoundaryError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::InvalidArgument(errors.to_string())
    }
}

impl IntoResponse for BoundaryError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message: self.to_string(),
                retryable: self.retryable(),
            },
        };
        (status, Json(body)).into_response()
    }
}
