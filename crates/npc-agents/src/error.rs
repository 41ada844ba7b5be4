//! Error types for the agent-state and memory-engine layer.
//!
//! All operations that can fail return typed errors rather than panicking.

use npc_types::AgentId;

/// Errors that can occur during agent state or memory operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Agent with the given ID is not known to the caller.
    #[error("agent not found: {0}")]
    AgentUnknown(AgentId),

    /// An action was attempted on an agent before `init` completed.
    #[error("agent uninitialized: {0}")]
    AgentUninitialized(AgentId),

    /// An arithmetic overflow occurred during a vitals or decay computation.
    #[error("arithmetic overflow in {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// A caller tried to abandon or progress a goal the agent does not hold.
    #[error("goal not found for agent {agent}: {description}")]
    GoalNotFound {
        agent: AgentId,
        description: String,
    },

    /// A value supplied to a public operation fell outside its documented
    /// range (e.g. a trust delta outside `[-0.2, 0.2]`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
