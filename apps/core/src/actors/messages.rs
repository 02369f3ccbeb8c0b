use crate::brain::ResolvedIntent;
use crate::models::ConversationTurn;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Serialize, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// An error originating from the LLM actor.
    #[error("LLM request failed: {0}")]
    LlmError(String),
    /// A generic internal error within an actor (closed channel, dropped responder).
    #[error("Internal system error: {0}")]
    Internal(String),
    /// An error indicating that an actor operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for ActorError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ActorError::Timeout(format!("Actor operation timed out: {}", err))
    }
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request to generate a complete, non-streamed answer.
    Generate {
        system_prompt: String,
        /// Output of the brain's context assembler; may be empty.
        context: String,
        user_message: String,
        /// A channel to send the final `String` result back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}

/// What the chat front-end receives for one user message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    /// Text shown to the user, generated or templated.
    pub message: String,
    /// Structured data (creature, comparison or team) for rich rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub suggestions: Vec<String>,
    pub resolved: ResolvedIntent,
    /// `true` when generation failed and the template reply was used.
    pub used_fallback: bool,
}

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// A request to answer one user message.
    ProcessUserMessage {
        content: String,
        /// Caller-owned history, oldest first; the current message is not included.
        history: Vec<ConversationTurn>,
        /// A channel to send the final reply back.
        responder: oneshot::Sender<Result<ChatReply, AppError>>,
    },
    /// A command to shut down the supervisor.
    Shutdown,
}
