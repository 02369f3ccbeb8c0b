use crate::actors::messages::AppError;
use async_trait::async_trait;

/// Defines the public interface for an LLM (Large Language Model) actor.
///
/// This trait abstracts the generation backend so the supervisor can be driven
/// by the Ollama actor in production and by in-memory mocks in tests.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Generates a complete answer to `user_message`.
    ///
    /// `context` carries the resolved creatures and recent history; an empty
    /// context means the brain found nothing to add.
    async fn generate(
        &self,
        system_prompt: String,
        context: String,
        user_message: String,
    ) -> Result<String, AppError>;
}
