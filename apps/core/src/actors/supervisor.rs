use crate::actors::llm::{LlmActorHandle, HANDLE_GRACE};
use crate::actors::messages::{ActorError, AppError, ChatReply, SupervisorMessage};
use crate::actors::traits::LlmActor;
use crate::brain::context_packet::{reply_payload, suggestions, system_prompt};
use crate::brain::{PokedexBrain, ResolvedIntent};
use crate::config::EngineConfig;
use crate::models::ConversationTurn;
use crate::pokeapi::PokeApiClient;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{error, info, instrument, warn};

/// How long resolution may take when no configuration is given.
const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(90);
/// Lower bound for one message: resolution plus one generation call.
const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(120);
/// Slack between the runner finishing and the handle giving up.
const REPLY_GRACE: Duration = Duration::from_secs(10);

/// Limits applied by the supervisor to each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub history_limit: usize,
    /// Resolution running longer than this is abandoned and the message is
    /// answered as if nothing resolved.
    pub resolve_timeout: Duration,
    pub reply_timeout: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            history_limit: 10,
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }
}

impl From<&EngineConfig> for SupervisorSettings {
    fn from(config: &EngineConfig) -> Self {
        let resolve_timeout = config.resolution_budget();
        let generation_wait = config.generation_timeout() + HANDLE_GRACE;
        Self {
            history_limit: config.history_limit,
            resolve_timeout,
            reply_timeout: DEFAULT_REPLY_TIMEOUT.max(resolve_timeout + generation_wait + REPLY_GRACE),
        }
    }
}

/// A handle to the `SupervisorActor`.
///
/// This is the primary entry point for all business logic in the application. It runs
/// the brain over each user message, asks the `LlmActor` for an answer and falls back
/// to a templated reply when generation fails.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
    reply_timeout: Duration,
}

impl SupervisorHandle {
    /// Creates the production supervisor: PokeAPI client, Ollama actor and a fresh brain.
    pub fn from_config(config: &EngineConfig) -> Result<Self, AppError> {
        let provider = Arc::new(PokeApiClient::new(
            config.pokeapi_base_url.clone(),
            config.provider_timeout(),
        )?);
        let brain = Arc::new(PokedexBrain::from_config(provider, config));
        let llm = Arc::new(LlmActorHandle::new(config)?);

        Ok(Self::with_settings(brain, llm, SupervisorSettings::from(config)))
    }

    /// Creates a supervisor over an existing brain and LLM actor with default limits.
    pub fn with_actors<L>(brain: Arc<PokedexBrain>, llm: Arc<L>, history_limit: usize) -> Self
    where
        L: LlmActor + Send + Sync + 'static,
    {
        let settings = SupervisorSettings {
            history_limit,
            ..SupervisorSettings::default()
        };
        Self::with_settings(brain, llm, settings)
    }

    /// This spawns the `SupervisorRunner` in a new Tokio task.
    pub fn with_settings<L>(brain: Arc<PokedexBrain>, llm: Arc<L>, settings: SupervisorSettings) -> Self
    where
        L: LlmActor + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::channel(32);
        let runner = SupervisorRunner::new(receiver, brain, llm, settings);
        tokio::spawn(async move { runner.run().await });
        Self {
            sender,
            reply_timeout: settings.reply_timeout,
        }
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    /// Answers one user message.
    ///
    /// `history` is the caller's conversation so far, oldest first, without
    /// the message being answered.
    #[instrument(skip(self, history), fields(history_len = history.len()))]
    pub async fn process_message(
        &self,
        content: String,
        history: Vec<ConversationTurn>,
    ) -> Result<ChatReply, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::ProcessUserMessage {
            content,
            history,
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::Internal(e.to_string()))?;
        timeout(self.reply_timeout, recv)
            .await?
            .map_err(|e| ActorError::Internal(e.to_string()))?
    }

    /// Stops the supervisor; later calls fail with an actor error.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.sender
            .send(SupervisorMessage::Shutdown)
            .await
            .map_err(|e| ActorError::Internal(e.to_string()))?;
        Ok(())
    }
}

// --- Actor Runner ---
struct SupervisorRunner<L>
where
    L: LlmActor + Send + Sync + 'static,
{
    receiver: mpsc::Receiver<SupervisorMessage>,
    brain: Arc<PokedexBrain>,
    llm_actor: Arc<L>,
    history_limit: usize,
    resolve_timeout: Duration,
}

impl<L> SupervisorRunner<L>
where
    L: LlmActor + Send + Sync + 'static,
{
    fn new(
        receiver: mpsc::Receiver<SupervisorMessage>,
        brain: Arc<PokedexBrain>,
        llm_actor: Arc<L>,
        settings: SupervisorSettings,
    ) -> Self {
        Self {
            receiver,
            brain,
            llm_actor,
            history_limit: settings.history_limit,
            resolve_timeout: settings.resolve_timeout,
        }
    }

    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                SupervisorMessage::Shutdown => {
                    info!("Supervisor received shutdown");
                    break;
                }
                other => self.handle_message(other).await,
            }
        }
        info!("Supervisor stopped");
    }

    async fn handle_message(&mut self, msg: SupervisorMessage) {
        match msg {
            SupervisorMessage::ProcessUserMessage {
                content,
                history,
                responder,
            } => {
                let result = self.handle_user_message(content, history).await;
                if let Err(e) = &result {
                    error!("Error processing user message: {:?}", e);
                }
                let _ = responder.send(result);
            }
            SupervisorMessage::Shutdown => {}
        }
    }

    #[instrument(skip(self, history))]
    async fn handle_user_message(
        &self,
        content: String,
        history: Vec<ConversationTurn>,
    ) -> Result<ChatReply, AppError> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Validation("Message must not be empty".to_string()));
        }

        let resolved = match timeout(self.resolve_timeout, self.brain.detect_and_resolve(&content)).await {
            Ok(resolved) => resolved,
            Err(_) => {
                warn!(
                    "Resolution exceeded {}s, answering without a resolved intent",
                    self.resolve_timeout.as_secs()
                );
                ResolvedIntent::None
            }
        };

        let start = history.len().saturating_sub(self.history_limit);
        let context = self.brain.build_context(&history[start..], &resolved);
        let system = system_prompt(&resolved);

        let (message, used_fallback) = match self
            .llm_actor
            .generate(system, context, content.clone())
            .await
        {
            Ok(text) => (text, false),
            Err(e) => {
                warn!("Generation failed, using template reply: {}", e);
                (self.brain.compose_fallback(&resolved), true)
            }
        };

        Ok(ChatReply {
            message,
            payload: reply_payload(&resolved),
            suggestions: suggestions(&resolved),
            resolved,
            used_fallback,
        })
    }
}
