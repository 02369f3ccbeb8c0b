use crate::actors::messages::{ActorError, AppError, LlmMessage};
use crate::actors::traits::LlmActor;
use crate::config::EngineConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Extra time the handle waits beyond the HTTP timeout before giving up on the actor.
pub const HANDLE_GRACE: Duration = Duration::from_secs(5);

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    reply_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` talking to an Ollama server and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task.
    pub fn new(config: &EngineConfig) -> Result<Self, AppError> {
        let (sender, receiver) = mpsc::channel(32);
        let actor = LlmActorRunner::new(receiver, config)?;
        tokio::spawn(async move { actor.run().await });
        Ok(Self {
            sender,
            reply_timeout: config.generation_timeout() + HANDLE_GRACE,
        })
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    async fn generate(
        &self,
        system_prompt: String,
        context: String,
        user_message: String,
    ) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Generate {
            system_prompt,
            context,
            user_message,
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
}

/// Folds the brain's context into the user turn.
fn user_content(context: &str, user_message: &str) -> String {
    if context.trim().is_empty() {
        user_message.to_string()
    } else {
        format!("CONTEXTO:\n{}\n\nPERGUNTA DO USUÁRIO:\n{}", context, user_message)
    }
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    server_url: String,
    model: String,
    temperature: f32,
    client: Client,
    auth_token: Option<String>,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, config: &EngineConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.generation_timeout())
            .build()?;

        Ok(Self {
            receiver,
            server_url: config.llm_base_url.trim_end_matches('/').to_string(),
            model: config.llm_model.clone(),
            temperature: config.temperature,
            client,
            auth_token: config.llm_auth_token.clone(),
        })
    }

    async fn run(mut self) {
        info!("LlmActor started (model: {})", self.model);

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }

        info!("LlmActor stopped");
    }

    fn build_request(&self, endpoint: &str, payload: &serde_json::Value) -> Result<reqwest::RequestBuilder, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_token {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AppError::Config(format!("Invalid auth token: {}", e)))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        Ok(self
            .client
            .post(format!("{}/{}", self.server_url, endpoint))
            .headers(headers)
            .json(payload))
    }

    async fn handle_message(&mut self, msg: LlmMessage) {
        match msg {
            LlmMessage::Generate {
                system_prompt,
                context,
                user_message,
                responder,
            } => {
                let result = self.chat(system_prompt, context, user_message).await;
                if let Err(e) = &result {
                    error!("Generation failed: {}", e);
                }
                let _ = responder.send(result);
            }
        }
    }

    async fn chat(&self, system_prompt: String, context: String, user_message: String) -> Result<String, AppError> {
        debug!("LLM generating for message: {}", user_message);

        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_content(&context, &user_message) },
            ],
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        let res = self
            .build_request("api/chat", &payload)?
            .send()
            .await
            .map_err(|e| ActorError::LlmError(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ActorError::LlmError(format!(
                "Chat request failed with status {}: {}",
                status, body
            ))
            .into());
        }

        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| ActorError::LlmError(e.to_string()))?;

        match json["message"]["content"].as_str() {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            _ => Err(ActorError::LlmError("Empty response from model".to_string()).into()),
        }
    }
}
