//! Engine configuration, read from the environment.
//!
//! Every knob has a default so the binary runs with no `.env` at all.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

pub const DEFAULT_POKEAPI_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3.2";

/// Provider round-trips a message may need besides team attempts: name count,
/// name list, type listing and the evolution fan-out.
const RESOLUTION_OVERHEAD_CALLS: u32 = 4;

/// Runtime configuration for the brain and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Base URL of the creature data API.
    #[validate(url)]
    pub pokeapi_base_url: String,
    /// Base URL of the Ollama-compatible generation server.
    #[validate(url)]
    pub llm_base_url: String,
    #[validate(length(min = 1))]
    pub llm_model: String,
    /// Optional bearer token sent to the generation server.
    #[serde(skip_serializing)]
    pub llm_auth_token: Option<String>,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    /// Per-request timeout for creature data calls.
    #[validate(range(min = 1, max = 120))]
    pub provider_timeout_secs: u64,
    /// Timeout for one generation call.
    #[validate(range(min = 1, max = 600))]
    pub generation_timeout_secs: u64,
    /// Total resolution attempts a team synthesis may spend.
    #[validate(range(min = 6, max = 500))]
    pub team_attempt_budget: u32,
    /// How many ids to pull from a type listing.
    #[validate(range(min = 6, max = 500))]
    pub type_pool_limit: usize,
    /// Ids sampled from each representative type when no type is requested.
    #[validate(range(min = 1, max = 10))]
    pub picks_per_type: usize,
    /// Restrict type-filtered pools to terminal evolution stages.
    pub prefer_fully_evolved: bool,
    /// How many past turns the caller should keep around.
    #[validate(range(min = 1, max = 100))]
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pokeapi_base_url: DEFAULT_POKEAPI_BASE_URL.to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_auth_token: None,
            temperature: 0.7,
            provider_timeout_secs: 10,
            generation_timeout_secs: 60,
            team_attempt_budget: 50,
            type_pool_limit: 60,
            picks_per_type: 2,
            prefer_fully_evolved: true,
            history_limit: 10,
        }
    }
}

impl EngineConfig {
    /// Builds a configuration from environment variables, falling back to
    /// defaults for anything unset, then validates it.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let config = Self {
            pokeapi_base_url: string_var("POKEAPI_BASE_URL", defaults.pokeapi_base_url),
            llm_base_url: string_var("OLLAMA_BASE_URL", defaults.llm_base_url),
            llm_model: string_var("OLLAMA_MODEL", defaults.llm_model),
            llm_auth_token: env::var("OLLAMA_AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
            temperature: parsed_var("LLM_TEMPERATURE", defaults.temperature)?,
            provider_timeout_secs: parsed_var("PROVIDER_TIMEOUT_SECS", defaults.provider_timeout_secs)?,
            generation_timeout_secs: parsed_var(
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout_secs,
            )?,
            team_attempt_budget: parsed_var("TEAM_ATTEMPT_BUDGET", defaults.team_attempt_budget)?,
            type_pool_limit: parsed_var("TYPE_POOL_LIMIT", defaults.type_pool_limit)?,
            picks_per_type: parsed_var("PICKS_PER_TYPE", defaults.picks_per_type)?,
            prefer_fully_evolved: parsed_var("PREFER_FULLY_EVOLVED", defaults.prefer_fully_evolved)?,
            history_limit: parsed_var("HISTORY_LIMIT", defaults.history_limit)?,
        };

        config.validate()?;
        // `validate(url)` accepts anything URL-shaped; make sure it also joins cleanly.
        Url::parse(&config.pokeapi_base_url)?;
        Url::parse(&config.llm_base_url)?;
        Ok(config)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Worst case for resolving one message: every team attempt plus the
    /// pool and catalog loads hitting the provider timeout.
    pub fn resolution_budget(&self) -> Duration {
        self.provider_timeout() * self.team_attempt_budget.saturating_add(RESOLUTION_OVERHEAD_CALLS)
    }
}

fn string_var(key: &str, default: String) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        _ => Ok(default),
    }
}
