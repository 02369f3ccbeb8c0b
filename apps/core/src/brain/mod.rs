//! # Brain Module
//!
//! Non-LLM understanding of a chat message, run BEFORE the generation call.
//!
//! ## Components
//! - `keywords`: tokenizer, stop words and keyword sets
//! - `intent`: ordered rule chain (team > comparison > single lookup)
//! - `catalog`: one-time load of every creature name
//! - `resolver`: direct / correction / fuzzy / prefix name resolution
//! - `filters`: type and strategy extraction for team requests
//! - `team`: team synthesis and repetition memory
//! - `narrator`: team title, roles and strengths
//! - `context_packet`: resolved intents and the generation context
//! - `fallback`: template replies when generation fails
//! - `analyzer`: main orchestrator

pub mod analyzer;
pub mod catalog;
pub mod context_packet;
pub mod fallback;
pub mod filters;
pub mod intent;
pub mod keywords;
pub mod narrator;
pub mod resolver;
pub mod team;

pub use analyzer::PokedexBrain;
pub use catalog::NameCatalog;
pub use context_packet::{build_context, ComparisonResult, ResolvedIntent};
pub use fallback::compose_fallback;
pub use filters::{Strategy, TeamFilters};
pub use intent::{IntentClassifier, IntentKind, IntentResult};
pub use narrator::{MemberRole, StrategyNarrative};
pub use resolver::{MatchSource, NameResolver, Resolution};
pub use team::{RepetitionMemory, SynthesisOutcome, TeamResult, TeamSettings, TeamSynthesizer};
