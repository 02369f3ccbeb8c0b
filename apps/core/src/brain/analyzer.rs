//! Brain engine: classifies a message and resolves it into creatures or a team.
//!
//! Nothing here fails: provider errors, unresolvable messages and exhausted
//! team budgets all end up as [`ResolvedIntent::None`].

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::catalog::NameCatalog;
use super::context_packet::{self, ComparisonResult, ResolvedIntent};
use super::fallback;
use super::filters::extract_filters;
use super::intent::{IntentClassifier, IntentKind};
use super::keywords::Utterance;
use super::resolver::NameResolver;
use super::team::{RepetitionMemory, SynthesisOutcome, TeamSettings, TeamSynthesizer};
use crate::config::EngineConfig;
use crate::models::{ConversationTurn, CreatureRecord};
use crate::pokeapi::CreatureProvider;

/// Creatures a comparison needs.
const COMPARISON_SIZE: usize = 2;

/// Main entry point of the brain.
pub struct PokedexBrain {
    classifier: IntentClassifier,
    resolver: NameResolver,
    synthesizer: TeamSynthesizer,
    catalog: Arc<NameCatalog>,
}

impl PokedexBrain {
    pub fn new(
        provider: Arc<dyn CreatureProvider>,
        catalog: Arc<NameCatalog>,
        memory: Arc<RepetitionMemory>,
        settings: TeamSettings,
    ) -> Self {
        let synthesizer = TeamSynthesizer::new(Arc::clone(&provider), memory, settings);
        Self::assemble(provider, catalog, synthesizer)
    }

    /// Same as [`PokedexBrain::new`] with a seeded team sampler.
    pub fn with_seed(
        provider: Arc<dyn CreatureProvider>,
        catalog: Arc<NameCatalog>,
        memory: Arc<RepetitionMemory>,
        settings: TeamSettings,
        seed: u64,
    ) -> Self {
        let synthesizer = TeamSynthesizer::with_seed(Arc::clone(&provider), memory, settings, seed);
        Self::assemble(provider, catalog, synthesizer)
    }

    /// Fresh catalog and memory, tunables from `config`.
    pub fn from_config(provider: Arc<dyn CreatureProvider>, config: &EngineConfig) -> Self {
        Self::new(
            provider,
            Arc::new(NameCatalog::new()),
            Arc::new(RepetitionMemory::new()),
            TeamSettings::from(config),
        )
    }

    fn assemble(
        provider: Arc<dyn CreatureProvider>,
        catalog: Arc<NameCatalog>,
        synthesizer: TeamSynthesizer,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            resolver: NameResolver::new(provider, Arc::clone(&catalog)),
            synthesizer,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Arc<NameCatalog> {
        &self.catalog
    }

    pub fn memory(&self) -> &Arc<RepetitionMemory> {
        self.synthesizer.memory()
    }

    #[instrument(skip(self))]
    pub async fn detect_and_resolve(&self, message: &str) -> ResolvedIntent {
        let start = Instant::now();
        let utterance = Utterance::new(message);
        let intent = self.classifier.classify(&utterance);

        let resolved = match intent.kind {
            IntentKind::TeamRequest => self.resolve_team(&utterance).await,
            IntentKind::Comparison => self.resolve_comparison(&utterance).await,
            IntentKind::SingleLookup => match self.resolve_single(&utterance).await {
                Some(record) => ResolvedIntent::Single(record),
                None => ResolvedIntent::None,
            },
        };

        info!(
            "Brain: rule {} -> {} in {}ms",
            intent.rule,
            resolved.label(),
            start.elapsed().as_millis()
        );
        resolved
    }

    pub fn build_context(&self, history: &[ConversationTurn], resolved: &ResolvedIntent) -> String {
        context_packet::build_context(history, resolved)
    }

    pub fn compose_fallback(&self, resolved: &ResolvedIntent) -> String {
        fallback::compose_fallback(resolved)
    }

    async fn resolve_team(&self, utterance: &Utterance) -> ResolvedIntent {
        let filters = extract_filters(&utterance.lowered);
        match self.synthesizer.synthesize(&filters).await {
            SynthesisOutcome::Success(team) => ResolvedIntent::Team(team),
            SynthesisOutcome::Exhausted {
                accepted,
                attempts_used,
            } => {
                warn!(
                    "Team unavailable ({} members after {} attempts)",
                    accepted, attempts_used
                );
                ResolvedIntent::None
            }
        }
    }

    /// Up to two distinct creatures; one degrades to a single lookup.
    async fn resolve_comparison(&self, utterance: &Utterance) -> ResolvedIntent {
        let mut found: Vec<CreatureRecord> = Vec::with_capacity(COMPARISON_SIZE);

        for token in utterance.candidate_tokens() {
            let Some(hit) = self.resolver.resolve(token).await else {
                continue;
            };
            if found.iter().any(|r| r.id == hit.record.id) {
                continue;
            }
            found.push(hit.record);
            if found.len() == COMPARISON_SIZE {
                break;
            }
        }

        let mut found = found.into_iter();
        match (found.next(), found.next()) {
            (Some(first), Some(second)) => {
                ResolvedIntent::Comparison(ComparisonResult::new(first, second))
            }
            (Some(only), None) => ResolvedIntent::Single(only),
            _ => ResolvedIntent::None,
        }
    }

    /// First token that resolves, left to right. When none does, the longest
    /// token gets one more try, which covers a provider that failed transiently.
    async fn resolve_single(&self, utterance: &Utterance) -> Option<CreatureRecord> {
        for token in utterance.candidate_tokens() {
            if let Some(hit) = self.resolver.resolve(token).await {
                return Some(hit.record);
            }
        }

        let longest = utterance.longest_candidate()?;
        debug!("Retrying longest token '{}'", longest);
        self.resolver.resolve(longest).await.map(|hit| hit.record)
    }
}
