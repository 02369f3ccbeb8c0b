//! Brain Module Tests
//!
//! Resolution cascade, intent priority, team synthesis properties and the
//! deterministic renderers, all against the in-memory provider.

use crate::brain::context_packet::{build_context, ComparisonResult, ResolvedIntent};
use crate::brain::fallback::compose_fallback;
use crate::brain::filters::{Strategy, TeamFilters};
use crate::brain::resolver::{MatchSource, NameResolver};
use crate::brain::team::{
    is_special_form, RepetitionMemory, SynthesisOutcome, TeamSettings, TeamSynthesizer, TEAM_SIZE,
};
use crate::brain::{NameCatalog, PokedexBrain};
use crate::models::ConversationTurn;
use crate::tests::fixtures::{creature, MockProvider};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

fn resolver_for(provider: Arc<MockProvider>) -> NameResolver {
    NameResolver::new(provider, Arc::new(NameCatalog::new()))
}

fn brain_for(provider: Arc<MockProvider>, seed: u64) -> PokedexBrain {
    PokedexBrain::with_seed(
        provider,
        Arc::new(NameCatalog::new()),
        Arc::new(RepetitionMemory::new()),
        TeamSettings::default(),
        seed,
    )
}

fn synthesizer(provider: Arc<MockProvider>, memory: Arc<RepetitionMemory>, seed: u64) -> TeamSynthesizer {
    let settings = TeamSettings {
        prefer_fully_evolved: false,
        ..TeamSettings::default()
    };
    TeamSynthesizer::with_seed(provider, memory, settings, seed)
}

fn filters(type_filter: Option<&str>, strategy: Option<Strategy>) -> TeamFilters {
    TeamFilters {
        type_filter: type_filter.map(str::to_string),
        strategy_filter: strategy,
    }
}

// ============================================================================
// Name resolution
// ============================================================================

#[tokio::test]
async fn test_catalog_names_resolve_directly_without_loading_catalog() {
    let provider = Arc::new(MockProvider::standard());
    let resolver = resolver_for(provider.clone());

    for name in ["bulbasaur", "charizard", "pikachu", "charizard-mega-x", "mew"] {
        let hit = resolver.resolve(name).await.unwrap();
        assert_eq!(hit.source, MatchSource::Direct);
        assert_eq!(hit.record.name, name);
    }
    // Fuzzy stages need the catalog; it was never loaded.
    assert_eq!(provider.names_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_resolution_of_canonical_names_is_idempotent() {
    let provider = Arc::new(MockProvider::standard());
    let resolver = resolver_for(provider);

    for name in ["venusaur", "blastoise", "gengar"] {
        let first = resolver.resolve(name).await.unwrap();
        let again = resolver.resolve(&first.record.name).await.unwrap();
        assert_eq!(again.record.name, name);
    }
}

#[tokio::test]
async fn test_manual_corrections_map_to_canonical_names() {
    let provider = Arc::new(MockProvider::standard());
    let resolver = resolver_for(provider);

    for (typo, canonical) in [("pikaxu", "pikachu"), ("charizad", "charizard"), ("mewtu", "mewtwo")] {
        let hit = resolver.resolve(typo).await.unwrap();
        assert_eq!(hit.source, MatchSource::Correction);
        assert_eq!(hit.record.name, canonical);
    }
}

#[tokio::test]
async fn test_fuzzy_stages() {
    let provider = Arc::new(MockProvider::standard());
    let resolver = resolver_for(provider);

    let strict = resolver.resolve("charizrd").await.unwrap();
    assert_eq!(strict.source, MatchSource::FuzzyStrict);
    assert_eq!(strict.record.name, "charizard");

    // Two substitutions in six letters: below the strict cutoff.
    let loose = resolver.resolve("raixhy").await.unwrap();
    assert_eq!(loose.source, MatchSource::FuzzyLoose);
    assert_eq!(loose.record.name, "raichu");
}

#[tokio::test]
async fn test_transposed_letters_are_a_strict_fuzzy_match() {
    let provider = Arc::new(MockProvider::standard());
    let resolver = resolver_for(provider);

    let hit = resolver.resolve("pikahcu").await.unwrap();
    assert_eq!(hit.source, MatchSource::FuzzyStrict);
    assert_eq!(hit.record.name, "pikachu");
}

#[tokio::test]
async fn test_each_name_is_fetched_once_per_resolution() {
    let provider = Arc::new(MockProvider::standard().with_transient_failures("pikachu", 1));
    let resolver = resolver_for(provider.clone());

    // Every fuzzy and prefix stage points back at the name that just failed.
    assert!(resolver.resolve("pikachu").await.is_none());
    assert_eq!(provider.lookup_count("pikachu"), 1);
}

#[tokio::test]
async fn test_prefix_fallback() {
    let provider = Arc::new(MockProvider::standard());
    let resolver = resolver_for(provider);

    let hit = resolver.resolve("bulbaxxxxxxx").await.unwrap();
    assert_eq!(hit.source, MatchSource::Prefix);
    assert_eq!(hit.record.name, "bulbasaur");
}

#[tokio::test]
async fn test_unresolvable_tokens() {
    let provider = Arc::new(MockProvider::standard());
    let resolver = resolver_for(provider.clone());

    assert!(resolver.resolve("zzzzzzzz").await.is_none());
    // Short and stop-word tokens never reach the provider.
    assert!(resolver.resolve("xy").await.is_none());
    assert!(resolver.resolve("sobre").await.is_none());
    assert_eq!(provider.lookup_count("xy"), 0);
    assert_eq!(provider.lookup_count("sobre"), 0);
}

#[tokio::test]
async fn test_offline_provider_resolves_nothing() {
    let provider = Arc::new(MockProvider::offline());
    let resolver = resolver_for(provider);
    assert!(resolver.resolve("pikachu").await.is_none());
}

// ============================================================================
// Intent priority and engine
// ============================================================================

#[tokio::test]
async fn test_team_keywords_beat_comparison_keywords() {
    let provider = Arc::new(MockProvider::standard());
    let brain = brain_for(provider, 11);

    let resolved = brain
        .detect_and_resolve("monte uma equipe, compare fogo vs água")
        .await;

    let ResolvedIntent::Team(team) = resolved else {
        panic!("expected a team, got {:?}", resolved);
    };
    assert_eq!(team.filters.type_filter.as_deref(), Some("fire"));
}

#[tokio::test]
async fn test_comparison_with_one_creature_degrades_to_single() {
    let provider = Arc::new(MockProvider::standard());
    let brain = brain_for(provider, 1);

    let resolved = brain.detect_and_resolve("compare gengar vs zzzzzzzz").await;
    assert!(matches!(resolved, ResolvedIntent::Single(ref r) if r.name == "gengar"));
}

#[tokio::test]
async fn test_comparison_without_creatures_is_none() {
    let provider = Arc::new(MockProvider::standard());
    let brain = brain_for(provider, 1);

    let resolved = brain.detect_and_resolve("compare zzzz vs yyyy").await;
    assert_eq!(resolved, ResolvedIntent::None);
}

#[tokio::test]
async fn test_comparison_deduplicates_creatures() {
    let provider = Arc::new(MockProvider::standard());
    let brain = brain_for(provider, 1);

    let resolved = brain
        .detect_and_resolve("compare pikachu vs pikaxu vs raichu")
        .await;
    let ResolvedIntent::Comparison(comparison) = resolved else {
        panic!("expected a comparison");
    };
    assert_eq!(comparison.members[0].name, "pikachu");
    assert_eq!(comparison.members[1].name, "raichu");
}

#[tokio::test]
async fn test_single_lookup_scans_left_to_right() {
    let provider = Arc::new(MockProvider::standard());
    let brain = brain_for(provider, 1);

    let resolved = brain.detect_and_resolve("gengar ou alakazam?").await;
    assert!(matches!(resolved, ResolvedIntent::Single(ref r) if r.name == "gengar"));
}

#[tokio::test]
async fn test_single_lookup_runs_the_whole_cascade_per_token() {
    let provider = Arc::new(MockProvider::standard());
    let brain = brain_for(provider, 1);

    // A partial first name beats a correctly spelled later one.
    let partial = brain.detect_and_resolve("charm ou gengar").await;
    assert!(matches!(partial, ResolvedIntent::Single(ref r) if r.name == "charmander"));

    let misspelled = brain.detect_and_resolve("pikahcu ou gengar").await;
    assert!(matches!(misspelled, ResolvedIntent::Single(ref r) if r.name == "pikachu"));
}

#[tokio::test]
async fn test_single_lookup_retries_longest_token() {
    // 1. Arrange
    let provider = Arc::new(MockProvider::standard().with_transient_failures("pikachu", 1));
    let brain = brain_for(provider.clone(), 1);

    // 2. Act
    let resolved = brain.detect_and_resolve("fale sobre pikachu").await;

    // 3. Assert
    assert!(matches!(resolved, ResolvedIntent::Single(ref r) if r.name == "pikachu"));
    assert_eq!(provider.lookup_count("pikachu"), 2);
}

#[tokio::test]
async fn test_nothing_resolvable_is_none() {
    let provider = Arc::new(MockProvider::standard());
    let brain = brain_for(provider, 1);

    assert_eq!(brain.detect_and_resolve("olá, tudo bem?").await, ResolvedIntent::None);
    assert_eq!(brain.detect_and_resolve("").await, ResolvedIntent::None);
}

#[tokio::test]
async fn test_offline_provider_never_fails_the_engine() {
    let provider = Arc::new(MockProvider::offline());
    let brain = brain_for(provider, 1);

    assert_eq!(brain.detect_and_resolve("fale sobre pikachu").await, ResolvedIntent::None);
    assert_eq!(
        brain.detect_and_resolve("monte uma equipe de fogo").await,
        ResolvedIntent::None
    );
}

// ============================================================================
// Team synthesis
// ============================================================================

#[tokio::test]
async fn test_successful_teams_are_six_unique_with_one_special_form_at_most() {
    let provider = Arc::new(MockProvider::standard());

    for seed in 0..20 {
        let synth = synthesizer(provider.clone(), Arc::new(RepetitionMemory::new()), seed);
        let SynthesisOutcome::Success(team) = synth.synthesize(&filters(Some("fire"), None)).await else {
            panic!("seed {} failed to build a team", seed);
        };

        let ids: HashSet<u32> = team.member_ids().into_iter().collect();
        assert_eq!(team.members.len(), TEAM_SIZE);
        assert_eq!(ids.len(), TEAM_SIZE);
        let specials = team.members.iter().filter(|m| is_special_form(&m.name)).count();
        assert!(specials <= 1, "seed {} produced {} special forms", seed, specials);
    }
}

#[tokio::test]
async fn test_special_form_cap_with_a_mega_heavy_pool() {
    let mut provider = MockProvider::numbered("dragon", 6);
    for i in 0..4 {
        provider = provider.with_record(creature(
            10100 + i,
            &format!("dragon-{}-mega", i),
            &["dragon"],
            [80, 80, 80, 80, 80, 80],
        ));
    }
    let provider = Arc::new(provider);

    for seed in 0..10 {
        let synth = synthesizer(provider.clone(), Arc::new(RepetitionMemory::new()), seed);
        let SynthesisOutcome::Success(team) = synth.synthesize(&filters(Some("dragon"), None)).await else {
            panic!("expected a team");
        };
        let specials = team.members.iter().filter(|m| is_special_form(&m.name)).count();
        assert!(specials <= 1);
    }
}

#[tokio::test]
async fn test_strategy_filtered_members_satisfy_the_predicate() {
    let provider = Arc::new(MockProvider::standard());

    for seed in 0..10 {
        let synth = synthesizer(provider.clone(), Arc::new(RepetitionMemory::new()), seed);
        let outcome = synth
            .synthesize(&filters(Some("fire"), Some(Strategy::Offensive)))
            .await;
        let SynthesisOutcome::Success(team) = outcome else {
            panic!("expected a team");
        };
        for member in &team.members {
            assert!(
                Strategy::Offensive.matches(&member.stats),
                "{} is not offensive",
                member.name
            );
        }
    }
}

#[tokio::test]
async fn test_repetition_memory_is_avoided_when_possible() {
    // Twelve candidates, the last team used six of them.
    let provider = Arc::new(MockProvider::numbered("ghost", 12));
    let memory = Arc::new(RepetitionMemory::new());
    memory.replace(1..=6);

    let synth = synthesizer(provider, memory.clone(), 42);
    let SynthesisOutcome::Success(team) = synth.synthesize(&filters(Some("ghost"), None)).await else {
        panic!("expected a team");
    };

    let ids: HashSet<u32> = team.member_ids().into_iter().collect();
    assert_eq!(ids, (7..=12).collect::<HashSet<u32>>());
    assert_eq!(memory.snapshot(), ids);
}

#[tokio::test]
async fn test_repetition_memory_is_advisory() {
    // Only eight candidates and six remembered: the full pool has to be used.
    let provider = Arc::new(MockProvider::numbered("ghost", 8));
    let memory = Arc::new(RepetitionMemory::new());
    memory.replace(1..=6);

    let synth = synthesizer(provider, memory, 5);
    let outcome = synth.synthesize(&filters(Some("ghost"), None)).await;
    assert!(matches!(outcome, SynthesisOutcome::Success(_)));
}

#[tokio::test]
async fn test_consecutive_teams_differ_when_pool_allows() {
    let provider = Arc::new(MockProvider::numbered("ghost", 12));
    let memory = Arc::new(RepetitionMemory::new());
    let synth = synthesizer(provider, memory, 9);

    let SynthesisOutcome::Success(first) = synth.synthesize(&filters(Some("ghost"), None)).await else {
        panic!("expected a team");
    };
    let SynthesisOutcome::Success(second) = synth.synthesize(&filters(Some("ghost"), None)).await else {
        panic!("expected a team");
    };

    let first: HashSet<u32> = first.member_ids().into_iter().collect();
    let second: HashSet<u32> = second.member_ids().into_iter().collect();
    assert!(first.is_disjoint(&second));
}

#[tokio::test]
async fn test_fully_evolved_preference() {
    let provider = Arc::new(MockProvider::standard());
    let synth = TeamSynthesizer::with_seed(
        provider,
        Arc::new(RepetitionMemory::new()),
        TeamSettings::default(),
        3,
    );

    for _ in 0..5 {
        let SynthesisOutcome::Success(team) = synth.synthesize(&filters(Some("fire"), None)).await else {
            panic!("expected a team");
        };
        for member in &team.members {
            assert!(
                !["charmander", "charmeleon", "vulpix", "growlithe", "ponyta"]
                    .contains(&member.name.as_str()),
                "{} is not fully evolved",
                member.name
            );
        }
    }
}

#[tokio::test]
async fn test_diverse_pool_without_type_filter() {
    let provider = Arc::new(MockProvider::standard());
    let synth = synthesizer(provider, Arc::new(RepetitionMemory::new()), 21);

    let SynthesisOutcome::Success(team) = synth.synthesize(&TeamFilters::default()).await else {
        panic!("expected a team");
    };
    let types: HashSet<&str> = team
        .members
        .iter()
        .flat_map(|m| m.types.iter().map(String::as_str))
        .collect();
    assert!(types.len() >= 3, "only {:?}", types);
    assert_eq!(team.narrative.title, "Equipe Diversificada");
}

// ============================================================================
// Renderers
// ============================================================================

#[tokio::test]
async fn test_fallback_is_byte_identical_for_every_intent() {
    let provider = Arc::new(MockProvider::standard());
    let brain = brain_for(provider, 8);

    let single = brain.detect_and_resolve("fale sobre pikachu").await;
    let comparison = brain.detect_and_resolve("compare charizard vs blastoise").await;
    let team = brain.detect_and_resolve("monte uma equipe de fogo ofensiva").await;

    for resolved in [ResolvedIntent::None, single, comparison, team] {
        let first = compose_fallback(&resolved);
        assert_eq!(first, compose_fallback(&resolved));
        assert_eq!(first, brain.compose_fallback(&resolved));
        assert!(!first.is_empty());
    }
}

#[test]
fn test_context_templates_are_distinct() {
    let a = creature(6, "charizard", &["fire", "flying"], [78, 84, 78, 109, 85, 100]);
    let b = creature(9, "blastoise", &["water"], [79, 83, 100, 85, 105, 78]);
    let history = [ConversationTurn::user("oi")];

    let single = build_context(&history, &ResolvedIntent::Single(a.clone()));
    let comparison = build_context(
        &history,
        &ResolvedIntent::Comparison(ComparisonResult::new(a, b)),
    );

    assert!(single.starts_with("Pokémon em foco: Charizard"));
    assert!(comparison.starts_with("Comparação solicitada entre Charizard e Blastoise"));
    assert!(comparison.ends_with("Histórico recente:\nUsuário: oi"));
}
