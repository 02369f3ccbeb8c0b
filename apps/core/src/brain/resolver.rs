//! Name resolution: turns a user token into a creature record.
//!
//! Stages, first success wins: direct lookup, manual correction table,
//! strict fuzzy match, loose fuzzy match, shared-prefix fallback. A name is
//! fetched at most once per resolution.

use super::catalog::NameCatalog;
use super::keywords::is_stopword;
use crate::models::CreatureRecord;
use crate::pokeapi::CreatureProvider;
use serde::Serialize;
use similar::TextDiff;
use std::sync::Arc;
use tracing::{debug, warn};

/// Similarity needed for the strict fuzzy stage.
pub const STRICT_CUTOFF: f64 = 0.75;
/// Similarity needed for the loose fuzzy stage.
pub const LOOSE_CUTOFF: f64 = 0.6;
/// Characters compared by the prefix fallback (and the minimum token length for it).
pub const PREFIX_LEN: usize = 4;

/// Well-known misspellings and transliteration slips.
const MANUAL_CORRECTIONS: &[(&str, &str)] = &[
    ("pikaxu", "pikachu"),
    ("pikachuu", "pikachu"),
    ("picachu", "pikachu"),
    ("charizad", "charizard"),
    ("charizar", "charizard"),
    ("xarizard", "charizard"),
    ("bulbassauro", "bulbasaur"),
    ("bulbasauro", "bulbasaur"),
    ("esquirtle", "squirtle"),
    ("blastoyse", "blastoise"),
    ("mewtu", "mewtwo"),
    ("miutu", "mewtwo"),
    ("evee", "eevee"),
    ("jiglypuff", "jigglypuff"),
    ("snorlaks", "snorlax"),
    ("garados", "gyarados"),
    ("dragonait", "dragonite"),
    ("lucarío", "lucario"),
];

/// Which stage produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Direct,
    Correction,
    FuzzyStrict,
    FuzzyLoose,
    Prefix,
}

/// A successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: CreatureRecord,
    pub source: MatchSource,
}

/// Looks up a manual correction for `token`.
pub fn manual_correction(token: &str) -> Option<&'static str> {
    MANUAL_CORRECTIONS
        .iter()
        .find(|(typo, _)| *typo == token)
        .map(|(_, canonical)| *canonical)
}

/// Matching-characters ratio `2·M / (|a| + |b|)`, where `M` counts the
/// characters left in place by a minimal character diff.
pub fn similarity(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Best catalog name whose similarity to `token` reaches `cutoff`.
/// Ties go to the earliest name in catalog order.
pub fn closest_match<'a>(token: &str, names: &'a [String], cutoff: f64) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for name in names {
        let score = similarity(token, name);
        if score < cutoff {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((name.as_str(), score)),
        }
    }
    best.map(|(name, _)| name)
}

/// First catalog name sharing the first [`PREFIX_LEN`] characters of `token`.
pub fn prefix_match<'a>(token: &str, names: &'a [String]) -> Option<&'a str> {
    if token.chars().count() < PREFIX_LEN {
        return None;
    }
    let prefix: String = token.chars().take(PREFIX_LEN).collect();
    names
        .iter()
        .find(|name| name.starts_with(&prefix))
        .map(String::as_str)
}

/// Whether a token is eligible for resolution at all.
pub fn is_resolvable_token(token: &str) -> bool {
    token.chars().count() > 2 && !is_stopword(token)
}

/// Resolves tokens against the provider and the catalog.
#[derive(Clone)]
pub struct NameResolver {
    provider: Arc<dyn CreatureProvider>,
    catalog: Arc<NameCatalog>,
}

impl NameResolver {
    pub fn new(provider: Arc<dyn CreatureProvider>, catalog: Arc<NameCatalog>) -> Self {
        Self { provider, catalog }
    }

    /// Runs the cascade on one cleaned, lowercased token.
    pub async fn resolve(&self, token: &str) -> Option<Resolution> {
        if !is_resolvable_token(token) {
            return None;
        }

        if let Some(record) = self.lookup(token).await {
            return Some(Resolution {
                record,
                source: MatchSource::Direct,
            });
        }
        let mut tried = vec![token.to_string()];

        if let Some(corrected) = manual_correction(token) {
            debug!("Manual correction: {} -> {}", token, corrected);
            if let Some(record) = self.lookup(corrected).await {
                return Some(Resolution {
                    record,
                    source: MatchSource::Correction,
                });
            }
            tried.push(corrected.to_string());
        }

        if let Err(e) = self.catalog.ensure_loaded(self.provider.as_ref()).await {
            warn!("Catalog unavailable, skipping fuzzy stages for '{}': {}", token, e);
            return None;
        }
        let names = self.catalog.all();

        let stages = [
            (MatchSource::FuzzyStrict, closest_match(token, &names, STRICT_CUTOFF)),
            (MatchSource::FuzzyLoose, closest_match(token, &names, LOOSE_CUTOFF)),
            (MatchSource::Prefix, prefix_match(token, &names)),
        ];

        for (source, candidate) in stages {
            let Some(candidate) = candidate else {
                continue;
            };
            if tried.iter().any(|t| t.as_str() == candidate) {
                continue;
            }
            debug!("{:?} candidate for '{}': {}", source, token, candidate);
            if let Some(record) = self.lookup(candidate).await {
                return Some(Resolution { record, source });
            }
            tried.push(candidate.to_string());
        }

        debug!("No match for '{}'", token);
        None
    }

    async fn lookup(&self, name: &str) -> Option<CreatureRecord> {
        match self.provider.fetch_by_identifier(name).await {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Lookup of '{}' failed: {}", name, e);
                None
            }
        }
    }
}
