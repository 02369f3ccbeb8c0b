//! Team filter extraction: an optional elemental type and an optional
//! strategy, pulled out of a team request.
//!
//! Both tables are scanned in declaration order and the first hit wins, so
//! "fogo e água" asks for a fire team.

use crate::models::StatBlock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Team archetype requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Speed,
    Tank,
    Offensive,
    Balanced,
}

impl Strategy {
    /// Whether a creature with these stats fits the archetype.
    pub fn matches(&self, stats: &StatBlock) -> bool {
        match self {
            Strategy::Speed => stats.speed >= 100,
            Strategy::Tank => stats.defense + stats.special_defense >= 150,
            Strategy::Offensive => stats.attack >= 100 || stats.special_attack >= 100,
            Strategy::Balanced => stats.labelled().iter().all(|(_, value)| *value >= 50),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Speed => "speed",
            Strategy::Tank => "tank",
            Strategy::Offensive => "offensive",
            Strategy::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate applied to every candidate; no strategy accepts everything.
pub fn strategy_accepts(strategy: Option<Strategy>, stats: &StatBlock) -> bool {
    strategy.map_or(true, |s| s.matches(stats))
}

/// Constraints extracted from a team request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamFilters {
    /// Canonical (English, lowercase) type name.
    pub type_filter: Option<String>,
    pub strategy_filter: Option<Strategy>,
}

impl TeamFilters {
    pub fn is_empty(&self) -> bool {
        self.type_filter.is_none() && self.strategy_filter.is_none()
    }
}

/// Canonical type, Portuguese display name, accepted spellings.
const TYPE_TABLE: &[(&str, &str, &[&str])] = &[
    ("fire", "Fogo", &["fogo", "fire"]),
    ("water", "Água", &["água", "agua", "water"]),
    ("grass", "Planta", &["planta", "grama", "grass"]),
    ("electric", "Elétrico", &["elétrico", "eletrico", "elétricos", "eletricos", "electric"]),
    ("ice", "Gelo", &["gelo", "ice"]),
    ("fighting", "Lutador", &["lutador", "lutadores", "luta", "fighting"]),
    ("poison", "Venenoso", &["venenoso", "venenosos", "veneno", "poison"]),
    ("ground", "Terra", &["terra", "ground"]),
    ("flying", "Voador", &["voador", "voadores", "flying"]),
    ("psychic", "Psíquico", &["psíquico", "psiquico", "psíquicos", "psiquicos", "psychic"]),
    ("bug", "Inseto", &["inseto", "insetos", "bug"]),
    ("rock", "Pedra", &["pedra", "rocha", "rock"]),
    ("ghost", "Fantasma", &["fantasma", "fantasmas", "ghost"]),
    ("dragon", "Dragão", &["dragão", "dragao", "dragões", "dragoes", "dragon"]),
    ("dark", "Sombrio", &["sombrio", "sombrios", "noturno", "dark"]),
    ("steel", "Aço", &["aço", "aco", "metal", "steel"]),
    ("fairy", "Fada", &["fada", "fadas", "fairy"]),
    ("normal", "Normal", &["normal", "normais"]),
];

/// Fixed evaluation order: speed, tank, offensive, balanced.
const STRATEGY_TABLE: &[(Strategy, &[&str])] = &[
    (
        Strategy::Speed,
        &["rápido", "rapido", "rápida", "rapida", "rápidos", "rapidos", "velocidade", "veloz", "velozes", "speed", "fast"],
    ),
    (
        Strategy::Tank,
        &["tanque", "tank", "defensivo", "defensiva", "defensivos", "defesa", "resistente", "muralha", "defensive"],
    ),
    (
        Strategy::Offensive,
        &["ofensivo", "ofensiva", "ofensivos", "ataque", "atacante", "agressivo", "agressiva", "forte", "offensive", "attack"],
    ),
    (
        Strategy::Balanced,
        &["balanceado", "balanceada", "equilibrado", "equilibrada", "versátil", "versatil", "balanced"],
    ),
];

/// Word-boundary pattern that also treats accented letters as word characters.
fn keyword_pattern(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?:^|[^\p{{L}}\p{{N}}])(?:{})(?:$|[^\p{{L}}\p{{N}}])", alternation);
    // NOTE: expect() is acceptable here: patterns are built from constant tables.
    Regex::new(&pattern).expect("Invalid regex: filter keyword table")
}

static TYPE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TYPE_TABLE
        .iter()
        .map(|(canonical, _, words)| (*canonical, keyword_pattern(words)))
        .collect()
});

static STRATEGY_PATTERNS: LazyLock<Vec<(Strategy, Regex)>> = LazyLock::new(|| {
    STRATEGY_TABLE
        .iter()
        .map(|(strategy, words)| (*strategy, keyword_pattern(words)))
        .collect()
});

/// Portuguese display name for a canonical type; unknown types are capitalized.
pub fn type_display_name(canonical: &str) -> String {
    TYPE_TABLE
        .iter()
        .find(|(name, _, _)| *name == canonical)
        .map(|(_, display, _)| display.to_string())
        .unwrap_or_else(|| {
            let mut chars = canonical.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
}

/// Every canonical type, in table order.
pub fn canonical_types() -> impl Iterator<Item = &'static str> {
    TYPE_TABLE.iter().map(|(canonical, _, _)| *canonical)
}

/// First type in table order mentioned in `lowered`.
pub fn extract_type(lowered: &str) -> Option<String> {
    TYPE_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(lowered))
        .map(|(canonical, _)| canonical.to_string())
}

/// First strategy in evaluation order mentioned in `lowered`.
pub fn extract_strategy(lowered: &str) -> Option<Strategy> {
    STRATEGY_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(lowered))
        .map(|(strategy, _)| *strategy)
}

/// Both filters from a lowercased message.
pub fn extract_filters(lowered: &str) -> TeamFilters {
    TeamFilters {
        type_filter: extract_type(lowered),
        strategy_filter: extract_strategy(lowered),
    }
}
