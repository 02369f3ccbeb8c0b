//! Intent classification as an ordered rule chain.
//!
//! Rules are evaluated top to bottom and the first matching predicate wins.
//! Team requests sit above comparisons, so "monte uma equipe, compare fogo vs
//! água" is a team request.

use super::keywords::{mentions_comparison, mentions_team, Utterance};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the message asks for, before any name is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Build a six-member team.
    TeamRequest,
    /// Compare two creatures.
    Comparison,
    /// Information about a single creature.
    SingleLookup,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IntentKind::TeamRequest => "team_request",
            IntentKind::Comparison => "comparison",
            IntentKind::SingleLookup => "single_lookup",
        };
        write!(f, "{}", label)
    }
}

type Predicate = fn(&Utterance) -> bool;

/// One entry of the rule chain.
pub struct IntentRule {
    pub name: &'static str,
    pub kind: IntentKind,
    predicate: Predicate,
}

impl IntentRule {
    pub fn matches(&self, utterance: &Utterance) -> bool {
        (self.predicate)(utterance)
    }
}

/// Result of classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResult {
    pub kind: IntentKind,
    /// Name of the rule that fired.
    pub rule: String,
}

/// Ordered keyword rules; the last rule always matches.
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        let rules = vec![
            IntentRule {
                name: "team_keywords",
                kind: IntentKind::TeamRequest,
                predicate: mentions_team,
            },
            IntentRule {
                name: "comparison_keywords",
                kind: IntentKind::Comparison,
                predicate: mentions_comparison,
            },
            IntentRule {
                name: "single_lookup",
                kind: IntentKind::SingleLookup,
                predicate: |_| true,
            },
        ];

        Self { rules }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn classify(&self, utterance: &Utterance) -> IntentResult {
        self.rules
            .iter()
            .find(|rule| rule.matches(utterance))
            .map(|rule| IntentResult {
                kind: rule.kind,
                rule: rule.name.to_string(),
            })
            .unwrap_or(IntentResult {
                kind: IntentKind::SingleLookup,
                rule: "default".to_string(),
            })
    }
}
