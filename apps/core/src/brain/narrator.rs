//! Deterministic team narrative: roles, title, description and strengths,
//! derived only from member stats and the filters that produced the team.

use super::filters::{type_display_name, Strategy, TeamFilters};
use crate::models::{CreatureRecord, StatBlock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Average speed needed for the speed strength note.
const FAST_TEAM_BAR: u32 = 90;
/// Average attack needed for the attack strength note.
const STRONG_ATTACK_BAR: u32 = 90;
/// Distinct types needed for the coverage note.
const COVERAGE_TYPES: usize = 5;

/// Role of one member inside the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Speed,
    Offense,
    Defense,
    Versatile,
}

impl MemberRole {
    /// Priority: speed, offense, defense, versatile.
    pub fn for_stats(stats: &StatBlock) -> Self {
        if Strategy::Speed.matches(stats) {
            MemberRole::Speed
        } else if Strategy::Offensive.matches(stats) {
            MemberRole::Offense
        } else if Strategy::Tank.matches(stats) {
            MemberRole::Defense
        } else {
            MemberRole::Versatile
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemberRole::Speed => "Atacante Veloz",
            MemberRole::Offense => "Atacante",
            MemberRole::Defense => "Defensor",
            MemberRole::Versatile => "Versátil",
        }
    }
}

/// Everything said about a team besides its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyNarrative {
    pub title: String,
    pub description: String,
    /// One `"Name: Role"` line per member, in team order.
    pub roles: Vec<String>,
    pub strengths: Vec<String>,
    /// Integer-truncated mean of each stat.
    pub average_stats: StatBlock,
    /// `(type, count)` sorted by count descending, then type name.
    pub type_counts: Vec<(String, usize)>,
}

fn title_and_description(filters: &TeamFilters) -> (String, String) {
    if let Some(type_name) = &filters.type_filter {
        let display = type_display_name(type_name);
        return (
            format!("Equipe Tipo {}", display),
            format!(
                "Uma equipe focada no tipo {}, aproveitando as vantagens e a sinergia desse elemento.",
                display
            ),
        );
    }

    let (title, description) = match filters.strategy_filter {
        Some(Strategy::Speed) => (
            "Equipe Velocidade Máxima",
            "Uma equipe rápida, pensada para agir primeiro e pressionar o adversário desde o início.",
        ),
        Some(Strategy::Tank) => (
            "Equipe Muralha Defensiva",
            "Uma equipe resistente, feita para aguentar golpes e vencer pelo desgaste.",
        ),
        Some(Strategy::Offensive) => (
            "Equipe Ofensiva Total",
            "Uma equipe agressiva, com alto poder de ataque físico e especial.",
        ),
        Some(Strategy::Balanced) => (
            "Equipe Equilibrada",
            "Uma equipe sem pontos fracos evidentes, com atributos bem distribuídos.",
        ),
        None => (
            "Equipe Diversificada",
            "Uma equipe variada, com tipos diferentes para cobrir várias situações de batalha.",
        ),
    };
    (title.to_string(), description.to_string())
}

fn average_stats(members: &[CreatureRecord]) -> StatBlock {
    let n = members.len() as u32;
    if n == 0 {
        return StatBlock::default();
    }
    let sum = members.iter().fold(StatBlock::default(), |acc, m| StatBlock {
        hp: acc.hp + m.stats.hp,
        attack: acc.attack + m.stats.attack,
        defense: acc.defense + m.stats.defense,
        special_attack: acc.special_attack + m.stats.special_attack,
        special_defense: acc.special_defense + m.stats.special_defense,
        speed: acc.speed + m.stats.speed,
    });
    StatBlock {
        hp: sum.hp / n,
        attack: sum.attack / n,
        defense: sum.defense / n,
        special_attack: sum.special_attack / n,
        special_defense: sum.special_defense / n,
        speed: sum.speed / n,
    }
}

fn type_counts(members: &[CreatureRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in members.iter().flat_map(|m| m.types.iter()) {
        *counts.entry(t.as_str()).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(t, c)| (t.to_string(), c))
        .collect();
    // BTreeMap already ordered by name; a stable sort keeps that for equal counts.
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

/// Builds the narrative for an accepted team.
pub fn narrate(members: &[CreatureRecord], filters: &TeamFilters) -> StrategyNarrative {
    let (title, description) = title_and_description(filters);
    let averages = average_stats(members);
    let counts = type_counts(members);

    let roles = members
        .iter()
        .map(|m| format!("{}: {}", m.display_name(), MemberRole::for_stats(&m.stats).label()))
        .collect();

    let mut strengths = Vec::new();
    let distinct: HashSet<&str> = counts.iter().map(|(t, _)| t.as_str()).collect();
    if distinct.len() >= COVERAGE_TYPES {
        strengths.push(format!(
            "Boa cobertura de tipos ({} tipos diferentes)",
            distinct.len()
        ));
    }
    if averages.speed >= FAST_TEAM_BAR {
        strengths.push(format!("Equipe rápida (velocidade média {})", averages.speed));
    }
    if averages.attack >= STRONG_ATTACK_BAR {
        strengths.push(format!("Alto poder de ataque (ataque médio {})", averages.attack));
    }
    strengths.push(format!("HP médio: {}", averages.hp));

    StrategyNarrative {
        title,
        description,
        roles,
        strengths,
        average_stats: averages,
        type_counts: counts,
    }
}
