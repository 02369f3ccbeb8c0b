//! Resolved intents and everything rendered from them: the context block sent
//! to the generation model, the system prompt, the front-end payload and the
//! follow-up suggestions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::narrator::MemberRole;
use super::team::TeamResult;
use crate::models::{ConversationTurn, CreatureRecord};

/// Turns of history included in the context.
pub const CONTEXT_HISTORY_TURNS: usize = 3;
/// Characters kept from each history turn.
pub const TURN_CHAR_BUDGET: usize = 200;

/// Exactly two creatures side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub members: [CreatureRecord; 2],
}

impl ComparisonResult {
    pub fn new(first: CreatureRecord, second: CreatureRecord) -> Self {
        Self {
            members: [first, second],
        }
    }
}

/// What a message turned out to be about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ResolvedIntent {
    None,
    Single(CreatureRecord),
    Comparison(ComparisonResult),
    Team(TeamResult),
}

impl ResolvedIntent {
    pub fn label(&self) -> &'static str {
        match self {
            ResolvedIntent::None => "none",
            ResolvedIntent::Single(_) => "single",
            ResolvedIntent::Comparison(_) => "comparison",
            ResolvedIntent::Team(_) => "team",
        }
    }

    /// The creature follow-up suggestions are about, if any.
    pub fn primary_creature(&self) -> Option<&CreatureRecord> {
        match self {
            ResolvedIntent::None => None,
            ResolvedIntent::Single(record) => Some(record),
            ResolvedIntent::Comparison(c) => c.members.first(),
            ResolvedIntent::Team(t) => t.members.first(),
        }
    }
}

fn creature_line(record: &CreatureRecord) -> String {
    format!(
        "- {} (#{}) | Tipos: {} | {} | Total: {}",
        record.display_name(),
        record.id,
        record.types_label(),
        record.stats.compact(),
        record.stats.total()
    )
}

fn entity_summary(resolved: &ResolvedIntent) -> Option<String> {
    match resolved {
        ResolvedIntent::None => None,
        ResolvedIntent::Single(record) => {
            let stats = record
                .stats
                .labelled()
                .iter()
                .map(|(label, value)| format!("{}: {}", label, value))
                .collect::<Vec<_>>()
                .join(", ");
            Some(format!(
                "Pokémon em foco: {} (#{})\nTipos: {}\nStats base: {}\nTotal: {}",
                record.display_name(),
                record.id,
                record.types_label(),
                stats,
                record.stats.total()
            ))
        }
        ResolvedIntent::Comparison(comparison) => {
            let [a, b] = &comparison.members;
            Some(format!(
                "Comparação solicitada entre {} e {}:\n{}\n{}",
                a.display_name(),
                b.display_name(),
                creature_line(a),
                creature_line(b)
            ))
        }
        ResolvedIntent::Team(team) => {
            let members = team
                .members
                .iter()
                .map(|m| {
                    format!(
                        "{} | Papel: {}",
                        creature_line(m),
                        MemberRole::for_stats(&m.stats).label()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            Some(format!(
                "Equipe sugerida: {}\n{}\nMembros:\n{}\nPontos fortes: {}",
                team.narrative.title,
                team.narrative.description,
                members,
                team.narrative.strengths.join("; ")
            ))
        }
    }
}

fn truncate_turn(content: &str) -> String {
    if content.chars().count() <= TURN_CHAR_BUDGET {
        return content.to_string();
    }
    let kept: String = content.chars().take(TURN_CHAR_BUDGET).collect();
    format!("{}...", kept)
}

/// Entity summary first, then the last few turns of history.
pub fn build_context(history: &[ConversationTurn], resolved: &ResolvedIntent) -> String {
    let mut sections = Vec::new();

    if let Some(summary) = entity_summary(resolved) {
        sections.push(summary);
    }

    let start = history.len().saturating_sub(CONTEXT_HISTORY_TURNS);
    let recent = &history[start..];
    if !recent.is_empty() {
        let lines = recent
            .iter()
            .map(|turn| format!("{}: {}", turn.role, truncate_turn(&turn.content)))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Histórico recente:\n{}", lines));
    }

    sections.join("\n\n")
}

const BASE_SYSTEM_PROMPT: &str = "Você é um assistente especializado em Pokémon, parte de uma Pokédex AI.
Seu papel é ajudar treinadores com informações sobre Pokémon, sugestões de equipes, estratégias e curiosidades.

DIRETRIZES:
- Seja amigável e entusiasta sobre Pokémon
- Forneça informações precisas e úteis
- Use linguagem clara e acessível
- Quando falar de stats, seja específico
- Sugira estratégias práticas
- Seja conciso mas informativo (máximo 3-4 parágrafos)";

/// System prompt for the generation model, with a task line per intent.
pub fn system_prompt(resolved: &ResolvedIntent) -> String {
    let task = match resolved {
        ResolvedIntent::None => {
            "Nenhum Pokémon específico foi identificado. Responda de forma geral e ofereça ajuda."
        }
        ResolvedIntent::Single(_) => {
            "Use as informações do Pokémon em foco para dar uma resposta detalhada e precisa."
        }
        ResolvedIntent::Comparison(_) => {
            "Compare os dois Pokémon stat por stat e diga em que situações cada um se sai melhor."
        }
        ResolvedIntent::Team(_) => {
            "Apresente a equipe sugerida, explique o papel de cada membro e como jogar com ela."
        }
    };
    format!("{}\n\nTAREFA: {}", BASE_SYSTEM_PROMPT, task)
}

/// Structured data for the chat front-end; `None` when nothing was resolved.
pub fn reply_payload(resolved: &ResolvedIntent) -> Option<Value> {
    match resolved {
        ResolvedIntent::None => None,
        ResolvedIntent::Single(record) => Some(json!(record)),
        ResolvedIntent::Comparison(comparison) => Some(json!({
            "is_comparison": true,
            "pokemon_list": comparison.members,
        })),
        ResolvedIntent::Team(team) => Some(json!({
            "is_team": true,
            "team_list": team.members,
            "strategy": {
                "title": team.narrative.title,
                "description": team.narrative.description,
                "roles": team.narrative.roles,
                "strengths": team.narrative.strengths,
            },
        })),
    }
}

/// Three follow-up questions.
pub fn suggestions(resolved: &ResolvedIntent) -> Vec<String> {
    match resolved.primary_creature() {
        Some(record) => {
            let name = record.display_name();
            vec![
                format!("Qual a melhor moveset para {}?", name),
                format!("Quais são os counters de {}?", name),
                format!("Como {} evolui?", name),
            ]
        }
        None => vec![
            "Me fale sobre Pikachu".to_string(),
            "Sugira um time balanceado".to_string(),
            "Quais são os tipos de Pokémon?".to_string(),
        ],
    }
}
