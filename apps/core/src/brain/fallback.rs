//! Template replies used when the generation model is unavailable.
//!
//! Output depends only on the resolved intent: same input, same bytes.

use super::context_packet::ResolvedIntent;
use super::narrator::MemberRole;
use crate::models::CreatureRecord;

const GENERIC_REPLY: &str = "Desculpe, não consegui gerar uma resposta completa agora. \
Posso ajudar com informações sobre um Pokémon específico, comparações entre dois Pokémon \
ou sugestões de equipe. Experimente perguntar: \"Me fale sobre Pikachu\" ou \"Sugira um time balanceado\".";

fn single_reply(record: &CreatureRecord) -> String {
    let s = &record.stats;
    format!(
        "{} (#{}) é um Pokémon do tipo {}. Stats base: HP {}, Ataque {}, Defesa {}, \
Ataque Especial {}, Defesa Especial {}, Velocidade {} (total {}). \
Quer saber sobre evoluções, counters ou o melhor moveset?",
        record.display_name(),
        record.id,
        record.types_label(),
        s.hp,
        s.attack,
        s.defense,
        s.special_attack,
        s.special_defense,
        s.speed,
        s.total()
    )
}

fn comparison_reply(a: &CreatureRecord, b: &CreatureRecord) -> String {
    let (name_a, name_b) = (a.display_name(), b.display_name());
    let mut lines = vec![format!("Comparando {} e {}:", name_a, name_b)];

    for ((label, va), (_, vb)) in a.stats.labelled().iter().zip(b.stats.labelled().iter()) {
        let leader = if va > vb {
            name_a.as_str()
        } else if vb > va {
            name_b.as_str()
        } else {
            "empate"
        };
        lines.push(format!("- {}: {} {} x {} {} ({})", label, name_a, va, vb, name_b, leader));
    }

    let (ta, tb) = (a.stats.total(), b.stats.total());
    let verdict = if ta > tb {
        format!("{} tem o maior total de stats ({} contra {}).", name_a, ta, tb)
    } else if tb > ta {
        format!("{} tem o maior total de stats ({} contra {}).", name_b, tb, ta)
    } else {
        format!("Os dois têm o mesmo total de stats ({}).", ta)
    };
    lines.push(verdict);
    lines.join("\n")
}

/// Deterministic reply for any resolved intent.
pub fn compose_fallback(resolved: &ResolvedIntent) -> String {
    match resolved {
        ResolvedIntent::None => GENERIC_REPLY.to_string(),
        ResolvedIntent::Single(record) => single_reply(record),
        ResolvedIntent::Comparison(comparison) => {
            let [a, b] = &comparison.members;
            comparison_reply(a, b)
        }
        ResolvedIntent::Team(team) => {
            let mut lines = vec![
                format!("{}!", team.narrative.title),
                team.narrative.description.clone(),
                "Membros:".to_string(),
            ];
            for member in &team.members {
                lines.push(format!(
                    "- {} ({}): {}",
                    member.display_name(),
                    member.types_label(),
                    MemberRole::for_stats(&member.stats).label()
                ));
            }
            lines.push(format!(
                "Pontos fortes: {}.",
                team.narrative.strengths.join("; ")
            ));
            lines.join("\n")
        }
    }
}
