use serde::{Deserialize, Serialize};
use std::fmt;

/// The six base stats of a creature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    #[serde(rename = "special-attack")]
    pub special_attack: u32,
    #[serde(rename = "special-defense")]
    pub special_defense: u32,
    pub speed: u32,
}

impl StatBlock {
    /// Sum of all six base stats.
    pub fn total(&self) -> u32 {
        self.hp
            + self.attack
            + self.defense
            + self.special_attack
            + self.special_defense
            + self.speed
    }

    /// Stats paired with their Portuguese display labels, in canonical order.
    pub fn labelled(&self) -> [(&'static str, u32); 6] {
        [
            ("HP", self.hp),
            ("Ataque", self.attack),
            ("Defesa", self.defense),
            ("Ataque Especial", self.special_attack),
            ("Defesa Especial", self.special_defense),
            ("Velocidade", self.speed),
        ]
    }

    /// Compact one-line rendering used in prompts and summaries.
    pub fn compact(&self) -> String {
        format!(
            "HP:{} ATK:{} DEF:{} SP.ATK:{} SP.DEF:{} SPD:{}",
            self.hp,
            self.attack,
            self.defense,
            self.special_attack,
            self.special_defense,
            self.speed
        )
    }
}

/// A creature as returned by the data provider. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureRecord {
    /// National dex id (special forms live above 10000).
    pub id: u32,
    /// Canonical lowercase name, e.g. `charizard-mega-x`.
    pub name: String,
    /// Elemental types in slot order.
    pub types: Vec<String>,
    pub stats: StatBlock,
    /// Front sprite URL, when the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
}

impl CreatureRecord {
    /// Name with its first letter capitalized, for user-facing text.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Types joined for display (`fire, flying`).
    pub fn types_label(&self) -> String {
        self.types.join(", ")
    }
}

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "Usuário"),
            Role::Assistant => write!(f, "Assistente"),
        }
    }
}

/// A single message of the externally owned conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One node of an evolution tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionNode {
    pub species: String,
    #[serde(default)]
    pub evolves_to: Vec<EvolutionNode>,
}

impl EvolutionNode {
    fn find(&self, species: &str) -> Option<&EvolutionNode> {
        if self.species == species {
            return Some(self);
        }
        self.evolves_to.iter().find_map(|child| child.find(species))
    }
}

/// The evolution chain a creature belongs to, together with the species that
/// was asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionChain {
    /// Species name of the creature the chain was fetched for.
    pub subject: String,
    pub root: EvolutionNode,
}

impl EvolutionChain {
    /// `true` when the subject is a terminal node (no further evolutions).
    ///
    /// A subject missing from its own chain is reported as fully evolved so
    /// inconsistent provider data never shrinks a candidate pool.
    pub fn is_fully_evolved(&self) -> bool {
        self.root
            .find(&self.subject)
            .map(|node| node.evolves_to.is_empty())
            .unwrap_or(true)
    }
}
