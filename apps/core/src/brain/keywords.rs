//! Keyword tables and message tokenization.
//!
//! Stop words cover Portuguese and English filler that must never be sent to
//! the name resolver. Team and comparison keyword sets drive the intent rules.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Words that are never creature names.
const STOPWORDS: &[&str] = &[
    // Portuguese
    "o", "a", "os", "as", "um", "uma", "uns", "umas", "de", "do", "da", "dos", "das", "no",
    "na", "nos", "nas", "em", "e", "ou", "é", "são", "ser", "eu", "me", "meu", "minha", "seu",
    "sua", "com", "sem", "para", "pra", "por", "pelo", "pela", "que", "quem", "qual", "quais",
    "onde", "quando", "como", "porque", "porquê", "quanto", "sobre", "fale", "falar", "fala",
    "mostre", "mostra", "mostrar", "conte", "conta", "diga", "quero", "queria", "gostaria",
    "saber", "pode", "poderia", "voce", "você", "mais", "menos", "muito", "melhor", "pior",
    "forte", "fraco", "entre", "contra", "versus", "compare", "comparar", "comparação",
    "comparacao", "informações", "informacoes", "info", "dados", "stats", "status", "tipo",
    "tipos", "monte", "montar", "crie", "criar", "gere", "gerar", "sugira", "sugerir", "equipe",
    "equipes", "time", "times", "aleatória", "aleatoria", "aleatório", "aleatorio", "isso",
    "esse", "essa", "este", "esta", "ele", "ela", "olá", "ola", "oi", "obrigado", "obrigada",
    "favor", "ajuda", "tem", "têm", "ter", "está", "estão", "sim", "não", "nao", "tudo", "bem",
    "bom", "boa",
    // English
    "the", "an", "and", "or", "of", "to", "in", "on", "for", "with", "about", "tell", "show",
    "what", "which", "who", "how", "is", "are", "was", "me", "my", "please", "can", "you",
    "give", "info", "information", "stronger", "better", "best", "build", "make", "create",
    "team", "teams", "squad", "random", "type", "types", "pokemon", "pokémon", "pokemons",
    "pokémons", "hello", "hi", "thanks",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Whole-word tokens that mark a team request.
const TEAM_TOKENS: &[&str] = &["equipe", "equipes", "equipa", "time", "times", "team", "teams", "squad"];

/// Substrings that mark an explicit comparison.
const COMPARISON_PHRASES: &[&str] = &[
    "compar",
    "versus",
    "diferença entre",
    "diferenca entre",
    "difference between",
    "mais forte",
    "stronger",
];

/// Standalone tokens that mark a comparison ("pikachu vs raichu", "pikachu x raichu").
const COMPARISON_TOKENS: &[&str] = &["vs", "vs.", "x"];

// NOTE: expect() is acceptable here: the pattern is a compile-time constant.
static WORD_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace splitter"));

/// Returns `true` when the word must never be resolved to a creature.
pub fn is_stopword(word: &str) -> bool {
    STOPWORD_SET.contains(word)
}

/// Strips surrounding punctuation, keeping inner hyphens and apostrophes
/// (`mr-mime`, `farfetch'd`).
pub fn clean_token(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphanumeric()).to_string()
}

/// A lowercased message split into cleaned tokens.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub lowered: String,
    /// Raw whitespace-separated pieces, lowercased (punctuation kept).
    pub raw_tokens: Vec<String>,
    /// Cleaned tokens, empty ones removed.
    pub tokens: Vec<String>,
}

impl Utterance {
    pub fn new(message: &str) -> Self {
        let lowered = message.trim().to_lowercase();
        let raw_tokens: Vec<String> = WORD_SPLIT
            .split(&lowered)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let tokens = raw_tokens
            .iter()
            .map(|t| clean_token(t))
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            lowered,
            raw_tokens,
            tokens,
        }
    }

    /// Tokens worth handing to the resolver: not stop words, longer than two
    /// characters, in message order, without duplicates.
    pub fn candidate_tokens(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.tokens
            .iter()
            .map(String::as_str)
            .filter(|t| t.chars().count() > 2 && !is_stopword(t))
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// The longest candidate token; the first one wins on equal length.
    pub fn longest_candidate(&self) -> Option<&str> {
        self.candidate_tokens()
            .into_iter()
            .fold(None, |best: Option<&str>, t| match best {
                Some(b) if b.chars().count() >= t.chars().count() => Some(b),
                _ => Some(t),
            })
    }
}

/// Team-request keywords present?
pub fn mentions_team(utterance: &Utterance) -> bool {
    utterance
        .tokens
        .iter()
        .any(|t| TEAM_TOKENS.contains(&t.as_str()))
}

/// Comparison keywords present?
pub fn mentions_comparison(utterance: &Utterance) -> bool {
    COMPARISON_PHRASES
        .iter()
        .any(|phrase| utterance.lowered.contains(phrase))
        || utterance
            .raw_tokens
            .iter()
            .any(|t| COMPARISON_TOKENS.contains(&t.as_str()))
}
