//! Team synthesis: six creatures under type and strategy constraints.
//!
//! Synthesis is a small state machine (`Scan` then `Backfill`) driven by a
//! hard budget of creature fetches. Every fetch costs one attempt whether it
//! succeeds or not, so a sparse or broken provider always terminates.

use super::filters::{canonical_types, strategy_accepts, TeamFilters};
use super::narrator::{narrate, StrategyNarrative};
use crate::config::EngineConfig;
use crate::models::CreatureRecord;
use crate::pokeapi::CreatureProvider;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Members in a finished team.
pub const TEAM_SIZE: usize = 6;

/// Name segments that mark alternate forms (megas, gigantamax, regional forms...).
const SPECIAL_FORM_MARKERS: &[&str] = &[
    "mega", "gmax", "primal", "totem", "eternamax", "alola", "galar", "hisui", "paldea",
];

/// Most special forms a team may carry.
const SPECIAL_FORM_CAP: usize = 1;

/// `true` for names like `charizard-mega-x` or `meowth-galar`.
/// The first segment is the species and never counts.
pub fn is_special_form(name: &str) -> bool {
    name.split('-')
        .skip(1)
        .any(|segment| SPECIAL_FORM_MARKERS.contains(&segment))
}

/// Ids of the last successfully synthesized team.
///
/// Advisory only: synthesis prefers other creatures but falls back to the
/// full pool when avoiding them would leave fewer than six candidates.
#[derive(Debug, Default)]
pub struct RepetitionMemory {
    last_team_ids: RwLock<HashSet<u32>>,
}

impl RepetitionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HashSet<u32> {
        self.last_team_ids
            .read()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.last_team_ids
            .read()
            .map(|ids| ids.contains(&id))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.last_team_ids
            .read()
            .map(|ids| ids.is_empty())
            .unwrap_or(true)
    }

    /// Swaps in the ids of a new team.
    pub fn replace(&self, ids: impl IntoIterator<Item = u32>) {
        if let Ok(mut slot) = self.last_team_ids.write() {
            *slot = ids.into_iter().collect();
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.last_team_ids.write() {
            slot.clear();
        }
    }
}

/// A complete team with its narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResult {
    pub members: Vec<CreatureRecord>,
    pub narrative: StrategyNarrative,
    pub filters: TeamFilters,
}

impl TeamResult {
    pub fn member_ids(&self) -> Vec<u32> {
        self.members.iter().map(|m| m.id).collect()
    }
}

#[derive(Debug, Clone)]
pub enum SynthesisOutcome {
    Success(TeamResult),
    /// Budget ran out (or the pool dried up) with fewer than six members.
    Exhausted { accepted: usize, attempts_used: u32 },
}

/// Tunables for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSettings {
    /// Creature fetches allowed per synthesis, across all phases.
    pub attempt_budget: u32,
    /// Ids requested from a type listing.
    pub type_pool_limit: usize,
    /// Ids sampled per representative type when no type filter is given.
    pub picks_per_type: usize,
    /// Restrict type pools to final evolutions when enough of them exist.
    pub prefer_fully_evolved: bool,
}

impl Default for TeamSettings {
    fn default() -> Self {
        Self {
            attempt_budget: 50,
            type_pool_limit: 60,
            picks_per_type: 2,
            prefer_fully_evolved: true,
        }
    }
}

impl From<&EngineConfig> for TeamSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            attempt_budget: config.team_attempt_budget,
            type_pool_limit: config.type_pool_limit,
            picks_per_type: config.picks_per_type,
            prefer_fully_evolved: config.prefer_fully_evolved,
        }
    }
}

enum Phase {
    /// Walk the shuffled preferred pool once.
    Scan(VecDeque<u32>),
    /// Random draws over what is left.
    Backfill,
}

/// Mutable state of one synthesis.
struct Run {
    attempts_remaining: u32,
    members: Vec<CreatureRecord>,
    member_ids: HashSet<u32>,
    /// Fetched and refused; never drawn again.
    rejected: HashSet<u32>,
    special_forms: usize,
}

impl Run {
    fn new(budget: u32) -> Self {
        Self {
            attempts_remaining: budget,
            members: Vec::with_capacity(TEAM_SIZE),
            member_ids: HashSet::new(),
            rejected: HashSet::new(),
            special_forms: 0,
        }
    }

    fn is_complete(&self) -> bool {
        self.members.len() == TEAM_SIZE
    }

    fn is_open(&self, id: u32) -> bool {
        !self.member_ids.contains(&id) && !self.rejected.contains(&id)
    }
}

pub struct TeamSynthesizer {
    provider: Arc<dyn CreatureProvider>,
    memory: Arc<RepetitionMemory>,
    settings: TeamSettings,
    rng: Mutex<StdRng>,
}

impl TeamSynthesizer {
    pub fn new(
        provider: Arc<dyn CreatureProvider>,
        memory: Arc<RepetitionMemory>,
        settings: TeamSettings,
    ) -> Self {
        Self {
            provider,
            memory,
            settings,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sampling, for tests and reproducible runs.
    pub fn with_seed(
        provider: Arc<dyn CreatureProvider>,
        memory: Arc<RepetitionMemory>,
        settings: TeamSettings,
        seed: u64,
    ) -> Self {
        Self {
            provider,
            memory,
            settings,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn memory(&self) -> &Arc<RepetitionMemory> {
        &self.memory
    }

    pub async fn synthesize(&self, filters: &TeamFilters) -> SynthesisOutcome {
        info!(
            "Synthesizing team (type: {:?}, strategy: {:?})",
            filters.type_filter, filters.strategy_filter
        );

        let pool = self.build_pool(filters).await;
        let preferred = self.preferred_pool(&pool);
        debug!(
            "Team pool: {} ids, {} preferred",
            pool.len(),
            preferred.len()
        );

        let budget = self.settings.attempt_budget;
        let mut run = Run::new(budget);
        let mut phase = Phase::Scan(self.shuffled(preferred.clone()).into());

        while !run.is_complete() && run.attempts_remaining > 0 {
            phase = match phase {
                Phase::Scan(mut queue) => match queue.pop_front() {
                    Some(id) => {
                        if run.is_open(id) {
                            self.try_candidate(&mut run, id, filters).await;
                        }
                        Phase::Scan(queue)
                    }
                    None => Phase::Backfill,
                },
                Phase::Backfill => match self.draw(&run, &preferred, &pool) {
                    Some(id) => {
                        self.try_candidate(&mut run, id, filters).await;
                        Phase::Backfill
                    }
                    None => break,
                },
            };
        }

        let attempts_used = budget - run.attempts_remaining;
        if !run.is_complete() {
            warn!(
                "Team synthesis exhausted: {} of {} members after {} attempts",
                run.members.len(),
                TEAM_SIZE,
                attempts_used
            );
            return SynthesisOutcome::Exhausted {
                accepted: run.members.len(),
                attempts_used,
            };
        }

        self.memory.replace(run.members.iter().map(|m| m.id));
        info!("Team synthesized in {} attempts", attempts_used);

        let narrative = narrate(&run.members, filters);
        SynthesisOutcome::Success(TeamResult {
            members: run.members,
            narrative,
            filters: filters.clone(),
        })
    }

    async fn try_candidate(&self, run: &mut Run, id: u32, filters: &TeamFilters) {
        run.attempts_remaining = run.attempts_remaining.saturating_sub(1);

        let record = match self.provider.fetch_by_identifier(&id.to_string()).await {
            Ok(record) => record,
            Err(e) => {
                // Transient failures stay eligible for backfill.
                debug!("Candidate {} unavailable: {}", id, e);
                return;
            }
        };

        if run.member_ids.contains(&record.id) {
            return;
        }

        let special = is_special_form(&record.name);
        if special && run.special_forms >= SPECIAL_FORM_CAP {
            debug!("Rejected {}: special form cap reached", record.name);
            run.rejected.insert(id);
            return;
        }

        if !strategy_accepts(filters.strategy_filter, &record.stats) {
            debug!("Rejected {}: strategy mismatch", record.name);
            run.rejected.insert(id);
            return;
        }

        if special {
            run.special_forms += 1;
        }
        run.member_ids.insert(id);
        run.member_ids.insert(record.id);
        run.members.push(record);
    }

    async fn build_pool(&self, filters: &TeamFilters) -> Vec<u32> {
        match &filters.type_filter {
            Some(type_name) => self.typed_pool(type_name).await,
            None => self.diverse_pool().await,
        }
    }

    async fn typed_pool(&self, type_name: &str) -> Vec<u32> {
        let ids = match self
            .provider
            .fetch_ids_by_type(type_name, self.settings.type_pool_limit)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not list type '{}': {}", type_name, e);
                return Vec::new();
            }
        };

        if !self.settings.prefer_fully_evolved {
            return ids;
        }

        let checks = ids.iter().map(|id| self.provider.fetch_evolution_chain(*id));
        let verdicts = join_all(checks).await;
        let evolved: Vec<u32> = ids
            .iter()
            .zip(verdicts)
            .filter(|(_, verdict)| match verdict {
                Ok(chain) => chain.is_fully_evolved(),
                Err(_) => true,
            })
            .map(|(id, _)| *id)
            .collect();

        if evolved.len() >= TEAM_SIZE {
            evolved
        } else {
            debug!(
                "Only {} fully evolved '{}' creatures, using the whole listing",
                evolved.len(),
                type_name
            );
            ids
        }
    }

    async fn diverse_pool(&self) -> Vec<u32> {
        let types: Vec<&str> = canonical_types().collect();
        let listings = join_all(
            types
                .iter()
                .map(|t| self.provider.fetch_ids_by_type(t, self.settings.type_pool_limit)),
        )
        .await;

        let mut seen = HashSet::new();
        let mut pool = Vec::new();
        for (type_name, listing) in types.iter().zip(listings) {
            let ids = match listing {
                Ok(ids) => ids,
                Err(e) => {
                    debug!("Skipping type '{}' in diverse pool: {}", type_name, e);
                    continue;
                }
            };
            for id in self.sample(&ids, self.settings.picks_per_type) {
                if seen.insert(id) {
                    pool.push(id);
                }
            }
        }
        pool
    }

    fn preferred_pool(&self, pool: &[u32]) -> Vec<u32> {
        let remembered = self.memory.snapshot();
        let fresh: Vec<u32> = pool
            .iter()
            .copied()
            .filter(|id| !remembered.contains(id))
            .collect();
        if fresh.len() >= TEAM_SIZE {
            fresh
        } else {
            pool.to_vec()
        }
    }

    /// Random open id, from the preferred pool first, then the full pool.
    fn draw(&self, run: &Run, preferred: &[u32], pool: &[u32]) -> Option<u32> {
        let open: Vec<u32> = preferred.iter().copied().filter(|id| run.is_open(*id)).collect();
        let open = if open.is_empty() {
            pool.iter().copied().filter(|id| run.is_open(*id)).collect()
        } else {
            open
        };
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        open.choose(&mut *rng).copied()
    }

    fn shuffled(&self, mut ids: Vec<u32>) -> Vec<u32> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        ids.shuffle(&mut *rng);
        ids
    }

    fn sample(&self, ids: &[u32], count: usize) -> Vec<u32> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        ids.choose_multiple(&mut *rng, count).copied().collect()
    }
}
