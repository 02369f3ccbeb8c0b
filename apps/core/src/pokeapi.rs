//! Creature data provider.
//!
//! `CreatureProvider` is the seam the brain talks through; `PokeApiClient` is
//! the PokéAPI-backed implementation used by the binary.

use crate::error::LookupError;
use crate::models::{CreatureRecord, EvolutionChain, EvolutionNode, StatBlock};
use async_trait::async_trait;
use lru::LruCache;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Read-only access to the creature catalog.
#[async_trait]
pub trait CreatureProvider: Send + Sync + 'static {
    /// Fetches one creature by canonical name or numeric id.
    async fn fetch_by_identifier(&self, identifier: &str) -> Result<CreatureRecord, LookupError>;

    /// Fetches every known creature name, in catalog id order.
    async fn fetch_all_names(&self) -> Result<Vec<String>, LookupError>;

    /// Fetches up to `limit` creature ids having the given elemental type.
    async fn fetch_ids_by_type(&self, type_name: &str, limit: usize) -> Result<Vec<u32>, LookupError>;

    /// Fetches the evolution chain of the creature with this id.
    async fn fetch_evolution_chain(&self, id: u32) -> Result<EvolutionChain, LookupError>;
}

// --- Wire shapes ---

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawTypeSlot {
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawStat {
    base_stat: u32,
    stat: NamedResource,
}

#[derive(Debug, Default, Deserialize)]
struct RawSprites {
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPokemon {
    id: u32,
    name: String,
    types: Vec<RawTypeSlot>,
    stats: Vec<RawStat>,
    #[serde(default)]
    sprites: RawSprites,
}

impl From<RawPokemon> for CreatureRecord {
    fn from(raw: RawPokemon) -> Self {
        let mut stats = StatBlock::default();
        for entry in raw.stats {
            match entry.stat.name.as_str() {
                "hp" => stats.hp = entry.base_stat,
                "attack" => stats.attack = entry.base_stat,
                "defense" => stats.defense = entry.base_stat,
                "special-attack" => stats.special_attack = entry.base_stat,
                "special-defense" => stats.special_defense = entry.base_stat,
                "speed" => stats.speed = entry.base_stat,
                _ => {}
            }
        }

        CreatureRecord {
            id: raw.id,
            name: raw.name,
            types: raw.types.into_iter().map(|slot| slot.kind.name).collect(),
            stats,
            sprite: raw.sprites.front_default,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPage {
    count: usize,
    #[serde(default)]
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct RawTypeMember {
    pokemon: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawType {
    #[serde(default)]
    pokemon: Vec<RawTypeMember>,
}

#[derive(Debug, Deserialize)]
struct RawUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawSpecies {
    name: String,
    evolution_chain: Option<RawUrl>,
}

#[derive(Debug, Deserialize)]
struct RawChainLink {
    species: NamedResource,
    #[serde(default)]
    evolves_to: Vec<RawChainLink>,
}

#[derive(Debug, Deserialize)]
struct RawEvolutionChain {
    chain: RawChainLink,
}

impl From<RawChainLink> for EvolutionNode {
    fn from(link: RawChainLink) -> Self {
        EvolutionNode {
            species: link.species.name,
            evolves_to: link.evolves_to.into_iter().map(EvolutionNode::from).collect(),
        }
    }
}

/// Extracts the trailing numeric id of a PokéAPI resource URL
/// (`.../pokemon/25/` → 25).
fn id_from_resource_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

// --- Client ---

/// PokéAPI-backed [`CreatureProvider`] with an in-process record cache.
pub struct PokeApiClient {
    client: Client,
    base_url: String,
    record_cache: Mutex<LruCache<String, CreatureRecord>>,
}

impl PokeApiClient {
    const CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(512) {
        Some(size) => size,
        None => panic!("Cache size must be non-zero"),
    };

    /// Creates a client for `base_url` (e.g. `https://pokeapi.co/api/v2`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            record_cache: Mutex::new(LruCache::new(Self::CACHE_SIZE)),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, subject: &str) -> Result<T, LookupError> {
        debug!("PokeAPI GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(subject.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Transport(format!(
                "{} answered with status {}",
                url, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))
    }

    fn cached(&self, key: &str) -> Option<CreatureRecord> {
        self.record_cache.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, record: &CreatureRecord) {
        if let Ok(mut cache) = self.record_cache.lock() {
            cache.put(record.name.clone(), record.clone());
            cache.put(record.id.to_string(), record.clone());
        }
    }
}

#[async_trait]
impl CreatureProvider for PokeApiClient {
    async fn fetch_by_identifier(&self, identifier: &str) -> Result<CreatureRecord, LookupError> {
        let key = identifier.trim().to_lowercase();
        if key.is_empty() {
            return Err(LookupError::NotFound(identifier.to_string()));
        }
        if let Some(record) = self.cached(&key) {
            return Ok(record);
        }

        let url = format!("{}/pokemon/{}", self.base_url, key);
        let raw: RawPokemon = self.get_json(&url, &key).await?;
        let record = CreatureRecord::from(raw);
        self.remember(&record);
        Ok(record)
    }

    async fn fetch_all_names(&self) -> Result<Vec<String>, LookupError> {
        // The listing endpoint wants an explicit limit, so ask for the count first.
        let probe: RawPage = self
            .get_json(&format!("{}/pokemon?limit=1", self.base_url), "pokemon list")
            .await?;

        let page: RawPage = self
            .get_json(
                &format!("{}/pokemon?limit={}", self.base_url, probe.count),
                "pokemon list",
            )
            .await?;

        let names: Vec<String> = page.results.into_iter().map(|r| r.name).collect();
        info!("Loaded {} creature names from PokeAPI", names.len());
        Ok(names)
    }

    async fn fetch_ids_by_type(&self, type_name: &str, limit: usize) -> Result<Vec<u32>, LookupError> {
        let url = format!("{}/type/{}", self.base_url, type_name);
        let raw: RawType = self.get_json(&url, type_name).await?;

        let ids: Vec<u32> = raw
            .pokemon
            .iter()
            .filter_map(|member| {
                let id = id_from_resource_url(&member.pokemon.url);
                if id.is_none() {
                    warn!("Skipping type member with unparsable url: {}", member.pokemon.url);
                }
                id
            })
            .take(limit)
            .collect();

        debug!("Type {} yielded {} ids", type_name, ids.len());
        Ok(ids)
    }

    async fn fetch_evolution_chain(&self, id: u32) -> Result<EvolutionChain, LookupError> {
        let species_url = format!("{}/pokemon-species/{}", self.base_url, id);
        let species: RawSpecies = self.get_json(&species_url, &id.to_string()).await?;

        let chain_url = species
            .evolution_chain
            .map(|c| c.url)
            .ok_or_else(|| LookupError::NotFound(format!("evolution chain of {}", species.name)))?;

        let chain: RawEvolutionChain = self.get_json(&chain_url, &species.name).await?;
        Ok(EvolutionChain {
            subject: species.name,
            root: chain.chain.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pikachu_body() -> serde_json::Value {
        json!({
            "id": 25,
            "name": "pikachu",
            "sprites": { "front_default": "https://img/25.png" },
            "types": [{ "slot": 1, "type": { "name": "electric", "url": "" } }],
            "stats": [
                { "base_stat": 35, "stat": { "name": "hp" } },
                { "base_stat": 55, "stat": { "name": "attack" } },
                { "base_stat": 40, "stat": { "name": "defense" } },
                { "base_stat": 50, "stat": { "name": "special-attack" } },
                { "base_stat": 50, "stat": { "name": "special-defense" } },
                { "base_stat": 90, "stat": { "name": "speed" } }
            ]
        })
    }

    fn client_for(server: &MockServer) -> PokeApiClient {
        PokeApiClient::new(server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_id_from_resource_url() {
        assert_eq!(id_from_resource_url("https://pokeapi.co/api/v2/pokemon/25/"), Some(25));
        assert_eq!(id_from_resource_url("https://pokeapi.co/api/v2/pokemon/10034"), Some(10034));
        assert_eq!(id_from_resource_url("https://pokeapi.co/api/v2/pokemon/"), None);
    }

    #[tokio::test]
    async fn test_fetch_by_identifier_maps_record_and_caches_it() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/pikachu"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pikachu_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let record = client.fetch_by_identifier("Pikachu").await.unwrap();

        assert_eq!(record.id, 25);
        assert_eq!(record.types, vec!["electric".to_string()]);
        assert_eq!(record.stats.speed, 90);
        assert_eq!(record.stats.special_attack, 50);
        assert_eq!(record.sprite.as_deref(), Some("https://img/25.png"));

        // Second lookup, by name or by id, is served from the cache.
        let again = client.fetch_by_identifier("pikachu").await.unwrap();
        let by_id = client.fetch_by_identifier("25").await.unwrap();
        assert_eq!(again, record);
        assert_eq!(by_id, record);
    }

    #[tokio::test]
    async fn test_fetch_by_identifier_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/missingno"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_by_identifier("missingno").await.unwrap_err();
        assert_eq!(err, LookupError::NotFound("missingno".to_string()));
    }

    #[tokio::test]
    async fn test_server_error_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/pikachu"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_by_identifier("pikachu").await.unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/pikachu"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(pikachu_body())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = PokeApiClient::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.fetch_by_identifier("pikachu").await.unwrap_err();
        assert!(matches!(err, LookupError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_all_names_uses_reported_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "results": [{ "name": "bulbasaur", "url": "" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pokemon"))
            .and(query_param("limit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "results": [
                    { "name": "bulbasaur", "url": "" },
                    { "name": "ivysaur", "url": "" },
                    { "name": "venusaur", "url": "" }
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let names = client.fetch_all_names().await.unwrap();
        assert_eq!(names, vec!["bulbasaur", "ivysaur", "venusaur"]);
    }

    #[tokio::test]
    async fn test_fetch_ids_by_type_respects_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/type/fire"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pokemon": [
                    { "pokemon": { "name": "charmander", "url": "https://pokeapi.co/api/v2/pokemon/4/" } },
                    { "pokemon": { "name": "charmeleon", "url": "https://pokeapi.co/api/v2/pokemon/5/" } },
                    { "pokemon": { "name": "charizard", "url": "https://pokeapi.co/api/v2/pokemon/6/" } }
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ids = client.fetch_ids_by_type("fire", 2).await.unwrap();
        assert_eq!(ids, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_fetch_evolution_chain_follows_species_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon-species/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "charmeleon",
                "evolution_chain": { "url": format!("{}/evolution-chain/2/", server.uri()) }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/evolution-chain/2/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chain": {
                    "species": { "name": "charmander", "url": "" },
                    "evolves_to": [{
                        "species": { "name": "charmeleon", "url": "" },
                        "evolves_to": [{
                            "species": { "name": "charizard", "url": "" },
                            "evolves_to": []
                        }]
                    }]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let chain = client.fetch_evolution_chain(5).await.unwrap();
        assert_eq!(chain.subject, "charmeleon");
        assert_eq!(chain.root.species, "charmander");
        assert!(!chain.is_fully_evolved());
    }
}
