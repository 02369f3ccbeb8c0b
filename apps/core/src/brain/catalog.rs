//! Name catalog: every known creature name, loaded once per process.
//!
//! Lifecycle is unloaded → loading → loaded. Only one load runs at a time;
//! concurrent callers queue on the load lock and find the catalog populated
//! when they get it. A failed load leaves the catalog unloaded so the next
//! caller retries.

use crate::error::LookupError;
use crate::pokeapi::CreatureProvider;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct Snapshot {
    /// Provider order (catalog id order). Fuzzy and prefix tie-breaks rely on it.
    ordered: Arc<Vec<String>>,
    index: HashSet<String>,
}

/// Process-wide set of canonical creature names.
#[derive(Debug, Default)]
pub struct NameCatalog {
    snapshot: RwLock<Option<Snapshot>>,
    load_lock: Mutex<()>,
}

impl NameCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a load has completed successfully.
    pub fn is_loaded(&self) -> bool {
        self.snapshot.read().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Loads the catalog from `provider` unless it is already loaded.
    ///
    /// Returns the number of names available.
    pub async fn ensure_loaded(&self, provider: &dyn CreatureProvider) -> Result<usize, LookupError> {
        if let Some(count) = self.loaded_len() {
            return Ok(count);
        }

        let _guard = self.load_lock.lock().await;

        // Someone else may have finished loading while we waited.
        if let Some(count) = self.loaded_len() {
            return Ok(count);
        }

        info!("Loading creature name catalog...");
        let names = provider.fetch_all_names().await.inspect_err(|e| {
            warn!("Catalog load failed, will retry on next request: {}", e);
        })?;

        if names.is_empty() {
            warn!("Catalog load returned no names, will retry on next request");
            return Err(LookupError::NotFound("creature name list".to_string()));
        }

        let mut ordered = Vec::with_capacity(names.len());
        let mut index = HashSet::with_capacity(names.len());
        for name in names {
            let name = name.to_lowercase();
            if index.insert(name.clone()) {
                ordered.push(name);
            }
        }

        let count = ordered.len();
        if let Ok(mut slot) = self.snapshot.write() {
            *slot = Some(Snapshot {
                ordered: Arc::new(ordered),
                index,
            });
        }
        info!("Catalog loaded with {} names", count);
        Ok(count)
    }

    /// Membership test; always `false` before the first successful load.
    pub fn contains(&self, name: &str) -> bool {
        self.snapshot
            .read()
            .map(|s| s.as_ref().is_some_and(|snap| snap.index.contains(name)))
            .unwrap_or(false)
    }

    /// All names in stable catalog order; empty before the first successful load.
    pub fn all(&self) -> Arc<Vec<String>> {
        self.snapshot
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|snap| Arc::clone(&snap.ordered)))
            .unwrap_or_default()
    }

    /// Drops the loaded names; the next `ensure_loaded` fetches again.
    pub fn reset(&self) {
        if let Ok(mut slot) = self.snapshot.write() {
            *slot = None;
        }
    }

    fn loaded_len(&self) -> Option<usize> {
        self.snapshot
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|snap| snap.ordered.len()))
    }
}
