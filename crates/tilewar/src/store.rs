//! Where rooms get their maps from.
//!
//! Map editing and persistence live outside this server. The only contract
//! the room layer needs is [`MapStore::load`].

use std::collections::HashMap;
use std::path::Path;

use tilewar_map::MapDocument;

use crate::TilewarError;

/// Read access to saved maps, keyed by map id.
pub trait MapStore: Send + Sync + 'static {
    fn load(&self, map_id: &str) -> Option<MapDocument>;
}

/// A map store held in memory. Only valid maps get in.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMapStore {
    maps: HashMap<String, MapDocument>,
}

impl InMemoryMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `map` under `map_id` if it passes every validation rule.
    pub fn save(&mut self, map_id: impl Into<String>, map: MapDocument) -> Result<(), TilewarError> {
        let map_id = map_id.into();
        let report = map.validate();
        if !report.valid {
            return Err(TilewarError::InvalidMap {
                map_id,
                errors: report.errors,
            });
        }
        self.maps.insert(map_id, map);
        Ok(())
    }

    /// Loads every `*.json` map document in `dir`, keyed by file stem.
    ///
    /// Unreadable directories are errors; individual files that fail to
    /// parse or validate are skipped with a warning.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, TilewarError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| TilewarError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut store = Self::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(map_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let map_id = map_id.to_string();
            match read_map(&path).and_then(|map| store.save(map_id.clone(), map)) {
                Ok(()) => tracing::info!(%map_id, "map loaded"),
                Err(e) => tracing::warn!(%map_id, error = %e, "skipping map"),
            }
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

fn read_map(path: &Path) -> Result<MapDocument, TilewarError> {
    let bytes = std::fs::read(path).map_err(|source| TilewarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| TilewarError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl MapStore for InMemoryMapStore {
    fn load(&self, map_id: &str) -> Option<MapDocument> {
        self.maps.get(map_id).cloned()
    }
}
