//! Server settings read from the environment.

use std::path::{Path, PathBuf};

use tilewar_room::GameConfig;

use crate::TilewarError;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Where to listen, where maps live, and the per-room game settings.
///
/// | Variable         | Meaning                                  |
/// |------------------|------------------------------------------|
/// | `TILEWAR_BIND`   | listen address, default `127.0.0.1:8080` |
/// | `TILEWAR_MAPS`   | directory of `<map id>.json` documents   |
/// | `TILEWAR_CONFIG` | JSON file with [`GameConfig`] overrides  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub maps_dir: Option<PathBuf>,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            maps_dir: None,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, TilewarError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TilewarError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if let Some(bind) = var("TILEWAR_BIND") {
            config.bind = bind;
        }
        config.maps_dir = var("TILEWAR_MAPS").map(PathBuf::from);
        if let Some(path) = var("TILEWAR_CONFIG") {
            config.game = read_game_config(Path::new(&path))?;
        }
        if config.game.tick_period_ms == 0 {
            return Err(TilewarError::Env {
                name: "TILEWAR_CONFIG",
                reason: "tickPeriodMs must be positive".into(),
            });
        }
        Ok(config)
    }
}

fn read_game_config(path: &Path) -> Result<GameConfig, TilewarError> {
    let bytes = std::fs::read(path).map_err(|source| TilewarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| TilewarError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
