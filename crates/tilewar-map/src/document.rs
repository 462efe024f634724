//! Map documents as stored by the persistence collaborator.

use serde::{Deserialize, Serialize};

use crate::{Grid, ValidationReport, validate};

/// Size class of a map. Fixes the grid dimension, the number of spawn
/// points and the player cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapSize {
    Small,
    Medium,
    Large,
}

impl MapSize {
    /// Side length of the square grid.
    pub fn dimension(self) -> usize {
        match self {
            Self::Small => 10,
            Self::Medium => 15,
            Self::Large => 20,
        }
    }

    /// Required number of spawn markers.
    pub fn spawn_count(self) -> usize {
        match self {
            Self::Small => 2,
            Self::Medium => 4,
            Self::Large => 6,
        }
    }

    /// Room capacity for a map of this size.
    pub fn max_players(self) -> usize {
        self.spawn_count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameMode {
    Classic,
    CaptureTheFlag,
}

/// A saved map: `{name, description, size, mode, tiles, isVisible}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    pub name: String,
    pub description: String,
    pub size: MapSize,
    pub mode: GameMode,
    pub tiles: Grid,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl MapDocument {
    /// Runs every map rule plus the document-level name check.
    pub fn validate(&self) -> ValidationReport {
        let mut report =
            validate(&self.tiles, self.size, self.mode, &self.description);
        if self.name.trim().is_empty() {
            report.push("the map must have a name");
        }
        report
    }
}
