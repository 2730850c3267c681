//! Locally maintained departures merged into upstream boards.
//!
//! The dataset file has the same shape as a HERE departures response:
//! `{"boards": [{"place": {"name": ...}, "departures": [...]}]}`. It is loaded
//! once at startup and never changes afterwards.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::here::Board;

/// A supplemental board. Same shape as an upstream [`Board`].
pub type ExtraBoard = Board;

/// Errors loading the supplemental dataset.
#[derive(Debug, thiserror::Error)]
pub enum SupplementalError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The supplemental dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtraBoards {
    #[serde(default)]
    boards: Vec<ExtraBoard>,
}

impl ExtraBoards {
    /// Create a dataset from boards already in memory.
    pub fn new(boards: Vec<ExtraBoard>) -> Self {
        Self { boards }
    }

    /// An empty dataset. Merging with it changes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the dataset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SupplementalError> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|source| SupplementalError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| SupplementalError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the dataset, falling back to an empty one on any failure.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(extra) => {
                info!(boards = extra.len(), "loaded supplemental departures");
                extra
            }
            Err(e) => {
                warn!(error = %e, "supplemental departures unavailable, merging disabled");
                Self::empty()
            }
        }
    }

    /// Number of supplemental boards.
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// First supplemental board whose place name equals `name`.
    ///
    /// Later boards with a duplicate name are never returned.
    pub fn find(&self, name: &str) -> Option<&ExtraBoard> {
        self.boards.iter().find(|b| b.place_name() == Some(name))
    }

    /// Append matching supplemental departures to each board.
    ///
    /// Boards match by exact place name. Matched departures go after the
    /// board's own, in dataset order. Boards without a name never match.
    pub fn merge_into(&self, boards: &mut [Board]) {
        if self.boards.is_empty() {
            return;
        }

        for board in boards.iter_mut() {
            let Some(extra) = board.place_name().and_then(|name| self.find(name)) else {
                continue;
            };
            board.departures.extend(extra.departures.iter().cloned());
        }
    }
}
