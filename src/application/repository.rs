//! Loading and saving the forest through a key-value store.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::Forest;
use crate::infrastructure::traits::KeyValueStore;

/// What `load` found under the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Key absent: started with an empty forest.
    Missing,
    /// Stored forest read successfully.
    Loaded { nodes: usize },
    /// Stored value was unusable; started with an empty forest.
    Recovered { reason: String },
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOutcome::Missing => f.write_str("no stored forest, starting empty"),
            LoadOutcome::Loaded { nodes } => write!(f, "loaded {nodes} nodes"),
            LoadOutcome::Recovered { reason } => {
                write!(f, "stored forest is corrupt ({reason}), starting empty")
            }
        }
    }
}

/// Reads and writes the whole forest as one JSON value under a fixed key.
#[derive(Clone)]
pub struct ForestRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl ForestRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored forest.
    ///
    /// A missing key or an unparsable/invalid value yields an empty forest;
    /// only a failing store is an error.
    #[instrument(level = "debug", skip(self), fields(key = %self.key))]
    pub fn load(&self) -> ApplicationResult<(Forest, LoadOutcome)> {
        let Some(raw) = self
            .store
            .get(&self.key)
            .with_key_context("load forest", &self.key)?
        else {
            return Ok((Forest::new(), LoadOutcome::Missing));
        };

        let forest: Forest = match serde_json::from_str(&raw) {
            Ok(forest) => forest,
            Err(e) => {
                warn!("load: cannot parse stored forest: {e}");
                return Ok((Forest::new(), LoadOutcome::Recovered { reason: e.to_string() }));
            }
        };
        if let Err(e) = forest.validate() {
            warn!("load: stored forest violates tree invariants: {e}");
            return Ok((Forest::new(), LoadOutcome::Recovered { reason: e.to_string() }));
        }

        let nodes = forest.len();
        debug!("load: {nodes} nodes");
        Ok((forest, LoadOutcome::Loaded { nodes }))
    }

    /// Persist the full forest, replacing the stored value.
    #[instrument(level = "debug", skip(self, forest), fields(key = %self.key))]
    pub fn save(&self, forest: &Forest) -> ApplicationResult<()> {
        let json = self.to_json(forest)?;
        self.store
            .set(&self.key, &json)
            .with_key_context("save forest", &self.key)
    }

    /// Raw stored value, if any.
    pub fn export(&self) -> ApplicationResult<Option<String>> {
        self.store
            .get(&self.key)
            .with_key_context("export forest", &self.key)
    }

    fn to_json(&self, forest: &Forest) -> ApplicationResult<String> {
        serde_json::to_string(forest).map_err(|e| ApplicationError::OperationFailed {
            context: format!("serialize forest for {}", self.key),
            source: Box::new(e),
        })
    }
}
