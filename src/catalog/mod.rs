//! Model catalog and agent profile collaborators.
//!
//! Both are read-only from the pipeline's point of view: the gateway looks a
//! model up once per request and reads the agent profile once per request.

pub mod profile;

pub use profile::{AGENT_PROFILE_KEY, AgentProfile, AgentProfileStore, JsonFileProfileStore};

use crate::config::ModelEntry;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Lookup of model entries by id.
pub trait ModelCatalog: Send + Sync {
    fn lookup(&self, model_id: &str) -> Option<ModelEntry>;

    fn list(&self) -> Vec<ModelEntry>;

    /// First active entry, used when a request names no model.
    fn default_model_id(&self) -> Option<String> {
        self.list()
            .into_iter()
            .find(|entry| entry.active)
            .map(|entry| entry.id)
    }

    /// Resolve an id to an entry that may be used for generation.
    ///
    /// Missing and inactive models are rejected here so no upstream call is
    /// ever made for them.
    fn resolve_active(&self, model_id: &str) -> Result<ModelEntry, ConfigurationError> {
        let entry = self
            .lookup(model_id)
            .ok_or_else(|| ConfigurationError::ModelNotFound(model_id.to_string()))?;
        if !entry.active {
            return Err(ConfigurationError::ModelInactive(model_id.to_string()));
        }
        Ok(entry)
    }
}

/// Catalog backed by the `[[models]]` entries of the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<ModelEntry>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        Self { entries }
    }

}

impl ModelCatalog for StaticCatalog {
    fn lookup(&self, model_id: &str) -> Option<ModelEntry> {
        self.entries.iter().find(|entry| entry.id == model_id).cloned()
    }

    fn list(&self) -> Vec<ModelEntry> {
        self.entries.clone()
    }
}

/// Public view of a catalog entry served by `GET /api/models`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
    pub active: bool,
    pub coming_soon: bool,
}

impl From<&ModelEntry> for ModelSummary {
    fn from(entry: &ModelEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            features: entry.features.clone(),
            active: entry.active,
            coming_soon: entry.coming_soon,
        }
    }
}
