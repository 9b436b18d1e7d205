use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key under which the profile is stored in the key-value file.
pub const AGENT_PROFILE_KEY: &str = "agent_config";

/// User-defined assistant persona folded into the system message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub rules: String,
}

impl AgentProfile {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.instructions.trim().is_empty()
            && self.rules.trim().is_empty()
    }

    /// Merge the profile into a base system prompt.
    pub fn apply_to(&self, system: &str) -> String {
        let mut parts = Vec::new();
        let name = self.name.trim();
        if !name.is_empty() {
            parts.push(format!("You are {name}."));
        }
        let instructions = self.instructions.trim();
        if !instructions.is_empty() {
            parts.push(instructions.to_string());
        }
        if !system.trim().is_empty() {
            parts.push(system.trim().to_string());
        }
        let rules = self.rules.trim();
        if !rules.is_empty() {
            parts.push(format!("Rules:\n{rules}"));
        }
        parts.join("\n\n")
    }
}

/// Read-only access to the stored agent profile.
pub trait AgentProfileStore: Send + Sync {
    fn load(&self) -> Result<Option<AgentProfile>>;
}

/// JSON object file mapping keys to values; the profile lives under
/// [`AGENT_PROFILE_KEY`].
#[derive(Debug, Clone)]
pub struct JsonFileProfileStore {
    path: PathBuf,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, serde_json::Value>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// Store or replace the profile, keeping unrelated keys.
    pub fn save(&self, profile: &AgentProfile) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(AGENT_PROFILE_KEY.to_string(), serde_json::to_value(profile)?);
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl AgentProfileStore for JsonFileProfileStore {
    fn load(&self) -> Result<Option<AgentProfile>> {
        let mut entries = self.read_entries()?;
        let Some(value) = entries.remove(AGENT_PROFILE_KEY) else {
            return Ok(None);
        };
        // Browser-style stores keep the value as a JSON string.
        let value = match value {
            serde_json::Value::String(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Malformed {AGENT_PROFILE_KEY} entry"))?,
            other => other,
        };
        let profile: AgentProfile = serde_json::from_value(value)
            .with_context(|| format!("Malformed {AGENT_PROFILE_KEY} entry"))?;
        Ok((!profile.is_empty()).then_some(profile))
    }
}
