use super::Config;
use anyhow::{Context, Result, bail};
use directories::UserDirs;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let streamchat_dir = home.join(".streamchat");
        let config_path = streamchat_dir.join("config.toml");

        if !streamchat_dir.exists() {
            fs::create_dir_all(&streamchat_dir).context("Failed to create .streamchat directory")?;
        }

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Read and validate a config file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for model in &self.models {
            if model.id.trim().is_empty() {
                bail!("model catalog entry with empty id");
            }
            if !seen.insert(model.id.as_str()) {
                bail!("duplicate model id in catalog: {}", model.id);
            }
            if model.active && model.upstream_model.trim().is_empty() {
                bail!("active model {} has no upstream_model", model.id);
            }
        }
        if self.pipeline.chunk_threshold == 0 {
            bail!("pipeline.chunk_threshold must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            config_path: path.clone(),
            api_key: Some("hf_test".into()),
            provider: ProviderKind::OpenaiCompatible,
            ..Config::default()
        };
        config.save().unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("hf_test"));
        assert_eq!(loaded.provider, ProviderKind::OpenaiCompatible);
        assert_eq!(loaded.models, config.models);
        assert_eq!(loaded.config_path, path);
    }

    #[test]
    fn sparse_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"k\"\n[gateway]\nport = 4100\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.gateway.port, 4100);
        assert_eq!(loaded.pipeline.history_window, 4);
        assert_eq!(loaded.models.len(), 3);
    }

    #[test]
    fn duplicate_model_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[[models]]
id = "a"
name = "A"
upstream_model = "org/a"
active = true

[[models]]
id = "a"
name = "A again"
"#,
        )
        .unwrap();

        let error = Config::load_from(&path).unwrap_err();
        assert!(error.to_string().contains("duplicate model id"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "provider = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn unknown_provider_in_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "provider = \"carrier-pigeon\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
