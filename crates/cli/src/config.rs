//! Configuration file support for the filter command

use anyhow::{Context, Result};
use c4clean_core::{DocumentFilterConfig, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Filter and pipeline settings as stored on disk
///
/// Every section is optional; missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterFileConfig {
    pub pipeline: PipelineConfig,
    pub filter: DocumentFilterConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match extension {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(anyhow::anyhow!(
                "Unsupported config file format: {:?}. Use .yaml, .yml, or .toml",
                extension
            )),
        }
    }
}

impl FilterFileConfig {
    /// Load configuration from a file (YAML or TOML)
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            ConfigFormat::Toml => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
        }
    }

    /// Save configuration to a file
    #[allow(dead_code)]
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Settings for small or noisy corpora
    #[allow(dead_code)]
    pub fn lenient() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            filter: DocumentFilterConfig::lenient(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("filter.yaml");

        let config = FilterFileConfig::lenient();
        config.save(&path).unwrap();

        assert_eq!(FilterFileConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_save_and_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("filter.toml");

        let mut config = FilterFileConfig::default();
        config.pipeline.num_threads = Some(4);
        config.filter.sentences.min_alphanumeric_percentage = Some(60.0);
        config.save(&path).unwrap();

        assert_eq!(FilterFileConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.yml");
        std::fs::write(
            &path,
            "pipeline:\n  text_field: content\nfilter:\n  min_sentences: 2\n  redaction:\n    credit_cards: false\n",
        )
        .unwrap();

        let config = FilterFileConfig::load(&path).unwrap();
        assert_eq!(config.pipeline.text_field, "content");
        assert_eq!(config.pipeline.chunk_size, 10_000);
        assert_eq!(config.filter.min_sentences, 2);
        assert!(!config.filter.redaction.credit_cards);
        assert!(config.filter.redaction.ssn);
        assert_eq!(config.filter.language.confidence_threshold, 0.99);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[filter.language]\nallowed_languages = [\"eng\", \"deu\"]\nconfidence_threshold = 0.9\n",
        )
        .unwrap();

        let config = FilterFileConfig::load(&path).unwrap();
        assert_eq!(config.filter.language.allowed_languages, vec!["eng", "deu"]);
        assert_eq!(config.filter.min_sentences, 5);
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("filter.json");

        assert!(FilterFileConfig::default().save(&path).is_err());
        std::fs::write(&path, "{}").unwrap();
        assert!(FilterFileConfig::load(&path).is_err());
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "filter: [unclosed").unwrap();

        let err = FilterFileConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }
}
