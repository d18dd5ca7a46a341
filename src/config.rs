use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::compare::SummaryComparator;
use crate::error::DiffError;
use crate::git::SHORT_HASH_LEN;

/// Config file looked up in the repository working directory
pub const CONFIG_FILE: &str = "branch-diff.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matching: MatchingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum summary similarity for a partial match
    pub summary_threshold: f64,
    /// Weight of the summary comparator when merging
    pub summary_weight: f64,
    /// Compare Change-Id footers
    pub change_id: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            summary_threshold: SummaryComparator::DEFAULT_THRESHOLD,
            summary_weight: SummaryComparator::DEFAULT_WEIGHT,
            change_id: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of hash characters shown per commit
    pub hash_length: usize,
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            hash_length: SHORT_HASH_LEN,
            progress: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let invalid = |reason: String| DiffError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path)
            .map_err(|e| invalid(format!("failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        config.validate().map_err(|e| invalid(e.to_string()))?;

        Ok(config)
    }

    /// Load an explicit config file, or `branch-diff.toml` from `repo_dir`
    /// when present, or fall back to defaults
    pub fn discover(explicit: Option<&Path>, repo_dir: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match repo_dir.map(|dir| dir.join(CONFIG_FILE)) {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let unit = 0.0..=1.0;

        if !unit.contains(&self.matching.summary_threshold) {
            anyhow::bail!(
                "matching.summary_threshold must be between 0 and 1, got {}",
                self.matching.summary_threshold
            );
        }

        if !unit.contains(&self.matching.summary_weight) {
            anyhow::bail!(
                "matching.summary_weight must be between 0 and 1, got {}",
                self.matching.summary_weight
            );
        }

        if !(4..=40).contains(&self.output.hash_length) {
            anyhow::bail!(
                "output.hash_length must be between 4 and 40, got {}",
                self.output.hash_length
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[matching]
summary_threshold = 0.8
change_id = false

[output]
progress = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.matching.summary_threshold, 0.8);
        assert_eq!(config.matching.summary_weight, 0.4);
        assert!(!config.matching.change_id);
        assert_eq!(config.output.hash_length, 12);
        assert!(!config.output.progress);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.matching.summary_threshold, 0.7);
        assert!(config.matching.change_id);
        assert!(config.output.progress);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        fs::write(&path, "[matching]\nsummary_threshold = 1.5\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("summary_threshold"));
        assert!(matches!(
            err.downcast_ref::<DiffError>(),
            Some(DiffError::Config { .. })
        ));
        assert_eq!(err.downcast_ref::<DiffError>().map(DiffError::exit_code), Some(1));

        fs::write(&path, "[output]\nhash_length = 2\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_discover() {
        let dir = tempdir().unwrap();

        let config = Config::discover(None, Some(dir.path())).unwrap();
        assert_eq!(config.output.hash_length, 12);

        fs::write(dir.path().join(CONFIG_FILE), "[output]\nhash_length = 8\n").unwrap();
        let config = Config::discover(None, Some(dir.path())).unwrap();
        assert_eq!(config.output.hash_length, 8);

        let missing = dir.path().join("missing.toml");
        let err = Config::discover(Some(&missing), Some(dir.path())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DiffError>(),
            Some(DiffError::Config { .. })
        ));
    }
}
