use crate::error::{Result, UnflattenError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Convert `\r\n` and lone `\r` to `\n` before scanning.
    pub normalize_newlines: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Reject block paths that resolve outside the output directory.
    pub strict_paths: bool,
    pub on_duplicate: DuplicatePolicy,
}

/// What to do when two blocks normalize to the same destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last write wins.
    #[default]
    Overwrite,
    /// The later block is reported as a failure and not written.
    Error,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            normalize_newlines: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            strict_paths: false,
            on_duplicate: DuplicatePolicy::Overwrite,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(UnflattenError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| UnflattenError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| UnflattenError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["unflatten.toml", ".unflatten.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        log::debug!("loading configuration from {}", default_path);
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(strict) = cli_args.strict_paths {
            self.output.strict_paths = strict;
        }

        if let Some(policy) = cli_args.on_duplicate {
            self.output.on_duplicate = policy;
        }

        if let Some(normalize) = cli_args.normalize_newlines {
            self.parse.normalize_newlines = normalize;
        }
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub strict_paths: Option<bool>,
    pub on_duplicate: Option<DuplicatePolicy>,
    pub normalize_newlines: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict_paths(mut self, strict: Option<bool>) -> Self {
        self.strict_paths = strict;
        self
    }

    pub fn with_on_duplicate(mut self, policy: Option<DuplicatePolicy>) -> Self {
        self.on_duplicate = policy;
        self
    }

    pub fn with_normalize_newlines(mut self, normalize: Option<bool>) -> Self {
        self.normalize_newlines = normalize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.parse.normalize_newlines);
        assert!(!config.output.strict_paths);
        assert_eq!(config.output.on_duplicate, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn test_sample_config_loads_back() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", Config::create_sample_config()).unwrap();

        let loaded = Config::load_from_file(temp_file.path()).unwrap();
        assert!(loaded.parse.normalize_newlines);
        assert!(!loaded.output.strict_paths);
        assert_eq!(loaded.output.on_duplicate, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[output]").unwrap();
        writeln!(temp_file, "strict_paths = true").unwrap();
        writeln!(temp_file, "on_duplicate = \"error\"").unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert!(config.output.strict_paths);
        assert!(config.parse.normalize_newlines);
    }

    #[test]
    fn test_missing_and_malformed_config() {
        assert!(Config::load_from_file("/definitely/not/here.toml").is_err());

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[output").unwrap();
        let err = Config::load_from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, UnflattenError::Config { .. }));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_strict_paths(Some(true))
            .with_on_duplicate(Some(DuplicatePolicy::Error));

        config.merge_with_cli_args(&overrides);

        assert!(config.output.strict_paths);
        assert_eq!(config.output.on_duplicate, DuplicatePolicy::Error);
        assert!(config.parse.normalize_newlines);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(sample.contains("[parse]"));
        assert!(sample.contains("[output]"));
        assert!(sample.contains("on_duplicate = \"overwrite\""));
    }
}
