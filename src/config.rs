use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load config from default locations or fall back to defaults
    pub fn load_or_default() -> Result<Self> {
        let paths = [
            PathBuf::from("/etc/flowtag/config.toml"),
            dirs_next::config_dir()
                .map(|p| p.join("flowtag/config.toml"))
                .unwrap_or_default(),
            PathBuf::from("flowtag.toml"),
        ];

        for path in &paths {
            if path.is_file() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(&path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Input and output locations for an analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// CSV lookup table with `dstport`, `protocol` and `tag` columns
    #[serde(default = "default_lookup_table")]
    pub lookup_table: PathBuf,

    /// Whitespace-delimited flow log
    #[serde(default = "default_flow_logs")]
    pub flow_logs: PathBuf,

    /// Report destination (parent directory must exist)
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            lookup_table: default_lookup_table(),
            flow_logs: default_flow_logs(),
            output: default_output(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Where generated flow logs are written
    #[serde(default = "default_generator_output")]
    pub output: PathBuf,

    /// Target file size in megabytes
    #[serde(default = "default_size_mb")]
    pub size_mb: u64,

    /// Fixed RNG seed for reproducible output
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output: default_generator_output(),
            size_mb: default_size_mb(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_lookup_table() -> PathBuf {
    PathBuf::from("./data/lookup_table.csv")
}

fn default_flow_logs() -> PathBuf {
    PathBuf::from("./data/flow_logs.txt")
}

fn default_output() -> PathBuf {
    PathBuf::from("./output/output_results.txt")
}

fn default_generator_output() -> PathBuf {
    PathBuf::from("./testingLogs/flow_logs_gen.txt")
}

fn default_size_mb() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
