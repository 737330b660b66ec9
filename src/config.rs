use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult as Result};
use crate::output::VerbosityLevel;

/// Default catalog read by the sorter
pub const DEFAULT_INPUT: &str = "library.xml";

/// Default destination of the sorted catalog
pub const DEFAULT_OUTPUT: &str = "library_sorted.xml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "LIBRARY_SORT_CONFIG";

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub files: FileConfig,
    pub output: OutputConfig,
}

/// Catalog file locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Catalog to sort
    pub input: PathBuf,
    /// Where the sorted catalog is written
    pub output: PathBuf,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (warnings and errors only)
    pub quiet: bool,
    /// Colorize status lines when stdout is a terminal
    pub color: bool,
}

impl OutputConfig {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            quiet: false,
            color: true,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment
    pub fn load_config() -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider)
    }

    pub fn load_config_with(env: &impl EnvProvider) -> Result<Config> {
        let config = if let Some(path) = env.get(CONFIG_PATH_VAR) {
            Self::load_from_file(Path::new(&path))?
        } else {
            Self::find_config_file()?.unwrap_or_default()
        };

        let config = Self::apply_environment_overrides_with(env, config)?;
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "library-sort.toml",
            "library-sort.json",
            ".library-sort.toml",
            ".library-sort.json",
        ];

        // Check current directory first
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path)?));
            }
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("library-sort");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path)?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(input) = env.get("LIBRARY_SORT_INPUT") {
            config.files.input = PathBuf::from(input);
        }

        if let Some(output) = env.get("LIBRARY_SORT_OUTPUT") {
            config.files.output = PathBuf::from(output);
        }

        if let Some(verbose) = env.get("LIBRARY_SORT_VERBOSE") {
            config.output.verbose = parse_flag("LIBRARY_SORT_VERBOSE", &verbose)?;
        }

        if let Some(quiet) = env.get("LIBRARY_SORT_QUIET") {
            config.output.quiet = parse_flag("LIBRARY_SORT_QUIET", &quiet)?;
        }

        if let Some(color) = env.get("LIBRARY_SORT_COLOR") {
            config.output.color = parse_flag("LIBRARY_SORT_COLOR", &color)?;
        }

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if config.files.input.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "Input file path must not be empty".to_string(),
            ));
        }

        if config.files.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "Output file path must not be empty".to_string(),
            ));
        }

        if config.files.input == config.files.output {
            return Err(ConfigError::Validation(format!(
                "Input and output must differ: {}",
                config.files.input.display()
            )));
        }

        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", name, value)))
}
