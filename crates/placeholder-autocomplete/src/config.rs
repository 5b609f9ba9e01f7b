/// Configuration loading and validation for the autocomplete
use crate::error::{SuggestError, SuggestResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// When synchronous candidates are shown relative to an asynchronous fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Render only once the fetch has resolved and been merged
    #[default]
    AfterFetch,
    /// Render synchronous candidates immediately, re-render after the merge
    Eager,
}

/// Serializable autocomplete settings
///
/// Candidate sources, observers and the list container are not data and are
/// handed to [`crate::AutoCompleteBuilder`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCompleteConfig {
    /// Character that opens a session
    pub trigger_character: char,
    /// Trailing-edge delay applied to document-change refreshes
    pub debounce_ms: u64,
    /// Shortest raw query, in characters, that is sent to the fetcher
    pub min_fetch_query_len: usize,
    /// Ordering of synchronous and asynchronous results
    pub fetch_mode: FetchMode,
    /// Fuzzy similarity floor; lower-scoring labels do not match
    pub min_match_score: u32,
    /// Extra vertical space between the trigger and the list
    pub list_offset: f32,
}

impl Default for AutoCompleteConfig {
    fn default() -> Self {
        Self {
            trigger_character: '#',
            debounce_ms: 0,
            min_fetch_query_len: 0,
            fetch_mode: FetchMode::default(),
            min_match_score: 0,
            list_offset: 2.0,
        }
    }
}

impl AutoCompleteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

/// Autocomplete configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub fn load_from_yaml(path: &Path) -> SuggestResult<AutoCompleteConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_string(&content, ConfigFormat::Yaml)
    }

    /// Load configuration from a JSON file
    pub fn load_from_json(path: &Path) -> SuggestResult<AutoCompleteConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_string(&content, ConfigFormat::Json)
    }

    /// Load configuration from a file, picking the format from its extension
    pub fn load_from_path(path: &Path) -> SuggestResult<AutoCompleteConfig> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::load_from_yaml(path),
            Some("json") => Self::load_from_json(path),
            _ => Err(SuggestError::config_error(format!(
                "Unsupported configuration file: {}",
                path.display()
            ))),
        }
    }

    /// Load configuration from a string
    pub fn load_from_string(
        content: &str,
        format: ConfigFormat,
    ) -> SuggestResult<AutoCompleteConfig> {
        let config: AutoCompleteConfig = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Validate autocomplete configuration
    pub fn validate_config(config: &AutoCompleteConfig) -> SuggestResult<()> {
        let trigger = config.trigger_character;
        if trigger.is_whitespace() || trigger.is_control() {
            return Err(SuggestError::config_error(format!(
                "Trigger character must be printable, got {:?}",
                trigger
            )));
        }

        if !config.list_offset.is_finite() || config.list_offset < 0.0 {
            return Err(SuggestError::config_error(
                "List offset must be a non-negative number",
            ));
        }

        Ok(())
    }
}
