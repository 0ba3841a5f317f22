use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "hypermap.config.json";

/// Reserved key written on serialization and always read on parse
pub const ATTRIBUTE_KEY: &str = "@";

/// What to do with a reserved-attribute entry written under a legacy key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyKeyPolicy {
    /// Drop the entry from the data view and log it
    Strip,
    /// Fail the parse
    Reject,
    /// Read it as the attributes record
    Accept,
}

/// Wire-format and action settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extra reserved key read as a node's attributes on parse
    #[serde(default = "default_attribute_key")]
    pub attribute_key: String,

    /// Historical spellings of the reserved key
    #[serde(default = "default_legacy_keys")]
    pub legacy_keys: Vec<String>,

    #[serde(default = "default_legacy_policy")]
    pub legacy_key_policy: LegacyKeyPolicy,

    /// Nesting limit for eager transclusions during hydration
    #[serde(default = "default_max_transclusion_depth")]
    pub max_transclusion_depth: usize,

    #[serde(default = "default_submit_content_type")]
    pub submit_content_type: String,
}

fn default_attribute_key() -> String {
    ATTRIBUTE_KEY.to_string()
}

fn default_legacy_keys() -> Vec<String> {
    vec!["#".to_string()]
}

fn default_legacy_policy() -> LegacyKeyPolicy {
    LegacyKeyPolicy::Strip
}

fn default_max_transclusion_depth() -> usize {
    8
}

fn default_submit_content_type() -> String {
    "application/json".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn is_attribute_key(&self, key: &str) -> bool {
        key == ATTRIBUTE_KEY || key == self.attribute_key
    }

    pub fn is_legacy_key(&self, key: &str) -> bool {
        self.legacy_keys.iter().any(|k| k == key)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attribute_key: default_attribute_key(),
            legacy_keys: default_legacy_keys(),
            legacy_key_policy: default_legacy_policy(),
            max_transclusion_depth: default_max_transclusion_depth(),
            submit_content_type: default_submit_content_type(),
        }
    }
}
