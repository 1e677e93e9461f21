//! Coordinator configuration

use serde::{Deserialize, Serialize};

use crate::strategy::StrategyPreference;
use crate::Result;

pub const DEFAULT_REGISTRY_KEY_SUFFIX: &str = "_tabs";
pub const DEFAULT_DUPLICATE_MESSAGE: &str =
    "Duplicate Tab Detected. Please close this tab to continue using the application.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which transport to use when the platform offers a choice
    pub strategy: StrategyPreference,
    /// Appended to the namespace to form the shared-store registry key
    pub registry_key_suffix: String,
    /// Text surfaced by the guard once a duplicate is detected
    pub duplicate_message: String,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: StrategyPreference::Auto,
            registry_key_suffix: DEFAULT_REGISTRY_KEY_SUFFIX.to_string(),
            duplicate_message: DEFAULT_DUPLICATE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json_str(r#"{"strategy":"shared_store"}"#).unwrap();
        assert_eq!(config.strategy, StrategyPreference::SharedStore);
        assert_eq!(config.registry_key_suffix, "_tabs");
        assert_eq!(config.duplicate_message, DEFAULT_DUPLICATE_MESSAGE);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(Config::from_json_str(r#"{"strategy":"carrier_pigeon"}"#).is_err());
    }
}
