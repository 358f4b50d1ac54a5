//! CLI configuration loaded from environment variables.
//!
//! Every setting has a default so the tool runs with zero configuration.
//! Command-line flags are applied on top in `main`.

use igschema_models::{BatchMode, DocumentMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Drop absent fields from the printed documents.
    /// Env: `IGSCHEMA_SPARSE` (true/false)
    /// Default: `true`
    pub sparse: bool,

    /// Abort a batch on its first invalid item instead of skipping it.
    /// Env: `IGSCHEMA_STRICT` (true/false)
    /// Default: `false`
    pub strict: bool,

    /// Pretty-print the output JSON.
    /// Env: `IGSCHEMA_PRETTY` (true/false)
    /// Default: `true`
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            sparse: true,
            strict: false,
            pretty: true,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let flag = |key: &str, current: bool| match lookup(key) {
            None => current,
            Some(val) => parse_flag(&val).unwrap_or_else(|| {
                tracing::warn!(key, value = %val, "Invalid boolean, using default");
                current
            }),
        };

        config.sparse = flag("IGSCHEMA_SPARSE", config.sparse);
        config.strict = flag("IGSCHEMA_STRICT", config.strict);
        config.pretty = flag("IGSCHEMA_PRETTY", config.pretty);

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }

    pub fn document_mode(&self) -> DocumentMode {
        if self.sparse {
            DocumentMode::Sparse
        } else {
            DocumentMode::Full
        }
    }

    pub fn batch_mode(&self) -> BatchMode {
        if self.strict {
            BatchMode::Strict
        } else {
            BatchMode::SkipInvalid
        }
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]);
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.document_mode(), DocumentMode::Sparse);
        assert_eq!(config.batch_mode(), BatchMode::SkipInvalid);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("IGSCHEMA_SPARSE", "false"),
            ("IGSCHEMA_STRICT", "1"),
            ("IGSCHEMA_PRETTY", "NO"),
        ]);
        assert_eq!(config.document_mode(), DocumentMode::Full);
        assert_eq!(config.batch_mode(), BatchMode::Strict);
        assert!(!config.pretty);
    }

    #[test]
    fn test_invalid_value_keeps_default() {
        let config = config_from(&[("IGSCHEMA_STRICT", "maybe")]);
        assert!(!config.strict);
    }
}
