// Project-wide constants
//
// Defaults and file locations in one place. Import via
// `use crate::config::constants::*;`.

/// Initialization attempts before the router gives up on the semantic layer.
pub const DEFAULT_INIT_ATTEMPTS: u32 = 3;

/// Fixed delay between initialization attempts.
pub const DEFAULT_INIT_BACKOFF_MS: u64 = 1000;

/// Upper bound on one query encode. MiniLM on CPU takes a few milliseconds
/// for a short query; anything near this bound means the backend is stuck.
pub const DEFAULT_ENCODE_TIMEOUT_MS: u64 = 2000;

/// Directory under `$HOME` holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = ".intent-router";

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "INTENT_ROUTER_CONFIG";
