//! # Configuration
//!
//! Murmur configuration is managed by [`clapfig`], which handles layered loading
//! from TOML files, environment variables, and programmatic overrides.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `MURMUR__SEED_DEMO_DATA`, `MURMUR__LOG_LEVEL`, etc.
//! 2. **Data-dir Config**: `<data dir>/murmur.toml`.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `seed_demo_data` | `true` | Insert demo data on the very first run |
//! | `top_tags_limit` | `10` | How many tags top-tag reads return by default |
//! | `log_level` | `info` | Log filter used when `RUST_LOG` is unset |

use confique::Config;
use serde::{Deserialize, Serialize};

/// Configuration for murmur, stored in `murmur.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MurmurConfig {
    /// Seed demo data on first run. Has no effect once the seed flag is set.
    #[config(default = true)]
    pub seed_demo_data: bool,

    #[config(default = 10)]
    pub top_tags_limit: usize,

    /// A `tracing` filter directive such as "info" or "murmurapp=debug".
    #[config(default = "info")]
    pub log_level: String,
}

impl Default for MurmurConfig {
    fn default() -> Self {
        Self {
            seed_demo_data: true,
            top_tags_limit: 10,
            log_level: "info".to_string(),
        }
    }
}

impl MurmurConfig {
    /// The top-tag limit, never below 1.
    pub fn top_tags_limit(&self) -> usize {
        self.top_tags_limit.max(1)
    }
}
