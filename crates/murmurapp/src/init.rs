//! # Startup
//!
//! [`initialize`] wires a ready-to-use store for a data directory:
//!
//! 1. Resolve the data directory ([`resolve_data_dir`]).
//! 2. Load `murmur.toml` from it, merged over compiled defaults.
//! 3. Open an [`AudioStore`] over an [`FsBackend`] rooted there. Opening
//!    loads the current blob and never fails (see [`crate::store`]).
//! 4. [`bootstrap`]: run the v1 → v2 migration if due, then seed demo data
//!    if due and enabled.
//!
//! The order matters: seeding first would make the store non-empty and
//! migration would then refuse to run.
//!
//! ## Data Directory Resolution
//!
//! 1. An explicit `data_override` path, used as-is.
//! 2. The `MURMUR_DATA` environment variable (primarily for testing).
//! 3. The OS data directory from the `directories` crate.
//!
//! ## Fail-Soft Bootstrap
//!
//! A migration or seed failure is logged and startup continues with
//! whatever state the store holds. The step is retried on the next start
//! since its flag was not set.

use crate::config::MurmurConfig;
use crate::error::{MurmurError, Result};
use crate::migration::{run_migration, MigrationOutcome};
use crate::seed::{run_seed, SeedOutcome};
use crate::store::fs_backend::FsBackend;
use crate::store::{AudioStore, StorageBackend};
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DATA_DIR_ENV: &str = "MURMUR_DATA";
pub const CONFIG_FILE_NAME: &str = "murmur.toml";

pub struct MurmurContext {
    pub store: AudioStore<FsBackend>,
    pub config: MurmurConfig,
    pub data_dir: PathBuf,
    pub startup: StartupReport,
}

/// What [`bootstrap`] did. `None` means the step failed (and was logged) or,
/// for seeding, was disabled by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartupReport {
    pub migration: Option<MigrationOutcome>,
    pub seed: Option<SeedOutcome>,
}

pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "murmur", "murmur")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| MurmurError::Store("Could not determine data directory".to_string()))
}

/// Loads `murmur.toml` from `data_dir`. A missing or broken file yields defaults.
pub fn load_config(data_dir: &Path) -> MurmurConfig {
    Clapfig::builder()
        .app_name("murmur")
        .file_name(CONFIG_FILE_NAME)
        .search_paths(vec![SearchPath::Path(data_dir.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .load()
        .unwrap_or_default()
}

/// Migration, then seeding. Never fails; see the module docs.
pub fn bootstrap<B: StorageBackend>(
    store: &mut AudioStore<B>,
    config: &MurmurConfig,
) -> StartupReport {
    let migration = match run_migration(store) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!(error = %e, "migration failed, continuing with current store");
            None
        }
    };

    let seed = if config.seed_demo_data {
        match run_seed(store) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "seeding failed");
                None
            }
        }
    } else {
        None
    };

    info!(?migration, ?seed, "store ready");
    StartupReport { migration, seed }
}

/// Builds the context for `data_override` (see [`resolve_data_dir`]).
///
/// `seed_override` replaces the configured `seed_demo_data` when set.
pub fn initialize(data_override: Option<PathBuf>, seed_override: Option<bool>) -> Result<MurmurContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let mut config = load_config(&data_dir);
    if let Some(seed) = seed_override {
        config.seed_demo_data = seed;
    }

    let mut store = AudioStore::open(FsBackend::new(data_dir.clone()));
    let startup = bootstrap(&mut store, &config);

    Ok(MurmurContext {
        store,
        config,
        data_dir,
        startup,
    })
}
