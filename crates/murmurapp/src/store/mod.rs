//! # Storage Layer
//!
//! This module holds the store itself ([`AudioStore`]) and the pieces it is
//! built from: the record [`collection`], the in-memory [`state`], the
//! durable [`snapshot`] codec and the [`StorageBackend`] abstraction.
//!
//! ## Write-Through Model
//!
//! The in-memory [`StoreState`] is the working copy. Every mutating call
//!
//! 1. validates its input and checks that referenced ids exist,
//! 2. mutates canonical records and indexes together (materialized counters
//!    such as `Track::likes` are rewritten in the same call),
//! 3. saves the *whole* store to the backend before returning.
//!
//! There is no batching and no debounce. A rejected call (unknown id,
//! invalid input, duplicate id, self reference) returns before step 2 and
//! never writes.
//!
//! ## Save Failures
//!
//! A failing write-through save is logged at `error` level and *not*
//! retried; the mutation still stands in memory and the previous durable
//! blob stays untouched. Memory and disk then disagree until the next
//! successful save. Callers that need to know can call [`AudioStore::save`]
//! directly, which returns the error.
//!
//! ## Load Failures
//!
//! [`AudioStore::open`] never fails. A missing blob means an empty store. A
//! blob that cannot be read or parsed is logged and replaced by an empty
//! store; it is overwritten by the next successful save.
//!
//! ## Multiple Writers
//!
//! Two processes sharing one backend race with last-writer-wins semantics.
//! There is no merge and no concurrency token.
//!
//! ## Durable Keys
//!
//! | Key | Content |
//! |-----|---------|
//! | [`STORE_KEY`] | current store blob |
//! | [`LEGACY_STORE_KEY`] | previous schema's blob, read by migration only |
//! | [`MIGRATION_FLAG_KEY`] | set once migration has been handled |
//! | [`SEED_FLAG_KEY`] | set once demo data was seeded |
//!
//! The flags are only consulted by startup code ([`crate::migration`],
//! [`crate::seed`]), never by ordinary reads and writes.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one file per key, atomic writes.
//! - [`mem_backend::MemBackend`]: for testing logic without filesystem I/O.

pub mod audio_store;
pub mod backend;
pub mod collection;
pub mod fs_backend;
mod interactions;
pub mod mem_backend;
mod moderation;
mod social;
pub mod snapshot;
pub mod state;

pub use audio_store::AudioStore;
pub use backend::StorageBackend;
pub use interactions::Toggle;
pub use state::{StoreCounts, StoreState};

pub const STORE_KEY: &str = "murmur.store.v2";
pub const LEGACY_STORE_KEY: &str = "murmur.store.v1";
pub const MIGRATION_FLAG_KEY: &str = "murmur.migrated.v2";
pub const SEED_FLAG_KEY: &str = "murmur.seeded";
