//! # murmurapp
//!
//! The data layer of a social audio-sharing app. It is the single source of
//! truth for tracks, users, comments, likes, bookmarks, follows,
//! notifications, moderation reports, pending uploads, play counts and the
//! tag-frequency cache.
//!
//! ## Components
//!
//! ```text
//!  init ──► migration ──► seed          (startup, once)
//!   │
//!   ▼
//!  store::AudioStore ◄──► index          (canonical records + derived indexes)
//!   │        │
//!   │        └──► store::snapshot ──► store::StorageBackend  (write-through)
//!   ▼
//!  views                                 (per-viewer projections)
//! ```
//!
//! - [`store`]: the [`AudioStore`](store::AudioStore), its collections and
//!   persistence.
//! - [`index`]: set-valued relations (likes, bookmarks, comment likes) and
//!   play counts.
//! - [`tags`]: tag normalization, validation and frequency counting.
//! - [`views`]: read enrichment. Everything a consumer reads goes through here.
//! - [`migration`]: the one-time v1 → v2 schema migration.
//! - [`seed`]: first-run demo data.
//! - [`init`]: data directory, config and startup ordering.
//!
//! ## Usage
//!
//! ```
//! use murmurapp::model::{Track, UserSnapshot};
//! use murmurapp::store::{mem_backend::MemBackend, AudioStore};
//!
//! let mut store = AudioStore::open(MemBackend::new());
//! let owner = UserSnapshot::new("u1", "ana");
//! store
//!     .add_track(Track::new("t1", owner, "Rain", "data:audio/mp3;base64,AAAA", 10.0))
//!     .unwrap();
//! store.toggle_like("t1", "u2").unwrap();
//!
//! let views = store.get_all_tracks(Some("u2"));
//! assert!(views[0].is_liked);
//! assert_eq!(views[0].track.likes, 1);
//! ```
//!
//! The store is synchronous and single-threaded. Every mutating call
//! validates, mutates, and saves the whole store before returning.

pub mod config;
pub mod error;
pub mod index;
pub mod init;
pub mod migration;
pub mod model;
pub mod seed;
pub mod store;
pub mod tags;
pub mod views;
