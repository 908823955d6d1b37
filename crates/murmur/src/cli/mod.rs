//! # CLI Behavior
//!
//! This is **one possible client** of the murmur data layer, not the
//! application itself. It is the only place that knows about terminal I/O,
//! exit codes and output formatting.
//!
//! ## Viewer
//!
//! Reads are always projected for a viewer. `--viewer <id>` selects it;
//! without one, `isLiked`/`isBookmarked` are false everywhere.
//!
//! ## Output
//!
//! Human-readable by default. `--json` prints the projections as JSON, the
//! same camelCase shape consumers of the library receive.
//!
//! ## Logging
//!
//! Logs go to stderr. `RUST_LOG` wins; otherwise the configured `log_level`
//! applies, and `-v` forces `debug`.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Context setup and per-command handlers
//! - `render`: Output formatting (lists, detail views, messages)
//! - `styles`: Terminal styling constants

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
