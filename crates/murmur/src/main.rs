//! # Murmur CLI
//!
//! A thin terminal client over the `murmurapp` data layer, used to inspect
//! and poke at a store on disk. The binary only invokes `cli::run()` and
//! handles process termination; everything else lives in `src/cli/`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/murmur/src/cli/)                      │
//! │  - clap argument parsing (setup.rs)                      │
//! │  - logging, context wiring, dispatch (commands.rs)       │
//! │  - terminal and JSON output (render.rs, styles.rs)       │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  murmurapp                                               │
//! │  - init: data dir, config, migration, seed               │
//! │  - store / views: mutations and per-viewer reads         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything in `murmurapp` is UI agnostic. The CLI owns stdout/stderr,
//! exit codes, and the tracing subscriber.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
