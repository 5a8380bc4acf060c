//! # Tracing Setup
//!
//! Installs the `fmt` subscriber used by applications embedding the stores.
//!
//! ## Filter Resolution
//! 1. `RUST_LOG`, if set and parsable
//! 2. Otherwise the directives passed to [`init_tracing`]
//!
//! ```bash
//! RUST_LOG=menu_store::reorder=trace,info ./menu-app
//! ```

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVES: &str = "info,menu_store=debug";

/// Installs a global `fmt` subscriber.
///
/// Returns `false` if a global subscriber was already installed, which
/// makes repeated calls (tests, embedding apps) harmless.
pub fn init_tracing(default_directives: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
