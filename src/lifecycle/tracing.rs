//! # Logging
//!
//! Structured logging through `tracing`, filtered with `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=order_board::board_actor=debug cargo run
//! DASHBOARD_LOG_JSON=true RUST_LOG=info cargo run
//! ```
//!
//! With `RUST_LOG=info` a normal start looks like:
//!
//! ```text
//! INFO Actor started actor_type="SessionState"
//! INFO Actor started actor_type="OrderBoard"
//! INFO Loading board generation=1
//! INFO Store resolved user_id=u-1 store_id=store-1 path=Owner
//! INFO Orders loaded store_id=store-1 count=3
//! INFO Realtime subscription open topic="orders:store_id=eq.store-1"
//! ```
//!
//! Fallback store resolution, rollbacks and dropped feed events are logged at
//! `warn`. Per-message handling and payloads are logged at `debug`.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Compact lines by default, one JSON object
/// per line when `json` is set.
///
/// Falls back to `info` when `RUST_LOG` is unset or invalid.
pub fn setup_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // A second install (tests, embedding) keeps the first subscriber.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
