//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Install a stderr subscriber for the crate's log events.
///
/// Reads `CKSCAN_LOG` for filter directives, e.g.
/// `CKSCAN_LOG=ckscan::orchestrator=debug,ckscan::analysis=warn`.
/// Falls back to `ckscan=info` when the variable is unset or invalid.
///
/// Idempotent. Leaves an already-installed global subscriber in place.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("CKSCAN_LOG").unwrap_or_else(|_| EnvFilter::new("ckscan=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("still alive");
    }
}
