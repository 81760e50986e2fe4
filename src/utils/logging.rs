use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::types::{Name, Regid};

/// Install the global fmt subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // a second call (tests, embedding hosts) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .try_init();
}

/// Emit captured contract console output with its dispatch prefix.
pub fn log_console(contract: Regid, action: Name, receiver: Regid, console: &str) {
    if console.is_empty() {
        return;
    }
    let prefix = format!("[({},{})->{}]", contract, action, receiver);
    info!("{}: CONSOLE OUTPUT BEGIN =====================", prefix);
    for line in console.lines() {
        info!("{}", line);
    }
    info!("{}: CONSOLE OUTPUT END   =====================", prefix);
}
