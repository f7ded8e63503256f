//==================================================
// File: logging.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Tracing setup for bridge binaries
// Objective: Offer a consistent subscriber configuration with a component label
//==================================================

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

static INIT: OnceLock<()> = OnceLock::new();

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "warn";

/// Initialize tracing with a component label. Later calls are no-ops.
pub fn init(component: &str) {
    INIT.get_or_init(|| {
        let filter = filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
        let _ = SubscriberBuilder::default()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
    tracing::debug!(component, "tracing initialised");
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn env_directives_override_the_default_level() {
        let filter = filter_from(Some("debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn unset_env_falls_back_to_warn() {
        assert_eq!(filter_from(None).max_level_hint(), Some(LevelFilter::WARN));
    }
}
