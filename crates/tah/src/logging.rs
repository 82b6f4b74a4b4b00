//! Tracing subscriber setup.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn setup_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry().with(filter);

    if settings.json_format {
        registry
            .with(fmt::layer().json().with_target(false).with_thread_ids(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_target(false))
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", settings.level);
    Ok(())
}
