//! Logging initialisation

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::settings::LoggingSettings;
use crate::PipelineError;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `settings.level`. Returns `false` when a
/// subscriber was already installed, which leaves the existing one in place.
pub fn init_logging(settings: &LoggingSettings) -> Result<bool, PipelineError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .map_err(|e| PipelineError::Logging(format!("bad level {:?}: {e}", settings.level)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if settings.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        debug!(level = %settings.level, json = settings.json, "logging initialised");
    }
    Ok(installed)
}
