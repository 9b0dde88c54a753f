//! Run settings

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use estimators::KernelEstimator;
use serde::{Deserialize, Serialize};
use tracing::info;
use volume_features::{GradientConfig, GridConfig, HistogramConfig, KeypointConfig, VolumeGeometry};

use crate::PipelineError;

/// Environment variable prefix, e.g. `VOLUME_PIPELINE_GRID__X_CELLS=4`
pub const ENV_PREFIX: &str = "VOLUME_PIPELINE";

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Everything a pipeline run is configured with
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub volume: VolumeGeometry,
    pub grid: GridConfig,
    pub histogram: HistogramConfig,
    pub gradient: GradientConfig,
    pub keypoints: KeypointConfig,
    pub logging: LoggingSettings,
    /// Where kernel estimator diagnostics go; none when unset
    pub diagnostics_dir: Option<PathBuf>,
}

impl Settings {
    /// Load from an optional TOML file, overridden by `VOLUME_PIPELINE_*`
    /// environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self, PipelineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings: Self = builder.add_source(env).build()?.try_deserialize()?;

        settings.volume.validate()?;
        settings.grid.validate(&settings.volume)?;
        info!(
            dims = ?settings.volume.shape(),
            cells = settings.grid.cell_count(),
            file = ?path,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Kernel estimator writing diagnostics to `diagnostics_dir` if set
    pub fn kernel_estimator(&self) -> KernelEstimator {
        let mut estimator = KernelEstimator::new();
        estimator.set_save_path(self.diagnostics_dir.clone());
        estimator
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
