use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::encode::OpacityConfig;
use crate::error::ConfigurationError;
use crate::frame::EncodingConfig;
use crate::physics::SimulationConfig;
use crate::viewport::ViewportConfig;

/// Everything tunable from a JSON config file. Missing sections and fields
/// fall back to their defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub viewport: ViewportConfig,
    pub encoding: EncodingConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.simulation.validate()?;
        self.viewport.validate()?;
        validate_opacity(&self.encoding.opacity)
    }
}

fn validate_opacity(opacity: &OpacityConfig) -> Result<(), ConfigurationError> {
    if !(0.0..=1.0).contains(&opacity.min_opacity) {
        return Err(ConfigurationError::parameter(
            "min_opacity",
            format!("expected a value in [0, 1], got {}", opacity.min_opacity),
        ));
    }
    if !(opacity.min_opacity..=1.0).contains(&opacity.max_opacity) {
        return Err(ConfigurationError::parameter(
            "max_opacity",
            format!(
                "expected a value in [min_opacity, 1], got {}",
                opacity.max_opacity
            ),
        ));
    }
    if !(opacity.exponent.is_finite() && opacity.exponent > 0.0) {
        return Err(ConfigurationError::parameter(
            "exponent",
            format!("expected a finite positive value, got {}", opacity.exponent),
        ));
    }
    Ok(())
}
