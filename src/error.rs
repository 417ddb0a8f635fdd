use thiserror::Error;

/// Fatal setup failures. Everything else the engine runs into is recovered
/// locally and only counted (see `BindReport` and `TickReport`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("layout bounds must be positive and finite, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },
    #[error("invalid `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigurationError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
