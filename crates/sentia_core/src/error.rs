use thiserror::Error;

/// Hard configuration failures. Recoverable problems (missing keys,
/// inverted bounds, out-of-range baselines) are repaired instead and
/// reported through [`crate::ValidationReport`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("chemical '{chemical}' has a non-finite {field}")]
    NonFinite {
        chemical: String,
        field: &'static str,
    },

    #[error("interaction {from} -> {to} has a non-finite weight")]
    NonFiniteWeight { from: String, to: String },

    #[error("decision value for action '{action}' is not finite")]
    NonFiniteProbability { action: String },
}
