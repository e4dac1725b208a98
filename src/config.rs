//! Embedding parameters and their environment overrides.

use std::env;

use crate::error::{Result, WatermarkError};
use crate::utils::convert::Channel;

/// Environment variable selecting the carrier channel.
pub const CHANNEL_ENV: &str = "DCTMARK_CHANNEL";
/// Environment variable holding the embedding strength.
pub const ALPHA_ENV: &str = "DCTMARK_ALPHA";

/// Default embedding strength. Truncation on reconstruction can move a selected
/// coefficient by up to 8, so stronger marks decode reliably.
pub const DEFAULT_ALPHA: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkConfig {
    pub channel: Channel,
    pub alpha: f64,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            channel: Channel::default(),
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl WatermarkConfig {
    pub fn new(channel: Channel, alpha: f64) -> Result<Self> {
        validate_alpha(alpha)?;
        Ok(Self { channel, alpha })
    }

    /// Reads `DCTMARK_CHANNEL` and `DCTMARK_ALPHA`, keeping defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`WatermarkConfig::from_env`], with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(channel) = lookup(CHANNEL_ENV) {
            config.channel = channel.parse()?;
        }
        if let Some(alpha) = lookup(ALPHA_ENV) {
            config.alpha = alpha.trim().parse().map_err(|e| {
                WatermarkError::InvalidConfig(format!("{ALPHA_ENV}='{alpha}': {e}"))
            })?;
            validate_alpha(config.alpha)?;
        }

        Ok(config)
    }
}

/// Alpha must be finite and non-negative.
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(WatermarkError::InvalidAlpha(alpha));
    }
    Ok(())
}
