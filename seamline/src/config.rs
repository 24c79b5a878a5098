//! Engine configuration. Every field has a default so partial JSON objects
//! coming from the editor's settings panel load cleanly.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 96 dpi expressed in pixels per centimeter.
pub const DEFAULT_PX_PER_CM: f64 = 96.0 / 2.54;
pub const DEFAULT_CUBIC_SAMPLES: usize = 32;
pub const DEFAULT_SNAP_THRESHOLD_PX: f64 = 10.0;
pub const DEFAULT_MITER_LIMIT: f64 = 4.0;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub px_per_cm: f64,
    /// Fixed sample count used to flatten one cubic edge.
    pub cubic_samples: usize,
    pub snap_threshold_px: f64,
    /// Max miter extension as a multiple of the offset distance.
    pub miter_limit: f64,
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            px_per_cm: DEFAULT_PX_PER_CM,
            cubic_samples: DEFAULT_CUBIC_SAMPLES,
            snap_threshold_px: DEFAULT_SNAP_THRESHOLD_PX,
            miter_limit: DEFAULT_MITER_LIMIT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.px_per_cm.is_finite() || self.px_per_cm <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "pxPerCm",
                reason: "must be finite and positive",
            });
        }
        if self.cubic_samples == 0 {
            return Err(ConfigError::Invalid {
                field: "cubicSamples",
                reason: "must be at least 1",
            });
        }
        if !self.snap_threshold_px.is_finite() || self.snap_threshold_px < 0.0 {
            return Err(ConfigError::Invalid {
                field: "snapThresholdPx",
                reason: "must be finite and non-negative",
            });
        }
        if !self.miter_limit.is_finite() || self.miter_limit < 1.0 {
            return Err(ConfigError::Invalid {
                field: "miterLimit",
                reason: "must be finite and at least 1",
            });
        }
        Ok(())
    }
}
