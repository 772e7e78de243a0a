//! Editor configuration.
//!
//! Every section has defaults, so a config document only needs the values
//! it changes:
//!
//! ```json
//! { "overlap": "strict", "viewport": { "max_scale": 4.0 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::edges::EdgeStyle;
use crate::error::ConfigError;
use crate::layout::RadialLayoutConfig;
use crate::selection::ToolbarConfig;
use crate::spans::OverlapPolicy;
use crate::viewport::ViewportConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether interactively created annotations may overlap.
    pub overlap: OverlapPolicy,
    pub layout: RadialLayoutConfig,
    pub viewport: ViewportConfig,
    pub toolbar: ToolbarConfig,
    pub edges: EdgeStyle,
}

impl EditorConfig {
    /// Parse and [`validate`](Self::validate) a config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the zoom and fit maths cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let viewport = &self.viewport;
        if !is_positive(viewport.zoom_factor) {
            return Err(invalid("viewport.zoom_factor", "must be positive"));
        }
        if !is_positive(viewport.min_scale) {
            return Err(invalid("viewport.min_scale", "must be positive"));
        }
        if viewport.min_scale > viewport.max_scale {
            return Err(invalid("viewport.max_scale", "must not be below min_scale"));
        }
        let layout = &self.layout;
        if !is_positive(layout.min_fit_scale) {
            return Err(invalid("layout.min_fit_scale", "must be positive"));
        }
        if layout.min_fit_scale > layout.max_fit_scale {
            return Err(invalid("layout.max_fit_scale", "must not be below min_fit_scale"));
        }
        Ok(())
    }
}

// NaN is not positive
fn is_positive(value: f32) -> bool {
    value > 0.0
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
