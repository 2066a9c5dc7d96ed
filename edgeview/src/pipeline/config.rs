use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::filter::CannyConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub canny: CannyConfig,
    /// RGBA in 0..=1, applied to the default framebuffer before each draw.
    pub clear_color: [f32; 4],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canny: CannyConfig::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.canny.validate()?;

        if self
            .clear_color
            .iter()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            return Err(Error::InvalidConfig(format!(
                "clear color components must lie in 0..=1, got {:?}",
                self.clear_color
            )));
        }

        Ok(())
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
