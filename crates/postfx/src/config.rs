use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which programmable pipeline flavour to try when probing a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// OpenGL 2.0 when the context version allows it, otherwise ARB.
    #[default]
    Auto,
    Arb,
    Core,
}

/// Runtime knobs for the subsystem, usually read from the `[pipeline]` table
/// of a TOML config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub backend: BackendPreference,
    /// RGBA colour the window is cleared to before each frame.
    pub clear_color: [f32; 4],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("clear_color channel {index} is {value}, expected a value in [0, 1]")]
    ClearColor { index: usize, value: f32 },
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, &value) in self.clear_color.iter().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ClearColor { index, value });
            }
        }
        Ok(())
    }
}
