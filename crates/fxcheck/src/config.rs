use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use postfx::PipelineConfig;
use serde::Deserialize;
use tracing::debug;

/// Contents of `fxcheck.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub roots: Vec<PathBuf>,
    pub pipeline: PipelineConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!(path = %path.display(), roots = config.roots.len(), "loaded config");
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.pipeline.validate()?;
        Ok(config)
    }
}
