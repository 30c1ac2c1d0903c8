//! A shader pack directory: `shader.toml` plus the two GLSL stage files it
//! names.
//!
//! Types:
//!
//! - `PackError` classifies manifest parsing, validation, and stage read
//!   failures.
//! - `LocalPack` stores the pack root and its parsed `ShaderPackManifest`.
//!
//! Functions:
//!
//! - `LocalPack::load` reads `shader.toml`, validates it, and returns a
//!   filesystem-backed handle.
//! - `LocalPack::read_sources` reads both stages into `postfx::ShaderData`.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use postfx::{ShaderData, StageKind};
use thiserror::Error;
use tracing::debug;

use crate::manifest::ShaderPackManifest;

pub const MANIFEST_FILE: &str = "shader.toml";

#[derive(Debug, Error)]
pub enum PackError {
    #[error("manifest not found at {0}")]
    ManifestMissing(PathBuf),

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    #[error("manifest validation failed: {}", .0.join("; "))]
    ManifestValidation(Vec<String>),

    #[error("failed to read {stage} stage {}: {source}", .path.display())]
    StageRead {
        stage: StageKind,
        path: PathBuf,
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct LocalPack {
    root: PathBuf,
    manifest: ShaderPackManifest,
}

impl LocalPack {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, PackError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(PackError::ManifestMissing(manifest_path));
        }

        let manifest_raw = fs::read_to_string(&manifest_path)?;
        let manifest: ShaderPackManifest = toml::from_str(&manifest_raw)?;
        let issues = manifest.validate();
        if !issues.is_empty() {
            return Err(PackError::ManifestValidation(issues));
        }

        debug!(path = %root.display(), "loaded shader pack manifest");
        Ok(Self { root, manifest })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn manifest(&self) -> &ShaderPackManifest {
        &self.manifest
    }

    /// Directory name of the pack, which is also its shader id.
    pub fn id(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Manifest `name`, falling back to the id.
    pub fn display_name(&self) -> String {
        self.manifest.name.clone().unwrap_or_else(|| self.id())
    }

    pub fn stage_path(&self, stage: StageKind) -> PathBuf {
        match stage {
            StageKind::Vertex => self.root.join(&self.manifest.vertex),
            StageKind::Fragment => self.root.join(&self.manifest.fragment),
        }
    }

    pub fn read_stage(&self, stage: StageKind) -> Result<String, PackError> {
        let path = self.stage_path(stage);
        fs::read_to_string(&path).map_err(|source| PackError::StageRead {
            stage,
            path,
            source,
        })
    }

    pub fn read_sources(&self) -> Result<ShaderData, PackError> {
        let vertex = self.read_stage(StageKind::Vertex)?;
        let fragment = self.read_stage(StageKind::Fragment)?;
        Ok(ShaderData::new(vertex, fragment).with_metadata(self.manifest.metadata()))
    }
}
