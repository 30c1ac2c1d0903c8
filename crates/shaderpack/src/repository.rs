//! Resolves shader ids into packs by walking an ordered list of search roots,
//! and serves their sources to `postfx` programs.
//!
//! Types:
//!
//! - `ResolveError` separates ids that cannot name a pack, ids no root holds,
//!   and packs that exist but do not load.
//! - `PackEntry` is one id found while listing, with the directory that won.
//! - `ShaderRepository` stores the search roots and performs resolution.
//!
//! Functions:
//!
//! - `ShaderRepository::resolve` returns the first pack for an id.
//! - `ShaderRepository::list` enumerates every reachable pack id.
//! - `validate_id` rejects ids that are not a single path component.
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use postfx::{ShaderData, ShaderSourceProvider, SourceError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::pack::{LocalPack, PackError, MANIFEST_FILE};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("'{0}' is not a valid shader id; ids are a single directory name")]
    InvalidId(String),

    #[error("unable to locate shader pack '{id}'. searched roots: {roots:?}")]
    NotFound { id: String, roots: Vec<PathBuf> },

    #[error("shader pack '{id}' failed to load: {source}")]
    Pack {
        id: String,
        #[source]
        source: PackError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackEntry {
    pub id: String,
    pub dir: PathBuf,
}

pub fn validate_id(id: &str) -> Result<(), ResolveError> {
    let mut components = Path::new(id).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || id.contains(['/', '\\']) {
        return Err(ResolveError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ShaderRepository {
    roots: Vec<PathBuf>,
}

impl ShaderRepository {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn resolve(&self, id: &str) -> Result<LocalPack, ResolveError> {
        validate_id(id)?;
        debug!(shader = id, roots = ?self.roots, "resolving shader pack");
        for root in &self.roots {
            let candidate = root.join(id);
            if !candidate.join(MANIFEST_FILE).is_file() {
                continue;
            }
            debug!(candidate = %candidate.display(), "found shader pack");
            return LocalPack::load(&candidate).map_err(|source| {
                warn!(path = %candidate.display(), error = %source, "failed to load shader pack");
                ResolveError::Pack {
                    id: id.to_string(),
                    source,
                }
            });
        }

        warn!(shader = id, roots = ?self.roots, "shader pack missing");
        Err(ResolveError::NotFound {
            id: id.to_string(),
            roots: self.roots.clone(),
        })
    }

    /// Every pack reachable through the roots, sorted by id. When two roots
    /// hold the same id the earlier root wins, as in `resolve`.
    pub fn list(&self) -> Result<Vec<PackEntry>> {
        let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();
        for root in &self.roots {
            let entries = match fs::read_dir(root) {
                Ok(entries) => entries,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    debug!(root = %root.display(), "search root does not exist");
                    continue;
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to read shader root {}", root.display()))
                }
            };
            for entry in entries {
                let entry = entry
                    .with_context(|| format!("failed to read shader root {}", root.display()))?;
                let dir = entry.path();
                if !dir.join(MANIFEST_FILE).is_file() {
                    continue;
                }
                let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                    warn!(path = %dir.display(), "skipping shader pack with a non UTF-8 name");
                    continue;
                };
                found.entry(id).or_insert(dir);
            }
        }
        Ok(found
            .into_iter()
            .map(|(id, dir)| PackEntry { id, dir })
            .collect())
    }
}

impl ShaderSourceProvider for ShaderRepository {
    fn fetch(&self, shader_id: &str) -> Result<ShaderData, SourceError> {
        let pack = self.resolve(shader_id).map_err(|err| match err {
            ResolveError::InvalidId(_) | ResolveError::NotFound { .. } => {
                SourceError::NotFound(shader_id.to_string())
            }
            ResolveError::Pack { source, .. } => SourceError::Malformed {
                id: shader_id.to_string(),
                reason: source.to_string(),
            },
        })?;
        pack.read_sources().map_err(|err| SourceError::Malformed {
            id: shader_id.to_string(),
            reason: err.to_string(),
        })
    }
}
