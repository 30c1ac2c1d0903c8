use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::SourceError;
use crate::types::ShaderData;

/// Supplies vertex and fragment sources, plus metadata, for a shader id.
///
/// Programs fetch on every load, so a provider that reads from disk picks up
/// edits on the next reload.
pub trait ShaderSourceProvider {
    fn fetch(&self, shader_id: &str) -> Result<ShaderData, SourceError>;
}

/// In-memory provider, for embedding built-in shaders and for tests.
///
/// Entries can be replaced through a shared reference so that a live edit can
/// be simulated while programs hold the provider.
#[derive(Debug, Default)]
pub struct StaticSources {
    shaders: RefCell<HashMap<String, ShaderData>>,
}

impl StaticSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `id`, returning the previous one.
    pub fn insert(&self, id: impl Into<String>, data: ShaderData) -> Option<ShaderData> {
        self.shaders.borrow_mut().insert(id.into(), data)
    }

    pub fn remove(&self, id: &str) -> Option<ShaderData> {
        self.shaders.borrow_mut().remove(id)
    }

    pub fn len(&self) -> usize {
        self.shaders.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.borrow().is_empty()
    }
}

impl ShaderSourceProvider for StaticSources {
    fn fetch(&self, shader_id: &str) -> Result<ShaderData, SourceError> {
        self.shaders
            .borrow()
            .get(shader_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(shader_id.to_string()))
    }
}
