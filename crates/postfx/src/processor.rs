use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::info;

use crate::config::PipelineConfig;
use crate::frame::{DisplaySurface, FrameRenderer, FrameReport};
use crate::program::ShaderProgram;
use crate::resolver::Capability;
use crate::source::ShaderSourceProvider;

/// Programs loaded on one context, at most one of them active.
///
/// Programs stay loaded when another is activated, so switching back does not
/// recompile. Each can be reloaded on its own.
pub struct PostProcessor {
    capability: Capability,
    provider: Rc<dyn ShaderSourceProvider>,
    programs: BTreeMap<String, ShaderProgram>,
    active: Option<String>,
    frames: FrameRenderer,
}

impl PostProcessor {
    pub fn new(
        capability: Capability,
        provider: Rc<dyn ShaderSourceProvider>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            capability,
            provider,
            programs: BTreeMap::new(),
            active: None,
            frames: FrameRenderer::new(config),
        }
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    pub fn frames(&self) -> &FrameRenderer {
        &self.frames
    }

    /// Loads `id` unless already loaded and makes it the active program.
    pub fn activate(&mut self, id: &str) -> &mut ShaderProgram {
        let capability = &self.capability;
        let provider = &self.provider;
        let program = self
            .programs
            .entry(id.to_string())
            .or_insert_with(|| capability.create_program(id, Rc::clone(provider)));
        info!(shader = id, valid = program.is_valid(), "shader activated");
        self.active = Some(id.to_string());
        program
    }

    /// Renders subsequent frames unshaded. Loaded programs are kept.
    pub fn deactivate(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<&ShaderProgram> {
        self.active.as_deref().and_then(|id| self.programs.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut ShaderProgram> {
        self.active.as_deref().and_then(|id| self.programs.get_mut(id))
    }

    pub fn program(&self, id: &str) -> Option<&ShaderProgram> {
        self.programs.get(id)
    }

    pub fn loaded(&self) -> impl Iterator<Item = &str> + '_ {
        self.programs.keys().map(String::as_str)
    }

    /// Reloads `id` from the provider; false when it was never loaded.
    pub fn reload(&mut self, id: &str) -> bool {
        match self.programs.get_mut(id) {
            Some(program) => {
                program.reload();
                true
            }
            None => false,
        }
    }

    pub fn reload_all(&mut self) {
        for program in self.programs.values_mut() {
            program.reload();
        }
    }

    /// Drops `id` and its driver objects, deactivating it if needed.
    pub fn unload(&mut self, id: &str) -> bool {
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        self.programs.remove(id).is_some()
    }

    pub fn render(&mut self, display: &mut dyn DisplaySurface) -> FrameReport {
        let gl = Rc::clone(self.capability.pipeline());
        let program = self
            .active
            .as_deref()
            .and_then(|id| self.programs.get_mut(id));
        self.frames.render(&*gl, program, display)
    }
}
