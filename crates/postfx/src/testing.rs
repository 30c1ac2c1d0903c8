//! Recording fakes for the driver and the display, plus a few GLSL sources the
//! tests share.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::frame::DisplaySurface;
use crate::gl::ProgrammablePipeline;
use crate::source::StaticSources;
use crate::types::{Backend, GlHandle, ShaderData, Size, StageKind, UniformValue, MISSING_UNIFORM};

pub(crate) const GL_INVALID_OPERATION: u32 = 0x0502;

/// Value the fake reports for the full-screen orthographic projection.
pub(crate) const ORTHO_PROJECTION: u32 = u32::MAX;

pub(crate) const VERTEX_SOURCE: &str = r"#version 110
void main() {
    gl_Position = gl_ModelViewProjectionMatrix * gl_Vertex;
    gl_TexCoord[0] = gl_MultiTexCoord0;
}
";

pub(crate) const SEPIA_FRAGMENT: &str = r"#version 110
uniform sampler2D sol_texture;
uniform int sol_time;
uniform vec2 sol_output_size;
uniform vec2 sol_input_size;
uniform float strength;
void main() {
    vec4 color = texture2D(sol_texture, gl_TexCoord[0].st);
    float grey = dot(color.rgb, vec3(0.299, 0.587, 0.114));
    gl_FragColor = vec4(mix(color.rgb, grey * vec3(1.2, 1.0, 0.8), strength), color.a);
}
";

pub(crate) const OVERLAY_FRAGMENT: &str = r"#version 110
uniform sampler2D sol_texture;
uniform sampler2D overlay;
uniform sampler2D mask;
uniform sampler2D noise;
void main() {
    vec4 scene = texture2D(sol_texture, gl_TexCoord[0].st);
    vec4 top = texture2D(overlay, gl_TexCoord[0].st) * texture2D(mask, gl_TexCoord[0].st).a;
    gl_FragColor = mix(scene, top, top.a) + texture2D(noise, gl_TexCoord[0].st) * 0.05;
}
";

pub(crate) const BROKEN_FRAGMENT: &str = r"#version 110
uniform sampler2D sol_texture;
void main() {
    gl_FragColor = texture2D(sol_texture, gl_TexCoord[0].st;
}
";

/// Sources keyed by the ids the tests use: `sepia`, `overlay`, `broken`.
pub(crate) fn library() -> Rc<StaticSources> {
    let sources = StaticSources::new();
    sources.insert("sepia", ShaderData::new(VERTEX_SOURCE, SEPIA_FRAGMENT));
    sources.insert("overlay", ShaderData::new(VERTEX_SOURCE, OVERLAY_FRAGMENT));
    sources.insert("broken", ShaderData::new(VERTEX_SOURCE, BROKEN_FRAGMENT));
    Rc::new(sources)
}

struct MockStage {
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct MockProgram {
    stages: Vec<GlHandle>,
    linked: bool,
    uniforms: Vec<String>,
    values: HashMap<i32, UniformValue>,
}

struct MockTexture {
    size: Size,
    pixels: Vec<u8>,
    uploads: usize,
}

#[derive(Default)]
struct MockState {
    next_handle: GlHandle,
    stages: HashMap<GlHandle, MockStage>,
    programs: HashMap<GlHandle, MockProgram>,
    textures: HashMap<GlHandle, MockTexture>,
    deleted: Vec<GlHandle>,
    invalid_deletes: usize,
    current_program: GlHandle,
    active_unit: u32,
    unit_bindings: HashMap<u32, GlHandle>,
    projection: u32,
    projection_stack: Vec<u32>,
    errors: VecDeque<u32>,
    location_queries: usize,
    draws: Vec<GlHandle>,
    clears: usize,
    uniform_failure: Option<u32>,
}

impl MockState {
    fn allocate(&mut self) -> GlHandle {
        self.next_handle += 1;
        self.next_handle
    }
}

/// In-memory driver that follows GL's object and binding rules closely
/// enough for the subsystem's bookkeeping to be checked.
///
/// A stage compiles when its parentheses and braces balance and it declares
/// `main`; a program fails to link when a stage contains
/// `#pragma mock_link_failure`. Uniform locations are assigned at link time
/// from `uniform <type> <name>;` declarations.
pub(crate) struct MockGl {
    backend: Backend,
    state: RefCell<MockState>,
}

impl MockGl {
    pub(crate) fn new() -> Self {
        Self::with_backend(Backend::Arb)
    }

    pub(crate) fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            state: RefCell::new(MockState::default()),
        }
    }

    pub(crate) fn active_unit(&self) -> u32 {
        self.state.borrow().active_unit
    }

    pub(crate) fn bound_texture(&self, unit: u32) -> GlHandle {
        self.state
            .borrow()
            .unit_bindings
            .get(&unit)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn projection_depth(&self) -> usize {
        self.state.borrow().projection_stack.len()
    }

    pub(crate) fn projection_matrix(&self) -> u32 {
        self.state.borrow().projection
    }

    pub(crate) fn set_projection_matrix(&self, tag: u32) {
        self.state.borrow_mut().projection = tag;
    }

    pub(crate) fn push_error(&self, code: u32) {
        self.state.borrow_mut().errors.push_back(code);
    }

    /// Makes every later uniform update raise `code` instead of storing.
    pub(crate) fn fail_uniform_updates(&self, code: u32) {
        self.state.borrow_mut().uniform_failure = Some(code);
    }

    pub(crate) fn location_queries(&self) -> usize {
        self.state.borrow().location_queries
    }

    pub(crate) fn is_deleted(&self, handle: GlHandle) -> bool {
        self.state.borrow().deleted.contains(&handle)
    }

    pub(crate) fn invalid_deletes(&self) -> usize {
        self.state.borrow().invalid_deletes
    }

    /// Stages, programs and textures created and not yet deleted.
    pub(crate) fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.stages.len() + state.programs.len() + state.textures.len()
    }

    pub(crate) fn uniform_value(&self, program: GlHandle, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let location = program.uniforms.iter().position(|n| n == name)? as i32;
        program.values.get(&location).copied()
    }

    pub(crate) fn texture_pixels(&self, texture: GlHandle) -> Option<(Size, Vec<u8>)> {
        let state = self.state.borrow();
        state
            .textures
            .get(&texture)
            .map(|texture| (texture.size, texture.pixels.clone()))
    }

    pub(crate) fn texture_uploads(&self, texture: GlHandle) -> usize {
        self.state
            .borrow()
            .textures
            .get(&texture)
            .map_or(0, |texture| texture.uploads)
    }

    /// Program bound at each quad draw, in order.
    pub(crate) fn draws(&self) -> Vec<GlHandle> {
        self.state.borrow().draws.clone()
    }

    pub(crate) fn clears(&self) -> usize {
        self.state.borrow().clears
    }

    fn delete(&self, handle: GlHandle, kind: &str) {
        if handle == 0 {
            return;
        }
        let mut state = self.state.borrow_mut();
        let removed = match kind {
            "stage" => state.stages.remove(&handle).is_some(),
            "program" => state.programs.remove(&handle).is_some(),
            _ => state.textures.remove(&handle).is_some(),
        };
        if removed {
            state.deleted.push(handle);
        } else {
            state.invalid_deletes += 1;
        }
    }
}

fn compiles(source: &str) -> Result<(), String> {
    let mut parens = 0i32;
    let mut braces = 0i32;
    for (line_index, line) in source.lines().enumerate() {
        for ch in line.chars() {
            match ch {
                '(' => parens += 1,
                ')' => parens -= 1,
                '{' => braces += 1,
                '}' => braces -= 1,
                _ => {}
            }
            if parens < 0 || braces < 0 {
                return Err(format!("0:{}(1): error: syntax error, unexpected '{ch}'", line_index + 1));
            }
        }
        if parens != 0 && line.trim_end().ends_with(';') {
            return Err(format!(
                "0:{}(1): error: syntax error, unexpected ';', expecting ')'",
                line_index + 1
            ));
        }
    }
    if parens != 0 || braces != 0 {
        return Err("0:1(1): error: syntax error, unexpected end of file".to_string());
    }
    if !source.contains("void main") {
        return Err("0:1(1): error: function `main' is not defined".to_string());
    }
    Ok(())
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let mut tokens = line.trim().strip_prefix("uniform ")?.split_whitespace();
        let _ty = tokens.next()?;
        let name = tokens.next()?.trim_end_matches(';');
        Some(name.split('[').next().unwrap_or(name).to_string())
    })
}

impl ProgrammablePipeline for MockGl {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn create_stage(&self, _kind: StageKind) -> GlHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.stages.insert(
            handle,
            MockStage {
                source: String::new(),
                compiled: false,
            },
        );
        handle
    }

    fn compile_stage(&self, stage: GlHandle, source: &str) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.stages.get_mut(&stage) else {
            return Err("invalid shader object".to_string());
        };
        entry.source = source.to_string();
        let result = compiles(source);
        entry.compiled = result.is_ok();
        result
    }

    fn delete_stage(&self, stage: GlHandle) {
        self.delete(stage, "stage");
    }

    fn create_program(&self) -> GlHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.programs.insert(handle, MockProgram::default());
        handle
    }

    fn attach_stage(&self, program: GlHandle, stage: GlHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(program) = state.programs.get_mut(&program) {
            program.stages.push(stage);
        }
    }

    fn link_program(&self, program: GlHandle) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let stages: Vec<(bool, String)> = match state.programs.get(&program) {
            Some(entry) => entry
                .stages
                .iter()
                .filter_map(|stage| state.stages.get(stage))
                .map(|stage| (stage.compiled, stage.source.clone()))
                .collect(),
            None => return Err("invalid program object".to_string()),
        };

        let failure = if stages.len() != 2 || stages.iter().any(|(compiled, _)| !compiled) {
            Some("error: linking with uncompiled shader".to_string())
        } else if stages
            .iter()
            .any(|(_, source)| source.contains("#pragma mock_link_failure"))
        {
            Some("error: fragment shader varying v_uv not written by vertex shader".to_string())
        } else {
            None
        };

        let mut uniforms: Vec<String> = Vec::new();
        for (_, source) in &stages {
            for name in declared_uniforms(source) {
                if !uniforms.contains(&name) {
                    uniforms.push(name);
                }
            }
        }

        let entry = state.programs.get_mut(&program).expect("program checked above");
        entry.values.clear();
        match failure {
            Some(log) => {
                entry.linked = false;
                entry.uniforms.clear();
                Err(log)
            }
            None => {
                entry.linked = true;
                entry.uniforms = uniforms;
                Ok(())
            }
        }
    }

    fn delete_program(&self, program: GlHandle) {
        self.delete(program, "program");
    }

    fn current_program(&self) -> GlHandle {
        self.state.borrow().current_program
    }

    fn use_program(&self, program: GlHandle) {
        self.state.borrow_mut().current_program = program;
    }

    fn uniform_location(&self, program: GlHandle, name: &str) -> i32 {
        let mut state = self.state.borrow_mut();
        state.location_queries += 1;
        state
            .programs
            .get(&program)
            .filter(|program| program.linked)
            .and_then(|program| program.uniforms.iter().position(|n| n == name))
            .map_or(MISSING_UNIFORM, |index| index as i32)
    }

    fn set_uniform(&self, location: i32, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.uniform_failure {
            state.errors.push_back(code);
            return;
        }
        let current = state.current_program;
        let valid = state
            .programs
            .get(&current)
            .is_some_and(|program| program.linked && (location as usize) < program.uniforms.len())
            && location >= 0;
        if !valid {
            state.errors.push_back(GL_INVALID_OPERATION);
            return;
        }
        if let Some(program) = state.programs.get_mut(&current) {
            program.values.insert(location, value);
        }
    }

    fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
    }

    fn create_texture(&self) -> GlHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.textures.insert(
            handle,
            MockTexture {
                size: Size::default(),
                pixels: Vec::new(),
                uploads: 0,
            },
        );
        handle
    }

    fn upload_texture(&self, texture: GlHandle, size: Size, rgba: &[u8]) {
        let mut state = self.state.borrow_mut();
        match state.textures.get_mut(&texture) {
            Some(entry) => {
                entry.size = size;
                entry.pixels = rgba.to_vec();
                entry.uploads += 1;
            }
            None => state.errors.push_back(GL_INVALID_OPERATION),
        }
    }

    fn bind_texture(&self, texture: GlHandle) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        state.unit_bindings.insert(unit, texture);
    }

    fn delete_texture(&self, texture: GlHandle) {
        self.delete(texture, "texture");
    }

    fn take_error(&self) -> u32 {
        self.state.borrow_mut().errors.pop_front().unwrap_or(0)
    }

    fn clear(&self, _color: [f32; 4]) {
        self.state.borrow_mut().clears += 1;
    }

    fn push_projection(&self) {
        let mut state = self.state.borrow_mut();
        let current = state.projection;
        state.projection_stack.push(current);
        state.projection = ORTHO_PROJECTION;
    }

    fn pop_projection(&self) {
        let mut state = self.state.borrow_mut();
        match state.projection_stack.pop() {
            Some(previous) => state.projection = previous,
            None => state.errors.push_back(GL_INVALID_OPERATION),
        }
    }

    fn draw_quad(&self) {
        let mut state = self.state.borrow_mut();
        let current = state.current_program;
        state.draws.push(current);
    }
}

/// Display fake that records the order of collaborator calls.
pub(crate) struct MockDisplay {
    pub output: Size,
    pub input: Size,
    pub events: Vec<&'static str>,
}

impl MockDisplay {
    pub(crate) fn new(output: Size, input: Size) -> Self {
        Self {
            output,
            input,
            events: Vec::new(),
        }
    }

    pub(crate) fn presents(&self) -> usize {
        self.events.iter().filter(|event| **event == "present").count()
    }
}

impl DisplaySurface for MockDisplay {
    fn output_size(&self) -> Size {
        self.output
    }

    fn input_size(&self) -> Size {
        self.input
    }

    fn compose_scene(&mut self) {
        self.events.push("compose");
    }

    fn bind_scene_texture(&mut self) {
        self.events.push("bind_scene");
    }

    fn unbind_scene_texture(&mut self) {
        self.events.push("unbind_scene");
    }

    fn present(&mut self) {
        self.events.push("present");
    }
}
