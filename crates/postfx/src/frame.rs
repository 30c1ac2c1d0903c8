use std::time::Instant;

use tracing::trace;

use crate::config::PipelineConfig;
use crate::gl::{ProgramScope, ProgrammablePipeline, ProjectionScope, TextureUnitScope};
use crate::program::ShaderProgram;
use crate::textures::SCENE_TEXTURE_UNIT;
use crate::types::Size;

/// The window side of a frame: an offscreen scene target plus the window it
/// is presented to.
pub trait DisplaySurface {
    /// Size of the window's drawable area.
    fn output_size(&self) -> Size;
    /// Size of the offscreen scene target.
    fn input_size(&self) -> Size;
    /// Renders the engine's scene into the offscreen target.
    fn compose_scene(&mut self);
    /// Binds the offscreen target as a 2D texture on the active unit.
    fn bind_scene_texture(&mut self);
    fn unbind_scene_texture(&mut self);
    /// Swaps the window buffers.
    fn present(&mut self);
}

/// Where a frame is in its sequence. Logged at trace level on each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    SceneComposed,
    ShaderBound,
    Drawn,
    Presented,
    Restored,
}

/// Outcome of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// 1-based index of the frame.
    pub frame: u64,
    /// False when the scene was drawn without a shader.
    pub shaded: bool,
}

/// Drives the per-frame sequence: compose, clear, bind, draw, present,
/// restore.
pub struct FrameRenderer {
    clear_color: [f32; 4],
    started: Instant,
    frames: u64,
    state: FrameState,
}

impl FrameRenderer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            clear_color: config.clear_color,
            started: Instant::now(),
            frames: 0,
            state: FrameState::Idle,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Milliseconds since the renderer was created, as `sol_time` receives
    /// them. Wraps after about 24 days.
    pub fn elapsed_millis(&self) -> i32 {
        (self.started.elapsed().as_millis() % (i32::MAX as u128 + 1)) as i32
    }

    fn advance(&mut self, state: FrameState) {
        trace!(frame = self.frames + 1, ?state, "frame state");
        self.state = state;
    }

    /// Renders one frame through `program`, or unshaded when there is no
    /// valid program.
    ///
    /// Program binding, projection matrix and active texture unit are left as
    /// they were found.
    pub fn render(
        &mut self,
        gl: &dyn ProgrammablePipeline,
        mut program: Option<&mut ShaderProgram>,
        display: &mut dyn DisplaySurface,
    ) -> FrameReport {
        gl.clear(self.clear_color);
        display.compose_scene();
        self.advance(FrameState::SceneComposed);

        let shaded = program.as_ref().is_some_and(|program| program.is_valid());
        {
            let _projection = ProjectionScope::push(gl);
            let bound = match &program {
                Some(program) if shaded => program.handle(),
                _ => 0,
            };
            let _program_scope = ProgramScope::bind(gl, bound);
            self.advance(FrameState::ShaderBound);

            if let Some(program) = program.as_deref_mut().filter(|_| shaded) {
                let output = display.output_size().as_vec2();
                let input = display.input_size().as_vec2();
                program.set_int("sol_time", self.elapsed_millis());
                program.set_vector2("sol_output_size", output[0], output[1]);
                program.set_vector2("sol_input_size", input[0], input[1]);
            }

            {
                let units = TextureUnitScope::select(gl, SCENE_TEXTURE_UNIT);
                display.bind_scene_texture();
                gl.draw_quad();
                display.unbind_scene_texture();

                if let Some(program) = program.as_deref().filter(|_| shaded) {
                    for (unit, texture) in program.textures().units() {
                        units.switch(unit);
                        gl.bind_texture(texture);
                    }
                }
            }
            self.advance(FrameState::Drawn);

            display.present();
            self.advance(FrameState::Presented);
        }
        self.advance(FrameState::Restored);

        self.frames += 1;
        self.state = FrameState::Idle;
        FrameReport {
            frame: self.frames,
            shaded,
        }
    }
}
