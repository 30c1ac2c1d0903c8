//! Driver surface for the programmable pipeline.
//!
//! Every component above this module talks to the GPU through
//! [`ProgrammablePipeline`] only:
//! - `arb` resolves the `GL_ARB_shader_objects` family of extension entry
//!   points (the legacy path).
//! - `gl20` resolves the OpenGL 2.0 equivalents (the newer path).
//! - `fixed` carries the GL 1.1 calls both paths share: projection matrix
//!   stack, immediate-mode quad, texture objects, and the error queue.
//!
//! The scope guards at the bottom save a piece of global pipeline state when
//! created and put it back when dropped, so callers never restore by hand.

mod arb;
mod ffi;
mod fixed;
mod gl20;

pub(crate) use self::arb::{ArbFunctions, ArbPipeline, REQUIRED_EXTENSIONS};
pub(crate) use self::ffi::Lookup;
pub(crate) use self::fixed::FixedFunctions;
pub(crate) use self::gl20::{CoreFunctions, CorePipeline, MINIMUM_VERSION};

use crate::types::{Backend, GlHandle, Size, StageKind, UniformValue};

/// The calls the shader subsystem needs from a programmable pipeline.
///
/// Implementations wrap resolved driver entry points; tests substitute a
/// recording fake. All calls must happen on the thread that owns the context.
pub trait ProgrammablePipeline {
    fn backend(&self) -> Backend;

    fn create_stage(&self, kind: StageKind) -> GlHandle;
    /// Submits source and compiles it, returning the driver log on failure.
    fn compile_stage(&self, stage: GlHandle, source: &str) -> Result<(), String>;
    fn delete_stage(&self, stage: GlHandle);

    fn create_program(&self) -> GlHandle;
    fn attach_stage(&self, program: GlHandle, stage: GlHandle);
    /// Links the program, returning the driver log on failure.
    fn link_program(&self, program: GlHandle) -> Result<(), String>;
    fn delete_program(&self, program: GlHandle);
    fn current_program(&self) -> GlHandle;
    fn use_program(&self, program: GlHandle);

    /// Location of `name` in `program`, or [`crate::MISSING_UNIFORM`].
    fn uniform_location(&self, program: GlHandle, name: &str) -> i32;
    /// Updates a uniform of the currently bound program.
    fn set_uniform(&self, location: i32, value: UniformValue);

    fn active_texture(&self, unit: u32);
    /// Creates a texture object with nearest filtering and edge clamping.
    fn create_texture(&self) -> GlHandle;
    /// Replaces the contents of `texture` with tightly packed RGBA bytes.
    fn upload_texture(&self, texture: GlHandle, size: Size, rgba: &[u8]);
    fn bind_texture(&self, texture: GlHandle);
    fn delete_texture(&self, texture: GlHandle);

    /// Pops one code off the driver error queue (0 when empty).
    fn take_error(&self) -> u32;
    fn clear(&self, color: [f32; 4]);
    /// Pushes the projection matrix and loads an identity orthographic one.
    fn push_projection(&self);
    fn pop_projection(&self);
    /// Draws the full-viewport quad with texture coordinates covering [0, 1].
    fn draw_quad(&self);

    /// Empties the error queue and returns the first code seen.
    fn drain_errors(&self) -> u32 {
        let first = self.take_error();
        if first != 0 {
            // The queue holds at most one code per error flag.
            for _ in 0..8 {
                if self.take_error() == 0 {
                    break;
                }
            }
        }
        first
    }
}

/// Binds a program for the lifetime of the guard and restores whatever
/// program was bound before.
pub struct ProgramScope<'a> {
    gl: &'a dyn ProgrammablePipeline,
    previous: GlHandle,
}

impl<'a> ProgramScope<'a> {
    pub fn bind(gl: &'a dyn ProgrammablePipeline, program: GlHandle) -> Self {
        let previous = gl.current_program();
        gl.use_program(program);
        Self { gl, previous }
    }

    pub fn previous(&self) -> GlHandle {
        self.previous
    }
}

impl Drop for ProgramScope<'_> {
    fn drop(&mut self) {
        self.gl.use_program(self.previous);
    }
}

/// Replaces the projection matrix with the full-screen orthographic one and
/// pops it back on drop.
pub struct ProjectionScope<'a> {
    gl: &'a dyn ProgrammablePipeline,
}

impl<'a> ProjectionScope<'a> {
    pub fn push(gl: &'a dyn ProgrammablePipeline) -> Self {
        gl.push_projection();
        Self { gl }
    }
}

impl Drop for ProjectionScope<'_> {
    fn drop(&mut self) {
        self.gl.pop_projection();
    }
}

/// Resets the active texture unit to 0 on drop.
pub struct TextureUnitScope<'a> {
    gl: &'a dyn ProgrammablePipeline,
}

impl<'a> TextureUnitScope<'a> {
    pub fn select(gl: &'a dyn ProgrammablePipeline, unit: u32) -> Self {
        gl.active_texture(unit);
        Self { gl }
    }

    pub fn switch(&self, unit: u32) {
        self.gl.active_texture(unit);
    }
}

impl Drop for TextureUnitScope<'_> {
    fn drop(&mut self) {
        self.gl.active_texture(0);
    }
}
