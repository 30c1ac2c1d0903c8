use std::ffi::CString;

use super::ffi::{self, gl_functions, GLchar, GLenum, GLfloat, GLint, GLsizei, GLuint};
use super::fixed::{forward_fixed_functions, FixedFunctions};
use super::ProgrammablePipeline;
use crate::types::{Backend, GlHandle, Size, StageKind, UniformValue, MISSING_UNIFORM};

/// Lowest context version that exposes the shader entry points in core.
pub(crate) const MINIMUM_VERSION: (u32, u32) = (2, 0);

gl_functions! {
    pub(crate) struct CoreFunctions {
        attach_shader = "glAttachShader": fn(GLuint, GLuint);
        active_texture = "glActiveTexture": fn(GLenum);
        compile_shader = "glCompileShader": fn(GLuint);
        create_program = "glCreateProgram": fn() -> GLuint;
        create_shader = "glCreateShader": fn(GLenum) -> GLuint;
        delete_program = "glDeleteProgram": fn(GLuint);
        delete_shader = "glDeleteShader": fn(GLuint);
        get_program_info_log = "glGetProgramInfoLog": fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar);
        get_programiv = "glGetProgramiv": fn(GLuint, GLenum, *mut GLint);
        get_shader_info_log = "glGetShaderInfoLog": fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar);
        get_shaderiv = "glGetShaderiv": fn(GLuint, GLenum, *mut GLint);
        get_uniform_location = "glGetUniformLocation": fn(GLuint, *const GLchar) -> GLint;
        link_program = "glLinkProgram": fn(GLuint);
        shader_source = "glShaderSource": fn(GLuint, GLsizei, *const *const GLchar, *const GLint);
        uniform_1i = "glUniform1i": fn(GLint, GLint);
        uniform_1f = "glUniform1f": fn(GLint, GLfloat);
        uniform_2f = "glUniform2f": fn(GLint, GLfloat, GLfloat);
        uniform_3f = "glUniform3f": fn(GLint, GLfloat, GLfloat, GLfloat);
        uniform_4f = "glUniform4f": fn(GLint, GLfloat, GLfloat, GLfloat, GLfloat);
        use_program = "glUseProgram": fn(GLuint);
    }
}

/// Programmable pipeline driven through the OpenGL 2.0 core entry points.
pub(crate) struct CorePipeline {
    gl: CoreFunctions,
    fixed: FixedFunctions,
}

impl CorePipeline {
    pub(crate) fn new(gl: CoreFunctions, fixed: FixedFunctions) -> Self {
        Self { gl, fixed }
    }

    fn shader_parameter(&self, shader: GLuint, name: GLenum) -> GLint {
        let mut value: GLint = 0;
        // SAFETY: `value` outlives the call.
        unsafe { (self.gl.get_shaderiv)(shader, name, &mut value) };
        value
    }

    fn program_parameter(&self, program: GLuint, name: GLenum) -> GLint {
        let mut value: GLint = 0;
        // SAFETY: `value` outlives the call.
        unsafe { (self.gl.get_programiv)(program, name, &mut value) };
        value
    }
}

// SAFETY (whole impl): both tables were resolved against the context current
// on this thread; pointers handed to the driver outlive each call.
impl ProgrammablePipeline for CorePipeline {
    fn backend(&self) -> Backend {
        Backend::Core
    }

    fn create_stage(&self, kind: StageKind) -> GlHandle {
        let kind = match kind {
            StageKind::Vertex => ffi::VERTEX_SHADER,
            StageKind::Fragment => ffi::FRAGMENT_SHADER,
        };
        unsafe { (self.gl.create_shader)(kind) }
    }

    fn compile_stage(&self, stage: GlHandle, source: &str) -> Result<(), String> {
        let text = source.as_ptr().cast::<GLchar>();
        let length = source.len() as GLint;
        unsafe {
            (self.gl.shader_source)(stage, 1, &text, &length);
            (self.gl.compile_shader)(stage);
        }
        if self.shader_parameter(stage, ffi::COMPILE_STATUS) != 0 {
            return Ok(());
        }
        let length = self.shader_parameter(stage, ffi::INFO_LOG_LENGTH);
        Err(ffi::read_info_log(length, |capacity, written, buffer| unsafe {
            (self.gl.get_shader_info_log)(stage, capacity, written, buffer)
        }))
    }

    fn delete_stage(&self, stage: GlHandle) {
        unsafe { (self.gl.delete_shader)(stage) }
    }

    fn create_program(&self) -> GlHandle {
        unsafe { (self.gl.create_program)() }
    }

    fn attach_stage(&self, program: GlHandle, stage: GlHandle) {
        unsafe { (self.gl.attach_shader)(program, stage) }
    }

    fn link_program(&self, program: GlHandle) -> Result<(), String> {
        unsafe { (self.gl.link_program)(program) };
        if self.program_parameter(program, ffi::LINK_STATUS) != 0 {
            return Ok(());
        }
        let length = self.program_parameter(program, ffi::INFO_LOG_LENGTH);
        Err(ffi::read_info_log(length, |capacity, written, buffer| unsafe {
            (self.gl.get_program_info_log)(program, capacity, written, buffer)
        }))
    }

    fn delete_program(&self, program: GlHandle) {
        unsafe { (self.gl.delete_program)(program) }
    }

    fn current_program(&self) -> GlHandle {
        self.fixed.integer(ffi::CURRENT_PROGRAM).max(0) as GlHandle
    }

    fn use_program(&self, program: GlHandle) {
        unsafe { (self.gl.use_program)(program) }
    }

    fn uniform_location(&self, program: GlHandle, name: &str) -> i32 {
        let Ok(name) = CString::new(name) else {
            return MISSING_UNIFORM;
        };
        unsafe { (self.gl.get_uniform_location)(program, name.as_ptr()) }
    }

    fn set_uniform(&self, location: i32, value: UniformValue) {
        unsafe {
            match value {
                UniformValue::Bool(flag) => (self.gl.uniform_1i)(location, GLint::from(flag)),
                UniformValue::Int(v) => (self.gl.uniform_1i)(location, v),
                UniformValue::Float(v) => (self.gl.uniform_1f)(location, v),
                UniformValue::Vec2([x, y]) => (self.gl.uniform_2f)(location, x, y),
                UniformValue::Vec3([x, y, z]) => (self.gl.uniform_3f)(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => (self.gl.uniform_4f)(location, x, y, z, w),
            }
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { (self.gl.active_texture)(ffi::TEXTURE0 + unit) }
    }

    forward_fixed_functions!();
}
