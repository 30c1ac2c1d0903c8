use std::ffi::CString;

use super::ffi::{self, gl_functions, GLchar, GLenum, GLfloat, GLhandleARB, GLint, GLsizei};
use super::fixed::{forward_fixed_functions, FixedFunctions};
use super::ProgrammablePipeline;
use crate::types::{Backend, GlHandle, Size, StageKind, UniformValue, MISSING_UNIFORM};

/// Extensions that must all be advertised before any ARB symbol is resolved.
pub(crate) const REQUIRED_EXTENSIONS: &[&str] = &[
    "GL_ARB_shader_objects",
    "GL_ARB_shading_language_100",
    "GL_ARB_vertex_shader",
    "GL_ARB_fragment_shader",
    "GL_ARB_multitexture",
];

gl_functions! {
    pub(crate) struct ArbFunctions {
        attach_object = "glAttachObjectARB": fn(GLhandleARB, GLhandleARB);
        active_texture = "glActiveTextureARB": fn(GLenum);
        compile_shader = "glCompileShaderARB": fn(GLhandleARB);
        create_program_object = "glCreateProgramObjectARB": fn() -> GLhandleARB;
        create_shader_object = "glCreateShaderObjectARB": fn(GLenum) -> GLhandleARB;
        delete_object = "glDeleteObjectARB": fn(GLhandleARB);
        get_info_log = "glGetInfoLogARB": fn(GLhandleARB, GLsizei, *mut GLsizei, *mut GLchar);
        get_object_parameteriv = "glGetObjectParameterivARB": fn(GLhandleARB, GLenum, *mut GLint);
        get_uniform_location = "glGetUniformLocationARB": fn(GLhandleARB, *const GLchar) -> GLint;
        link_program = "glLinkProgramARB": fn(GLhandleARB);
        shader_source = "glShaderSourceARB": fn(GLhandleARB, GLsizei, *const *const GLchar, *const GLint);
        uniform_1i = "glUniform1iARB": fn(GLint, GLint);
        uniform_1f = "glUniform1fARB": fn(GLint, GLfloat);
        uniform_2f = "glUniform2fARB": fn(GLint, GLfloat, GLfloat);
        uniform_3f = "glUniform3fARB": fn(GLint, GLfloat, GLfloat, GLfloat);
        uniform_4f = "glUniform4fARB": fn(GLint, GLfloat, GLfloat, GLfloat, GLfloat);
        use_program_object = "glUseProgramObjectARB": fn(GLhandleARB);
        get_handle = "glGetHandleARB": fn(GLenum) -> GLhandleARB;
    }
}

/// Programmable pipeline driven through `GL_ARB_shader_objects`.
pub(crate) struct ArbPipeline {
    arb: ArbFunctions,
    fixed: FixedFunctions,
}

impl ArbPipeline {
    pub(crate) fn new(arb: ArbFunctions, fixed: FixedFunctions) -> Self {
        Self { arb, fixed }
    }

    fn parameter(&self, object: GLhandleARB, name: GLenum) -> GLint {
        let mut value: GLint = 0;
        // SAFETY: `value` outlives the call.
        unsafe { (self.arb.get_object_parameteriv)(object, name, &mut value) };
        value
    }

    fn info_log(&self, object: GLhandleARB) -> String {
        let length = self.parameter(object, ffi::INFO_LOG_LENGTH);
        ffi::read_info_log(length, |capacity, written, buffer| {
            // SAFETY: `buffer` holds at least `capacity` bytes.
            unsafe { (self.arb.get_info_log)(object, capacity, written, buffer) }
        })
    }
}

// SAFETY (whole impl): both tables were resolved against the context current
// on this thread; pointers handed to the driver outlive each call.
impl ProgrammablePipeline for ArbPipeline {
    fn backend(&self) -> Backend {
        Backend::Arb
    }

    fn create_stage(&self, kind: StageKind) -> GlHandle {
        let kind = match kind {
            StageKind::Vertex => ffi::VERTEX_SHADER,
            StageKind::Fragment => ffi::FRAGMENT_SHADER,
        };
        unsafe { (self.arb.create_shader_object)(kind) }
    }

    fn compile_stage(&self, stage: GlHandle, source: &str) -> Result<(), String> {
        let text = source.as_ptr().cast::<GLchar>();
        let length = source.len() as GLint;
        unsafe {
            (self.arb.shader_source)(stage, 1, &text, &length);
            (self.arb.compile_shader)(stage);
        }
        if self.parameter(stage, ffi::COMPILE_STATUS) == 0 {
            return Err(self.info_log(stage));
        }
        Ok(())
    }

    fn delete_stage(&self, stage: GlHandle) {
        unsafe { (self.arb.delete_object)(stage) }
    }

    fn create_program(&self) -> GlHandle {
        unsafe { (self.arb.create_program_object)() }
    }

    fn attach_stage(&self, program: GlHandle, stage: GlHandle) {
        unsafe { (self.arb.attach_object)(program, stage) }
    }

    fn link_program(&self, program: GlHandle) -> Result<(), String> {
        unsafe { (self.arb.link_program)(program) };
        if self.parameter(program, ffi::LINK_STATUS) == 0 {
            return Err(self.info_log(program));
        }
        Ok(())
    }

    fn delete_program(&self, program: GlHandle) {
        unsafe { (self.arb.delete_object)(program) }
    }

    fn current_program(&self) -> GlHandle {
        unsafe { (self.arb.get_handle)(ffi::PROGRAM_OBJECT_ARB) }
    }

    fn use_program(&self, program: GlHandle) {
        unsafe { (self.arb.use_program_object)(program) }
    }

    fn uniform_location(&self, program: GlHandle, name: &str) -> i32 {
        let Ok(name) = CString::new(name) else {
            return MISSING_UNIFORM;
        };
        unsafe { (self.arb.get_uniform_location)(program, name.as_ptr()) }
    }

    fn set_uniform(&self, location: i32, value: UniformValue) {
        unsafe {
            match value {
                UniformValue::Bool(flag) => (self.arb.uniform_1i)(location, GLint::from(flag)),
                UniformValue::Int(v) => (self.arb.uniform_1i)(location, v),
                UniformValue::Float(v) => (self.arb.uniform_1f)(location, v),
                UniformValue::Vec2([x, y]) => (self.arb.uniform_2f)(location, x, y),
                UniformValue::Vec3([x, y, z]) => (self.arb.uniform_3f)(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => (self.arb.uniform_4f)(location, x, y, z, w),
            }
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { (self.arb.active_texture)(ffi::TEXTURE0 + unit) }
    }

    forward_fixed_functions!();
}
