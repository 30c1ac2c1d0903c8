//! GL 1.1 entry points used by both backends: the projection matrix stack,
//! immediate-mode quad drawing, texture objects, and the error queue.

use std::os::raw::c_void;

use super::ffi::{
    self, gl_functions, GLbitfield, GLdouble, GLenum, GLfloat, GLint, GLsizei, GLuint,
};
use crate::types::{GlHandle, Size};

gl_functions! {
    pub(crate) struct FixedFunctions {
        get_error = "glGetError": fn() -> GLenum;
        get_integerv = "glGetIntegerv": fn(GLenum, *mut GLint);
        clear_color = "glClearColor": fn(GLfloat, GLfloat, GLfloat, GLfloat);
        clear = "glClear": fn(GLbitfield);
        matrix_mode = "glMatrixMode": fn(GLenum);
        push_matrix = "glPushMatrix": fn();
        pop_matrix = "glPopMatrix": fn();
        load_identity = "glLoadIdentity": fn();
        ortho = "glOrtho": fn(GLdouble, GLdouble, GLdouble, GLdouble, GLdouble, GLdouble);
        begin = "glBegin": fn(GLenum);
        end = "glEnd": fn();
        tex_coord_2f = "glTexCoord2f": fn(GLfloat, GLfloat);
        vertex_3f = "glVertex3f": fn(GLfloat, GLfloat, GLfloat);
        gen_textures = "glGenTextures": fn(GLsizei, *mut GLuint);
        delete_textures = "glDeleteTextures": fn(GLsizei, *const GLuint);
        bind_texture = "glBindTexture": fn(GLenum, GLuint);
        tex_parameteri = "glTexParameteri": fn(GLenum, GLenum, GLint);
        tex_image_2d = "glTexImage2D": fn(GLenum, GLint, GLint, GLsizei, GLsizei, GLint, GLenum, GLenum, *const c_void);
        pixel_storei = "glPixelStorei": fn(GLenum, GLint);
    }
}

/// Corners of the full-viewport quad: texture coordinate, then position.
const QUAD: [([f32; 2], [f32; 3]); 4] = [
    ([0.0, 0.0], [-1.0, 1.0, 0.0]),
    ([1.0, 0.0], [1.0, 1.0, 0.0]),
    ([1.0, 1.0], [1.0, -1.0, 0.0]),
    ([0.0, 1.0], [-1.0, -1.0, 0.0]),
];

// SAFETY (whole impl): the table was fully resolved against the context that
// is current on this thread, and every call passes values or pointers that
// outlive the call.
impl FixedFunctions {
    pub(crate) fn take_error(&self) -> u32 {
        unsafe { (self.get_error)() }
    }

    pub(crate) fn integer(&self, parameter: GLenum) -> GLint {
        let mut value: GLint = 0;
        unsafe { (self.get_integerv)(parameter, &mut value) };
        value
    }

    pub(crate) fn clear_window(&self, color: [f32; 4]) {
        unsafe {
            (self.clear_color)(color[0], color[1], color[2], color[3]);
            (self.clear)(ffi::COLOR_BUFFER_BIT | ffi::DEPTH_BUFFER_BIT);
        }
    }

    pub(crate) fn push_projection(&self) {
        unsafe {
            (self.matrix_mode)(ffi::PROJECTION);
            (self.push_matrix)();
            (self.load_identity)();
            (self.ortho)(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0);
            (self.matrix_mode)(ffi::MODELVIEW);
        }
    }

    pub(crate) fn pop_projection(&self) {
        unsafe {
            (self.matrix_mode)(ffi::PROJECTION);
            (self.pop_matrix)();
            (self.matrix_mode)(ffi::MODELVIEW);
        }
    }

    pub(crate) fn draw_quad(&self) {
        unsafe {
            (self.begin)(ffi::QUADS);
            for ([u, v], [x, y, z]) in QUAD {
                (self.tex_coord_2f)(u, v);
                (self.vertex_3f)(x, y, z);
            }
            (self.end)();
        }
    }

    pub(crate) fn create_texture(&self) -> GlHandle {
        let mut handle: GLuint = 0;
        unsafe {
            (self.gen_textures)(1, &mut handle);
            (self.bind_texture)(ffi::TEXTURE_2D, handle);
            (self.tex_parameteri)(ffi::TEXTURE_2D, ffi::TEXTURE_MAG_FILTER, ffi::NEAREST);
            (self.tex_parameteri)(ffi::TEXTURE_2D, ffi::TEXTURE_MIN_FILTER, ffi::NEAREST);
            (self.tex_parameteri)(ffi::TEXTURE_2D, ffi::TEXTURE_WRAP_S, ffi::CLAMP_TO_EDGE);
            (self.tex_parameteri)(ffi::TEXTURE_2D, ffi::TEXTURE_WRAP_T, ffi::CLAMP_TO_EDGE);
            (self.bind_texture)(ffi::TEXTURE_2D, 0);
        }
        handle
    }

    pub(crate) fn upload_texture(&self, texture: GlHandle, size: Size, rgba: &[u8]) {
        debug_assert_eq!(rgba.len(), size.area() * 4);
        unsafe {
            (self.pixel_storei)(ffi::UNPACK_ALIGNMENT, 1);
            (self.pixel_storei)(ffi::UNPACK_ROW_LENGTH, 0);
            (self.pixel_storei)(ffi::UNPACK_SKIP_PIXELS, 0);
            (self.pixel_storei)(ffi::UNPACK_SKIP_ROWS, 0);
            (self.bind_texture)(ffi::TEXTURE_2D, texture);
            (self.tex_image_2d)(
                ffi::TEXTURE_2D,
                0,
                ffi::RGBA8,
                size.width as GLsizei,
                size.height as GLsizei,
                0,
                ffi::RGBA,
                ffi::UNSIGNED_BYTE,
                rgba.as_ptr().cast::<c_void>(),
            );
            (self.bind_texture)(ffi::TEXTURE_2D, 0);
        }
    }

    pub(crate) fn bind_texture_2d(&self, texture: GlHandle) {
        unsafe { (self.bind_texture)(ffi::TEXTURE_2D, texture) }
    }

    pub(crate) fn delete_texture(&self, texture: GlHandle) {
        unsafe { (self.delete_textures)(1, &texture) }
    }
}

/// Expands to the [`super::ProgrammablePipeline`] methods that forward to a
/// `fixed: FixedFunctions` field.
macro_rules! forward_fixed_functions {
    () => {
        fn create_texture(&self) -> GlHandle {
            self.fixed.create_texture()
        }

        fn upload_texture(&self, texture: GlHandle, size: Size, rgba: &[u8]) {
            self.fixed.upload_texture(texture, size, rgba)
        }

        fn bind_texture(&self, texture: GlHandle) {
            self.fixed.bind_texture_2d(texture)
        }

        fn delete_texture(&self, texture: GlHandle) {
            self.fixed.delete_texture(texture)
        }

        fn take_error(&self) -> u32 {
            self.fixed.take_error()
        }

        fn clear(&self, color: [f32; 4]) {
            self.fixed.clear_window(color)
        }

        fn push_projection(&self) {
            self.fixed.push_projection()
        }

        fn pop_projection(&self) {
            self.fixed.pop_projection()
        }

        fn draw_quad(&self) {
            self.fixed.draw_quad()
        }
    };
}

pub(crate) use forward_fixed_functions;
