//! Raw GL scalar types, enum values, and the table generator used by every
//! backend. Nothing here is called directly outside `gl`.

#![allow(non_camel_case_types, dead_code)]

use std::os::raw::{c_char, c_void};

pub type GLenum = u32;
pub type GLbitfield = u32;
pub type GLuint = u32;
pub type GLint = i32;
pub type GLsizei = i32;
pub type GLfloat = f32;
pub type GLdouble = f64;
pub type GLchar = c_char;
/// `GLhandleARB` is an unsigned int everywhere except Apple, where the ARB
/// shader path is not offered.
pub type GLhandleARB = u32;

pub const NO_ERROR: GLenum = 0;

pub const VERTEX_SHADER: GLenum = 0x8B31;
pub const FRAGMENT_SHADER: GLenum = 0x8B30;
pub const COMPILE_STATUS: GLenum = 0x8B81;
pub const LINK_STATUS: GLenum = 0x8B82;
pub const INFO_LOG_LENGTH: GLenum = 0x8B84;
pub const CURRENT_PROGRAM: GLenum = 0x8B8D;
pub const PROGRAM_OBJECT_ARB: GLenum = 0x8B40;

pub const TEXTURE0: GLenum = 0x84C0;
pub const TEXTURE_2D: GLenum = 0x0DE1;
pub const TEXTURE_MAG_FILTER: GLenum = 0x2800;
pub const TEXTURE_MIN_FILTER: GLenum = 0x2801;
pub const TEXTURE_WRAP_S: GLenum = 0x2802;
pub const TEXTURE_WRAP_T: GLenum = 0x2803;
pub const NEAREST: GLint = 0x2600;
pub const CLAMP_TO_EDGE: GLint = 0x812F;
pub const RGBA: GLenum = 0x1908;
pub const RGBA8: GLint = 0x8058;
pub const UNSIGNED_BYTE: GLenum = 0x1401;

pub const UNPACK_ROW_LENGTH: GLenum = 0x0CF2;
pub const UNPACK_SKIP_ROWS: GLenum = 0x0CF3;
pub const UNPACK_SKIP_PIXELS: GLenum = 0x0CF4;
pub const UNPACK_ALIGNMENT: GLenum = 0x0CF5;

pub const MODELVIEW: GLenum = 0x1700;
pub const PROJECTION: GLenum = 0x1701;
pub const QUADS: GLenum = 0x0007;
pub const DEPTH_BUFFER_BIT: GLbitfield = 0x0100;
pub const COLOR_BUFFER_BIT: GLbitfield = 0x4000;

/// Declares a struct of resolved entry points together with a loader that
/// either resolves every symbol or reports all the ones that came back null.
macro_rules! gl_functions {
    (
        $(#[$meta:meta])*
        pub(crate) struct $name:ident {
            $( $field:ident = $symbol:literal : fn($($arg:ty),*) $(-> $ret:ty)?; )*
        }
    ) => {
        $(#[$meta])*
        pub(crate) struct $name {
            $( pub(crate) $field: unsafe extern "system" fn($($arg),*) $(-> $ret)?, )*
        }

        impl $name {
            #[allow(dead_code)]
            pub(crate) const SYMBOLS: &'static [&'static str] = &[$($symbol),*];

            pub(crate) fn load(
                lookup: $crate::gl::ffi::Lookup<'_>,
            ) -> Result<Self, Vec<&'static str>> {
                $( let $field = lookup($symbol); )*

                let missing: Vec<&'static str> = [$(($symbol, $field.is_null())),*]
                    .into_iter()
                    .filter_map(|(symbol, null)| null.then_some(symbol))
                    .collect();
                if !missing.is_empty() {
                    return Err(missing);
                }

                // SAFETY: every pointer is non-null and was resolved by its
                // registry name, whose signature the field type mirrors.
                unsafe {
                    Ok(Self {
                        $( $field: ::std::mem::transmute::<
                            *const ::std::os::raw::c_void,
                            unsafe extern "system" fn($($arg),*) $(-> $ret)?,
                        >($field), )*
                    })
                }
            }
        }
    };
}

pub(crate) use gl_functions;

/// Reads a driver info log given its length query and fetch call.
pub(crate) fn read_info_log(
    length: GLint,
    fetch: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar),
) -> String {
    if length <= 0 {
        return String::new();
    }
    let mut buffer = vec![0u8; length as usize + 1];
    let mut written: GLsizei = 0;
    fetch(length, &mut written as *mut GLsizei, buffer.as_mut_ptr().cast::<GLchar>());
    let written = (written.max(0) as usize).min(length as usize);
    buffer.truncate(written);
    String::from_utf8_lossy(&buffer)
        .trim_end_matches('\0')
        .trim_end()
        .to_string()
}

pub(crate) type Lookup<'a> = &'a dyn Fn(&str) -> *const c_void;
