use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Driver object name (program, stage or texture). Zero means "no object".
pub type GlHandle = u32;

/// Location returned by the driver for a uniform the program does not declare.
pub const MISSING_UNIFORM: i32 = -1;

/// Pixel dimensions of a surface or render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_vec2(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One half of a program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Which flavour of the programmable pipeline the driver exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// `GL_ARB_shader_objects` and friends, resolved as extension entry points.
    Arb,
    /// OpenGL 2.0 core entry points.
    Core,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arb => f.write_str("arb"),
            Self::Core => f.write_str("core"),
        }
    }
}

/// Compositing mode of a pixel source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    None,
    #[default]
    Blend,
    Add,
    Multiply,
}

/// Channel layout of engine-side pixel data.
///
/// `Rgba8888` and `Bgra8888` describe byte order in memory. `Argb8888` and
/// `Abgr8888` describe packed 32-bit words in host byte order, with the first
/// named channel in the most significant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8888,
    Bgra8888,
    Argb8888,
    Abgr8888,
}

/// A value pushed into a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

/// Already-parsed metadata that accompanies a shader's sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMetadata {
    /// Scale to apply on the input size to get the output window size.
    pub logical_scale: f64,
    /// Values pushed into the named uniforms right after every link.
    pub uniforms: BTreeMap<String, UniformValue>,
}

impl Default for ShaderMetadata {
    fn default() -> Self {
        Self {
            logical_scale: 1.0,
            uniforms: BTreeMap::new(),
        }
    }
}

/// Everything a source provider hands over for one shader id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderData {
    pub vertex_source: String,
    pub fragment_source: String,
    pub metadata: ShaderMetadata,
}

impl ShaderData {
    pub fn new(vertex_source: impl Into<String>, fragment_source: impl Into<String>) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            metadata: ShaderMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ShaderMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn source(&self, kind: StageKind) -> &str {
        match kind {
            StageKind::Vertex => &self.vertex_source,
            StageKind::Fragment => &self.fragment_source,
        }
    }
}
