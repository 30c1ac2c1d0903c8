//! Full-screen GLSL post-processing for an OpenGL 1.x/2.x render loop.
//!
//! The engine composes each frame into an offscreen target; this crate draws
//! that target onto the window through a user-supplied vertex + fragment
//! program, or unshaded when no valid program is active.
//!
//! ```text
//! GlContext ──probe_and_resolve──▶ Capability ──create_program──▶ ShaderProgram
//!                                       │                           │  ▲
//!                                       ▼                           │  │ fetch
//!                                 PostProcessor ──FrameRenderer─────┘  ShaderSourceProvider
//!                                       │
//!                                       ▼
//!                                 DisplaySurface (compose, bind, present)
//! ```
//!
//! Driver objects belong to the thread that created the context; none of the
//! public types are `Send`.

mod config;
mod error;
mod frame;
mod gl;
mod processor;
mod program;
mod resolver;
mod source;
mod surface;
mod textures;
mod types;
mod uniforms;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{BackendPreference, ConfigError, PipelineConfig};
pub use error::{ShaderError, SourceError};
pub use frame::{DisplaySurface, FrameRenderer, FrameReport, FrameState};
pub use gl::{ProgramScope, ProgrammablePipeline, ProjectionScope, TextureUnitScope};
pub use processor::PostProcessor;
pub use program::ShaderProgram;
pub use resolver::{probe_and_resolve, Capability, GlContext};
pub use source::{ShaderSourceProvider, StaticSources};
pub use surface::{ImageSurface, PixelSource, SharedSurface};
pub use textures::{convert_to_rgba, TextureBindings, SCENE_TEXTURE_UNIT};
pub use types::{
    Backend, BlendMode, GlHandle, PixelFormat, ShaderData, ShaderMetadata, Size, StageKind,
    UniformValue, MISSING_UNIFORM,
};
pub use uniforms::UniformCache;

/// Uniform names the frame renderer and program setup write on their own.
pub const BUILTIN_UNIFORMS: [&str; 4] = [
    "sol_texture",
    "sol_time",
    "sol_input_size",
    "sol_output_size",
];
