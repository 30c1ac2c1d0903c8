//! Sampler texture bookkeeping for one program.
//!
//! Types:
//! - [`TextureBindings`]: engine image to (texture unit, GPU texture) table.
//!
//! Functions:
//! - [`convert_to_rgba`]: normalises engine pixel layouts to byte-order RGBA.

use std::cell::{RefCell, RefMut};
use std::ops::Deref;
use std::rc::{Rc, Weak};

use bytemuck::{Pod, Zeroable};
use tracing::{debug, warn};

use crate::gl::ProgrammablePipeline;
use crate::surface::{PixelSource, SharedSurface};
use crate::types::{BlendMode, GlHandle, PixelFormat, Size};

/// Unit reserved for the composed scene (`sol_texture`).
pub const SCENE_TEXTURE_UNIT: u32 = 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
struct Rgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

fn texel(format: PixelFormat, px: &[u8]) -> Rgba8 {
    match format {
        PixelFormat::Rgba8888 => Rgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        },
        PixelFormat::Bgra8888 => Rgba8 {
            r: px[2],
            g: px[1],
            b: px[0],
            a: px[3],
        },
        PixelFormat::Argb8888 => {
            let [a, r, g, b] = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]).to_be_bytes();
            Rgba8 { r, g, b, a }
        }
        PixelFormat::Abgr8888 => {
            let [a, b, g, r] = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]).to_be_bytes();
            Rgba8 { r, g, b, a }
        }
    }
}

/// Converts `pixels` to tightly packed RGBA bytes for a `size` texture.
///
/// Missing trailing pixels come out transparent black, extra bytes are
/// ignored.
pub fn convert_to_rgba(format: PixelFormat, size: Size, pixels: &[u8]) -> Vec<u8> {
    let mut texels: Vec<Rgba8> = pixels
        .chunks_exact(4)
        .take(size.area())
        .map(|px| texel(format, px))
        .collect();
    if texels.len() < size.area() {
        warn!(
            size = %size,
            bytes = pixels.len(),
            "pixel source shorter than its size; padding with transparent texels"
        );
        texels.resize(size.area(), Rgba8::zeroed());
    }
    bytemuck::cast_slice::<Rgba8, u8>(&texels).to_vec()
}

/// Disables blending on a pixel source while its contents are copied and puts
/// the original mode back afterwards.
struct UnblendedCopy<'a> {
    surface: RefMut<'a, dyn PixelSource + 'static>,
    saved: BlendMode,
}

impl<'a> UnblendedCopy<'a> {
    fn new(mut surface: RefMut<'a, dyn PixelSource + 'static>) -> Self {
        let saved = surface.blend_mode();
        surface.set_blend_mode(BlendMode::None);
        Self { surface, saved }
    }
}

impl<'a> Deref for UnblendedCopy<'a> {
    type Target = dyn PixelSource + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.surface
    }
}

impl Drop for UnblendedCopy<'_> {
    fn drop(&mut self) {
        self.surface.set_blend_mode(self.saved);
    }
}

fn upload(
    gl: &dyn ProgrammablePipeline,
    texture: GlHandle,
    image: &RefCell<dyn PixelSource + 'static>,
) -> Size {
    let source = UnblendedCopy::new(image.borrow_mut());
    let size = source.size();
    let rgba = convert_to_rgba(source.pixel_format(), size, source.pixels());
    gl.upload_texture(texture, size, &rgba);
    size
}

struct TextureBinding {
    source: Weak<RefCell<dyn PixelSource>>,
    unit: u32,
    texture: GlHandle,
    uniforms: Vec<String>,
}

/// Images bound to sampler uniforms, each on its own texture unit.
///
/// Unit 0 is reserved for the scene; a new image gets the lowest unit no live
/// binding holds. Bindings whose image has been dropped, or that no uniform
/// samples any more, are released on the next `bind`. Images are matched by
/// allocation identity.
#[derive(Default)]
pub struct TextureBindings {
    bindings: Vec<TextureBinding>,
}

impl TextureBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn position(&self, image: &SharedSurface) -> Option<usize> {
        let wanted = Rc::downgrade(image);
        self.bindings
            .iter()
            .position(|binding| binding.source.strong_count() > 0 && binding.source.ptr_eq(&wanted))
    }

    pub fn unit_of(&self, image: &SharedSurface) -> Option<u32> {
        self.position(image).map(|index| self.bindings[index].unit)
    }

    pub fn texture_of(&self, image: &SharedSurface) -> Option<GlHandle> {
        self.position(image).map(|index| self.bindings[index].texture)
    }

    /// Records that `uniform` samples `image` and returns the unit to push
    /// into it.
    ///
    /// A known image keeps its unit and has its GPU texture refreshed from the
    /// current contents; a new one gets a texture and the next free unit.
    pub fn bind(&mut self, gl: &dyn ProgrammablePipeline, uniform: &str, image: &SharedSurface) -> u32 {
        let wanted = Rc::downgrade(image);
        for binding in &mut self.bindings {
            if !binding.source.ptr_eq(&wanted) {
                binding.uniforms.retain(|name| name != uniform);
            }
        }
        self.prune(gl);

        if let Some(index) = self.position(image) {
            let binding = &mut self.bindings[index];
            upload(gl, binding.texture, image);
            if !binding.uniforms.iter().any(|name| name == uniform) {
                binding.uniforms.push(uniform.to_string());
            }
            return binding.unit;
        }

        let unit = self.lowest_free_unit();
        let texture = gl.create_texture();
        let size = upload(gl, texture, image);
        debug!(uniform, unit, texture, size = %size, "bound sampler texture");
        self.bindings.push(TextureBinding {
            source: wanted,
            unit,
            texture,
            uniforms: vec![uniform.to_string()],
        });
        unit
    }

    fn lowest_free_unit(&self) -> u32 {
        (SCENE_TEXTURE_UNIT + 1..)
            .find(|unit| self.bindings.iter().all(|binding| binding.unit != *unit))
            .unwrap_or(SCENE_TEXTURE_UNIT + 1)
    }

    /// Deletes the textures of bindings whose image is gone or that no
    /// uniform samples.
    fn prune(&mut self, gl: &dyn ProgrammablePipeline) {
        self.bindings.retain(|binding| {
            let live = binding.source.strong_count() > 0 && !binding.uniforms.is_empty();
            if !live {
                debug!(unit = binding.unit, texture = binding.texture, "released sampler texture");
                gl.delete_texture(binding.texture);
            }
            live
        });
    }

    /// `(unit, texture)` for every binding, in allocation order.
    pub fn units(&self) -> impl Iterator<Item = (u32, GlHandle)> + '_ {
        self.bindings.iter().map(|binding| (binding.unit, binding.texture))
    }

    /// `(uniform, unit)` for every sampler uniform assigned so far.
    pub fn sampler_uniforms(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.bindings.iter().flat_map(|binding| {
            binding
                .uniforms
                .iter()
                .map(move |name| (name.as_str(), binding.unit))
        })
    }

    /// Deletes every GPU texture and forgets all bindings.
    pub fn release(&mut self, gl: &dyn ProgrammablePipeline) {
        for binding in self.bindings.drain(..) {
            gl.delete_texture(binding.texture);
        }
    }
}
