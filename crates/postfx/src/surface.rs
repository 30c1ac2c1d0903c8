use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use image::RgbaImage;

use crate::types::{BlendMode, PixelFormat, Size};

/// An engine-side image that can be uploaded as a sampler texture.
pub trait PixelSource {
    fn size(&self) -> Size;
    fn pixel_format(&self) -> PixelFormat;
    /// Tightly packed rows, four bytes per pixel in [`Self::pixel_format`].
    fn pixels(&self) -> &[u8];
    fn blend_mode(&self) -> BlendMode;
    fn set_blend_mode(&mut self, mode: BlendMode);
}

/// A pixel source shared between the engine and the programs sampling it.
/// Programs identify textures by the allocation, not by contents.
pub type SharedSurface = Rc<RefCell<dyn PixelSource>>;

/// Pixel source backed by an in-memory RGBA image.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: RgbaImage,
    blend_mode: BlendMode,
}

impl ImageSurface {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            blend_mode: BlendMode::default(),
        }
    }

    /// Decodes any format the `image` crate was built with.
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        Ok(Self::new(image::open(path)?.to_rgba8()))
    }

    /// Wraps raw RGBA bytes; `None` when the buffer does not match `size`.
    pub fn from_pixels(size: Size, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(size.width, size.height, pixels).map(Self::new)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_shared(self) -> SharedSurface {
        Rc::new(RefCell::new(self))
    }
}

impl PixelSource for ImageSurface {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Rgba8888
    }

    fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }
}
