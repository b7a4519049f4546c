//! The seam between the headless window and a GPU implementation.
//!
//! A [`Context`] owns a native rendering context and reports the API handle
//! devices and renderers are created from. A [`Backend`] turns that handle into
//! a [`Device`] and a [`Renderer`]. Everything here is only ever called on the
//! window's context thread, with the context current.

use bitflags::bitflags;
use image::RgbaImage;

use crate::color::Color;
use crate::geometry::Rect;
use crate::ops::Ops;

/// Error produced by a backend implementation.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub trait Context: Send + 'static {
    /// Handle passed to [`Backend::new_device`] and [`Backend::new_renderer`].
    type Api;

    fn api(&self) -> Self::Api;
    fn make_current(&mut self) -> Result<(), DriverError>;
    fn release_current(&mut self);
    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA, sRGB encoded color channels.
    Srgba8,
    Rgba8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindingFlags: u8 {
        const SAMPLED = 1 << 0;
        const FRAMEBUFFER = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub bindings: BindingFlags,
}

pub trait Texture: Send + 'static {
    fn release(&mut self);
}

pub trait Device: Send + 'static {
    type Texture: Texture;

    fn new_texture(&mut self, desc: &TextureDescriptor) -> Result<Self::Texture, DriverError>;

    /// Reads `rect` of `texture` back into host memory.
    fn download_image(
        &mut self,
        texture: &Self::Texture,
        rect: Rect,
    ) -> Result<RgbaImage, DriverError>;

    fn release(&mut self);
}

pub trait Renderer: Send + 'static {
    type Device: Device;

    /// Color the target is cleared to at the start of the next frame.
    fn clear(&mut self, color: Color);

    fn frame(
        &mut self,
        device: &mut Self::Device,
        ops: &Ops,
        target: &<Self::Device as Device>::Texture,
        size: (u32, u32),
    ) -> Result<(), DriverError>;

    fn release(&mut self);
}

/// Creates devices and renderers for one kind of [`Context`].
pub trait Backend: Send + 'static {
    type Context: Context;
    type Device: Device;
    type Renderer: Renderer<Device = Self::Device>;

    fn new_device(
        &self,
        api: &<Self::Context as Context>::Api,
    ) -> Result<Self::Device, DriverError>;

    fn new_renderer(
        &self,
        api: &<Self::Context as Context>::Api,
        device: &Self::Device,
    ) -> Result<Self::Renderer, DriverError>;
}
