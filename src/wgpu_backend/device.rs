use futures::executor::block_on;
use image::RgbaImage;

use super::readback::download_region;
use super::WgpuError;
use crate::driver::{BindingFlags, Device, DriverError, Filter, Texture, TextureDescriptor, TextureFormat};
use crate::geometry::Rect;

pub struct WgpuDevice {
    pub(super) device: wgpu::Device,
    pub(super) queue: wgpu::Queue,
}

pub struct WgpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl WgpuDevice {
    pub(super) fn new(adapter: &wgpu::Adapter) -> Result<Self, WgpuError> {
        let (device, queue) = block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("opframe_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: Default::default(),
        }))?;
        Ok(Self { device, queue })
    }

    /// Runs `f` inside a validation error scope and reports what it caught.
    pub(super) fn validated<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, WgpuError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        match block_on(self.device.pop_error_scope()) {
            Some(err) => Err(WgpuError::Validation(err.to_string())),
            None => Ok(value),
        }
    }
}

fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Srgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
    }
}

fn filter_mode(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Nearest => wgpu::FilterMode::Nearest,
        Filter::Linear => wgpu::FilterMode::Linear,
    }
}

fn texture_usages(bindings: BindingFlags) -> wgpu::TextureUsages {
    let mut usage = wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST;
    if bindings.contains(BindingFlags::SAMPLED) {
        usage |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if bindings.contains(BindingFlags::FRAMEBUFFER) {
        usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    usage
}

impl Device for WgpuDevice {
    type Texture = WgpuTexture;

    fn new_texture(&mut self, desc: &TextureDescriptor) -> Result<WgpuTexture, DriverError> {
        let texture = self.validated(|device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some("opframe_target"),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: texture_format(desc.format),
                usage: texture_usages(desc.bindings),
                view_formats: &[],
            })
        })?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("opframe_target_sampler"),
            min_filter: filter_mode(desc.min_filter),
            mag_filter: filter_mode(desc.mag_filter),
            ..Default::default()
        });
        tracing::debug!(
            "created {}x{} {:?} texture",
            desc.width,
            desc.height,
            desc.format
        );
        Ok(WgpuTexture {
            texture,
            view,
            sampler,
        })
    }

    fn download_image(
        &mut self,
        texture: &WgpuTexture,
        rect: Rect,
    ) -> Result<RgbaImage, DriverError> {
        Ok(download_region(self, &texture.texture, rect)?)
    }

    fn release(&mut self) {
        self.device.destroy();
    }
}

impl WgpuTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Sampler honoring the texture's min and mag filters.
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

impl Texture for WgpuTexture {
    fn release(&mut self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_target_is_srgb_and_renderable() {
        assert_eq!(
            texture_format(TextureFormat::Srgba8),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        let usage = texture_usages(BindingFlags::SAMPLED | BindingFlags::FRAMEBUFFER);
        assert!(usage.contains(
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
        ));
    }

    #[test]
    fn plain_texture_is_copy_only() {
        assert_eq!(
            texture_usages(BindingFlags::empty()),
            wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST
        );
    }
}
