//! The default GPU backend, built on wgpu.
//!
//! Windows render into an offscreen `Rgba8UnormSrgb` texture. Paint
//! operations are tessellated with lyon, clipped with a scissor rectangle and
//! drawn by a single solid-color pipeline.

mod cache;
mod context;
mod device;
mod pipeline;
mod readback;
mod renderer;

use std::num::NonZeroUsize;
use std::sync::Arc;

use thiserror::Error;

use crate::backend::ContextStrategy;
use crate::color::Color;
use crate::driver::{Backend, DriverError};
use crate::ops::DecodeError;

pub use context::WgpuContext;
pub use device::{WgpuDevice, WgpuTexture};
pub use renderer::WgpuRenderer;

/// Settings for [`WgpuBackend`] and its context strategies.
#[derive(Debug, Clone)]
pub struct WgpuConfig {
    pub power_preference: wgpu::PowerPreference,
    /// Backends tried first, looking for a hardware adapter.
    pub primary_backends: wgpu::Backends,
    /// Backends tried with `force_fallback_adapter` when no hardware adapter
    /// is available. Empty disables the fallback.
    pub fallback_backends: wgpu::Backends,
    /// Number of tessellated area shapes kept between frames.
    pub cache_capacity: usize,
    pub clear_color: Color,
}

impl Default for WgpuConfig {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            primary_backends: wgpu::Backends::PRIMARY,
            fallback_backends: wgpu::Backends::all(),
            cache_capacity: 256,
            clear_color: Color::TRANSPARENT,
        }
    }
}

#[derive(Debug, Error)]
pub enum WgpuError {
    #[error("no adapter found: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("tessellation failed: {0:?}")]
    Tessellation(lyon::tessellation::TessellationError),
    #[error("invalid operation buffer: {0}")]
    Decode(#[from] DecodeError),
    #[error("render target is {actual:?}, renderer draws to {expected:?}")]
    TargetFormat {
        expected: wgpu::TextureFormat,
        actual: wgpu::TextureFormat,
    },
    #[error("region {region:?} is outside the {width}x{height} texture")]
    RegionOutOfBounds {
        region: [i32; 4],
        width: u32,
        height: u32,
    },
    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("readback returned {actual} bytes, expected {expected}")]
    ShortReadback { expected: usize, actual: usize },
    #[error("readback callback was dropped")]
    MapCallbackDropped,
    #[error("context has been released")]
    Released,
}

impl From<lyon::tessellation::TessellationError> for WgpuError {
    fn from(err: lyon::tessellation::TessellationError) -> Self {
        WgpuError::Tessellation(err)
    }
}

/// Creates wgpu devices and renderers for a [`WgpuContext`].
#[derive(Debug, Clone, Default)]
pub struct WgpuBackend {
    config: WgpuConfig,
}

impl WgpuBackend {
    pub fn new(config: WgpuConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WgpuConfig {
        &self.config
    }

    /// Context strategies for `config`: a hardware adapter on the primary
    /// backends, then the software fallback adapter.
    pub fn strategies(config: &WgpuConfig) -> Vec<Option<ContextStrategy<WgpuContext>>> {
        let power_preference = config.power_preference;
        let primary = config.primary_backends;
        let fallback = config.fallback_backends;

        vec![
            (!primary.is_empty()).then(|| {
                ContextStrategy::new("wgpu hardware adapter", move || {
                    Ok(WgpuContext::new(primary, power_preference, false)?)
                })
            }),
            (!fallback.is_empty()).then(|| {
                ContextStrategy::new("wgpu fallback adapter", move || {
                    Ok(WgpuContext::new(fallback, power_preference, true)?)
                })
            }),
        ]
    }

    fn cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.config.cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Backend for WgpuBackend {
    type Context = WgpuContext;
    type Device = WgpuDevice;
    type Renderer = WgpuRenderer;

    fn new_device(&self, adapter: &Arc<wgpu::Adapter>) -> Result<WgpuDevice, DriverError> {
        Ok(WgpuDevice::new(adapter)?)
    }

    fn new_renderer(
        &self,
        _adapter: &Arc<wgpu::Adapter>,
        device: &WgpuDevice,
    ) -> Result<WgpuRenderer, DriverError> {
        Ok(WgpuRenderer::new(device, self.cache_capacity())?)
    }
}
