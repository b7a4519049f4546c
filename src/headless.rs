//! Headless windows: render an operation buffer offscreen and read the
//! pixels back.

mod context_thread;

use std::sync::Arc;

use image::RgbaImage;

use crate::backend::{select_context, ContextStrategy};
use crate::color::Color;
use crate::driver::{
    Backend, BindingFlags, Context, Device, DriverError, Filter, Renderer, Texture,
    TextureDescriptor, TextureFormat,
};
use crate::error::{CreateStep, Error};
use crate::geometry::{rect, Rect};
use crate::ops::Ops;
use crate::wgpu_backend::{WgpuBackend, WgpuConfig};

use context_thread::{ContextThread, Current};

type TextureOf<B> = <<B as Backend>::Device as Device>::Texture;

/// A window without a visible surface.
///
/// The context, device, target texture and renderer live on a dedicated
/// context thread; every method that touches them blocks until that thread
/// has done the work.
pub struct Window<B: Backend> {
    size: (u32, u32),
    clear_color: Color,
    thread: ContextThread<WindowState<B>>,
}

struct WindowState<B: Backend> {
    size: (u32, u32),
    context: Option<B::Context>,
    device: Option<B::Device>,
    texture: Option<TextureOf<B>>,
    renderer: Option<B::Renderer>,
}

/// Creates a `width` x `height` headless window on the default wgpu setup.
pub fn new_offscreen_window(width: u32, height: u32) -> Result<Window<WgpuBackend>, Error> {
    new_offscreen_window_with(WgpuConfig::default(), width, height)
}

pub fn new_offscreen_window_with(
    config: WgpuConfig,
    width: u32,
    height: u32,
) -> Result<Window<WgpuBackend>, Error> {
    let strategies = WgpuBackend::strategies(&config);
    let clear_color = config.clear_color;
    let mut window = Window::new(WgpuBackend::new(config), strategies, width, height)?;
    window.set_clear_color(clear_color);
    Ok(window)
}

impl<B: Backend> Window<B> {
    /// Selects a context from `strategies` and creates the device, target
    /// texture and renderer on the window's context thread.
    ///
    /// On failure everything created so far is released, context included.
    pub fn new(
        backend: B,
        strategies: Vec<Option<ContextStrategy<B::Context>>>,
        width: u32,
        height: u32,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidSize { width, height });
        }
        let size = (width, height);
        let thread = ContextThread::spawn("opframe-context", move || {
            WindowState::create(&backend, strategies, size)
        })?;
        tracing::info!("created {width}x{height} headless window");
        Ok(Self {
            size,
            clear_color: Color::TRANSPARENT,
            thread,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Color every frame starts from. Transparent black by default.
    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Replaces the window content with the rendering of `ops`.
    ///
    /// The buffer is shared with the context thread, never copied. Pass an
    /// `Arc<Ops>` to keep using it afterwards. Failures leave the window
    /// usable.
    pub fn frame(&self, ops: impl Into<Arc<Ops>>) -> Result<(), Error> {
        let ops: Arc<Ops> = ops.into();
        let clear_color = self.clear_color;
        self.thread
            .run(move |state| state.frame(&ops, clear_color))
    }

    /// Reads the whole window content back.
    pub fn screenshot(&self) -> Result<RgbaImage, Error> {
        let (width, height) = self.size;
        let region = rect(0, 0, width as i32, height as i32);
        self.thread.run(move |state| state.screenshot(region))
    }

    /// Releases the GPU resources and the context, then stops the context
    /// thread. Further calls do nothing.
    pub fn release(&mut self) {
        if !self.thread.is_running() {
            return;
        }
        if let Err(err) = self.thread.run(|state| {
            state.release_resources();
            Ok(())
        }) {
            tracing::warn!("releasing window resources without a current context: {err}");
        }
        self.thread.finish(|state| {
            // Nothing left here unless the context could not be made current.
            state.release_resources();
            state.release_context();
        });
        tracing::debug!("released headless window");
    }
}

impl<B: Backend> Drop for Window<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: Backend> WindowState<B> {
    fn create(
        backend: &B,
        strategies: Vec<Option<ContextStrategy<B::Context>>>,
        size: (u32, u32),
    ) -> Result<Self, Error> {
        let mut context = select_context(strategies)?;
        if let Err(source) = context.make_current() {
            context.release();
            return Err(Error::Create {
                step: CreateStep::MakeCurrent,
                source,
            });
        }
        let api = context.api();
        let resources = Self::create_resources(backend, &api, size);
        context.release_current();

        match resources {
            Ok((device, texture, renderer)) => Ok(Self {
                size,
                context: Some(context),
                device: Some(device),
                texture: Some(texture),
                renderer: Some(renderer),
            }),
            Err(err) => {
                context.release();
                Err(err)
            }
        }
    }

    fn create_resources(
        backend: &B,
        api: &<B::Context as Context>::Api,
        (width, height): (u32, u32),
    ) -> Result<(B::Device, TextureOf<B>, B::Renderer), Error> {
        let create_error = |step| move |source: DriverError| Error::Create { step, source };

        let mut device = backend
            .new_device(api)
            .map_err(create_error(CreateStep::Device))?;

        let desc = TextureDescriptor {
            format: TextureFormat::Srgba8,
            width,
            height,
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            bindings: BindingFlags::SAMPLED | BindingFlags::FRAMEBUFFER,
        };
        let mut texture = match device.new_texture(&desc) {
            Ok(texture) => texture,
            Err(source) => {
                device.release();
                return Err(create_error(CreateStep::Texture)(source));
            }
        };

        let renderer = match backend.new_renderer(api, &device) {
            Ok(renderer) => renderer,
            Err(source) => {
                texture.release();
                device.release();
                return Err(create_error(CreateStep::Renderer)(source));
            }
        };

        Ok((device, texture, renderer))
    }

    fn frame(&mut self, ops: &Ops, clear_color: Color) -> Result<(), Error> {
        let (Some(device), Some(texture), Some(renderer)) = (
            self.device.as_mut(),
            self.texture.as_ref(),
            self.renderer.as_mut(),
        ) else {
            return Err(Error::Released);
        };
        renderer.clear(clear_color);
        renderer
            .frame(device, ops, texture, self.size)
            .map_err(Error::Frame)
    }

    fn screenshot(&mut self, region: Rect) -> Result<RgbaImage, Error> {
        let (Some(device), Some(texture)) = (self.device.as_mut(), self.texture.as_ref()) else {
            return Err(Error::Released);
        };
        device
            .download_image(texture, region)
            .map_err(Error::Screenshot)
    }

    /// Texture, then renderer, then device. Normally runs with the context
    /// current; a lost context still gets every handle released.
    fn release_resources(&mut self) {
        if let Some(mut texture) = self.texture.take() {
            texture.release();
        }
        if let Some(mut renderer) = self.renderer.take() {
            renderer.release();
        }
        if let Some(mut device) = self.device.take() {
            device.release();
        }
    }

    fn release_context(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.release();
        }
    }
}

impl<B: Backend> Current for WindowState<B> {
    fn make_current(&mut self) -> Result<(), DriverError> {
        match self.context.as_mut() {
            Some(context) => context.make_current(),
            None => Err("context already released".into()),
        }
    }

    fn release_current(&mut self) {
        if let Some(context) = self.context.as_mut() {
            context.release_current();
        }
    }
}
