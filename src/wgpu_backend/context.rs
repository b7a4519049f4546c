use std::sync::Arc;

use futures::executor::block_on;

use super::WgpuError;
use crate::driver::{Context, DriverError};

/// A wgpu instance together with the adapter picked from it.
///
/// wgpu has no notion of a current context, so activation only tracks state.
/// The window still calls it on its context thread like any other backend.
pub struct WgpuContext {
    instance: Option<wgpu::Instance>,
    adapter: Arc<wgpu::Adapter>,
    current: bool,
}

impl WgpuContext {
    pub fn new(
        backends: wgpu::Backends,
        power_preference: wgpu::PowerPreference,
        force_fallback_adapter: bool,
    ) -> Result<Self, WgpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter,
        }))?;

        let info = adapter.get_info();
        tracing::info!(
            "selected adapter {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        Ok(Self {
            instance: Some(instance),
            adapter: Arc::new(adapter),
            current: false,
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn is_current(&self) -> bool {
        self.current
    }
}

impl Context for WgpuContext {
    type Api = Arc<wgpu::Adapter>;

    fn api(&self) -> Arc<wgpu::Adapter> {
        self.adapter.clone()
    }

    fn make_current(&mut self) -> Result<(), DriverError> {
        if self.instance.is_none() {
            return Err(WgpuError::Released.into());
        }
        self.current = true;
        Ok(())
    }

    fn release_current(&mut self) {
        self.current = false;
    }

    fn release(&mut self) {
        self.current = false;
        if self.instance.take().is_some() {
            tracing::debug!("released wgpu instance");
        }
    }
}
