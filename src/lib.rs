use std::sync::Arc;

use anyhow::Context;
use winit::window::Window;

pub use app::*;
pub use clock::FrameClock;
pub use error::{Result, WaterError};
pub use gpu::{GpuTarget, WgpuAllocator, DEPTH_FORMAT};
pub use mesh::{MeshBuffers, SurfaceMesh, Vertex};
pub use params::*;
pub use pipeline::*;
pub use shader::WaterShader;
pub use target::*;
pub use texture::NoiseTexture;
pub use uniforms::*;
pub use waves::*;

/// Window, surface and device shared by everything that draws.
pub struct Core {
    pub surface: wgpu::Surface<'static>,
    pub device: Arc<wgpu::Device>,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub window: Arc<Window>,
}

impl Core {
    pub async fn new(window: Window) -> anyhow::Result<Self> {
        let window = Arc::new(window);
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tidepool device"),
                ..Default::default()
            })
            .await?;
        let device = Arc::new(device);

        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .context("surface is not supported by the adapter")?;
        let surface_caps = surface.get_capabilities(&adapter);
        if let Some(srgb) = surface_caps.formats.iter().copied().find(|f| f.is_srgb()) {
            config.format = srgb;
        }
        config.present_mode = wgpu::PresentMode::Fifo;
        surface.configure(&device, &config);
        log::info!(
            "using {} ({:?}), surface {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        log::debug!("core resize to {}x{}", new_size.width, new_size.height);
        self.size = new_size;
        // a minimised window reports 0x0; keep the last valid configuration
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }
}

mod app;
mod clock;
pub mod compose;
mod error;
mod gpu;
pub mod logging;
mod mesh;
mod params;
mod pipeline;
mod shader;
mod target;
pub mod texture;
mod uniforms;
mod waves;
