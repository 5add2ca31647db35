use std::sync::Arc;

use log::debug;

use crate::target::{TargetAllocator, TargetDescriptor, TargetKind};
use crate::{Result, WaterError};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Offscreen colour texture with an optional sampled depth attachment.
pub struct GpuTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: Option<wgpu::Texture>,
    pub depth_view: Option<wgpu::TextureView>,
    pub width: u32,
    pub height: u32,
}

impl GpuTarget {
    /// Starts a pass that clears and writes this target.
    pub fn begin_capture_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        label: &'a str,
        clear: wgpu::Color,
    ) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.color_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: self.depth_view.as_ref().map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            ..Default::default()
        })
    }
}

/// Allocates capture targets on a wgpu device.
pub struct WgpuAllocator {
    device: Arc<wgpu::Device>,
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
}

impl WgpuAllocator {
    /// `color_format` should match whatever the host's scene pipelines render to.
    pub fn new(device: Arc<wgpu::Device>, color_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            color_format,
            depth_format: DEPTH_FORMAT,
        }
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    pub fn depth_format(&self) -> wgpu::TextureFormat {
        self.depth_format
    }

    fn create_texture(&self, label: &str, desc: &TargetDescriptor, format: wgpu::TextureFormat) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
    }
}

impl TargetAllocator for WgpuAllocator {
    type Target = GpuTarget;

    fn allocate(&mut self, label: &str, desc: &TargetDescriptor) -> Result<GpuTarget> {
        let failure = |reason: String| WaterError::TargetAllocationFailure {
            width: desc.width,
            height: desc.height,
            reason,
        };
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(failure(format!("size must be within 1..={max}")));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let color = self.create_texture(&format!("{label} colour"), desc, self.color_format);
        let depth = match desc.kind {
            TargetKind::ColorOnly => None,
            TargetKind::ColorAndDepth => Some(self.create_texture(&format!("{label} depth"), desc, self.depth_format)),
        };
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = out_of_memory.or(validation) {
            return Err(failure(err.to_string()));
        }

        debug!("created {label} textures {}x{} ({:?})", desc.width, desc.height, desc.kind);
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth
            .as_ref()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));
        Ok(GpuTarget {
            color,
            color_view,
            depth,
            depth_view,
            width: desc.width,
            height: desc.height,
        })
    }
}
