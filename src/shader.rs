use std::collections::HashMap;

use log::debug;

use crate::gpu::{GpuTarget, DEPTH_FORMAT};
use crate::mesh::{MeshBuffers, SurfaceMesh, Vertex};
use crate::pipeline::CapturedTextures;
use crate::target::TextureHandle;
use crate::texture::NoiseTexture;
use crate::uniforms::{TextureSlot, TextureSlots, UniformBinding, UniformSnapshot, WaterUniform};
use crate::{Result, WaterError};

const WATER_WGSL: &str = include_str!("shaders/water.wgsl");

/// Bind groups kept around before the cache is flushed.
const BIND_GROUP_CACHE_LIMIT: usize = 8;

enum Prepared {
    Surface(TextureSlots),
    Flat,
}

/// GPU side of the water surface: pipelines, uniform buffer, samplers and the
/// textures the fragment stage reads.
pub struct WaterShader {
    surface_pipeline: wgpu::RenderPipeline,
    flat_pipeline: wgpu::RenderPipeline,
    uniform: UniformBinding<WaterUniform>,
    texture_layout: wgpu::BindGroupLayout,
    repeat_sampler: wgpu::Sampler,
    clamp_sampler: wgpu::Sampler,
    placeholder_depth: wgpu::TextureView,
    placeholder_color: NoiseTexture,
    external: Vec<NoiseTexture>,
    bind_groups: HashMap<TextureSlots, wgpu::BindGroup>,
    mesh: MeshBuffers,
    prepared: Option<Prepared>,
}

impl WaterShader {
    /// `depth_format` is the depth attachment of the pass the surface is drawn
    /// in, if any. The surface tests against it but never writes it.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
        mesh: &SurfaceMesh,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("water_uniform_layout"),
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                texture_entry(0, wgpu::ShaderStages::FRAGMENT, wgpu::TextureSampleType::Depth),
                texture_entry(
                    1,
                    wgpu::ShaderStages::FRAGMENT,
                    wgpu::TextureSampleType::Float { filterable: true },
                ),
                texture_entry(
                    2,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    wgpu::TextureSampleType::Float { filterable: true },
                ),
                texture_entry(
                    3,
                    wgpu::ShaderStages::FRAGMENT,
                    wgpu::TextureSampleType::Float { filterable: true },
                ),
                sampler_entry(4, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                sampler_entry(5, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("water_texture_layout"),
        });

        let uniform = UniformBinding::new(
            device,
            "Water Uniform",
            <WaterUniform as bytemuck::Zeroable>::zeroed(),
            &uniform_layout,
            0,
        );

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Water Shader"),
            source: wgpu::ShaderSource::Wgsl(WATER_WGSL.into()),
        });
        let surface_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Water Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let flat_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Water Fallback Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let surface_pipeline = create_pipeline(
            device,
            "Water Surface Pipeline",
            &surface_layout,
            &module,
            ("vs_main", "fs_main"),
            color_format,
            depth_format,
        );
        let flat_pipeline = create_pipeline(
            device,
            "Water Fallback Pipeline",
            &flat_layout,
            &module,
            ("vs_flat", "fs_flat"),
            color_format,
            depth_format,
        );

        let repeat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Water Noise Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let clamp_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Water Capture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // wgpu zero-initialises textures, which is all a slot that is never read needs
        let placeholder_depth = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Water Placeholder Depth"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());
        let placeholder_color = NoiseTexture::solid(device, queue, [128, 128, 128, 255], "Water Placeholder");

        Self {
            surface_pipeline,
            flat_pipeline,
            uniform,
            texture_layout,
            repeat_sampler,
            clamp_sampler,
            placeholder_depth,
            placeholder_color,
            external: Vec::new(),
            bind_groups: HashMap::new(),
            mesh: mesh.upload(device, "Water Mesh"),
            prepared: None,
        }
    }

    /// Takes ownership of an asset texture and returns the handle to feed
    /// into the displacement or foam slot.
    pub fn register_texture(&mut self, texture: NoiseTexture) -> TextureHandle {
        self.external.push(texture);
        TextureHandle::External(self.external.len() as u32 - 1)
    }

    fn asset_view(&self, slot: TextureSlot, handle: Option<TextureHandle>) -> Result<&wgpu::TextureView> {
        match handle {
            None => Ok(&self.placeholder_color.view),
            Some(TextureHandle::External(index)) => self
                .external
                .get(index as usize)
                .map(|t| &t.view)
                .ok_or(WaterError::MissingUniform(slot.name())),
            Some(TextureHandle::Target { .. }) => Err(WaterError::InvalidConfiguration(format!(
                "{} takes a registered texture, not a render target",
                slot.name()
            ))),
        }
    }

    /// Uploads this frame's uniforms and picks the texture bind group for the
    /// next [`draw`](Self::draw).
    pub fn prepare_surface(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        snapshot: &UniformSnapshot,
        captured: &CapturedTextures<'_, GpuTarget>,
    ) -> Result<()> {
        let key = TextureSlots {
            depth: captured.depth.and(snapshot.textures.depth),
            scene: captured.scene.and(snapshot.textures.scene),
            displacement: snapshot.textures.displacement,
            foam: snapshot.textures.foam,
        };

        if !self.bind_groups.contains_key(&key) {
            let depth = match captured.depth {
                Some(target) => target.depth_view.as_ref().ok_or_else(|| {
                    WaterError::Capture("depth capture target has no depth attachment".into())
                })?,
                None => &self.placeholder_depth,
            };
            let scene = captured
                .scene
                .map_or(&self.placeholder_color.view, |target| &target.color_view);
            let displacement = self.asset_view(TextureSlot::Displacement, key.displacement)?;
            let foam = self.asset_view(TextureSlot::Foam, key.foam)?;

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(depth),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(scene),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(displacement),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(foam),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(&self.repeat_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::Sampler(&self.clamp_sampler),
                    },
                ],
                label: Some("Water Texture Bind Group"),
            });
            // cached groups keep their textures alive; drop those that hold
            // captures from before a resize or a release
            let before = self.bind_groups.len();
            self.bind_groups.retain(|cached, _| shares_captures(&key, cached));
            if self.bind_groups.len() < before {
                debug!("evicted {} water bind groups", before - self.bind_groups.len());
            }
            if self.bind_groups.len() >= BIND_GROUP_CACHE_LIMIT {
                debug!("flushing {} cached water bind groups", self.bind_groups.len());
                self.bind_groups.clear();
            }
            self.bind_groups.insert(key, bind_group);
        }

        self.uniform.data = snapshot.block;
        self.uniform.update(queue);
        self.prepared = Some(Prepared::Surface(key));
        Ok(())
    }

    /// Prepares the flat fallback draw. `block` supplies the transforms.
    pub fn prepare_flat(&mut self, queue: &wgpu::Queue, block: &WaterUniform, color: [f32; 4]) {
        self.uniform.data = WaterUniform {
            shallow_color: color,
            ..*block
        };
        self.uniform.update(queue);
        self.prepared = Some(Prepared::Flat);
    }

    /// Records whatever was last prepared. Does nothing before the first prepare.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        match &self.prepared {
            Some(Prepared::Surface(key)) => {
                let Some(textures) = self.bind_groups.get(key) else {
                    return;
                };
                pass.set_pipeline(&self.surface_pipeline);
                pass.set_bind_group(0, &self.uniform.bind_group, &[]);
                pass.set_bind_group(1, textures, &[]);
            }
            Some(Prepared::Flat) => {
                pass.set_pipeline(&self.flat_pipeline);
                pass.set_bind_group(0, &self.uniform.bind_group, &[]);
            }
            None => return,
        }
        self.mesh.draw(pass);
    }
}

/// Whether `cached` samples no captured texture other than the ones `current`
/// does.
fn shares_captures(current: &TextureSlots, cached: &TextureSlots) -> bool {
    let current_or_unused = |cached: Option<TextureHandle>, current: Option<TextureHandle>| {
        cached.is_none() || cached == current
    };
    current_or_unused(cached.depth, current.depth) && current_or_unused(cached.scene, current.scene)
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    (vs_entry, fs_entry): (&str, &str),
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some(vs_entry),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(fs_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // the surface is seen from above and below
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Attachment, TargetId};

    fn captured(target: u32, attachment: Attachment, generation: u32) -> Option<TextureHandle> {
        Some(TextureHandle::Target {
            target: TargetId(target),
            attachment,
            generation,
        })
    }

    #[test]
    fn resized_captures_evict_cached_groups() {
        let assets = TextureSlots {
            displacement: Some(TextureHandle::External(0)),
            foam: Some(TextureHandle::External(1)),
            ..TextureSlots::default()
        };
        let before = TextureSlots {
            depth: captured(0, Attachment::Depth, 0),
            scene: captured(1, Attachment::Color, 0),
            ..assets
        };
        let after = TextureSlots {
            depth: captured(0, Attachment::Depth, 1),
            scene: captured(1, Attachment::Color, 1),
            ..assets
        };
        assert!(shares_captures(&before, &before));
        assert!(!shares_captures(&after, &before));

        // a group without the scene texture still matches the current depth
        let depth_only = TextureSlots { scene: None, ..after };
        assert!(shares_captures(&after, &depth_only));
        assert!(shares_captures(&after, &assets));
        assert!(!shares_captures(&depth_only, &after));
    }
}
