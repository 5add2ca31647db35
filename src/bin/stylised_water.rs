use glam::{Mat4, Vec3};
use log::info;
use tidepool::texture::{value_noise, voronoi};
use tidepool::{
    CameraState, CaptureRequest, CapturePass, CapturedTextures, Core, FrameClock, FrameDriver, FrameOutcome,
    FramePipeline, FrameRenderer, FrameState, GpuTarget, NoiseTexture, PassConfig, Projection, SurfaceMesh,
    SurfaceParameters, TextureSlot, UniformBinding, UniformProvider, UniformSnapshot, Visibility, WaterApp,
    WaterShader, WaterUniform, WaterVariant, WaveSet, WgpuAllocator, DEPTH_FORMAT,
};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

const SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");

const CAMERA_HEIGHT: f32 = 10.0;
const CAMERA_ZOOM: f32 = 75.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 17.0;
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.03,
    b: 0.06,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneVertex {
    position: [f32; 3],
    normal: [f32; 3],
    color: [f32; 3],
}

impl SceneVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

impl UniformProvider for SceneUniform {
    fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

fn push_cuboid(min: Vec3, max: Vec3, color: [f32; 3], vertices: &mut Vec<SceneVertex>, indices: &mut Vec<u32>) {
    let corner = |x: bool, y: bool, z: bool| {
        Vec3::new(
            if x { max.x } else { min.x },
            if y { max.y } else { min.y },
            if z { max.z } else { min.z },
        )
    };
    let faces = [
        (Vec3::X, [corner(true, false, false), corner(true, true, false), corner(true, true, true), corner(true, false, true)]),
        (Vec3::NEG_X, [corner(false, false, true), corner(false, true, true), corner(false, true, false), corner(false, false, false)]),
        (Vec3::Y, [corner(false, true, false), corner(false, true, true), corner(true, true, true), corner(true, true, false)]),
        (Vec3::NEG_Y, [corner(false, false, true), corner(false, false, false), corner(true, false, false), corner(true, false, true)]),
        (Vec3::Z, [corner(true, false, true), corner(true, true, true), corner(false, true, true), corner(false, false, true)]),
        (Vec3::NEG_Z, [corner(false, false, false), corner(false, true, false), corner(true, true, false), corner(true, false, false)]),
    ];
    for (normal, quad) in faces {
        let base = vertices.len() as u32;
        vertices.extend(quad.iter().map(|p| SceneVertex {
            position: p.to_array(),
            normal: normal.to_array(),
            color,
        }));
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Sandy floor under the water and four boxes breaking the surface.
struct SceneGeometry {
    pipeline: wgpu::RenderPipeline,
    uniform: UniformBinding<SceneUniform>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl SceneGeometry {
    fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        push_cuboid(
            Vec3::new(-5.0, -2.05, -5.0),
            Vec3::new(5.0, -2.0, 5.0),
            [0.76, 0.70, 0.50],
            &mut vertices,
            &mut indices,
        );
        for (x, z, height) in [(1.0, 1.0, 1.0), (-1.0, 1.0, 2.0), (-1.0, -1.0, 1.5), (1.0, -1.0, 3.0)] {
            push_cuboid(
                Vec3::new(x - 0.5, -height / 2.0, z - 0.5),
                Vec3::new(x + 0.5, height / 2.0, z + 0.5),
                [0.85, 0.45, 0.30],
                &mut vertices,
                &mut indices,
            );
        }

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("scene_uniform_layout"),
        });
        let uniform = UniformBinding::new(
            device,
            "Scene Uniform",
            SceneUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                light_dir: [0.0, 10.0, 10.0, 0.0],
            },
            &layout,
            0,
        );
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_WGSL.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[SceneVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            pipeline,
            uniform,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Records one frame's capture passes into a shared encoder.
struct HostFrame<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    encoder: &'a mut wgpu::CommandEncoder,
    scene: &'a SceneGeometry,
    water: &'a mut WaterShader,
}

impl FrameRenderer<GpuTarget> for HostFrame<'_> {
    fn render_capture(&mut self, target: &GpuTarget, request: &CaptureRequest) -> tidepool::Result<()> {
        let label = match request.pass {
            CapturePass::Depth => "Water Depth Capture",
            CapturePass::Scene => "Water Scene Capture",
        };
        let mut pass = target.begin_capture_pass(self.encoder, label, BACKGROUND);
        self.scene.draw(&mut pass);
        if request.surface == Visibility::Visible {
            self.water.draw(&mut pass);
        }
        Ok(())
    }

    fn draw_surface(&mut self, snapshot: &UniformSnapshot, captured: CapturedTextures<'_, GpuTarget>) -> tidepool::Result<()> {
        self.water.prepare_surface(self.device, self.queue, snapshot, &captured)
    }

    fn draw_fallback(&mut self, block: &WaterUniform, color: [f32; 4]) -> tidepool::Result<()> {
        self.water.prepare_flat(self.queue, block, color);
        Ok(())
    }
}

struct StylisedWater {
    scene: SceneGeometry,
    water: WaterShader,
    pipeline: FramePipeline<WgpuAllocator>,
    clock: FrameClock,
    depth_view: wgpu::TextureView,
    camera: CameraState,
    last_outcome: Option<FrameOutcome>,
}

fn create_depth_view(core: &Core) -> wgpu::TextureView {
    core.device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Main Depth"),
            size: wgpu::Extent3d {
                width: core.config.width,
                height: core.config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

impl StylisedWater {
    fn new(core: &Core) -> anyhow::Result<Self> {
        let format = core.config.format;
        let scene = SceneGeometry::new(&core.device, format);
        let mesh = SurfaceMesh::plane(10.0, 10.0, 100, 100);
        let mut water = WaterShader::new(&core.device, &core.queue, format, Some(DEPTH_FORMAT), &mesh);

        let params = SurfaceParameters {
            amplitude: 0.001,
            ..SurfaceParameters::default()
        };
        let mut pipeline = FramePipeline::new(
            WgpuAllocator::new(core.device.clone(), format),
            WaterVariant::Refractive.config(),
            WaveSet::default(),
            params,
        )?;

        let displacement = NoiseTexture::from_image(&core.device, &core.queue, &value_noise(256, 8, 1), "Displacement Noise");
        let foam = NoiseTexture::from_image(&core.device, &core.queue, &voronoi(256, 6, 2), "Foam Voronoi");
        pipeline.set_texture(TextureSlot::Displacement, water.register_texture(displacement))?;
        pipeline.set_texture(TextureSlot::Foam, water.register_texture(foam))?;

        let camera = camera_for(core);
        Ok(Self {
            scene,
            water,
            pipeline,
            clock: FrameClock::new(),
            depth_view: create_depth_view(core),
            camera,
            last_outcome: None,
        })
    }

    fn frame_state(&self, core: &Core) -> FrameState {
        FrameState {
            elapsed: self.clock.elapsed(),
            resolution: (core.size.width, core.size.height),
            scale_factor: core.window().scale_factor(),
            camera: self.camera,
        }
    }

    fn switch_variant(&mut self, config: PassConfig) {
        match self.pipeline.set_config(config) {
            Ok(()) => info!("switched to {config:?}"),
            Err(e) => log::warn!("rejected pass configuration: {e}"),
        }
    }
}

/// Top-down orthographic camera sized like a zoomed CSS-pixel viewport.
fn camera_for(core: &Core) -> CameraState {
    let scale_factor = core.window().scale_factor() as f32;
    let half_width = core.size.width.max(1) as f32 / scale_factor / (2.0 * CAMERA_ZOOM);
    let half_height = core.size.height.max(1) as f32 / scale_factor / (2.0 * CAMERA_ZOOM);
    let position = Vec3::new(0.0, CAMERA_HEIGHT, 0.0);
    let view = Mat4::look_at_rh(position, Vec3::ZERO, Vec3::NEG_Z);
    let projection = Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, CAMERA_NEAR, CAMERA_FAR);
    CameraState {
        position,
        near: CAMERA_NEAR,
        far: CAMERA_FAR,
        projection: Projection::Orthographic,
        view_projection: projection * view,
    }
}

impl FrameDriver for StylisedWater {
    fn resize(&mut self, core: &Core) {
        if core.size.width > 0 && core.size.height > 0 {
            self.depth_view = create_depth_view(core);
            self.camera = camera_for(core);
        }
    }

    fn update(&mut self, core: &Core) {
        self.clock.tick();
        self.scene.uniform.data.view_proj = self.camera.view_projection.to_cols_array_2d();
        self.scene.uniform.update(&core.queue);
    }

    fn render(&mut self, core: &Core) -> Result<(), wgpu::SurfaceError> {
        let output = core.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = core.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        let frame = self.frame_state(core);
        let outcome = {
            let mut host = HostFrame {
                device: &core.device,
                queue: &core.queue,
                encoder: &mut encoder,
                scene: &self.scene,
                water: &mut self.water,
            };
            self.pipeline.run_frame(&frame, &mut host)
        };
        if self.last_outcome != Some(outcome) {
            info!("water surface: {outcome:?}");
            self.last_outcome = Some(outcome);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            self.scene.draw(&mut pass);
            if outcome != FrameOutcome::Skipped {
                self.water.draw(&mut pass);
            }
        }

        core.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    fn handle_input(&mut self, _core: &Core, event: &WindowEvent) -> bool {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        else {
            return false;
        };
        match code {
            KeyCode::Space => self.clock.toggle_pause(),
            KeyCode::KeyR => self.clock.reset(),
            KeyCode::Digit1 => self.switch_variant(WaterVariant::DepthTint.config()),
            KeyCode::Digit2 => self.switch_variant(WaterVariant::Stylised.config()),
            KeyCode::Digit3 => self.switch_variant(WaterVariant::Refractive.config()),
            _ => return false,
        }
        true
    }
}

fn main() -> anyhow::Result<()> {
    tidepool::logging::init();
    let (app, event_loop) = WaterApp::new("Stylised Water", 800, 800)?;
    app.run(event_loop, StylisedWater::new)
}
