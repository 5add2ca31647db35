use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::params::{FrameState, Projection, Rgb, SurfaceParameters};
use crate::target::TextureHandle;
use crate::waves::{WaveSet, MAX_WAVES};
use crate::{Result, WaterError};

pub trait UniformProvider {
    fn as_bytes(&self) -> &[u8];
}

/// GPU buffer plus bind group for one uniform block.
pub struct UniformBinding<T: UniformProvider> {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub data: T,
}

impl<T: UniformProvider> UniformBinding<T> {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        data: T,
        layout: &wgpu::BindGroupLayout,
        binding: u32,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: data.as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self {
            buffer,
            bind_group,
            data,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, self.data.as_bytes());
    }
}

/// Feature bits published in [`WaterUniform::features`]. Mirrored in `water.wgsl`.
pub mod features {
    /// Water depth comes from the captured depth texture.
    pub const DEPTH: u32 = 1;
    /// Background comes from the captured scene texture.
    pub const SCENE: u32 = 1 << 1;
    /// The scene sample is offset by the displacement texture.
    pub const REFRACTION: u32 = 1 << 2;
    pub const FOAM: u32 = 1 << 3;
    /// Vertex ripple from the displacement texture.
    pub const DISPLACEMENT: u32 = 1 << 4;
}

/// The water shader's uniform block, laid out exactly as `WaterUniforms` in WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub features: u32,
    pub camera_near: f32,
    pub camera_far: f32,
    /// 0 = perspective, 1 = orthographic.
    pub projection: u32,
    pub wave_speed: f32,
    pub shallow_color: [f32; 4],
    pub deep_color: [f32; 4],
    pub foam_color: [f32; 4],
    pub horizon_color: [f32; 4],
    /// xyz only
    pub horizon_position: [f32; 4],
    /// scale, speed, strength, water opacity
    pub refraction: [f32; 4],
    /// scale, speed, amount, cutoff
    pub foam: [f32; 4],
    /// depth falloff, amplitude, threshold, floor depth
    pub surface: [f32; 4],
    pub waves: [[f32; 4]; MAX_WAVES],
}

impl UniformProvider for WaterUniform {
    fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Every name the water shader reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformName {
    Time,
    Resolution,
    CameraNear,
    CameraFar,
    CameraPosition,
    ViewProjection,
    ModelMatrix,
    ShallowColor,
    ShallowOpacity,
    DeepColor,
    DeepOpacity,
    FoamColor,
    FoamOpacity,
    HorizonColor,
    HorizonOpacity,
    HorizonPosition,
    WaterOpacity,
    Depth,
    RefractionScale,
    RefractionSpeed,
    RefractionStrength,
    FoamScale,
    FoamSpeed,
    FoamAmount,
    FoamCutoff,
    Amplitude,
    Threshold,
    FarPlaneDepth,
    Wave(usize),
    Texture(TextureSlot),
}

const NAMES: &[(&str, UniformName)] = &[
    ("u_time", UniformName::Time),
    ("u_resolution", UniformName::Resolution),
    ("u_cameraNear", UniformName::CameraNear),
    ("u_cameraFar", UniformName::CameraFar),
    ("u_cameraPosition", UniformName::CameraPosition),
    ("u_viewProjection", UniformName::ViewProjection),
    ("u_modelMatrix", UniformName::ModelMatrix),
    ("u_shallowColor", UniformName::ShallowColor),
    ("u_shallowColorOpacity", UniformName::ShallowOpacity),
    ("u_deepColor", UniformName::DeepColor),
    ("u_deepColorOpacity", UniformName::DeepOpacity),
    ("u_foamColor", UniformName::FoamColor),
    ("u_foamOpacity", UniformName::FoamOpacity),
    ("u_horizonColor", UniformName::HorizonColor),
    ("u_horizonOpacity", UniformName::HorizonOpacity),
    ("u_horizonPosition", UniformName::HorizonPosition),
    ("u_waterOpacity", UniformName::WaterOpacity),
    ("u_depth", UniformName::Depth),
    ("u_refractionScale", UniformName::RefractionScale),
    ("u_refractionSpeed", UniformName::RefractionSpeed),
    ("u_refractionStrength", UniformName::RefractionStrength),
    ("u_foamScale", UniformName::FoamScale),
    ("u_foamSpeed", UniformName::FoamSpeed),
    ("u_foamAmount", UniformName::FoamAmount),
    ("u_foamCutoff", UniformName::FoamCutoff),
    ("u_amplitude", UniformName::Amplitude),
    ("u_threshold", UniformName::Threshold),
    ("u_farPlaneDepth", UniformName::FarPlaneDepth),
    ("u_waveA", UniformName::Wave(0)),
    ("u_waveB", UniformName::Wave(1)),
    ("u_waveC", UniformName::Wave(2)),
    ("u_waveD", UniformName::Wave(3)),
    ("u_depthTexture", UniformName::Texture(TextureSlot::Depth)),
    ("u_sceneTexture", UniformName::Texture(TextureSlot::Scene)),
    ("u_displacementTexture", UniformName::Texture(TextureSlot::Displacement)),
    ("u_foamTexture", UniformName::Texture(TextureSlot::Foam)),
];

impl UniformName {
    pub fn as_str(self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, name)| *name == self)
            .map(|(s, _)| *s)
            .unwrap_or("u_unknown")
    }
}

impl FromStr for UniformName {
    type Err = WaterError;

    fn from_str(s: &str) -> Result<Self> {
        NAMES
            .iter()
            .find(|(key, _)| *key == s)
            .map(|(_, name)| *name)
            .ok_or_else(|| WaterError::UnknownUniform(s.to_owned()))
    }
}

impl fmt::Display for UniformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Texture inputs of the fragment and vertex stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Depth,
    Scene,
    Displacement,
    Foam,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 4] = [
        TextureSlot::Depth,
        TextureSlot::Scene,
        TextureSlot::Displacement,
        TextureSlot::Foam,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TextureSlot::Depth => "u_depthTexture",
            TextureSlot::Scene => "u_sceneTexture",
            TextureSlot::Displacement => "u_displacementTexture",
            TextureSlot::Foam => "u_foamTexture",
        }
    }

    /// Feature bit that makes this slot mandatory.
    fn required_by(self) -> u32 {
        match self {
            TextureSlot::Depth => features::DEPTH,
            TextureSlot::Scene => features::SCENE,
            TextureSlot::Displacement => features::REFRACTION | features::DISPLACEMENT,
            TextureSlot::Foam => features::FOAM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3(Vec3),
    Vec4([f32; 4]),
    Color(Rgb),
    Matrix(Mat4),
    Texture(TextureHandle),
}

impl UniformValue {
    pub fn as_scalar(self, name: &'static str) -> Result<f32> {
        match self {
            UniformValue::Scalar(v) => Ok(v),
            _ => Err(WaterError::UniformTypeMismatch {
                name,
                expected: "scalar",
            }),
        }
    }

    pub fn as_color(self, name: &'static str) -> Result<Rgb> {
        match self {
            UniformValue::Color(c) => Ok(c),
            UniformValue::Vec3(v) => Ok(Rgb::new(v.x, v.y, v.z)),
            _ => Err(WaterError::UniformTypeMismatch {
                name,
                expected: "colour",
            }),
        }
    }

    fn as_vec2(self, name: &'static str) -> Result<[f32; 2]> {
        match self {
            UniformValue::Vec2(v) => Ok(v),
            _ => Err(WaterError::UniformTypeMismatch { name, expected: "vec2" }),
        }
    }

    pub fn as_vec3(self, name: &'static str) -> Result<Vec3> {
        match self {
            UniformValue::Vec3(v) => Ok(v),
            _ => Err(WaterError::UniformTypeMismatch { name, expected: "vec3" }),
        }
    }

    fn as_vec4(self, name: &'static str) -> Result<[f32; 4]> {
        match self {
            UniformValue::Vec4(v) => Ok(v),
            _ => Err(WaterError::UniformTypeMismatch { name, expected: "vec4" }),
        }
    }

    fn as_matrix(self, name: &'static str) -> Result<Mat4> {
        match self {
            UniformValue::Matrix(m) => Ok(m),
            _ => Err(WaterError::UniformTypeMismatch {
                name,
                expected: "matrix",
            }),
        }
    }

    fn as_texture(self, name: &'static str) -> Result<TextureHandle> {
        match self {
            UniformValue::Texture(t) => Ok(t),
            _ => Err(WaterError::UniformTypeMismatch {
                name,
                expected: "texture",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureSlots {
    pub depth: Option<TextureHandle>,
    pub scene: Option<TextureHandle>,
    pub displacement: Option<TextureHandle>,
    pub foam: Option<TextureHandle>,
}

impl TextureSlots {
    pub fn get(&self, slot: TextureSlot) -> Option<TextureHandle> {
        match slot {
            TextureSlot::Depth => self.depth,
            TextureSlot::Scene => self.scene,
            TextureSlot::Displacement => self.displacement,
            TextureSlot::Foam => self.foam,
        }
    }

    fn slot_mut(&mut self, slot: TextureSlot) -> &mut Option<TextureHandle> {
        match slot {
            TextureSlot::Depth => &mut self.depth,
            TextureSlot::Scene => &mut self.scene,
            TextureSlot::Displacement => &mut self.displacement,
            TextureSlot::Foam => &mut self.foam,
        }
    }
}

/// What the shader stage consumes for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSnapshot {
    pub block: WaterUniform,
    pub textures: TextureSlots,
}

/// Current value of every water shader input for one surface.
///
/// Scalars and vectors always have a value (the block starts from the
/// defaults); only texture slots can be absent.
#[derive(Debug, Clone)]
pub struct UniformStore {
    block: WaterUniform,
    textures: TextureSlots,
}

impl UniformStore {
    pub fn new(waves: &WaveSet) -> Self {
        let mut store = Self {
            block: WaterUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                model: Mat4::IDENTITY.to_cols_array_2d(),
                features: features::DEPTH,
                camera_near: 0.1,
                camera_far: 100.0,
                ..<WaterUniform as bytemuck::Zeroable>::zeroed()
            },
            textures: TextureSlots::default(),
        };
        store.sync_waves(waves);
        store.sync_parameters(&SurfaceParameters::default());
        store
    }

    pub fn block(&self) -> &WaterUniform {
        &self.block
    }

    pub fn textures(&self) -> &TextureSlots {
        &self.textures
    }

    pub fn features(&self) -> u32 {
        self.block.features
    }

    pub fn set_features(&mut self, features: u32) {
        self.block.features = features;
    }

    pub fn set_texture(&mut self, slot: TextureSlot, handle: TextureHandle) {
        *self.textures.slot_mut(slot) = Some(handle);
    }

    pub fn clear_texture(&mut self, slot: TextureSlot) {
        *self.textures.slot_mut(slot) = None;
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.block.model = model.to_cols_array_2d();
    }

    pub fn sync_waves(&mut self, waves: &WaveSet) {
        self.block.waves = waves.uniform_vectors();
        self.block.wave_speed = waves.speed().to_uniform();
    }

    pub fn sync_frame(&mut self, frame: &FrameState) {
        let (width, height) = frame.physical_resolution();
        let camera = &frame.camera;
        self.block.time = frame.elapsed;
        self.block.resolution = [width as f32, height as f32];
        self.block.camera_near = camera.near;
        self.block.camera_far = camera.far;
        self.block.camera_position = camera.position.extend(1.0).to_array();
        self.block.projection = match camera.projection {
            Projection::Perspective => 0,
            Projection::Orthographic => 1,
        };
        self.block.view_proj = camera.view_projection.to_cols_array_2d();
    }

    pub fn sync_parameters(&mut self, params: &SurfaceParameters) {
        self.block.shallow_color = params.shallow.to_array();
        self.block.deep_color = params.deep.to_array();
        self.block.foam_color = params.foam_color.to_array();
        self.block.horizon_color = params.horizon.to_array();
        self.block.horizon_position = params.horizon_position.extend(1.0).to_array();
        self.block.refraction = [
            params.refraction.scale,
            params.refraction.speed,
            params.refraction.strength,
            params.water_opacity,
        ];
        self.block.foam = [
            params.foam.scale,
            params.foam.speed,
            params.foam.amount,
            params.foam.cutoff,
        ];
        self.block.surface = [
            params.depth_falloff,
            params.amplitude,
            params.threshold,
            params.floor_depth,
        ];
    }

    /// Writes one input by its shader name. Last write wins.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let name: UniformName = name.parse()?;
        let key = name.as_str();
        let b = &mut self.block;
        match name {
            UniformName::Time => b.time = value.as_scalar(key)?,
            UniformName::Resolution => b.resolution = value.as_vec2(key)?,
            UniformName::CameraNear => b.camera_near = value.as_scalar(key)?,
            UniformName::CameraFar => b.camera_far = value.as_scalar(key)?,
            UniformName::CameraPosition => {
                b.camera_position = value.as_vec3(key)?.extend(1.0).to_array()
            }
            UniformName::ViewProjection => b.view_proj = value.as_matrix(key)?.to_cols_array_2d(),
            UniformName::ModelMatrix => b.model = value.as_matrix(key)?.to_cols_array_2d(),
            UniformName::ShallowColor => set_rgb(&mut b.shallow_color, value.as_color(key)?),
            UniformName::ShallowOpacity => b.shallow_color[3] = value.as_scalar(key)?,
            UniformName::DeepColor => set_rgb(&mut b.deep_color, value.as_color(key)?),
            UniformName::DeepOpacity => b.deep_color[3] = value.as_scalar(key)?,
            UniformName::FoamColor => set_rgb(&mut b.foam_color, value.as_color(key)?),
            UniformName::FoamOpacity => b.foam_color[3] = value.as_scalar(key)?,
            UniformName::HorizonColor => set_rgb(&mut b.horizon_color, value.as_color(key)?),
            UniformName::HorizonOpacity => b.horizon_color[3] = value.as_scalar(key)?,
            UniformName::HorizonPosition => {
                b.horizon_position = value.as_vec3(key)?.extend(1.0).to_array()
            }
            UniformName::WaterOpacity => b.refraction[3] = value.as_scalar(key)?,
            UniformName::Depth => b.surface[0] = value.as_scalar(key)?,
            UniformName::RefractionScale => b.refraction[0] = value.as_scalar(key)?,
            UniformName::RefractionSpeed => b.refraction[1] = value.as_scalar(key)?,
            UniformName::RefractionStrength => b.refraction[2] = value.as_scalar(key)?,
            UniformName::FoamScale => b.foam[0] = value.as_scalar(key)?,
            UniformName::FoamSpeed => b.foam[1] = value.as_scalar(key)?,
            UniformName::FoamAmount => b.foam[2] = value.as_scalar(key)?,
            UniformName::FoamCutoff => b.foam[3] = value.as_scalar(key)?,
            UniformName::Amplitude => b.surface[1] = value.as_scalar(key)?,
            UniformName::Threshold => b.surface[2] = value.as_scalar(key)?,
            UniformName::FarPlaneDepth => b.surface[3] = value.as_scalar(key)?,
            UniformName::Wave(i) => b.waves[i] = value.as_vec4(key)?,
            UniformName::Texture(slot) => {
                *self.textures.slot_mut(slot) = Some(value.as_texture(key)?)
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<UniformValue> {
        let name: UniformName = name.parse()?;
        let b = &self.block;
        let rgb = |c: [f32; 4]| UniformValue::Color(Rgb::new(c[0], c[1], c[2]));
        let value = match name {
            UniformName::Time => UniformValue::Scalar(b.time),
            UniformName::Resolution => UniformValue::Vec2(b.resolution),
            UniformName::CameraNear => UniformValue::Scalar(b.camera_near),
            UniformName::CameraFar => UniformValue::Scalar(b.camera_far),
            UniformName::CameraPosition => UniformValue::Vec3(Vec3::new(
                b.camera_position[0],
                b.camera_position[1],
                b.camera_position[2],
            )),
            UniformName::ViewProjection => {
                UniformValue::Matrix(Mat4::from_cols_array_2d(&b.view_proj))
            }
            UniformName::ModelMatrix => UniformValue::Matrix(Mat4::from_cols_array_2d(&b.model)),
            UniformName::ShallowColor => rgb(b.shallow_color),
            UniformName::ShallowOpacity => UniformValue::Scalar(b.shallow_color[3]),
            UniformName::DeepColor => rgb(b.deep_color),
            UniformName::DeepOpacity => UniformValue::Scalar(b.deep_color[3]),
            UniformName::FoamColor => rgb(b.foam_color),
            UniformName::FoamOpacity => UniformValue::Scalar(b.foam_color[3]),
            UniformName::HorizonColor => rgb(b.horizon_color),
            UniformName::HorizonOpacity => UniformValue::Scalar(b.horizon_color[3]),
            UniformName::HorizonPosition => UniformValue::Vec3(Vec3::new(
                b.horizon_position[0],
                b.horizon_position[1],
                b.horizon_position[2],
            )),
            UniformName::WaterOpacity => UniformValue::Scalar(b.refraction[3]),
            UniformName::Depth => UniformValue::Scalar(b.surface[0]),
            UniformName::RefractionScale => UniformValue::Scalar(b.refraction[0]),
            UniformName::RefractionSpeed => UniformValue::Scalar(b.refraction[1]),
            UniformName::RefractionStrength => UniformValue::Scalar(b.refraction[2]),
            UniformName::FoamScale => UniformValue::Scalar(b.foam[0]),
            UniformName::FoamSpeed => UniformValue::Scalar(b.foam[1]),
            UniformName::FoamAmount => UniformValue::Scalar(b.foam[2]),
            UniformName::FoamCutoff => UniformValue::Scalar(b.foam[3]),
            UniformName::Amplitude => UniformValue::Scalar(b.surface[1]),
            UniformName::Threshold => UniformValue::Scalar(b.surface[2]),
            UniformName::FarPlaneDepth => UniformValue::Scalar(b.surface[3]),
            UniformName::Wave(i) => UniformValue::Vec4(b.waves[i]),
            UniformName::Texture(slot) => UniformValue::Texture(
                self.textures
                    .get(slot)
                    .ok_or(WaterError::MissingUniform(slot.name()))?,
            ),
        };
        Ok(value)
    }

    /// Frozen copy for this frame's draw. Fails if a texture the active
    /// features sample was never provided.
    pub fn snapshot(&self) -> Result<UniformSnapshot> {
        for slot in TextureSlot::ALL {
            if self.block.features & slot.required_by() != 0 && self.textures.get(slot).is_none() {
                return Err(WaterError::MissingUniform(slot.name()));
            }
        }
        Ok(UniformSnapshot {
            block: self.block,
            textures: self.textures,
        })
    }
}

fn set_rgb(target: &mut [f32; 4], color: Rgb) {
    target[0] = color.r;
    target[1] = color.g;
    target[2] = color.b;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Attachment, TargetId};

    fn handle(id: u32) -> TextureHandle {
        TextureHandle::Target {
            target: TargetId(id),
            attachment: Attachment::Depth,
            generation: 0,
        }
    }

    #[test]
    fn block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<WaterUniform>(), 368);
        assert_eq!(std::mem::size_of::<WaterUniform>() % 16, 0);
    }

    #[test]
    fn snapshot_without_depth_texture_is_missing_uniform() {
        let store = UniformStore::new(&WaveSet::default());
        assert_eq!(
            store.snapshot().unwrap_err(),
            WaterError::MissingUniform("u_depthTexture")
        );
    }

    #[test]
    fn snapshot_checks_every_active_feature() {
        let mut store = UniformStore::new(&WaveSet::default());
        store.set_features(features::DEPTH | features::SCENE | features::REFRACTION);
        store.set_texture(TextureSlot::Depth, handle(0));
        assert_eq!(
            store.snapshot().unwrap_err(),
            WaterError::MissingUniform("u_sceneTexture")
        );
        store.set_texture(TextureSlot::Scene, handle(1));
        assert_eq!(
            store.snapshot().unwrap_err(),
            WaterError::MissingUniform("u_displacementTexture")
        );
        store.set_texture(TextureSlot::Displacement, TextureHandle::External(0));
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.textures.depth, Some(handle(0)));
        assert_eq!(snapshot.textures.foam, None);
    }

    #[test]
    fn set_then_get_is_last_write_wins() {
        let mut store = UniformStore::new(&WaveSet::default());
        store.set("u_foamAmount", UniformValue::Scalar(2.0)).unwrap();
        store.set("u_foamAmount", UniformValue::Scalar(7.0)).unwrap();
        assert_eq!(store.get("u_foamAmount").unwrap(), UniformValue::Scalar(7.0));
        assert_eq!(store.block().foam[2], 7.0);
    }

    #[test]
    fn textures_are_addressable_by_name() {
        let mut store = UniformStore::new(&WaveSet::default());
        assert_eq!(
            store.get("u_sceneTexture").unwrap_err(),
            WaterError::MissingUniform("u_sceneTexture")
        );
        store
            .set("u_sceneTexture", UniformValue::Texture(handle(3)))
            .unwrap();
        assert_eq!(store.get("u_sceneTexture").unwrap(), UniformValue::Texture(handle(3)));
    }

    #[test]
    fn rejects_unknown_names_and_wrong_kinds() {
        let mut store = UniformStore::new(&WaveSet::default());
        assert!(matches!(
            store.set("u_bogus", UniformValue::Scalar(1.0)),
            Err(WaterError::UnknownUniform(_))
        ));
        assert_eq!(
            store.set("u_time", UniformValue::Vec2([0.0, 1.0])),
            Err(WaterError::UniformTypeMismatch {
                name: "u_time",
                expected: "scalar"
            })
        );
    }

    #[test]
    fn waves_are_packed_on_creation() {
        let waves = WaveSet::default();
        let store = UniformStore::new(&waves);
        assert_eq!(store.block().waves, waves.uniform_vectors());
        assert_eq!(
            store.get("u_waveB").unwrap(),
            UniformValue::Vec4(waves.waves()[1].to_uniform())
        );
    }

    #[test]
    fn horizon_is_addressable_by_name() {
        let mut store = UniformStore::new(&WaveSet::default());
        let point = Vec3::new(-2.0, 4.0, 1.0);
        store.set("u_horizonPosition", UniformValue::Vec3(point)).unwrap();
        store.set("u_horizonOpacity", UniformValue::Scalar(0.6)).unwrap();
        assert_eq!(store.get("u_horizonPosition").unwrap(), UniformValue::Vec3(point));
        assert_eq!(store.block().horizon_position, [-2.0, 4.0, 1.0, 1.0]);
        assert_eq!(store.block().horizon_color[3], 0.6);
    }

    #[test]
    fn every_name_round_trips_through_its_string() {
        for (key, name) in NAMES {
            assert_eq!(name.as_str(), *key);
            assert_eq!(key.parse::<UniformName>().unwrap(), *name);
        }
    }
}
