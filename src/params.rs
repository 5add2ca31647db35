use std::str::FromStr;

use glam::{Mat4, Vec3};

use crate::uniforms::{UniformName, UniformValue};
use crate::{Result, WaterError};

/// Linear RGB triple in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `0xrrggbb` in sRGB, as colour pickers write it.
    pub fn from_hex(hex: u32) -> Self {
        Self::from_bytes((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// sRGB-encoded channels, decoded to linear.
    pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
        Self::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(v: [f32; 3]) -> Self {
        Rgb::new(v[0], v[1], v[2])
    }
}

/// Accepts `#rrggbb` and `rgb(r, g, b)`, the formats the parameter panel emits.
impl FromStr for Rgb {
    type Err = WaterError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || WaterError::InvalidConfiguration(format!("unrecognised colour '{s}'"));
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(invalid());
            }
            return u32::from_str_radix(hex, 16).map(Rgb::from_hex).map_err(|_| invalid());
        }
        let inner = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let channels = inner
            .split(',')
            .map(|c| c.trim().parse::<u8>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        match channels[..] {
            [r, g, b] => Ok(Rgb::from_bytes(r, g, b)),
            _ => Err(invalid()),
        }
    }
}

/// A colour together with the opacity it is blended at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub color: Rgb,
    pub opacity: f32,
}

impl ColorStop {
    pub const fn new(color: Rgb, opacity: f32) -> Self {
        Self { color, opacity }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.color.r, self.color.g, self.color.b, self.opacity]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefractionParams {
    /// Tiling of the displacement texture across the screen.
    pub scale: f32,
    pub speed: f32,
    /// UV offset applied to the scene sample; 0 disables the effect visually.
    pub strength: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoamParams {
    pub scale: f32,
    pub speed: f32,
    pub amount: f32,
    /// Water depth past which no foam is drawn.
    pub cutoff: f32,
}

/// Live-editable look of one water surface.
///
/// Values are not clamped; opacities outside `[0, 1]` pass straight through to
/// the blend.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceParameters {
    pub shallow: ColorStop,
    pub deep: ColorStop,
    pub foam_color: ColorStop,
    /// Glow reflected off the surface where it faces `horizon_position`.
    /// The opacity is the strength of the glow.
    pub horizon: ColorStop,
    pub horizon_position: Vec3,
    pub water_opacity: f32,
    /// Depth over which shallow fades into deep.
    pub depth_falloff: f32,
    pub refraction: RefractionParams,
    pub foam: FoamParams,
    /// Height of the displacement-texture ripple added on top of the waves.
    pub amplitude: f32,
    /// Softness of the foam edge.
    pub threshold: f32,
    /// Depth of the floor below the surface, used when no depth capture runs.
    pub floor_depth: f32,
}

impl Default for SurfaceParameters {
    fn default() -> Self {
        Self {
            shallow: ColorStop::new(Rgb::from_hex(0x146aff), 0.48),
            deep: ColorStop::new(Rgb::from_hex(0x1f4d9c), 0.92),
            foam_color: ColorStop::new(Rgb::WHITE, 1.0),
            horizon: ColorStop::new(Rgb::from_hex(0xffa500), 0.35),
            horizon_position: Vec3::new(3.0, 3.0, 3.0),
            water_opacity: 0.5,
            depth_falloff: 9.91,
            refraction: RefractionParams {
                scale: 50.0,
                speed: 0.3,
                strength: 0.0047,
            },
            foam: FoamParams {
                scale: 35.0,
                speed: 0.2,
                amount: 4.5,
                cutoff: 5.0,
            },
            amplitude: 0.05,
            threshold: 0.1,
            floor_depth: 0.0,
        }
    }
}

impl SurfaceParameters {
    pub fn with_colors(mut self, shallow: ColorStop, deep: ColorStop) -> Self {
        self.shallow = shallow;
        self.deep = deep;
        self
    }

    pub fn with_refraction(mut self, refraction: RefractionParams) -> Self {
        self.refraction = refraction;
        self
    }

    pub fn with_foam(mut self, foam: FoamParams) -> Self {
        self.foam = foam;
        self
    }

    /// Colour drawn while the surface runs without its capture passes.
    pub fn fallback_color(&self) -> [f32; 4] {
        let c = self.shallow.color.lerp(self.deep.color, 0.5);
        [c.r, c.g, c.b, self.water_opacity]
    }

    /// Applies one name-addressed edit, as sent by the parameter panel.
    pub fn apply(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let name: UniformName = name.parse()?;
        let key = name.as_str();
        match name {
            UniformName::ShallowColor => self.shallow.color = value.as_color(key)?,
            UniformName::ShallowOpacity => self.shallow.opacity = value.as_scalar(key)?,
            UniformName::DeepColor => self.deep.color = value.as_color(key)?,
            UniformName::DeepOpacity => self.deep.opacity = value.as_scalar(key)?,
            UniformName::FoamColor => self.foam_color.color = value.as_color(key)?,
            UniformName::FoamOpacity => self.foam_color.opacity = value.as_scalar(key)?,
            UniformName::HorizonColor => self.horizon.color = value.as_color(key)?,
            UniformName::HorizonOpacity => self.horizon.opacity = value.as_scalar(key)?,
            UniformName::HorizonPosition => self.horizon_position = value.as_vec3(key)?,
            UniformName::WaterOpacity => self.water_opacity = value.as_scalar(key)?,
            UniformName::Depth => self.depth_falloff = value.as_scalar(key)?,
            UniformName::RefractionScale => self.refraction.scale = value.as_scalar(key)?,
            UniformName::RefractionSpeed => self.refraction.speed = value.as_scalar(key)?,
            UniformName::RefractionStrength => self.refraction.strength = value.as_scalar(key)?,
            UniformName::FoamScale => self.foam.scale = value.as_scalar(key)?,
            UniformName::FoamSpeed => self.foam.speed = value.as_scalar(key)?,
            UniformName::FoamAmount => self.foam.amount = value.as_scalar(key)?,
            UniformName::FoamCutoff => self.foam.cutoff = value.as_scalar(key)?,
            UniformName::Amplitude => self.amplitude = value.as_scalar(key)?,
            UniformName::Threshold => self.threshold = value.as_scalar(key)?,
            UniformName::FarPlaneDepth => self.floor_depth = value.as_scalar(key)?,
            other => return Err(WaterError::ReadOnlyUniform(other.as_str())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
    pub projection: Projection,
    pub view_projection: Mat4,
}

/// Per-frame input from the host. Recomputed every frame, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Seconds since the surface started animating.
    pub elapsed: f32,
    /// Viewport size in physical pixels, as the window system reports it.
    pub resolution: (u32, u32),
    /// Device pixel ratio.
    pub scale_factor: f64,
    pub camera: CameraState,
}

impl FrameState {
    /// Physical size of a viewport known only in logical pixels.
    pub fn physical_from_logical(logical: (f64, f64), scale_factor: f64) -> (u32, u32) {
        let scale = |v: f64| (v * scale_factor).floor() as u32;
        (scale(logical.0), scale(logical.1))
    }

    /// Size the capture targets are allocated at.
    pub fn physical_resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn logical_size(&self) -> (f64, f64) {
        (
            self.resolution.0 as f64 / self.scale_factor,
            self.resolution.1 as f64 / self.scale_factor,
        )
    }
}

/// When the scene-colour capture runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePass {
    Disabled,
    /// Every frame, whatever the refraction settings.
    Always,
    /// Only while refraction is enabled with a non-zero strength.
    WhenRefractionVisible,
}

/// Which passes and effects a surface runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassConfig {
    pub depth_pass: bool,
    pub scene_pass: ScenePass,
    pub foam: bool,
    pub refraction: bool,
    /// Hide the surface from its own capture passes.
    pub hide_surface_during_capture: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        WaterVariant::Refractive.config()
    }
}

impl PassConfig {
    pub fn validate(&self) -> Result<()> {
        if self.refraction && self.scene_pass == ScenePass::Disabled {
            return Err(WaterError::InvalidConfiguration(
                "refraction samples the scene texture but the scene pass is disabled".into(),
            ));
        }
        let captures = self.depth_pass || self.scene_pass != ScenePass::Disabled;
        if captures && !self.hide_surface_during_capture {
            return Err(WaterError::InvalidConfiguration(
                "capture passes must hide the surface or it samples its own output".into(),
            ));
        }
        Ok(())
    }

    /// Whether the scene capture runs this frame.
    pub fn wants_scene_pass(&self, params: &SurfaceParameters) -> bool {
        match self.scene_pass {
            ScenePass::Disabled => false,
            ScenePass::Always => true,
            ScenePass::WhenRefractionVisible => self.refraction_live(params),
        }
    }

    /// Whether the fragment stage should sample the scene texture this frame.
    pub fn refraction_live(&self, params: &SurfaceParameters) -> bool {
        self.refraction && params.refraction.strength != 0.0
    }
}

/// Pass layouts of the water surfaces this renderer replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterVariant {
    /// Depth capture only, colour from depth tint.
    DepthTint,
    /// Depth and scene capture, tint and foam, no refraction.
    Stylised,
    /// Depth and scene capture with refraction and foam.
    Refractive,
}

impl WaterVariant {
    pub fn config(self) -> PassConfig {
        match self {
            WaterVariant::DepthTint => PassConfig {
                depth_pass: true,
                scene_pass: ScenePass::Disabled,
                foam: false,
                refraction: false,
                hide_surface_during_capture: true,
            },
            WaterVariant::Stylised => PassConfig {
                depth_pass: true,
                scene_pass: ScenePass::Always,
                foam: true,
                refraction: false,
                hide_surface_during_capture: true,
            },
            WaterVariant::Refractive => PassConfig {
                depth_pass: true,
                scene_pass: ScenePass::Always,
                foam: true,
                refraction: true,
                hide_surface_during_capture: true,
            },
        }
    }
}
