//! Per-frame pass sequence for one water surface.
//!
//! Every displayed frame runs, in order:
//!
//! 1. pick the surface visibility for the capture passes
//! 2. depth capture (bind, render, unbind)
//! 3. scene colour capture (bind, render, unbind)
//! 4. back on the default framebuffer
//! 5. frame state and parameters pushed into the [`UniformStore`]
//! 6. the surface drawn from a snapshot of the store
//!
//! Failures stay inside the frame that hit them. A failed capture keeps last
//! frame's texture (or, if a resize just invalidated it, drops that input for
//! the frame), a missing asset texture skips the draw, and an allocation
//! failure drops the surface to a flat colour until targets can be allocated
//! again.

use glam::Mat4;
use log::{debug, error, info, warn};

use crate::params::{CameraState, FrameState, PassConfig, ScenePass, SurfaceParameters};
use crate::target::{Attachment, RenderTargetManager, TargetAllocator, TargetId, TargetKind, TextureHandle};
use crate::uniforms::{features, TextureSlot, UniformSnapshot, UniformStore, UniformValue, WaterUniform};
use crate::waves::WaveSet;
use crate::{Result, WaterError};

/// Frames between reallocation attempts while degraded.
pub const RECOVERY_INTERVAL: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePass {
    Depth,
    Scene,
}

/// One capture the host has to render. `surface` applies to this pass only;
/// the host must not carry it over to other draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    pub pass: CapturePass,
    pub surface: Visibility,
    pub camera: CameraState,
}

/// Captured targets the draw samples from, already checked against the
/// current generation.
pub struct CapturedTextures<'a, T> {
    pub depth: Option<&'a T>,
    pub scene: Option<&'a T>,
}

/// Host side of a frame: renders the scene into capture targets and encodes
/// the final surface draw.
pub trait FrameRenderer<T> {
    fn render_capture(&mut self, target: &T, request: &CaptureRequest) -> Result<()>;

    fn draw_surface(&mut self, snapshot: &UniformSnapshot, captured: CapturedTextures<'_, T>) -> Result<()>;

    /// Flat-colour draw used while the surface is degraded. `block` carries
    /// this frame's transforms.
    fn draw_fallback(&mut self, block: &WaterUniform, color: [f32; 4]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Full pass sequence ran and the surface was drawn.
    Composited,
    /// Capture passes disabled, flat colour drawn.
    Fallback,
    /// Nothing drawn for the surface this frame.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
enum SurfaceState {
    Active,
    Degraded {
        reason: WaterError,
        last_attempt: u64,
        size: (u32, u32),
    },
}

pub struct FramePipeline<A: TargetAllocator> {
    config: PassConfig,
    waves: WaveSet,
    params: SurfaceParameters,
    store: UniformStore,
    targets: RenderTargetManager<A>,
    depth_target: Option<TargetId>,
    scene_target: Option<TargetId>,
    /// Physical size the targets were last allocated at.
    resolution: Option<(u32, u32)>,
    state: SurfaceState,
    frame_index: u64,
}

impl<A: TargetAllocator> FramePipeline<A> {
    pub fn new(allocator: A, config: PassConfig, waves: WaveSet, params: SurfaceParameters) -> Result<Self> {
        config.validate()?;
        let mut store = UniformStore::new(&waves);
        store.sync_parameters(&params);
        Ok(Self {
            config,
            waves,
            params,
            store,
            targets: RenderTargetManager::new(allocator),
            depth_target: None,
            scene_target: None,
            resolution: None,
            state: SurfaceState::Active,
            frame_index: 0,
        })
    }

    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    /// Switches passes at runtime. Targets are checked again on the next frame.
    pub fn set_config(&mut self, config: PassConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.resolution = None;
        Ok(())
    }

    pub fn waves(&self) -> &WaveSet {
        &self.waves
    }

    pub fn parameters(&self) -> &SurfaceParameters {
        &self.params
    }

    /// Edits land in the store during the next frame's sync.
    pub fn parameters_mut(&mut self) -> &mut SurfaceParameters {
        &mut self.params
    }

    /// Name-addressed edit from a parameter panel; visible from the very next draw.
    pub fn update_parameter(&mut self, name: &str, value: UniformValue) -> Result<()> {
        self.params.apply(name, value)?;
        self.store.set(name, value)
    }

    pub fn uniforms(&self) -> &UniformStore {
        &self.store
    }

    /// Supplies an asset texture. Captured slots are owned by the pipeline.
    pub fn set_texture(&mut self, slot: TextureSlot, handle: TextureHandle) -> Result<()> {
        match slot {
            TextureSlot::Depth | TextureSlot::Scene => Err(WaterError::ReadOnlyUniform(slot.name())),
            TextureSlot::Displacement | TextureSlot::Foam => {
                self.store.set_texture(slot, handle);
                Ok(())
            }
        }
    }

    /// Placement of the surface mesh in the world.
    pub fn set_transform(&mut self, model: Mat4) {
        self.store.set_model(model);
    }

    pub fn targets(&self) -> &RenderTargetManager<A> {
        &self.targets
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        self.targets.allocator_mut()
    }

    pub fn depth_target(&self) -> Option<TargetId> {
        self.depth_target
    }

    pub fn scene_target(&self) -> Option<TargetId> {
        self.scene_target
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.state, SurfaceState::Degraded { .. })
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn run_frame<R: FrameRenderer<A::Target>>(&mut self, frame: &FrameState, renderer: &mut R) -> FrameOutcome {
        self.frame_index += 1;
        let resolution = frame.physical_resolution();
        if resolution.0 == 0 || resolution.1 == 0 {
            debug!("frame {}: zero-sized viewport, skipping surface", self.frame_index);
            return FrameOutcome::Skipped;
        }

        if !self.prepare_targets(resolution) {
            return self.draw_fallback(frame, renderer);
        }

        let surface = if self.config.hide_surface_during_capture {
            Visibility::Hidden
        } else {
            Visibility::Visible
        };

        if let Some(id) = self.depth_target.filter(|_| self.config.depth_pass) {
            let request = CaptureRequest {
                pass: CapturePass::Depth,
                surface,
                camera: frame.camera,
            };
            self.capture(id, Attachment::Depth, TextureSlot::Depth, &request, renderer);
        }

        let scene_live = self.config.wants_scene_pass(&self.params);
        if let Some(id) = self.scene_target.filter(|_| scene_live) {
            let request = CaptureRequest {
                pass: CapturePass::Scene,
                surface,
                camera: frame.camera,
            };
            self.capture(id, Attachment::Color, TextureSlot::Scene, &request, renderer);
        }

        debug_assert_eq!(self.targets.bound(), None);

        self.store.sync_frame(frame);
        self.store.sync_parameters(&self.params);
        self.store.set_features(self.active_features(scene_live));

        let snapshot = match self.store.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("frame {}: surface draw skipped: {e}", self.frame_index);
                return FrameOutcome::Skipped;
            }
        };
        let captured = match self.resolve_captured(&snapshot) {
            Ok(captured) => captured,
            Err(e) => {
                warn!("frame {}: surface draw skipped: {e}", self.frame_index);
                return FrameOutcome::Skipped;
            }
        };
        match renderer.draw_surface(&snapshot, captured) {
            Ok(()) => FrameOutcome::Composited,
            Err(e) => {
                error!("frame {}: surface draw failed: {e}", self.frame_index);
                FrameOutcome::Skipped
            }
        }
    }

    /// Makes sure the capture targets exist at `resolution`. Returns `false`
    /// while the surface is degraded.
    fn prepare_targets(&mut self, resolution: (u32, u32)) -> bool {
        match self.state {
            SurfaceState::Active if self.resolution == Some(resolution) => return true,
            SurfaceState::Degraded { last_attempt, size, .. } => {
                let due = self.frame_index.saturating_sub(last_attempt) >= RECOVERY_INTERVAL;
                if size == resolution && !due {
                    return false;
                }
            }
            SurfaceState::Active => {}
        }

        match self.ensure_targets(resolution) {
            Ok(()) => {
                if let SurfaceState::Degraded { reason, .. } = &self.state {
                    info!("surface recovered from: {reason}");
                }
                self.state = SurfaceState::Active;
                self.resolution = Some(resolution);
                true
            }
            Err(reason) => {
                error!(
                    "frame {}: capture targets unavailable, drawing flat colour: {reason}",
                    self.frame_index
                );
                self.state = SurfaceState::Degraded {
                    reason,
                    last_attempt: self.frame_index,
                    size: resolution,
                };
                false
            }
        }
    }

    fn ensure_targets(&mut self, (width, height): (u32, u32)) -> Result<()> {
        if self.config.depth_pass {
            self.depth_target = Some(self.ensure_target("water depth", self.depth_target, width, height)?);
        } else if let Some(id) = self.depth_target.take() {
            self.release_target(id, TextureSlot::Depth);
        }
        if self.config.scene_pass != ScenePass::Disabled {
            self.scene_target = Some(self.ensure_target("water scene", self.scene_target, width, height)?);
        } else if let Some(id) = self.scene_target.take() {
            self.release_target(id, TextureSlot::Scene);
        }
        Ok(())
    }

    fn release_target(&mut self, id: TargetId, slot: TextureSlot) {
        self.store.clear_texture(slot);
        if let Err(e) = self.targets.release(id) {
            warn!("could not release {} target: {e}", slot.name());
        }
    }

    fn ensure_target(&mut self, label: &str, existing: Option<TargetId>, width: u32, height: u32) -> Result<TargetId> {
        match existing {
            Some(id) => {
                self.targets.resize(id, width, height)?;
                Ok(id)
            }
            None => self.targets.acquire(label, TargetKind::ColorAndDepth, width, height),
        }
    }

    fn capture<R: FrameRenderer<A::Target>>(
        &mut self,
        id: TargetId,
        attachment: Attachment,
        slot: TextureSlot,
        request: &CaptureRequest,
        renderer: &mut R,
    ) {
        if let Err(e) = self.targets.bind(id) {
            warn!("{:?} capture not started: {e}", request.pass);
            return;
        }
        let rendered = self
            .targets
            .get(id)
            .and_then(|target| renderer.render_capture(target, request));
        self.targets.unbind();

        match rendered.and_then(|()| self.targets.texture(id, attachment)) {
            Ok(handle) => self.store.set_texture(slot, handle),
            Err(e) => {
                let stale = self
                    .store
                    .textures()
                    .get(slot)
                    .is_some_and(|held| self.targets.resolve(held).is_err());
                if stale {
                    // the previous texture went away with a resize this frame
                    self.store.clear_texture(slot);
                    warn!(
                        "frame {}: {:?} capture failed, drawing without it: {e}",
                        self.frame_index, request.pass
                    );
                } else {
                    warn!(
                        "frame {}: {:?} capture failed, keeping previous texture: {e}",
                        self.frame_index, request.pass
                    );
                }
            }
        }
    }

    /// Captured inputs only count once a capture has produced them.
    fn active_features(&self, scene_live: bool) -> u32 {
        let textures = self.store.textures();
        let mut bits = 0;
        if self.config.depth_pass && textures.depth.is_some() {
            bits |= features::DEPTH;
        }
        if scene_live && textures.scene.is_some() {
            bits |= features::SCENE;
            if self.config.refraction_live(&self.params) {
                bits |= features::REFRACTION;
            }
        }
        if self.config.foam {
            bits |= features::FOAM;
        }
        if textures.displacement.is_some() && self.params.amplitude != 0.0 {
            bits |= features::DISPLACEMENT;
        }
        bits
    }

    fn resolve_captured(&self, snapshot: &UniformSnapshot) -> Result<CapturedTextures<'_, A::Target>> {
        let bits = snapshot.block.features;
        let lookup = |handle: Option<TextureHandle>, bit: u32| -> Result<Option<&A::Target>> {
            match handle {
                Some(handle) if bits & bit != 0 => self.targets.resolve(handle),
                _ => Ok(None),
            }
        };
        Ok(CapturedTextures {
            depth: lookup(snapshot.textures.depth, features::DEPTH)?,
            scene: lookup(snapshot.textures.scene, features::SCENE)?,
        })
    }

    fn draw_fallback<R: FrameRenderer<A::Target>>(&mut self, frame: &FrameState, renderer: &mut R) -> FrameOutcome {
        self.store.sync_frame(frame);
        self.store.sync_parameters(&self.params);
        match renderer.draw_fallback(self.store.block(), self.params.fallback_color()) {
            Ok(()) => FrameOutcome::Fallback,
            Err(e) => {
                error!("frame {}: fallback draw failed: {e}", self.frame_index);
                FrameOutcome::Skipped
            }
        }
    }
}
