use glam::{Mat4, Vec3};
use tidepool::{
    features, Attachment, CameraState, CapturePass, CaptureRequest, CapturedTextures, FrameOutcome, FramePipeline,
    FrameRenderer, FrameState, PassConfig, Projection, ScenePass, SurfaceParameters, TargetAllocator,
    TargetDescriptor, TextureHandle, TextureSlot, UniformSnapshot, UniformValue, Visibility, WaterError, WaterUniform,
    WaterVariant, WaveSet, RECOVERY_INTERVAL,
};

#[derive(Debug, Clone, PartialEq)]
struct FakeTarget {
    label: String,
    width: u32,
    height: u32,
}

#[derive(Default)]
struct RecordingAllocator {
    allocations: Vec<(String, TargetDescriptor)>,
    fail: bool,
}

impl TargetAllocator for RecordingAllocator {
    type Target = FakeTarget;

    fn allocate(&mut self, label: &str, desc: &TargetDescriptor) -> tidepool::Result<FakeTarget> {
        if self.fail {
            return Err(WaterError::TargetAllocationFailure {
                width: desc.width,
                height: desc.height,
                reason: "out of memory".into(),
            });
        }
        self.allocations.push((label.to_owned(), *desc));
        Ok(FakeTarget {
            label: label.to_owned(),
            width: desc.width,
            height: desc.height,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Capture {
        pass: CapturePass,
        surface: Visibility,
        target: String,
    },
    Draw {
        features: u32,
        depth: bool,
        scene: bool,
        time: f32,
    },
    Fallback([f32; 4]),
}

#[derive(Default)]
struct RecordingRenderer {
    events: Vec<Event>,
    fail_captures: bool,
}

impl FrameRenderer<FakeTarget> for RecordingRenderer {
    fn render_capture(&mut self, target: &FakeTarget, request: &CaptureRequest) -> tidepool::Result<()> {
        if self.fail_captures {
            return Err(WaterError::Capture("device lost".into()));
        }
        self.events.push(Event::Capture {
            pass: request.pass,
            surface: request.surface,
            target: target.label.clone(),
        });
        Ok(())
    }

    fn draw_surface(
        &mut self,
        snapshot: &UniformSnapshot,
        captured: CapturedTextures<'_, FakeTarget>,
    ) -> tidepool::Result<()> {
        self.events.push(Event::Draw {
            features: snapshot.block.features,
            depth: captured.depth.is_some(),
            scene: captured.scene.is_some(),
            time: snapshot.block.time,
        });
        Ok(())
    }

    fn draw_fallback(&mut self, _block: &WaterUniform, color: [f32; 4]) -> tidepool::Result<()> {
        self.events.push(Event::Fallback(color));
        Ok(())
    }
}

fn frame(elapsed: f32, resolution: (u32, u32), scale_factor: f64) -> FrameState {
    FrameState {
        elapsed,
        resolution,
        scale_factor,
        camera: CameraState {
            position: Vec3::new(0.0, 10.0, 0.0),
            near: 0.1,
            far: 17.0,
            projection: Projection::Orthographic,
            view_projection: Mat4::IDENTITY,
        },
    }
}

fn pipeline(variant: WaterVariant) -> FramePipeline<RecordingAllocator> {
    let mut pipeline = FramePipeline::new(
        RecordingAllocator::default(),
        variant.config(),
        WaveSet::default(),
        SurfaceParameters::default(),
    )
    .unwrap();
    pipeline
        .set_texture(TextureSlot::Displacement, TextureHandle::External(0))
        .unwrap();
    pipeline.set_texture(TextureSlot::Foam, TextureHandle::External(1)).unwrap();
    pipeline
}

#[test]
fn passes_run_in_order_with_the_surface_hidden() {
    let mut pipeline = pipeline(WaterVariant::Refractive);
    let mut renderer = RecordingRenderer::default();

    assert_eq!(pipeline.run_frame(&frame(0.5, (800, 600), 1.0), &mut renderer), FrameOutcome::Composited);
    assert_eq!(
        renderer.events,
        vec![
            Event::Capture {
                pass: CapturePass::Depth,
                surface: Visibility::Hidden,
                target: "water depth".into(),
            },
            Event::Capture {
                pass: CapturePass::Scene,
                surface: Visibility::Hidden,
                target: "water scene".into(),
            },
            Event::Draw {
                features: features::DEPTH
                    | features::SCENE
                    | features::REFRACTION
                    | features::FOAM
                    | features::DISPLACEMENT,
                depth: true,
                scene: true,
                time: 0.5,
            },
        ]
    );
    assert_eq!(pipeline.targets().bound(), None);
}

#[test]
fn depth_tint_variant_only_captures_depth() {
    let mut pipeline = pipeline(WaterVariant::DepthTint);
    let mut renderer = RecordingRenderer::default();

    assert_eq!(pipeline.run_frame(&frame(0.0, (64, 64), 1.0), &mut renderer), FrameOutcome::Composited);
    assert_eq!(renderer.events.len(), 2);
    assert!(matches!(renderer.events[0], Event::Capture { pass: CapturePass::Depth, .. }));
    assert!(matches!(
        renderer.events[1],
        Event::Draw {
            depth: true,
            scene: false,
            ..
        }
    ));
    assert_eq!(pipeline.scene_target(), None);
    assert_eq!(pipeline.targets().len(), 1);
}

#[test]
fn targets_track_the_physical_resolution() {
    let mut pipeline = pipeline(WaterVariant::Refractive);
    let mut renderer = RecordingRenderer::default();

    // 642.4 x 961.6 logical pixels; the window's physical size is what counts
    pipeline.run_frame(&frame(0.0, (803, 1202), 1.25), &mut renderer);
    let depth = pipeline.depth_target().unwrap();
    let desc = pipeline.targets().descriptor(depth).unwrap();
    assert_eq!((desc.width, desc.height), (803, 1202));
    assert_eq!(pipeline.uniforms().block().resolution, [803.0, 1202.0]);
    assert_eq!(pipeline.targets().allocator().allocations.len(), 2);

    // same size: nothing reallocated
    pipeline.run_frame(&frame(0.1, (803, 1202), 1.25), &mut renderer);
    assert_eq!(pipeline.targets().allocator().allocations.len(), 2);

    pipeline.run_frame(&frame(0.2, (1024, 768), 1.0), &mut renderer);
    let allocations = &pipeline.targets().allocator().allocations;
    assert_eq!(allocations.len(), 4);
    assert!(allocations[2..].iter().all(|(_, d)| (d.width, d.height) == (1024, 768)));
}

#[test]
fn captured_handles_follow_resizes() {
    let mut pipeline = pipeline(WaterVariant::Refractive);
    let mut renderer = RecordingRenderer::default();

    pipeline.run_frame(&frame(0.0, (100, 100), 1.0), &mut renderer);
    let first = pipeline.uniforms().textures().depth.unwrap();
    pipeline.run_frame(&frame(0.0, (200, 100), 1.0), &mut renderer);
    let second = pipeline.uniforms().textures().depth.unwrap();

    assert_ne!(first, second);
    let depth = pipeline.depth_target().unwrap();
    assert_eq!(pipeline.targets().texture(depth, Attachment::Depth).unwrap(), second);
    assert!(pipeline.targets().resolve(first).is_err());
}

#[test]
fn allocation_failure_degrades_then_recovers_on_resize() {
    let mut pipeline = pipeline(WaterVariant::Refractive);
    let mut renderer = RecordingRenderer::default();
    pipeline.allocator_mut().fail = true;

    let outcome = pipeline.run_frame(&frame(0.0, (800, 600), 1.0), &mut renderer);
    assert_eq!(outcome, FrameOutcome::Fallback);
    assert!(pipeline.is_degraded());
    assert_eq!(
        renderer.events,
        vec![Event::Fallback(SurfaceParameters::default().fallback_color())]
    );

    // allocator is healthy again, but nothing retries until the size changes
    pipeline.allocator_mut().fail = false;
    assert_eq!(
        pipeline.run_frame(&frame(0.1, (800, 600), 1.0), &mut renderer),
        FrameOutcome::Fallback
    );
    assert!(pipeline.targets().allocator().allocations.is_empty());

    assert_eq!(
        pipeline.run_frame(&frame(0.2, (640, 480), 1.0), &mut renderer),
        FrameOutcome::Composited
    );
    assert!(!pipeline.is_degraded());
}

#[test]
fn degraded_surface_retries_periodically() {
    let mut pipeline = pipeline(WaterVariant::Refractive);
    let mut renderer = RecordingRenderer::default();
    pipeline.allocator_mut().fail = true;
    let state = frame(0.0, (320, 240), 1.0);

    assert_eq!(pipeline.run_frame(&state, &mut renderer), FrameOutcome::Fallback);
    pipeline.allocator_mut().fail = false;
    for _ in 1..RECOVERY_INTERVAL {
        assert_eq!(pipeline.run_frame(&state, &mut renderer), FrameOutcome::Fallback);
    }
    assert_eq!(pipeline.run_frame(&state, &mut renderer), FrameOutcome::Composited);
}

#[test]
fn missing_asset_texture_skips_the_draw() {
    let mut pipeline = FramePipeline::new(
        RecordingAllocator::default(),
        WaterVariant::Refractive.config(),
        WaveSet::default(),
        SurfaceParameters::default(),
    )
    .unwrap();
    let mut renderer = RecordingRenderer::default();

    assert_eq!(pipeline.run_frame(&frame(0.0, (64, 64), 1.0), &mut renderer), FrameOutcome::Skipped);
    assert!(renderer.events.iter().all(|e| !matches!(e, Event::Draw { .. })));

    pipeline
        .set_texture(TextureSlot::Displacement, TextureHandle::External(0))
        .unwrap();
    pipeline.set_texture(TextureSlot::Foam, TextureHandle::External(1)).unwrap();
    assert_eq!(pipeline.run_frame(&frame(0.1, (64, 64), 1.0), &mut renderer), FrameOutcome::Composited);
}

#[test]
fn zero_sized_viewport_is_skipped() {
    let mut pipeline = pipeline(WaterVariant::Refractive);
    let mut renderer = RecordingRenderer::default();

    assert_eq!(pipeline.run_frame(&frame(0.0, (0, 600), 1.0), &mut renderer), FrameOutcome::Skipped);
    assert!(renderer.events.is_empty());
    assert!(pipeline.targets().is_empty());
    assert!(!pipeline.is_degraded());
}

#[test]
fn failed_capture_keeps_drawing() {
    let mut pipeline = pipeline(WaterVariant::Refractive);
    let mut renderer = RecordingRenderer::default();
    let state = frame(0.0, (64, 64), 1.0);

    pipeline.run_frame(&state, &mut renderer);
    let depth = pipeline.uniforms().textures().depth;

    renderer.fail_captures = true;
    assert_eq!(pipeline.run_frame(&state, &mut renderer), FrameOutcome::Composited);
    assert_eq!(pipeline.uniforms().textures().depth, depth);
    assert_eq!(pipeline.targets().bound(), None);
}

#[test]
fn failed_capture_after_resize_draws_without_the_stale_texture() {
    let mut pipeline = pipeline(WaterVariant::DepthTint);
    let mut renderer = RecordingRenderer::default();

    assert_eq!(pipeline.run_frame(&frame(0.0, (64, 64), 1.0), &mut renderer), FrameOutcome::Composited);
    let old = pipeline.uniforms().textures().depth.unwrap();

    renderer.fail_captures = true;
    assert_eq!(pipeline.run_frame(&frame(0.1, (128, 128), 1.0), &mut renderer), FrameOutcome::Composited);
    assert!(pipeline.targets().resolve(old).is_err());
    assert_eq!(pipeline.uniforms().textures().depth, None);
    assert!(matches!(
        renderer.events.last(),
        Some(Event::Draw { depth: false, features: bits, .. }) if bits & features::DEPTH == 0
    ));

    renderer.fail_captures = false;
    pipeline.run_frame(&frame(0.2, (128, 128), 1.0), &mut renderer);
    assert!(matches!(
        renderer.events.last(),
        Some(Event::Draw { depth: true, features: bits, .. }) if bits & features::DEPTH != 0
    ));
}

#[test]
fn disabling_the_scene_pass_releases_its_target() {
    let mut pipeline = pipeline(WaterVariant::Refractive);
    let mut renderer = RecordingRenderer::default();
    let state = frame(0.0, (64, 64), 1.0);

    pipeline.run_frame(&state, &mut renderer);
    let scene = pipeline.scene_target().unwrap();
    assert_eq!(pipeline.targets().len(), 2);

    pipeline.set_config(WaterVariant::DepthTint.config()).unwrap();
    assert_eq!(pipeline.run_frame(&state, &mut renderer), FrameOutcome::Composited);
    assert_eq!(pipeline.scene_target(), None);
    assert_eq!(pipeline.targets().len(), 1);
    assert!(pipeline.targets().get(scene).is_err());
    assert_eq!(pipeline.uniforms().textures().scene, None);

    // turning it back on allocates a fresh target
    pipeline.set_config(WaterVariant::Refractive.config()).unwrap();
    assert_eq!(pipeline.run_frame(&state, &mut renderer), FrameOutcome::Composited);
    assert_ne!(pipeline.scene_target(), Some(scene));
    assert_eq!(pipeline.targets().len(), 2);
}

#[test]
fn gated_scene_pass_follows_refraction_strength() {
    let config = PassConfig {
        scene_pass: ScenePass::WhenRefractionVisible,
        ..WaterVariant::Refractive.config()
    };
    let mut pipeline = FramePipeline::new(
        RecordingAllocator::default(),
        config,
        WaveSet::default(),
        SurfaceParameters::default(),
    )
    .unwrap();
    pipeline
        .set_texture(TextureSlot::Displacement, TextureHandle::External(0))
        .unwrap();
    pipeline.set_texture(TextureSlot::Foam, TextureHandle::External(1)).unwrap();
    let mut renderer = RecordingRenderer::default();

    pipeline
        .update_parameter("u_refractionStrength", UniformValue::Scalar(0.0))
        .unwrap();
    pipeline.run_frame(&frame(0.0, (64, 64), 1.0), &mut renderer);
    let captures = |events: &[Event]| {
        events
            .iter()
            .filter(|e| matches!(e, Event::Capture { pass: CapturePass::Scene, .. }))
            .count()
    };
    assert_eq!(captures(&renderer.events), 0);
    assert!(matches!(
        renderer.events.last(),
        Some(Event::Draw { scene: false, features: bits, .. }) if bits & features::SCENE == 0
    ));

    pipeline.parameters_mut().refraction.strength = 0.01;
    pipeline.run_frame(&frame(0.1, (64, 64), 1.0), &mut renderer);
    assert_eq!(captures(&renderer.events), 1);
}

#[test]
fn parameter_edits_reach_the_next_draw() {
    let mut pipeline = pipeline(WaterVariant::Stylised);
    let mut renderer = RecordingRenderer::default();

    pipeline.update_parameter("u_foamCutoff", UniformValue::Scalar(2.5)).unwrap();
    assert_eq!(pipeline.uniforms().block().foam[3], 2.5);
    pipeline.run_frame(&frame(0.0, (64, 64), 1.0), &mut renderer);
    assert_eq!(pipeline.uniforms().block().foam[3], 2.5);
    assert_eq!(pipeline.parameters().foam.cutoff, 2.5);

    assert_eq!(
        pipeline.set_texture(TextureSlot::Depth, TextureHandle::External(4)),
        Err(WaterError::ReadOnlyUniform("u_depthTexture"))
    );
}

#[test]
fn invalid_configurations_are_rejected_up_front() {
    let config = PassConfig {
        refraction: true,
        scene_pass: ScenePass::Disabled,
        ..WaterVariant::DepthTint.config()
    };
    let result = FramePipeline::new(
        RecordingAllocator::default(),
        config,
        WaveSet::default(),
        SurfaceParameters::default(),
    );
    assert!(matches!(result, Err(WaterError::InvalidConfiguration(_))));

    let visible_depth_capture = PassConfig {
        hide_surface_during_capture: false,
        ..WaterVariant::DepthTint.config()
    };
    let mut pipeline = pipeline(WaterVariant::DepthTint);
    assert!(matches!(
        pipeline.set_config(visible_depth_capture),
        Err(WaterError::InvalidConfiguration(_))
    ));
    assert_eq!(pipeline.config(), &WaterVariant::DepthTint.config());
}
