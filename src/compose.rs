//! CPU mirror of the `fs_main` colour math in `shaders/water.wgsl`.
//!
//! The GPU never calls into this module. It exists so the blend curves can be
//! checked without a device, and so hosts can predict what a pixel will look
//! like (picking, screenshots, tuning tools). Change both sides together.

use glam::Vec3;

use crate::params::{ColorStop, FoamParams, Projection};

/// Exponent on the horizon glow; higher is a tighter highlight.
pub const HORIZON_SHARPNESS: f32 = 8.0;

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [mix(a[0], b[0], t), mix(a[1], b[1], t), mix(a[2], b[2], t)]
}

/// Converts a `[0, 1]` depth-buffer value into view-space distance.
pub fn linearize_depth(depth: f32, near: f32, far: f32, projection: Projection) -> f32 {
    match projection {
        Projection::Perspective => near * far / (far - depth * (far - near)),
        Projection::Orthographic => near + depth * (far - near),
    }
}

/// How far along shallow -> deep a pixel is. Smooth, never a hard cutoff.
pub fn depth_blend_factor(water_depth: f32, falloff: f32) -> f32 {
    smoothstep(0.0, falloff, water_depth)
}

/// Water colour and opacity for a column of water `water_depth` deep.
pub fn depth_tint(water_depth: f32, falloff: f32, shallow: ColorStop, deep: ColorStop) -> [f32; 4] {
    let t = depth_blend_factor(water_depth, falloff);
    let rgb = mix3(shallow.color.to_array(), deep.color.to_array(), t);
    [rgb[0], rgb[1], rgb[2], mix(shallow.opacity, deep.opacity, t)]
}

/// How strongly the horizon glows at a surface point: the view ray
/// reflected about `normal`, compared against the direction to the horizon.
pub fn horizon_glint(normal: Vec3, to_eye: Vec3, to_horizon: Vec3) -> f32 {
    let n = normal.normalize_or_zero();
    let incident = -to_eye.normalize_or_zero();
    let reflected = incident - 2.0 * n.dot(incident) * n;
    reflected
        .dot(to_horizon.normalize_or_zero())
        .max(0.0)
        .powf(HORIZON_SHARPNESS)
}

/// Pulls the tint toward the horizon colour. Opacity is left alone.
pub fn horizon_tint(tint: [f32; 4], glint: f32, horizon: ColorStop) -> [f32; 4] {
    let rgb = mix3([tint[0], tint[1], tint[2]], horizon.color.to_array(), glint * horizon.opacity);
    [rgb[0], rgb[1], rgb[2], tint[3]]
}

/// Screen-space UV offset from a displacement sample in `[0, 1]`.
pub fn refraction_offset(noise: [f32; 2], strength: f32) -> [f32; 2] {
    [(noise[0] * 2.0 - 1.0) * strength, (noise[1] * 2.0 - 1.0) * strength]
}

/// Foam coverage at a pixel. Shallower water lowers the bar the noise has to
/// clear; past `cutoff` there is none.
pub fn foam_mask(water_depth: f32, noise: f32, foam: &FoamParams, threshold: f32) -> f32 {
    if foam.cutoff <= 0.0 || water_depth >= foam.cutoff {
        return 0.0;
    }
    let shore = 1.0 - (water_depth / foam.cutoff).clamp(0.0, 1.0);
    let edge = 1.0 - (shore * foam.amount).clamp(0.0, 1.0);
    let half = threshold * 0.5;
    smoothstep(edge - half, edge + half, noise)
}

/// Final pixel. With a captured `background` the water is opaque over it by
/// the tint's opacity and the whole result is blended at `water_opacity`;
/// without one the tint's own opacity goes to the framebuffer blend.
pub fn composite(
    background: Option<[f32; 3]>,
    tint: [f32; 4],
    foam_mask: f32,
    foam: ColorStop,
    water_opacity: f32,
) -> [f32; 4] {
    let tint_rgb = [tint[0], tint[1], tint[2]];
    let (rgb, alpha) = match background {
        Some(bg) => (mix3(bg, tint_rgb, tint[3]), water_opacity),
        None => (tint_rgb, tint[3]),
    };
    let f = foam_mask * foam.opacity;
    let rgb = mix3(rgb, foam.color.to_array(), f);
    [rgb[0], rgb[1], rgb[2], mix(alpha, 1.0, f)]
}
