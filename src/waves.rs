//! Gerstner wave composition.
//!
//! CPU-side evaluation of the same wave sum that `shaders/water.wgsl` applies in
//! `vs_main`. Keep the two in step: anything sampling the surface on the CPU
//! (buoyancy, camera clipping, tests) relies on matching results.
//!
//! Callers own the steepness budget. The sum of all steepness values should
//! stay well below 1.0, otherwise neighbouring crests fold over each other and
//! the surface self-intersects. Nothing here clamps it.

use glam::{Vec2, Vec3};
use std::f32::consts::PI;

use crate::{Result, WaterError};

/// Maximum number of waves the uniform block carries (A-D).
pub const MAX_WAVES: usize = 4;

/// Gravity used by [`PhaseSpeed::Deep`] (m/s²).
pub const GRAVITY: f32 = 9.8;

/// A single Gerstner wave. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveDescriptor {
    direction_degrees: f32,
    /// Unit direction on the XZ plane, `(sin θ, cos θ)`.
    direction: Vec2,
    steepness: f32,
    wavelength: f32,
}

impl WaveDescriptor {
    pub fn new(direction_degrees: f32, steepness: f32, wavelength: f32) -> Result<Self> {
        if !(wavelength.is_finite() && wavelength > 0.0) {
            return Err(WaterError::InvalidWaveDescriptor { wavelength });
        }
        Ok(Self::from_parts(direction_degrees, steepness, wavelength))
    }

    fn from_parts(direction_degrees: f32, steepness: f32, wavelength: f32) -> Self {
        let radians = direction_degrees.to_radians();
        Self {
            direction_degrees,
            direction: Vec2::new(radians.sin(), radians.cos()),
            steepness,
            wavelength,
        }
    }

    pub fn direction_degrees(&self) -> f32 {
        self.direction_degrees
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn steepness(&self) -> f32 {
        self.steepness
    }

    pub fn wavelength(&self) -> f32 {
        self.wavelength
    }

    /// Angular wavenumber `k = 2π / λ`.
    pub fn wavenumber(&self) -> f32 {
        2.0 * PI / self.wavelength
    }

    /// `{sin(direction), cos(direction), steepness, wavelength}` as read by the vertex stage.
    pub fn to_uniform(&self) -> [f32; 4] {
        [self.direction.x, self.direction.y, self.steepness, self.wavelength]
    }
}

/// How fast a wave's phase travels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseSpeed {
    /// Same speed for every wave, in world units per second.
    Constant(f32),
    /// Deep-water dispersion, `c = sqrt(g / k)`.
    Deep { gravity: f32 },
}

impl Default for PhaseSpeed {
    fn default() -> Self {
        PhaseSpeed::Constant(1.0)
    }
}

impl PhaseSpeed {
    pub fn speed(&self, wave: &WaveDescriptor) -> f32 {
        match *self {
            PhaseSpeed::Constant(c) => c,
            PhaseSpeed::Deep { gravity } => (gravity / wave.wavenumber()).sqrt(),
        }
    }

    /// Value published to the shader: the constant speed, or the negated
    /// gravity to select the dispersion branch.
    pub fn to_uniform(&self) -> f32 {
        match *self {
            PhaseSpeed::Constant(c) => c,
            PhaseSpeed::Deep { gravity } => -gravity,
        }
    }
}

/// Result of evaluating a [`WaveSet`] at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSample {
    /// Offset to add to the undisplaced surface position.
    pub displacement: Vec3,
    /// Normalised surface normal after displacement.
    pub normal: Vec3,
}

/// Ordered set of up to four waves, summed additively.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSet {
    waves: Vec<WaveDescriptor>,
    speed: PhaseSpeed,
}

impl Default for WaveSet {
    fn default() -> Self {
        let waves = [(0.0, 0.01, 30.0), (30.0, 0.02, 30.0), (60.0, 0.005, 30.0), (90.0, 0.015, 30.0)]
            .into_iter()
            .map(|(direction, steepness, wavelength)| {
                WaveDescriptor::from_parts(direction, steepness, wavelength)
            })
            .collect();
        Self {
            waves,
            speed: PhaseSpeed::default(),
        }
    }
}

impl WaveSet {
    pub fn new(waves: Vec<WaveDescriptor>) -> Result<Self> {
        if waves.len() > MAX_WAVES {
            return Err(WaterError::InvalidConfiguration(format!(
                "a wave set holds at most {MAX_WAVES} waves, got {}",
                waves.len()
            )));
        }
        Ok(Self {
            waves,
            speed: PhaseSpeed::default(),
        })
    }

    pub fn with_speed(mut self, speed: PhaseSpeed) -> Self {
        self.speed = speed;
        self
    }

    pub fn waves(&self) -> &[WaveDescriptor] {
        &self.waves
    }

    pub fn speed(&self) -> PhaseSpeed {
        self.speed
    }

    /// Time after which a single wave repeats itself.
    pub fn period(&self, wave: &WaveDescriptor) -> f32 {
        wave.wavelength / self.speed.speed(wave)
    }

    /// Sum of all wave contributions at `position` (surface-local XZ) and `time` seconds.
    pub fn evaluate(&self, position: Vec2, time: f32) -> WaveSample {
        let mut displacement = Vec3::ZERO;
        let mut tangent = Vec3::X;
        let mut binormal = Vec3::Z;

        for wave in &self.waves {
            let k = wave.wavenumber();
            let c = self.speed.speed(wave);
            let d = wave.direction;
            let f = k * (d.dot(position) + c * time);
            let a = wave.steepness / k;
            let (sin_f, cos_f) = f.sin_cos();

            displacement += Vec3::new(d.x * a * cos_f, a * sin_f, d.y * a * cos_f);

            let s = wave.steepness;
            tangent += Vec3::new(-d.x * d.x * s * sin_f, d.x * s * cos_f, -d.x * d.y * s * sin_f);
            binormal += Vec3::new(-d.x * d.y * s * sin_f, d.y * s * cos_f, -d.y * d.y * s * sin_f);
        }

        WaveSample {
            displacement,
            normal: binormal.cross(tangent).normalize(),
        }
    }

    pub fn height_at(&self, position: Vec2, time: f32) -> f32 {
        self.evaluate(position, time).displacement.y
    }

    /// Packed wave vectors for the uniform block; unused slots are all zero
    /// except for a unit wavelength so the shader never divides by zero.
    pub fn uniform_vectors(&self) -> [[f32; 4]; MAX_WAVES] {
        let mut out = [[0.0, 0.0, 0.0, 1.0]; MAX_WAVES];
        for (slot, wave) in out.iter_mut().zip(&self.waves) {
            *slot = wave.to_uniform();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn single(direction: f32, steepness: f32, wavelength: f32) -> WaveSet {
        WaveSet::new(vec![WaveDescriptor::new(direction, steepness, wavelength).unwrap()]).unwrap()
    }

    #[test]
    fn rejects_non_positive_wavelength() {
        assert_eq!(
            WaveDescriptor::new(0.0, 0.1, 0.0),
            Err(WaterError::InvalidWaveDescriptor { wavelength: 0.0 })
        );
        assert!(WaveDescriptor::new(0.0, 0.1, -3.0).is_err());
        assert!(WaveDescriptor::new(0.0, 0.1, f32::NAN).is_err());
    }

    #[test]
    fn rejects_more_than_four_waves() {
        let wave = WaveDescriptor::new(0.0, 0.1, 10.0).unwrap();
        assert!(WaveSet::new(vec![wave; 5]).is_err());
    }

    #[test]
    fn direction_is_converted_once() {
        let wave = WaveDescriptor::new(90.0, 0.1, 10.0).unwrap();
        assert!((wave.direction().x - 1.0).abs() < EPS);
        assert!(wave.direction().y.abs() < EPS);
        assert_eq!(wave.direction_degrees(), 90.0);
    }

    #[test]
    fn origin_at_time_zero_has_no_vertical_offset() {
        let waves = single(0.0, 0.01, 30.0);
        let sample = waves.evaluate(Vec2::ZERO, 0.0);
        assert!(sample.displacement.y.abs() < EPS);
    }

    #[test]
    fn quarter_period_is_a_crest() {
        let waves = single(0.0, 0.01, 30.0);
        let wave = waves.waves()[0];
        assert!((waves.period(&wave) - 30.0).abs() < EPS);

        let amplitude = wave.steepness() / wave.wavenumber();
        let peak = waves.height_at(Vec2::ZERO, 7.5);
        assert!((peak - amplitude).abs() < EPS);
        assert!(peak >= waves.height_at(Vec2::ZERO, 7.3));
        assert!(peak >= waves.height_at(Vec2::ZERO, 7.7));
    }

    #[test]
    fn displacement_repeats_after_one_period() {
        let waves = WaveSet::default();
        let period = waves.period(&waves.waves()[0]);
        for position in [Vec2::ZERO, Vec2::new(3.5, -1.25), Vec2::new(-12.0, 40.0)] {
            let start = waves.evaluate(position, 0.0).displacement;
            let end = waves.evaluate(position, period).displacement;
            assert!((start - end).length() < 1e-3, "{start:?} vs {end:?}");
        }
    }

    #[test]
    fn deep_water_period_follows_dispersion() {
        let waves = single(45.0, 0.2, 8.0).with_speed(PhaseSpeed::Deep { gravity: GRAVITY });
        let wave = waves.waves()[0];
        let period = waves.period(&wave);
        let expected = (2.0 * PI * wave.wavelength() / GRAVITY).sqrt();
        assert!((period - expected).abs() < 1e-3);

        let p = Vec2::new(1.0, 2.0);
        let a = waves.evaluate(p, 0.3).displacement;
        let b = waves.evaluate(p, 0.3 + period).displacement;
        assert!((a - b).length() < 1e-3);
    }

    #[test]
    fn crests_pull_points_horizontally() {
        let waves = single(0.0, 0.5, 10.0);
        // direction 0° travels along +Z
        let sample = waves.evaluate(Vec2::ZERO, 0.0);
        assert!(sample.displacement.z > 0.0);
        assert!(sample.displacement.x.abs() < EPS);
    }

    #[test]
    fn flat_set_points_straight_up() {
        let waves = WaveSet::new(Vec::new()).unwrap();
        let sample = waves.evaluate(Vec2::new(4.0, 2.0), 12.0);
        assert_eq!(sample.displacement, Vec3::ZERO);
        assert!((sample.normal - Vec3::Y).length() < EPS);
    }

    #[test]
    fn normals_are_unit_length_and_upward() {
        let waves = WaveSet::default();
        for i in 0..16 {
            let p = Vec2::new(i as f32 * 1.7, i as f32 * -0.9);
            let n = waves.evaluate(p, i as f32 * 0.25).normal;
            assert!((n.length() - 1.0).abs() < EPS);
            assert!(n.y > 0.9);
        }
    }

    #[test]
    fn uniform_vectors_pad_unused_slots() {
        let waves = single(30.0, 0.02, 30.0);
        let packed = waves.uniform_vectors();
        assert!((packed[0][0] - 0.5).abs() < EPS);
        assert_eq!(packed[0][2], 0.02);
        assert_eq!(packed[0][3], 30.0);
        assert_eq!(packed[1], [0.0, 0.0, 0.0, 1.0]);
    }
}
