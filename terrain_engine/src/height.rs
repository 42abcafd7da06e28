//! Height field: one formula, one cache.
//!
//! Mesh vertices and point queries both go through [`HeightField::compute`],
//! which evaluates [`HeightProfile::evaluate`] at the *quantized* coordinate.
//! [`HeightField::height`] memoizes the result in [`HeightCache`].

use std::collections::HashMap;
use std::f32::consts::TAU;

use parking_lot::RwLock;

use crate::config::ProfileConfig;
use crate::error::{Result, TerrainError};
use crate::noise::NoiseSource;

/// Largest |coordinate| whose tenth-unit key still fits an `i32`.
const COORD_LIMIT: f32 = 1.0e8;

/// Cache key: coordinates scaled by 10 and rounded to the nearest integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeightKey {
    pub x: i32,
    pub z: i32,
}

impl HeightKey {
    pub const SCALE: f32 = 10.0;

    pub fn quantize(x: f32, z: f32) -> Result<Self> {
        if !x.is_finite() || !z.is_finite() || x.abs() > COORD_LIMIT || z.abs() > COORD_LIMIT {
            return Err(TerrainError::DegenerateInput { x, z });
        }
        Ok(Self {
            x: (x * Self::SCALE).round() as i32,
            z: (z * Self::SCALE).round() as i32,
        })
    }

    pub fn world_x(self) -> f32 {
        self.x as f32 / Self::SCALE
    }

    pub fn world_z(self) -> f32 {
        self.z as f32 / Self::SCALE
    }

    /// Both cells in one word; the cache map is keyed by this.
    pub fn packed(self) -> u64 {
        ((self.x as u32 as u64) << 32) | self.z as u32 as u64
    }
}

/// Memoized elevations. Grows for the lifetime of its terrain and is never
/// evicted; a new terrain gets a new cache.
#[derive(Default)]
pub struct HeightCache {
    entries: RwLock<HashMap<u64, f32>>,
}

impl HeightCache {
    pub fn get(&self, key: HeightKey) -> Option<f32> {
        self.entries.read().get(&key.packed()).copied()
    }

    pub fn insert(&self, key: HeightKey, height: f32) {
        self.entries.write().insert(key.packed(), height);
    }

    pub fn extend<I: IntoIterator<Item = (HeightKey, f32)>>(&self, entries: I) {
        self.entries.write().extend(entries.into_iter().map(|(key, h)| (key.packed(), h)));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, key: HeightKey) -> bool {
        self.entries.read().contains_key(&key.packed())
    }
}

/// Hermite smoothstep on `[0, 1]`.
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// The analytic pieces of the height formula. Noise is passed in so the
/// profile itself stays a plain value.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightProfile {
    pub config: ProfileConfig,
}

impl HeightProfile {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    /// Single peak at the origin: `peak · exp(−d / falloff)`.
    pub fn radial_base(&self, distance: f32) -> f32 {
        self.config.peak_height * (-distance / self.config.falloff).exp()
    }

    pub fn roughness_amplitude(&self, distance: f32) -> f32 {
        let c = &self.config;
        c.roughness_amplitude * (1.0 - (-distance / c.roughness_ramp).exp())
    }

    /// 1 on the path axis, 0 at and beyond the band edges.
    pub fn path_blend(&self, x: f32) -> f32 {
        let u = x.abs() / self.config.path_half_width;
        if u >= 1.0 {
            0.0
        } else {
            1.0 - u * u
        }
    }

    /// Weight of the ridge layer; ramps in over `ridge_transition` past the band edge.
    pub fn ridge_weight(&self, x: f32) -> f32 {
        let c = &self.config;
        smoothstep((x.abs() - c.path_half_width) / c.ridge_transition)
    }

    pub fn ridge(&self, x: f32, z: f32) -> f32 {
        let c = &self.config;
        let crest = 1.0 - (x * c.ridge_frequency).sin().abs();
        let along = 0.5 + 0.5 * (z * c.ridge_frequency * 0.6).cos();
        c.ridge_amplitude * crest * along
    }

    /// Long-wavelength rise and fall plus short sinusoidal curvature along the trail.
    pub fn path_relief(&self, z: f32) -> f32 {
        let c = &self.config;
        c.path_slope_amplitude * (z / c.path_slope_wavelength * TAU).sin()
            + c.path_wave_amplitude * (z * c.path_wave_frequency).sin()
    }

    /// Summed lift of every jump ramp at `(x, z)`; zero away from ramps.
    pub fn ramp_lift(&self, x: f32, z: f32) -> f32 {
        self.config
            .ramps
            .iter()
            .map(|ramp| {
                let u = (z - ramp.z) / ramp.length;
                let v = x.abs() / ramp.half_width;
                if u.abs() >= 0.5 || v >= 1.0 {
                    return 0.0;
                }
                let along = 0.5 * (1.0 + (u * TAU).cos());
                let across = (1.0 - v * v) * (1.0 - v * v);
                ramp.height * along * across
            })
            .sum()
    }

    /// Surface the groomed band is pulled toward.
    pub fn groomed(&self, x: f32, z: f32, base: f32) -> f32 {
        base + self.path_relief(z) + self.ramp_lift(x, z)
    }

    /// The height formula at an exact planar coordinate.
    pub fn evaluate(&self, noise: &dyn NoiseSource, x: f32, z: f32) -> f32 {
        let c = &self.config;
        let distance = (x * x + z * z).sqrt();
        let base = self.radial_base(distance);
        let rough = noise.noise(x * c.roughness_scale, z * c.roughness_scale) * self.roughness_amplitude(distance);
        let terrain = base + rough;

        if x.abs() < c.path_half_width {
            let t = self.path_blend(x);
            terrain * (1.0 - t) + self.groomed(x, z, base) * t
        } else {
            terrain + self.ridge(x, z) * self.ridge_weight(x)
        }
    }
}

/// Point-in-time comparison of the cache against a fresh evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheProbe {
    pub key: HeightKey,
    pub cached: Option<f32>,
    pub recomputed: f32,
}

impl CacheProbe {
    pub fn is_consistent(&self) -> bool {
        self.cached.map_or(true, |cached| cached.to_bits() == self.recomputed.to_bits())
    }

    pub fn divergence(&self) -> f32 {
        self.cached.map_or(0.0, |cached| (cached - self.recomputed).abs())
    }
}

pub struct HeightField {
    profile: HeightProfile,
    noise: Box<dyn NoiseSource>,
    cache: HeightCache,
}

impl HeightField {
    pub fn new(profile: HeightProfile, noise: Box<dyn NoiseSource>) -> Self {
        Self { profile, noise, cache: HeightCache::default() }
    }

    pub fn profile(&self) -> &HeightProfile {
        &self.profile
    }

    pub fn cache(&self) -> &HeightCache {
        &self.cache
    }

    /// Formula value for a key, bypassing the cache.
    pub fn compute(&self, key: HeightKey) -> f32 {
        self.profile.evaluate(self.noise.as_ref(), key.world_x(), key.world_z())
    }

    pub fn height(&self, x: f32, z: f32) -> Result<f32> {
        let key = HeightKey::quantize(x, z)?;
        Ok(self.height_at_key(key))
    }

    pub fn height_at_key(&self, key: HeightKey) -> f32 {
        if let Some(height) = self.cache.get(key) {
            return height;
        }
        let height = self.compute(key);
        // only finite values are memoized
        if height.is_finite() {
            self.cache.insert(key, height);
        }
        height
    }

    pub fn probe(&self, x: f32, z: f32) -> Result<CacheProbe> {
        let key = HeightKey::quantize(x, z)?;
        Ok(CacheProbe { key, cached: self.cache.get(key), recomputed: self.compute(key) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{FlatNoise, SimplexNoise};

    fn flat_field() -> HeightField {
        HeightField::new(HeightProfile::new(ProfileConfig::default()), Box::new(FlatNoise))
    }

    #[test]
    fn key_rounds_to_tenths() {
        let key = HeightKey::quantize(1.26, -3.04).unwrap();
        assert_eq!(key, HeightKey { x: 13, z: -30 });
        assert_eq!(HeightKey::quantize(0.0, -0.0).unwrap(), HeightKey { x: 0, z: 0 });
    }

    #[test]
    fn key_packing_keeps_sign() {
        assert_eq!(HeightKey { x: -1, z: 1 }.packed(), 0xffff_ffff_0000_0001);
        assert_ne!(HeightKey { x: -1, z: 1 }.packed(), HeightKey { x: 1, z: -1 }.packed());
    }

    #[test]
    fn mirrored_keys_occupy_separate_cache_slots() {
        let cache = HeightCache::default();
        cache.insert(HeightKey { x: -1, z: 1 }, 1.0);
        cache.extend([(HeightKey { x: 1, z: -1 }, 2.0), (HeightKey { x: i32::MIN, z: i32::MAX }, 3.0)]);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(HeightKey { x: -1, z: 1 }), Some(1.0));
        assert_eq!(cache.get(HeightKey { x: 1, z: -1 }), Some(2.0));
        assert!(cache.contains(HeightKey { x: i32::MIN, z: i32::MAX }));
        assert!(!cache.contains(HeightKey { x: 0, z: 0 }));
    }

    #[test]
    fn key_rejects_non_finite_input() {
        assert!(matches!(HeightKey::quantize(f32::NAN, 0.0), Err(TerrainError::DegenerateInput { .. })));
        assert!(matches!(HeightKey::quantize(0.0, f32::INFINITY), Err(TerrainError::DegenerateInput { .. })));
        assert!(matches!(HeightKey::quantize(2.0e9, 0.0), Err(TerrainError::DegenerateInput { .. })));
    }

    #[test]
    fn degenerate_query_leaves_cache_untouched() {
        let field = flat_field();
        assert!(field.height(f32::NAN, 1.0).is_err());
        assert!(field.cache().is_empty());
    }

    #[test]
    fn peak_is_forty_without_noise() {
        assert_eq!(flat_field().height(0.0, 0.0).unwrap(), 40.0);
    }

    #[test]
    fn cold_and_cached_lookups_agree() {
        let field = HeightField::new(HeightProfile::new(ProfileConfig::default()), Box::new(SimplexNoise::from_seed(5)));
        let cold = field.height(33.3, -71.7).unwrap();
        assert_eq!(field.cache().len(), 1);
        let warm = field.height(33.3, -71.7).unwrap();
        assert_eq!(cold.to_bits(), warm.to_bits());
        assert_eq!(field.cache().len(), 1);
    }

    #[test]
    fn nearby_inputs_share_a_cell() {
        let field = HeightField::new(HeightProfile::new(ProfileConfig::default()), Box::new(SimplexNoise::from_seed(8)));
        let a = field.height(10.01, 5.04).unwrap();
        let b = field.height(9.96, 4.99).unwrap();
        assert_eq!(a, b);
        assert_eq!(field.cache().len(), 1);
    }

    #[test]
    fn ramp_lift_vanishes_outside_its_footprint() {
        let profile = HeightProfile::new(ProfileConfig::default());
        let ramp = profile.config.ramps[0];
        assert!(profile.ramp_lift(0.0, ramp.z) > 0.0);
        assert_eq!(profile.ramp_lift(0.0, ramp.z + ramp.length), 0.0);
        assert_eq!(profile.ramp_lift(ramp.half_width, ramp.z), 0.0);
        assert!((profile.ramp_lift(0.0, ramp.z) - ramp.height).abs() < 1e-5);
    }

    #[test]
    fn blend_and_ridge_weight_meet_at_band_edge() {
        let profile = HeightProfile::new(ProfileConfig::default());
        let edge = profile.config.path_half_width;
        assert_eq!(profile.path_blend(0.0), 1.0);
        assert_eq!(profile.path_blend(edge), 0.0);
        assert_eq!(profile.ridge_weight(edge), 0.0);
        assert_eq!(profile.ridge_weight(edge + profile.config.ridge_transition), 1.0);
    }

    #[test]
    fn probe_reports_missing_then_matching_entry() {
        let field = HeightField::new(HeightProfile::new(ProfileConfig::default()), Box::new(SimplexNoise::from_seed(21)));
        let before = field.probe(-44.0, 12.0).unwrap();
        assert_eq!(before.cached, None);
        assert!(before.is_consistent());
        field.height(-44.0, 12.0).unwrap();
        let after = field.probe(-44.0, 12.0).unwrap();
        assert_eq!(after.cached, Some(after.recomputed));
        assert_eq!(after.divergence(), 0.0);
    }

    #[test]
    fn probe_flags_a_poisoned_entry() {
        let field = flat_field();
        let key = HeightKey::quantize(3.0, 3.0).unwrap();
        field.cache().insert(key, -1.0);
        let probe = field.probe(3.0, 3.0).unwrap();
        assert!(!probe.is_consistent());
        assert!(probe.divergence() > 0.0);
    }
}
