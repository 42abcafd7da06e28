use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::noise::NoiseBackend;

/// Shape of the height formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub peak_height: f32,
    pub falloff: f32,
    pub roughness_scale: f32,
    pub roughness_amplitude: f32,
    /// distance over which roughness grows from zero at the peak
    pub roughness_ramp: f32,
    pub path_half_width: f32,
    pub path_slope_amplitude: f32,
    pub path_slope_wavelength: f32,
    pub path_wave_amplitude: f32,
    pub path_wave_frequency: f32,
    pub ridge_amplitude: f32,
    pub ridge_frequency: f32,
    pub ridge_transition: f32,
    pub ramps: Vec<RampConfig>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            peak_height: 40.0,
            falloff: 40.0,
            roughness_scale: 0.05,
            roughness_amplitude: 2.5,
            roughness_ramp: 25.0,
            path_half_width: 15.0,
            path_slope_amplitude: 1.5,
            path_slope_wavelength: 200.0,
            path_wave_amplitude: 0.4,
            path_wave_frequency: 0.05,
            ridge_amplitude: 1.2,
            ridge_frequency: 0.1,
            ridge_transition: 10.0,
            ramps: vec![
                RampConfig { z: -70.0, length: 8.0, half_width: 4.0, height: 1.2 },
                RampConfig { z: -140.0, length: 10.0, half_width: 5.0, height: 1.6 },
            ],
        }
    }
}

/// A jump ramp built into the groomed band, centred on the path axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampConfig {
    pub z: f32,
    pub length: f32,
    pub half_width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: f32,
    pub depth: f32,
    /// subdivisions along each axis
    pub resolution: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { width: 200.0, depth: 400.0, resolution: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub grid_step: f32,
    pub path_buffer: f32,
    pub base_chance: f32,
    pub slope_factor: f32,
    pub companion_chance: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// fraction of a rock's size sunk below the surface
    pub burial: f32,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            grid_step: 8.0,
            path_buffer: 20.0,
            base_chance: 0.08,
            slope_factor: 0.35,
            companion_chance: 0.25,
            min_size: 0.6,
            max_size: 1.8,
            burial: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TerrainConfig {
    /// `None` draws a fresh seed from entropy for every terrain.
    pub seed: Option<u64>,
    pub noise: NoiseBackend,
    pub profile: ProfileConfig,
    pub surface: SurfaceConfig,
    pub scatter: ScatterConfig,
}

impl TerrainConfig {
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: TerrainConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.profile;
        let s = &self.surface;
        let r = &self.scatter;
        let positive = [
            ("profile.falloff", p.falloff),
            ("profile.path_half_width", p.path_half_width),
            ("profile.path_slope_wavelength", p.path_slope_wavelength),
            ("profile.ridge_transition", p.ridge_transition),
            ("profile.roughness_ramp", p.roughness_ramp),
            ("surface.width", s.width),
            ("surface.depth", s.depth),
            ("scatter.grid_step", r.grid_step),
            ("scatter.min_size", r.min_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TerrainError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        let non_negative = [
            ("profile.peak_height", p.peak_height),
            ("profile.roughness_scale", p.roughness_scale),
            ("profile.roughness_amplitude", p.roughness_amplitude),
            ("profile.path_slope_amplitude", p.path_slope_amplitude),
            ("profile.path_wave_amplitude", p.path_wave_amplitude),
            ("profile.path_wave_frequency", p.path_wave_frequency),
            ("profile.ridge_amplitude", p.ridge_amplitude),
            ("profile.ridge_frequency", p.ridge_frequency),
            ("scatter.path_buffer", r.path_buffer),
            ("scatter.max_size", r.max_size),
            ("scatter.burial", r.burial),
            ("scatter.slope_factor", r.slope_factor),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TerrainError::InvalidConfig(format!("{name} must be finite and >= 0, got {value}")));
            }
        }
        for (name, value) in [("scatter.base_chance", r.base_chance), ("scatter.companion_chance", r.companion_chance)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TerrainError::InvalidConfig(format!("{name} must lie in [0, 1], got {value}")));
            }
        }
        if s.resolution == 0 {
            return Err(TerrainError::InvalidConfig("surface.resolution must be at least 1".into()));
        }
        if r.max_size < r.min_size {
            return Err(TerrainError::InvalidConfig(format!(
                "scatter.max_size ({}) is below scatter.min_size ({})",
                r.max_size, r.min_size
            )));
        }
        if r.path_buffer < p.path_half_width {
            return Err(TerrainError::InvalidConfig(format!(
                "scatter.path_buffer ({}) must cover the path band ({})",
                r.path_buffer, p.path_half_width
            )));
        }
        for ramp in &p.ramps {
            if !(ramp.z.is_finite() && ramp.height.is_finite()) {
                return Err(TerrainError::InvalidConfig(format!("ramp at z={} has a non-finite field", ramp.z)));
            }
            if !(ramp.length > 0.0 && ramp.half_width > 0.0 && ramp.half_width <= p.path_half_width) {
                return Err(TerrainError::InvalidConfig(format!("ramp at z={} lies outside the path band", ramp.z)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        TerrainConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_ron_fills_defaults() {
        let config = TerrainConfig::from_ron_str("(seed: Some(42), surface: (resolution: 64))").unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.surface.resolution, 64);
        assert_eq!(config.surface.width, SurfaceConfig::default().width);
        assert_eq!(config.profile, ProfileConfig::default());
    }

    #[test]
    fn rejects_zero_resolution() {
        let err = TerrainConfig::from_ron_str("(surface: (resolution: 0))").unwrap_err();
        assert!(matches!(err, TerrainError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_buffer_narrower_than_path() {
        let err = TerrainConfig::from_ron_str("(scatter: (path_buffer: 5.0))").unwrap_err();
        assert!(matches!(err, TerrainError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_non_finite_scatter_sizes() {
        for text in ["(scatter: (max_size: inf))", "(scatter: (max_size: NaN))", "(scatter: (slope_factor: inf))"] {
            let err = TerrainConfig::from_ron_str(text).unwrap_err();
            assert!(matches!(err, TerrainError::InvalidConfig(_)), "{text} was accepted");
        }
    }

    #[test]
    fn rejects_nan_burial() {
        let err = TerrainConfig::from_ron_str("(scatter: (burial: NaN))").unwrap_err();
        assert!(matches!(err, TerrainError::InvalidConfig(_)));
    }

    #[test]
    fn chances_must_be_probabilities() {
        for text in [
            "(scatter: (base_chance: 1.5))",
            "(scatter: (base_chance: NaN))",
            "(scatter: (companion_chance: -0.1))",
            "(scatter: (companion_chance: inf))",
        ] {
            let err = TerrainConfig::from_ron_str(text).unwrap_err();
            assert!(matches!(err, TerrainError::InvalidConfig(_)), "{text} was accepted");
        }
    }

    #[test]
    fn rejects_non_finite_profile_amplitude() {
        let err = TerrainConfig::from_ron_str("(profile: (ridge_amplitude: inf))").unwrap_err();
        assert!(matches!(err, TerrainError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let err = TerrainConfig::from_ron_str("(seed: ").unwrap_err();
        assert!(matches!(err, TerrainError::ConfigParse(_)));
    }
}
