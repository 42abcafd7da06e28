use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::height::HeightField;

/// Forward-difference step, one cache cell.
pub const GRADIENT_STEP: f32 = 0.1;

/// Gradients shorter than this count as flat.
const FLAT_EPSILON: f32 = 1.0e-6;

/// A vector in the horizontal xz-plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanarVec {
    pub x: f32,
    pub z: f32,
}

impl PlanarVec {
    pub const ZERO: Self = Self { x: 0.0, z: 0.0 };

    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.z * other.z
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

/// Down the course, toward −z. Returned wherever the surface is flat.
pub const DEFAULT_DOWNHILL: PlanarVec = PlanarVec::new(0.0, -1.0);

/// Anything that answers point height queries.
pub trait HeightSource {
    fn height(&self, x: f32, z: f32) -> Result<f32>;
}

impl HeightSource for HeightField {
    fn height(&self, x: f32, z: f32) -> Result<f32> {
        HeightField::height(self, x, z)
    }
}

/// Adapts a plain closure into a [`HeightSource`].
pub struct HeightFn<F>(pub F);

impl<F: Fn(f32, f32) -> f32> HeightSource for HeightFn<F> {
    fn height(&self, x: f32, z: f32) -> Result<f32> {
        crate::height::HeightKey::quantize(x, z)?;
        Ok((self.0)(x, z))
    }
}

/// Slope queries over a height source. Holds no state of its own.
pub struct GradientEstimator<'a, H: HeightSource + ?Sized> {
    source: &'a H,
}

impl<'a, H: HeightSource + ?Sized> GradientEstimator<'a, H> {
    pub fn new(source: &'a H) -> Self {
        Self { source }
    }

    pub fn gradient(&self, x: f32, z: f32) -> Result<PlanarVec> {
        let h = self.source.height(x, z)?;
        let hx = self.source.height(x + GRADIENT_STEP, z)?;
        let hz = self.source.height(x, z + GRADIENT_STEP)?;
        Ok(PlanarVec::new((hx - h) / GRADIENT_STEP, (hz - h) / GRADIENT_STEP))
    }

    pub fn steepness(&self, x: f32, z: f32) -> Result<f32> {
        Ok(self.gradient(x, z)?.length())
    }

    /// Unit vector of steepest descent, or [`DEFAULT_DOWNHILL`] on flat ground.
    pub fn downhill_direction(&self, x: f32, z: f32) -> Result<PlanarVec> {
        Ok(downhill_from_gradient(self.gradient(x, z)?))
    }
}

pub fn downhill_from_gradient(gradient: PlanarVec) -> PlanarVec {
    let length = gradient.length();
    if !length.is_finite() || length < FLAT_EPSILON {
        return DEFAULT_DOWNHILL;
    }
    PlanarVec::new(-gradient.x / length, -gradient.z / length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilted_plane_has_constant_gradient() {
        let plane = HeightFn(|x: f32, z: f32| 0.5 * x - 0.25 * z);
        let estimator = GradientEstimator::new(&plane);
        let g = estimator.gradient(3.0, 7.0).unwrap();
        assert!((g.x - 0.5).abs() < 1e-3);
        assert!((g.z + 0.25).abs() < 1e-3);
    }

    #[test]
    fn downhill_is_unit_and_opposes_gradient() {
        let plane = HeightFn(|x: f32, z: f32| 3.0 * x + 4.0 * z);
        let estimator = GradientEstimator::new(&plane);
        let d = estimator.downhill_direction(1.0, 1.0).unwrap();
        assert!((d.length() - 1.0).abs() < 1e-4);
        assert!((d.x + 0.6).abs() < 1e-3);
        assert!((d.z + 0.8).abs() < 1e-3);
    }

    #[test]
    fn flat_surface_falls_back_to_default() {
        let flat = HeightFn(|_x: f32, _z: f32| 12.0);
        let estimator = GradientEstimator::new(&flat);
        for (x, z) in [(0.0, 0.0), (-50.0, 3.3), (1.0e4, -1.0e4)] {
            let d = estimator.downhill_direction(x, z).unwrap();
            assert_eq!(d, DEFAULT_DOWNHILL);
            assert!(d.is_finite());
        }
    }

    #[test]
    fn non_finite_gradient_falls_back_to_default() {
        assert_eq!(downhill_from_gradient(PlanarVec::new(f32::NAN, 1.0)), DEFAULT_DOWNHILL);
    }

    #[test]
    fn degenerate_coordinates_are_rejected() {
        let plane = HeightFn(|x: f32, _z: f32| x);
        let estimator = GradientEstimator::new(&plane);
        assert!(estimator.gradient(f32::NAN, 0.0).is_err());
        assert!(estimator.downhill_direction(0.0, f32::NEG_INFINITY).is_err());
    }
}
