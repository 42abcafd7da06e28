//! Slope-weighted rock scatter.
//!
//! One pass walks a fixed grid over the surface footprint, jitters a sample
//! inside each cell, and admits a rock with probability
//! `base_chance + slope_factor * |gradient|`. A pass always replaces the
//! previous one.

use std::f32::consts::TAU;

use rand::Rng;

use crate::config::{ScatterConfig, SurfaceConfig};
use crate::error::Result;
use crate::gradient::GradientEstimator;
use crate::height::HeightField;
use crate::obstacles::RockPlacement;

/// Companions are this fraction of their parent's size.
const COMPANION_SCALE: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScatterStats {
    pub cells: usize,
    pub excluded: usize,
    pub admitted: usize,
    pub companions: usize,
}

pub struct RockScatter {
    config: ScatterConfig,
    placements: Vec<RockPlacement>,
    stats: ScatterStats,
}

impl RockScatter {
    pub fn new(config: ScatterConfig) -> Self {
        Self { config, placements: Vec::new(), stats: ScatterStats::default() }
    }

    pub fn config(&self) -> &ScatterConfig {
        &self.config
    }

    pub fn placements(&self) -> &[RockPlacement] {
        &self.placements
    }

    pub fn stats(&self) -> ScatterStats {
        self.stats
    }

    pub fn admission_chance(&self, steepness: f32) -> f32 {
        (self.config.base_chance + self.config.slope_factor * steepness).clamp(0.0, 1.0)
    }

    /// Runs a fresh pass. Rocks from any earlier pass are dropped first.
    pub fn scatter<R: Rng + ?Sized>(
        &mut self,
        field: &HeightField,
        surface: &SurfaceConfig,
        rng: &mut R,
    ) -> Result<&[RockPlacement]> {
        if !self.placements.is_empty() {
            log::debug!("dropping {} rocks from the previous scatter pass", self.placements.len());
        }
        self.placements.clear();
        self.stats = ScatterStats::default();

        let gradients = GradientEstimator::new(field);
        let step = self.config.grid_step;
        let buffer = self.config.path_buffer;
        let (half_w, half_d) = (surface.width / 2.0, surface.depth / 2.0);
        let cols = (surface.width / step).ceil() as i32;
        let rows = (surface.depth / step).ceil() as i32;

        for row in 0..rows {
            for col in 0..cols {
                self.stats.cells += 1;
                let cell_x = -half_w + col as f32 * step;
                let cell_z = -half_d + row as f32 * step;
                let x = (cell_x + rng.gen::<f32>() * step).min(half_w);
                let z = (cell_z + rng.gen::<f32>() * step).min(half_d);
                if x.abs() < buffer {
                    self.stats.excluded += 1;
                    continue;
                }

                let steepness = gradients.steepness(x, z)?;
                if rng.gen::<f32>() >= self.admission_chance(steepness) {
                    continue;
                }

                let size = rng.gen_range(self.config.min_size..=self.config.max_size);
                let rock = self.place(field, &gradients, x, z, size, false, rng)?;
                self.placements.push(rock);
                self.stats.admitted += 1;

                if rng.gen::<f32>() < self.config.companion_chance {
                    // just outside the buffer, on the same side of the path
                    let cx = x.signum() * (buffer + rng.gen::<f32>() * step * 0.5);
                    let cz = (z + (rng.gen::<f32>() - 0.5) * step).clamp(-half_d, half_d);
                    if cx.abs() <= half_w {
                        let companion = self.place(field, &gradients, cx, cz, size * COMPANION_SCALE, true, rng)?;
                        self.placements.push(companion);
                        self.stats.companions += 1;
                    }
                }
            }
        }

        log::info!(
            "rock scatter: {} cells, {} excluded by path buffer, {} rocks, {} companions",
            self.stats.cells,
            self.stats.excluded,
            self.stats.admitted,
            self.stats.companions
        );
        Ok(&self.placements)
    }

    #[allow(clippy::too_many_arguments)]
    fn place<R: Rng + ?Sized>(
        &self,
        field: &HeightField,
        gradients: &GradientEstimator<'_, HeightField>,
        x: f32,
        z: f32,
        size: f32,
        companion: bool,
        rng: &mut R,
    ) -> Result<RockPlacement> {
        let height = field.height(x, z)?;
        let slope = gradients.gradient(x, z)?;
        Ok(RockPlacement {
            x,
            y: height - size * self.config.burial,
            z,
            size,
            normal: surface_normal(slope.x, slope.z),
            yaw: rng.gen::<f32>() * TAU,
            companion,
        })
    }
}

/// Unit normal `(-gx, 1, -gz) / |..|` of the surface with gradient `(gx, gz)`.
pub fn surface_normal(gx: f32, gz: f32) -> [f32; 3] {
    let len = (gx * gx + 1.0 + gz * gz).sqrt();
    [-gx / len, 1.0 / len, -gz / len]
}
