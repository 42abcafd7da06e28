use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::TerrainConfig;
use crate::error::Result;
use crate::gradient::{GradientEstimator, PlanarVec};
use crate::height::{CacheProbe, HeightField, HeightProfile};
use crate::mesh::{SurfaceMesh, SurfaceMeshBuilder};
use crate::noise::NoiseSource;
use crate::obstacles::{ObstacleSet, RockPlacement, TreePlacer};
use crate::scatter::RockScatter;

/// One point query: elevation plus local slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainSample {
    pub x: f32,
    pub z: f32,
    pub height: f32,
    pub gradient: PlanarVec,
}

pub struct TerrainBuild {
    pub mesh: SurfaceMesh,
    pub obstacles: ObstacleSet,
}

/// A single mountain: height field, its cache, and the obstacles placed on it.
///
/// The cache lives and dies with this value. Building a new terrain is the
/// only way to start from an empty cache.
pub struct Terrain {
    config: TerrainConfig,
    field: HeightField,
    tree_placer: Option<Box<dyn TreePlacer>>,
    rocks: RockScatter,
    obstacles: ObstacleSet,
    seed: Option<u64>,
}

impl Terrain {
    pub fn new(config: TerrainConfig, noise: Box<dyn NoiseSource>) -> Result<Self> {
        config.validate()?;
        let field = HeightField::new(HeightProfile::new(config.profile.clone()), noise);
        let rocks = RockScatter::new(config.scatter.clone());
        Ok(Self { config, field, tree_placer: None, rocks, obstacles: ObstacleSet::default(), seed: None })
    }

    /// Noise seeded from `config.seed`, or from entropy when none is set.
    pub fn from_config(config: TerrainConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = config.noise.build(&mut rng);
        log::info!("new terrain: {:?} noise, seed {}", config.noise, seed);
        let mut terrain = Self::new(config, noise)?;
        terrain.seed = Some(seed);
        Ok(terrain)
    }

    pub fn with_tree_placer(mut self, placer: Box<dyn TreePlacer>) -> Self {
        self.tree_placer = Some(placer);
        self
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    pub fn height(&self, x: f32, z: f32) -> Result<f32> {
        self.field.height(x, z)
    }

    pub fn gradient(&self, x: f32, z: f32) -> Result<PlanarVec> {
        GradientEstimator::new(&self.field).gradient(x, z)
    }

    pub fn downhill_direction(&self, x: f32, z: f32) -> Result<PlanarVec> {
        GradientEstimator::new(&self.field).downhill_direction(x, z)
    }

    pub fn sample(&self, x: f32, z: f32) -> Result<TerrainSample> {
        Ok(TerrainSample { x, z, height: self.height(x, z)?, gradient: self.gradient(x, z)? })
    }

    pub fn probe(&self, x: f32, z: f32) -> Result<CacheProbe> {
        self.field.probe(x, z)
    }

    /// Surface mesh, tree placement, then a rock pass.
    pub fn build<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TerrainBuild> {
        let placer = self.tree_placer.as_mut().map(|p| &mut **p as &mut dyn TreePlacer);
        let surface = SurfaceMeshBuilder::new(&self.config.surface).build(&self.field, placer)?;
        self.rocks.scatter(&self.field, &self.config.surface, rng)?;
        self.obstacles = ObstacleSet { rocks: self.rocks.placements().to_vec(), trees: surface.trees };
        Ok(TerrainBuild { mesh: surface.mesh, obstacles: self.obstacles.clone() })
    }

    /// Replaces the rock generation on this terrain, keeping trees and cache.
    pub fn rescatter<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&[RockPlacement]> {
        self.rocks.scatter(&self.field, &self.config.surface, rng)?;
        self.obstacles.rocks = self.rocks.placements().to_vec();
        Ok(&self.obstacles.rocks)
    }
}
