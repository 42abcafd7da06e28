//! Procedural ski-slope terrain: noise, a cached height field, slope queries,
//! surface meshing and rock scatter.

pub mod config;
pub mod error;
pub mod gradient;
pub mod height;
pub mod mesh;
pub mod noise;
pub mod obstacles;
pub mod scatter;
pub mod terrain;

pub use config::{ProfileConfig, RampConfig, ScatterConfig, SurfaceConfig, TerrainConfig};
pub use error::{Result, TerrainError};
pub use gradient::{GradientEstimator, HeightFn, HeightSource, PlanarVec, DEFAULT_DOWNHILL};
pub use height::{CacheProbe, HeightCache, HeightField, HeightKey, HeightProfile};
pub use mesh::{SurfaceBuild, SurfaceMesh, SurfaceMeshBuilder};
pub use noise::{FastNoise, FlatNoise, NoiseBackend, NoiseSource, SimplexNoise};
pub use obstacles::{
    ObstacleHit, ObstacleKind, ObstacleSet, PlacementContext, RockPlacement, TreePlacement, TreePlacer,
};
pub use scatter::{RockScatter, ScatterStats};
pub use terrain::{Terrain, TerrainBuild, TerrainSample};
