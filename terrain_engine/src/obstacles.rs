use serde::{Deserialize, Serialize};

use crate::config::SurfaceConfig;
use crate::height::HeightField;

/// Radius used for tree trunks in proximity checks.
pub const TREE_TRUNK_RADIUS: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreePlacement {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RockPlacement {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub size: f32,
    /// unit surface normal under the rock; its base sits flush with it
    pub normal: [f32; 3],
    pub yaw: f32,
    pub companion: bool,
}

/// What the tree placer sees once the surface has been built.
pub struct PlacementContext<'a> {
    pub field: &'a HeightField,
    pub surface: &'a SurfaceConfig,
    pub path_half_width: f32,
}

/// External scatter pass for trees, handed to the terrain at construction.
pub trait TreePlacer: Send + Sync {
    fn place_trees(&mut self, context: &PlacementContext<'_>) -> Vec<TreePlacement>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Rock,
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleHit {
    pub kind: ObstacleKind,
    pub index: usize,
    pub x: f32,
    pub z: f32,
    /// distance between centres in the xz-plane
    pub distance: f32,
    /// how far the probe circle overlaps the obstacle footprint
    pub overlap: f32,
}

/// Collision data for one built terrain. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct ObstacleSet {
    pub rocks: Vec<RockPlacement>,
    pub trees: Vec<TreePlacement>,
}

impl ObstacleSet {
    pub fn len(&self) -> usize {
        self.rocks.len() + self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rocks.is_empty() && self.trees.is_empty()
    }

    /// Closest obstacle whose footprint overlaps a circle of `radius` at `(x, z)`.
    pub fn nearest_hit(&self, x: f32, z: f32, radius: f32) -> Option<ObstacleHit> {
        let rocks = self
            .rocks
            .iter()
            .enumerate()
            .map(|(i, r)| (ObstacleKind::Rock, i, r.x, r.z, r.size));
        let trees = self
            .trees
            .iter()
            .enumerate()
            .map(|(i, t)| (ObstacleKind::Tree, i, t.x, t.z, TREE_TRUNK_RADIUS));

        rocks
            .chain(trees)
            .filter_map(|(kind, index, ox, oz, footprint)| {
                let distance = ((ox - x).powi(2) + (oz - z).powi(2)).sqrt();
                let overlap = radius + footprint - distance;
                (overlap > 0.0).then_some(ObstacleHit { kind, index, x: ox, z: oz, distance, overlap })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
