use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use terrain_engine::{GradientEstimator, PlacementContext, TreePlacement, TreePlacer};

/// 森林生成配置
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// 网格步长
    pub spacing: f32,
    /// 雪道两侧额外留空的宽度
    pub path_margin: f32,
    /// 密度噪声的频率
    pub density_frequency: f64,
    /// 低于该密度的区域不长树
    pub density_threshold: f64,
    /// 太陡的坡面不长树
    pub max_steepness: f32,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            spacing: 6.0,
            path_margin: 6.0,
            density_frequency: 0.025,
            density_threshold: 0.45,
            max_steepness: 1.2,
        }
    }
}

/// 按 Perlin 噪声分布的树林，避开雪道
pub struct ForestPlacer {
    config: ForestConfig,
    density: Perlin,
    rng: StdRng,
}

impl ForestPlacer {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, ForestConfig::default())
    }

    pub fn with_config(seed: u64, config: ForestConfig) -> Self {
        Self {
            config,
            density: Perlin::new(seed as u32),
            rng: StdRng::seed_from_u64(seed ^ 0x5eed_f0e5),
        }
    }

    /// 归一化到 [0, 1] 的树林密度
    fn density_at(&self, x: f32, z: f32) -> f64 {
        let f = self.config.density_frequency;
        (self.density.get([x as f64 * f, z as f64 * f]) + 1.0) * 0.5
    }
}

impl TreePlacer for ForestPlacer {
    fn place_trees(&mut self, context: &PlacementContext<'_>) -> Vec<TreePlacement> {
        let spacing = self.config.spacing;
        let half_w = context.surface.width / 2.0;
        let half_d = context.surface.depth / 2.0;
        let clearing = context.path_half_width + self.config.path_margin;
        let gradients = GradientEstimator::new(context.field);

        let cols = (context.surface.width / spacing) as i32;
        let rows = (context.surface.depth / spacing) as i32;
        let mut trees = Vec::new();

        for row in 0..rows {
            for col in 0..cols {
                let x = -half_w + (col as f32 + self.rng.gen::<f32>()) * spacing;
                let z = -half_d + (row as f32 + self.rng.gen::<f32>()) * spacing;
                if x.abs() < clearing {
                    continue;
                }

                let density = self.density_at(x, z);
                if density < self.config.density_threshold || self.rng.gen::<f64>() > density {
                    continue;
                }

                match gradients.steepness(x, z) {
                    Ok(s) if s <= self.config.max_steepness => {}
                    _ => continue,
                }
                if let Ok(y) = context.field.height(x, z) {
                    trees.push(TreePlacement { x, y, z });
                }
            }
        }

        trees
    }
}
