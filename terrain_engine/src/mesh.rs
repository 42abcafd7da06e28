use rayon::prelude::*;

use crate::config::SurfaceConfig;
use crate::error::{Result, TerrainError};
use crate::height::{HeightField, HeightKey};
use crate::obstacles::{PlacementContext, TreePlacement, TreePlacer};

const GROOMED_COLOR: [f32; 4] = [0.97, 0.98, 1.0, 1.0];
const SNOW_COLOR: [f32; 4] = [0.84, 0.88, 0.94, 1.0];
const EXPOSED_COLOR: [f32; 4] = [0.55, 0.57, 0.62, 1.0];
const UV_TILE: f32 = 8.0;

/// Plain vertex data; the renderer converts it into its own mesh type.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

pub struct SurfaceBuild {
    pub mesh: SurfaceMesh,
    pub trees: Vec<TreePlacement>,
}

#[derive(Debug, Clone, Copy)]
struct GridVertex {
    x: f32,
    z: f32,
    key: HeightKey,
}

/// Displaced grid over the terrain footprint, centred on the origin.
pub struct SurfaceMeshBuilder<'a> {
    surface: &'a SurfaceConfig,
}

impl<'a> SurfaceMeshBuilder<'a> {
    pub fn new(surface: &'a SurfaceConfig) -> Self {
        Self { surface }
    }

    fn grid(&self) -> Result<Vec<GridVertex>> {
        let res = self.surface.resolution;
        let (w, d) = (self.surface.width, self.surface.depth);
        let mut grid = Vec::with_capacity(((res + 1) * (res + 1)) as usize);
        for j in 0..=res {
            let z = -d / 2.0 + d * j as f32 / res as f32;
            for i in 0..=res {
                let x = -w / 2.0 + w * i as f32 / res as f32;
                grid.push(GridVertex { x, z, key: HeightKey::quantize(x, z)? });
            }
        }
        Ok(grid)
    }

    /// Builds the surface, fills the height cache for every vertex, then runs
    /// the tree placer if one was supplied.
    pub fn build(&self, field: &HeightField, trees: Option<&mut dyn TreePlacer>) -> Result<SurfaceBuild> {
        let grid = self.grid()?;

        let heights = grid
            .par_iter()
            .map(|v| {
                let height = field.compute(v.key);
                if height.is_finite() {
                    Ok(height)
                } else {
                    Err(TerrainError::NonFiniteVertex { x: v.x, z: v.z, height })
                }
            })
            .collect::<Result<Vec<f32>>>()?;

        field.cache().extend(grid.iter().zip(&heights).map(|(v, h)| (v.key, *h)));

        let positions: Vec<[f32; 3]> = grid.iter().zip(&heights).map(|(v, h)| [v.x, *h, v.z]).collect();
        let indices = self.indices();
        let normals = vertex_normals(&positions, &indices);
        let profile = field.profile();
        let colors = grid
            .iter()
            .zip(&normals)
            .map(|(v, n)| surface_color(profile.path_blend(v.x), n[1]))
            .collect();
        let uvs = grid.iter().map(|v| [v.x / UV_TILE, v.z / UV_TILE]).collect();

        let mesh = SurfaceMesh { positions, normals, uvs, colors, indices };
        log::info!(
            "surface built: {} vertices, {} triangles, {} cached heights",
            mesh.vertex_count(),
            mesh.triangle_count(),
            field.cache().len()
        );

        let trees = match trees {
            Some(placer) => {
                let context = PlacementContext {
                    field,
                    surface: self.surface,
                    path_half_width: profile.config.path_half_width,
                };
                let trees = placer.place_trees(&context);
                log::info!("tree placer returned {} trees", trees.len());
                trees
            }
            None => {
                log::debug!("no tree placer supplied, surface has no trees");
                Vec::new()
            }
        };

        Ok(SurfaceBuild { mesh, trees })
    }

    fn indices(&self) -> Vec<u32> {
        let res = self.surface.resolution;
        let row = res + 1;
        let mut indices = Vec::with_capacity((res * res * 6) as usize);
        for j in 0..res {
            for i in 0..res {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        indices
    }
}

/// Area-weighted smooth normals, recomputed from displaced positions.
pub fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![[0.0f32; 3]; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (positions[a], positions[b], positions[c]);
        let e1 = [pb[0] - pa[0], pb[1] - pa[1], pb[2] - pa[2]];
        let e2 = [pc[0] - pa[0], pc[1] - pa[1], pc[2] - pa[2]];
        let n = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        for v in [a, b, c] {
            for k in 0..3 {
                acc[v][k] += n[k];
            }
        }
    }
    acc.into_iter()
        .map(|n| {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if len > 0.0 {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

fn lerp_color(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0.0; 4];
    for k in 0..4 {
        out[k] = a[k] * (1.0 - t) + b[k] * t;
    }
    out
}

/// Groomed band reads bright, off-piste snow cooler, steep faces show rock.
fn surface_color(path_blend: f32, normal_y: f32) -> [f32; 4] {
    let snow = lerp_color(SNOW_COLOR, GROOMED_COLOR, path_blend);
    let exposure = ((0.85 - normal_y) / 0.25).clamp(0.0, 1.0) * (1.0 - path_blend);
    lerp_color(snow, EXPOSED_COLOR, exposure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::height::HeightProfile;
    use crate::noise::{FlatNoise, SimplexNoise};

    fn small_surface() -> SurfaceConfig {
        SurfaceConfig { width: 40.0, depth: 60.0, resolution: 20 }
    }

    struct FixedTrees(Vec<TreePlacement>);

    impl TreePlacer for FixedTrees {
        fn place_trees(&mut self, _context: &PlacementContext<'_>) -> Vec<TreePlacement> {
            self.0.clone()
        }
    }

    #[test]
    fn grid_has_expected_topology() {
        let surface = small_surface();
        let field = HeightField::new(HeightProfile::new(ProfileConfig::default()), Box::new(FlatNoise));
        let build = SurfaceMeshBuilder::new(&surface).build(&field, None).unwrap();
        assert_eq!(build.mesh.vertex_count(), 21 * 21);
        assert_eq!(build.mesh.triangle_count(), 20 * 20 * 2);
        assert_eq!(build.mesh.normals.len(), build.mesh.vertex_count());
        assert!(build.trees.is_empty());
    }

    #[test]
    fn every_vertex_is_cached_with_its_own_height() {
        let surface = small_surface();
        let field = HeightField::new(HeightProfile::new(ProfileConfig::default()), Box::new(SimplexNoise::from_seed(4)));
        let build = SurfaceMeshBuilder::new(&surface).build(&field, None).unwrap();
        for p in &build.mesh.positions {
            let key = HeightKey::quantize(p[0], p[2]).unwrap();
            assert_eq!(field.cache().get(key), Some(p[1]));
            assert_eq!(field.height(p[0], p[2]).unwrap().to_bits(), p[1].to_bits());
        }
    }

    #[test]
    fn normals_point_up_and_are_unit() {
        let surface = small_surface();
        let field = HeightField::new(HeightProfile::new(ProfileConfig::default()), Box::new(SimplexNoise::from_seed(9)));
        let build = SurfaceMeshBuilder::new(&surface).build(&field, None).unwrap();
        for n in &build.mesh.normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-4);
            assert!(n[1] > 0.0);
        }
    }

    #[test]
    fn flat_grid_normals_are_vertical() {
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]];
        let normals = vertex_normals(&positions, &[0, 2, 1, 1, 2, 3]);
        for n in normals {
            assert_eq!(n, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn tree_placer_output_is_returned() {
        let surface = small_surface();
        let field = HeightField::new(HeightProfile::new(ProfileConfig::default()), Box::new(FlatNoise));
        let mut placer = FixedTrees(vec![TreePlacement { x: 18.0, y: 3.0, z: -4.0 }]);
        let build = SurfaceMeshBuilder::new(&surface).build(&field, Some(&mut placer as &mut dyn TreePlacer)).unwrap();
        assert_eq!(build.trees.len(), 1);
    }

    #[test]
    fn path_band_is_brighter_than_open_snow() {
        let on_path = surface_color(1.0, 1.0);
        let off_path = surface_color(0.0, 1.0);
        assert!(on_path[0] > off_path[0]);
        assert_eq!(surface_color(0.0, 0.3), EXPOSED_COLOR);
    }
}
