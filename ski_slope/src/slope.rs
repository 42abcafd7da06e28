use std::path::Path;

use bevy::ecs::schedule::SystemConfigs;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use terrain_engine::{Terrain, TerrainBuild, TerrainConfig};

use crate::forest::ForestPlacer;
use crate::game_state::GameState;
use crate::rendering::{build_surface_mesh, spawn_rocks, spawn_trees, ObstacleAssets, Rock, SlopeSurface, Tree};

pub const CONFIG_PATH: &str = "assets/terrain.ron";

/// 当前山体的生成配置
#[derive(Resource, Clone, Debug, Default)]
pub struct SlopeConfig(pub TerrainConfig);

impl SlopeConfig {
    /// 读取配置文件，失败时退回默认值
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match TerrainConfig::load(path) {
            Ok(config) => {
                info!("Loaded terrain config from {}", path.display());
                Self(config)
            }
            Err(e) => {
                warn!("Using default terrain config ({}): {e}", path.display());
                Self::default()
            }
        }
    }
}

/// 当前的山体，物理查询和碰撞都读它
#[derive(Resource)]
pub struct ActiveTerrain(pub Terrain);

/// 岩石重新分布用的随机数
#[derive(Resource)]
pub struct ScatterRng(pub StdRng);

/// 请求生成一座新山
#[derive(Event, Default)]
pub struct RebuildSlope;

/// 请求在当前山体上重新摆放岩石
#[derive(Event, Default)]
pub struct RescatterRocks;

pub struct SlopePlugin;

impl Plugin for SlopePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SlopeConfig::load_or_default(CONFIG_PATH))
            .add_event::<RebuildSlope>()
            .add_event::<RescatterRocks>()
            .add_systems(Startup, request_initial_build)
            .add_systems(
                Update,
                (handle_slope_keys.run_if(in_state(GameState::InGame)), slope_update_systems()).chain(),
            );
    }
}

/// 重建与岩石重排；中间先应用命令，让重排看到新的山体和新生成的岩石
pub fn slope_update_systems() -> SystemConfigs {
    (rebuild_slope, apply_deferred, rescatter_rocks).chain()
}

fn request_initial_build(mut rebuild: EventWriter<RebuildSlope>) {
    rebuild.send(RebuildSlope);
}

fn handle_slope_keys(
    keyboard: Res<Input<KeyCode>>,
    mut rebuild: EventWriter<RebuildSlope>,
    mut rescatter: EventWriter<RescatterRocks>,
) {
    if keyboard.just_pressed(KeyCode::R) {
        rebuild.send(RebuildSlope);
    }
    if keyboard.just_pressed(KeyCode::T) {
        rescatter.send(RescatterRocks);
    }
}

/// 生成山体、树林和第一批岩石
pub fn build_terrain(config: &TerrainConfig) -> terrain_engine::Result<(Terrain, TerrainBuild, StdRng)> {
    let terrain = Terrain::from_config(config.clone())?;
    let seed = terrain.seed().unwrap_or_default();
    let mut terrain = terrain.with_tree_placer(Box::new(ForestPlacer::new(seed)));
    let mut rng = StdRng::seed_from_u64(seed.rotate_left(17));
    let build = terrain.build(&mut rng)?;
    Ok((terrain, build, rng))
}

fn rebuild_slope(
    mut commands: Commands,
    mut events: EventReader<RebuildSlope>,
    config: Res<SlopeConfig>,
    assets: Res<ObstacleAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    previous: Query<Entity, Or<(With<SlopeSurface>, With<Rock>, With<Tree>)>>,
) {
    // 同一帧内多次请求只重建一次
    if events.read().count() == 0 {
        return;
    }

    let (terrain, build, rng) = match build_terrain(&config.0) {
        Ok(built) => built,
        Err(e) => {
            error!("Terrain build failed, keeping the current slope: {e}");
            return;
        }
    };

    for entity in previous.iter() {
        commands.entity(entity).despawn_recursive();
    }

    info!(
        "Built slope: {} vertices, {} triangles, {} rocks, {} trees, {} cached heights",
        build.mesh.vertex_count(),
        build.mesh.triangle_count(),
        build.obstacles.rocks.len(),
        build.obstacles.trees.len(),
        terrain.field().cache().len(),
    );

    commands.spawn((
        PbrBundle {
            mesh: meshes.add(build_surface_mesh(build.mesh)),
            material: assets.snow_material.clone(),
            ..default()
        },
        SlopeSurface,
    ));
    spawn_trees(&mut commands, &assets, &build.obstacles.trees);
    spawn_rocks(&mut commands, &assets, &build.obstacles.rocks);

    commands.insert_resource(ActiveTerrain(terrain));
    commands.insert_resource(ScatterRng(rng));
}

fn rescatter_rocks(
    mut commands: Commands,
    mut events: EventReader<RescatterRocks>,
    terrain: Option<ResMut<ActiveTerrain>>,
    rng: Option<ResMut<ScatterRng>>,
    assets: Res<ObstacleAssets>,
    rocks: Query<Entity, With<Rock>>,
) {
    if events.read().count() == 0 {
        return;
    }
    let (Some(mut terrain), Some(mut rng)) = (terrain, rng) else {
        return;
    };

    match terrain.0.rescatter(&mut rng.0) {
        Ok(placements) => {
            // 旧的岩石先全部移除
            for entity in rocks.iter() {
                commands.entity(entity).despawn_recursive();
            }
            spawn_rocks(&mut commands, &assets, placements);
            info!("Rescattered {} rocks", placements.len());
        }
        Err(e) => error!("Rock scatter failed: {e}"),
    }
}
