use bevy::prelude::*;
use terrain_engine::{RockPlacement, TreePlacement};

pub mod surface_mesh;

pub use surface_mesh::{build_surface_mesh, SlopeSurface};

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_lighting, load_obstacle_assets));
    }
}

/// 岩石标记，index 对应 ObstacleSet::rocks
#[derive(Component)]
pub struct Rock {
    pub index: usize,
}

/// 树木标记，index 对应 ObstacleSet::trees
#[derive(Component)]
pub struct Tree {
    pub index: usize,
}

/// 障碍物和雪面共用的网格与材质
#[derive(Resource, Default)]
pub struct ObstacleAssets {
    pub rock_mesh: Handle<Mesh>,
    pub rock_material: Handle<StandardMaterial>,
    pub trunk_mesh: Handle<Mesh>,
    pub trunk_material: Handle<StandardMaterial>,
    pub crown_mesh: Handle<Mesh>,
    pub crown_material: Handle<StandardMaterial>,
    pub snow_material: Handle<StandardMaterial>,
}

fn setup_lighting(mut commands: Commands) {
    // 添加环境光，雪地反光较强
    commands.insert_resource(AmbientLight {
        color: Color::rgb(0.75, 0.8, 0.9),
        brightness: 0.45,
    });

    // 添加方向光（太阳光）
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            color: Color::rgb(1.0, 0.97, 0.9),
            illuminance: 12000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.8, 0.4, 0.0)),
        ..default()
    });
}

fn load_obstacle_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let assets = ObstacleAssets {
        rock_mesh: meshes.add(Mesh::from(shape::UVSphere { radius: 1.0, sectors: 7, stacks: 5 })),
        rock_material: materials.add(StandardMaterial {
            base_color: Color::rgb(0.42, 0.4, 0.38),
            perceptual_roughness: 0.95,
            ..default()
        }),
        trunk_mesh: meshes.add(Mesh::from(shape::Cylinder { radius: 0.25, height: 2.0, resolution: 8, segments: 1 })),
        trunk_material: materials.add(Color::rgb(0.35, 0.24, 0.15).into()),
        crown_mesh: meshes.add(Mesh::from(shape::UVSphere { radius: 1.4, sectors: 8, stacks: 6 })),
        crown_material: materials.add(Color::rgb(0.12, 0.3, 0.18).into()),
        // 顶点颜色会乘上这个底色
        snow_material: materials.add(StandardMaterial {
            base_color: Color::WHITE,
            perceptual_roughness: 0.8,
            ..default()
        }),
    };
    commands.insert_resource(assets);
}

/// 岩石朝向：先绕 y 轴随机偏转，再把 +y 转到坡面法线
pub fn rock_transform(rock: &RockPlacement) -> Transform {
    let normal = Vec3::from(rock.normal);
    let rotation = Quat::from_rotation_arc(Vec3::Y, normal) * Quat::from_rotation_y(rock.yaw);
    Transform {
        translation: Vec3::new(rock.x, rock.y, rock.z),
        rotation,
        scale: Vec3::new(rock.size, rock.size * 0.7, rock.size * 0.9),
    }
}

pub fn spawn_rocks(commands: &mut Commands, assets: &ObstacleAssets, rocks: &[RockPlacement]) {
    for (index, rock) in rocks.iter().enumerate() {
        commands.spawn((
            PbrBundle {
                mesh: assets.rock_mesh.clone(),
                material: assets.rock_material.clone(),
                transform: rock_transform(rock),
                ..default()
            },
            Rock { index },
        ));
    }
}

pub fn spawn_trees(commands: &mut Commands, assets: &ObstacleAssets, trees: &[TreePlacement]) {
    for (index, tree) in trees.iter().enumerate() {
        commands
            .spawn((SpatialBundle::from_transform(Transform::from_xyz(tree.x, tree.y, tree.z)), Tree { index }))
            .with_children(|parent| {
                parent.spawn(PbrBundle {
                    mesh: assets.trunk_mesh.clone(),
                    material: assets.trunk_material.clone(),
                    transform: Transform::from_xyz(0.0, 1.0, 0.0),
                    ..default()
                });
                parent.spawn(PbrBundle {
                    mesh: assets.crown_mesh.clone(),
                    material: assets.crown_material.clone(),
                    transform: Transform::from_xyz(0.0, 3.4, 0.0).with_scale(Vec3::new(1.0, 1.7, 1.0)),
                    ..default()
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_rock_only_turns_about_y() {
        let rock = RockPlacement {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            size: 1.5,
            normal: [0.0, 1.0, 0.0],
            yaw: 0.7,
            companion: false,
        };
        let transform = rock_transform(&rock);
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        let up = transform.rotation * Vec3::Y;
        assert!((up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn rock_on_compound_slope_sits_flush() {
        // 坡度 gx = gz = 1 时的法线
        let normal = Vec3::new(-1.0, 1.0, -1.0).normalize();
        let rock = RockPlacement {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            size: 1.0,
            normal: normal.to_array(),
            yaw: 2.3,
            companion: false,
        };
        let up = rock_transform(&rock).rotation * Vec3::Y;
        assert!((up - normal).length() < 1e-5);
    }
}
