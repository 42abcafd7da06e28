use bevy::prelude::*;

use crate::game_state::GameState;
use crate::skier::{Skier, SkierSet};
use crate::slope::ActiveTerrain;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(Update, follow_skier.in_set(SkierSet::Follow).run_if(in_state(GameState::InGame)));
    }
}

/// 跟随相机参数
#[derive(Component, Debug, Clone)]
pub struct FollowCamera {
    /// 在滑雪者身后的距离
    pub distance: f32,
    pub height: f32,
    /// 越大跟得越紧
    pub smoothing: f32,
    /// 相机与雪面的最小间距
    pub ground_margin: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self { distance: 9.0, height: 4.0, smoothing: 4.0, ground_margin: 1.5 }
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3dBundle {
            transform: Transform::from_xyz(0.0, 50.0, 12.0).looking_at(Vec3::new(0.0, 40.0, -6.0), Vec3::Y),
            ..default()
        },
        FollowCamera::default(),
    ));
}

/// 不让相机钻进雪面
pub fn clamp_above_ground(position: Vec3, ground: f32, margin: f32) -> Vec3 {
    Vec3::new(position.x, position.y.max(ground + margin), position.z)
}

fn follow_skier(
    time: Res<Time>,
    terrain: Option<Res<ActiveTerrain>>,
    skiers: Query<(&Skier, &Transform), Without<FollowCamera>>,
    mut cameras: Query<(&FollowCamera, &mut Transform)>,
) {
    let Ok((skier, target)) = skiers.get_single() else {
        return;
    };

    let forward = skier.forward();
    let anchor = target.translation;
    for (follow, mut transform) in cameras.iter_mut() {
        let desired = anchor - Vec3::new(forward.x, 0.0, forward.y) * follow.distance + Vec3::Y * follow.height;
        let t = 1.0 - (-follow.smoothing * time.delta_seconds()).exp();
        let mut position = transform.translation.lerp(desired, t);

        if let Some(terrain) = terrain.as_ref() {
            if let Ok(ground) = terrain.0.height(position.x, position.z) {
                position = clamp_above_ground(position, ground, follow.ground_margin);
            }
        }

        *transform = Transform::from_translation(position).looking_at(anchor + Vec3::Y, Vec3::Y);
    }
}
