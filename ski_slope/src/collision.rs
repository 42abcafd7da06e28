use bevy::prelude::*;
use terrain_engine::{ObstacleHit, ObstacleKind};

use crate::game_state::GameState;
use crate::skier::{Skier, SkierSet, SkierSettings};
use crate::slope::ActiveTerrain;

/// 撞击后保留的水平速度比例
pub const IMPACT_DAMPING: f32 = 0.35;

/// 滑雪者撞上岩石或树木
#[derive(Event, Debug, Clone, Copy)]
pub struct ObstacleCollision {
    pub kind: ObstacleKind,
    pub index: usize,
    /// 撞击前的速度
    pub speed: f32,
}

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ObstacleCollision>()
            .add_systems(
                Update,
                (resolve_obstacle_collisions, log_collisions)
                    .chain()
                    .in_set(SkierSet::Collide)
                    .run_if(in_state(GameState::InGame)),
            );
    }
}

/// 把位置推出障碍物，并去掉指向障碍物的速度分量
pub fn push_out(position: Vec2, velocity: Vec2, hit: &ObstacleHit) -> (Vec2, Vec2) {
    let offset = position - Vec2::new(hit.x, hit.z);
    // 正好落在圆心上时随便选一个方向
    let normal = offset.try_normalize().unwrap_or(Vec2::X);
    let position = position + normal * hit.overlap;

    let inward = velocity.dot(normal);
    let velocity = if inward < 0.0 { velocity - normal * inward } else { velocity };
    (position, velocity * IMPACT_DAMPING)
}

fn resolve_obstacle_collisions(
    terrain: Option<Res<ActiveTerrain>>,
    settings: Res<SkierSettings>,
    mut skiers: Query<(&mut Skier, &mut Transform)>,
    mut collisions: EventWriter<ObstacleCollision>,
) {
    let Some(terrain) = terrain else {
        return;
    };
    let terrain = &terrain.0;

    for (mut skier, mut transform) in skiers.iter_mut() {
        let p = transform.translation;
        let Some(hit) = terrain.obstacles().nearest_hit(p.x, p.z, settings.radius) else {
            skier.last_hit = None;
            continue;
        };

        let speed = skier.speed();
        let (planar, velocity) = push_out(Vec2::new(p.x, p.z), Vec2::new(skier.velocity.x, skier.velocity.z), &hit);
        skier.velocity = Vec3::new(velocity.x, skier.velocity.y, velocity.y);
        transform.translation.x = planar.x;
        transform.translation.z = planar.y;
        if !skier.airborne {
            if let Ok(y) = terrain.height(planar.x, planar.y) {
                transform.translation.y = y;
            }
        }

        let id = (hit.kind, hit.index);
        if skier.last_hit != Some(id) {
            skier.last_hit = Some(id);
            collisions.send(ObstacleCollision { kind: hit.kind, index: hit.index, speed });
        }
    }
}

fn log_collisions(mut collisions: EventReader<ObstacleCollision>) {
    for collision in collisions.read() {
        info!("Hit {:?} #{} at {:.1} m/s", collision.kind, collision.index, collision.speed);
    }
}
