use bevy::prelude::*;
use terrain_engine::{ObstacleKind, Terrain};

use crate::game_state::GameState;
use crate::slope::{ActiveTerrain, RebuildSlope};

pub struct SkierPlugin;

impl Plugin for SkierPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SkierSettings>()
            .configure_sets(Update, (SkierSet::Move, SkierSet::Collide, SkierSet::Follow).chain())
            .add_systems(Startup, spawn_skier)
            .add_systems(Update, reset_on_rebuild)
            .add_systems(Update, move_skier.in_set(SkierSet::Move).run_if(in_state(GameState::InGame)));
    }
}

/// 滑雪者相关系统的执行顺序
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkierSet {
    Move,
    Collide,
    Follow,
}

/// 滑雪物理参数
#[derive(Resource, Debug, Clone)]
pub struct SkierSettings {
    pub gravity: f32,
    /// 雪面滑动摩擦系数
    pub friction: f32,
    /// 空气阻力系数（与速度平方成正比）
    pub drag: f32,
    /// 刹车减速度
    pub brake: f32,
    /// 转向角速度（弧度/秒）
    pub steer_rate: f32,
    /// 雪板抓地，侧向速度每秒衰减的比例
    pub edge_grip: f32,
    pub max_speed: f32,
    /// 地面下坠所需的加速度超过 launch_factor 倍重力时起跳
    pub launch_factor: f32,
    /// 碰撞半径
    pub radius: f32,
    /// 出发点 (x, z)
    pub start: Vec2,
    /// 单步最大时长，避免掉帧时穿过障碍物
    pub max_step: f32,
}

impl Default for SkierSettings {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            friction: 0.04,
            drag: 0.003,
            brake: 8.0,
            steer_rate: 1.8,
            edge_grip: 3.0,
            max_speed: 30.0,
            launch_factor: 1.5,
            radius: 0.4,
            start: Vec2::new(0.0, -6.0),
            max_step: 1.0 / 30.0,
        }
    }
}

/// 滑雪者状态
#[derive(Component, Debug, Clone, Default)]
pub struct Skier {
    pub velocity: Vec3,
    /// 朝向，0 表示面向 -z
    pub heading: f32,
    pub airborne: bool,
    /// 上一帧接触的障碍物，用于碰撞事件去重
    pub last_hit: Option<(ObstacleKind, usize)>,
}

impl Skier {
    pub fn forward(&self) -> Vec2 {
        Vec2::new(-self.heading.sin(), -self.heading.cos())
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 一帧的操作输入
#[derive(Debug, Clone, Copy, Default)]
pub struct SkierInput {
    /// 正值向左转
    pub steer: f32,
    pub brake: bool,
}

/// 每步结束时的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Riding,
    Launched,
    Landed,
    /// 到达山脚边界
    Finished,
}

fn spawn_skier(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<SkierSettings>,
) {
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Mesh::from(shape::Capsule { radius: 0.3, depth: 1.0, ..default() })),
            material: materials.add(Color::rgb(0.85, 0.15, 0.1).into()),
            transform: Transform::from_xyz(settings.start.x, 0.0, settings.start.y),
            ..default()
        },
        Skier::default(),
    ));
}

fn reset_on_rebuild(
    mut events: EventReader<RebuildSlope>,
    settings: Res<SkierSettings>,
    mut skiers: Query<(&mut Skier, &mut Transform)>,
) {
    if events.read().count() == 0 {
        return;
    }
    for (mut skier, mut transform) in skiers.iter_mut() {
        skier.reset();
        transform.translation = Vec3::new(settings.start.x, transform.translation.y, settings.start.y);
    }
}

fn move_skier(
    keyboard: Res<Input<KeyCode>>,
    time: Res<Time>,
    settings: Res<SkierSettings>,
    terrain: Option<Res<ActiveTerrain>>,
    mut skiers: Query<(&mut Skier, &mut Transform)>,
) {
    let Some(terrain) = terrain else {
        return;
    };

    let mut input = SkierInput::default();
    if keyboard.pressed(KeyCode::A) || keyboard.pressed(KeyCode::Left) {
        input.steer += 1.0;
    }
    if keyboard.pressed(KeyCode::D) || keyboard.pressed(KeyCode::Right) {
        input.steer -= 1.0;
    }
    input.brake = keyboard.pressed(KeyCode::S) || keyboard.pressed(KeyCode::Down);

    let dt = time.delta_seconds().min(settings.max_step);
    if dt <= 0.0 {
        return;
    }

    for (mut skier, mut transform) in skiers.iter_mut() {
        match step_skier(&mut skier, &mut transform.translation, input, &terrain.0, &settings, dt) {
            Ok(StepOutcome::Launched) => debug!("Airborne at {:?}", transform.translation),
            Ok(StepOutcome::Finished) => {
                info!("Run finished, top speed reached the valley");
                respawn(&mut skier, &mut transform.translation, &terrain.0, &settings);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Skier left the height field: {e}");
                respawn(&mut skier, &mut transform.translation, &terrain.0, &settings);
            }
        }
        transform.rotation = Quat::from_rotation_y(skier.heading);
    }
}

fn respawn(skier: &mut Skier, position: &mut Vec3, terrain: &Terrain, settings: &SkierSettings) {
    skier.reset();
    let y = terrain.height(settings.start.x, settings.start.y).unwrap_or(position.y);
    *position = Vec3::new(settings.start.x, y, settings.start.y);
}

/// 推进一步滑雪物理
///
/// 贴地时沿坡面梯度加速，受雪板抓地、摩擦和空气阻力影响；
/// 地面突然下沉（跳台边缘）时转为抛体运动，落地后重新贴地。
pub fn step_skier(
    skier: &mut Skier,
    position: &mut Vec3,
    input: SkierInput,
    terrain: &Terrain,
    settings: &SkierSettings,
    dt: f32,
) -> terrain_engine::Result<StepOutcome> {
    skier.heading += input.steer * settings.steer_rate * dt;

    if skier.airborne {
        skier.velocity.y -= settings.gravity * dt;
        *position += skier.velocity * dt;
        let finished = clamp_to_footprint(position, terrain);
        let floor = terrain.height(position.x, position.z)?;
        if position.y > floor {
            return Ok(if finished { StepOutcome::Finished } else { StepOutcome::Riding });
        }
        // 落地后竖直速度贴合坡面
        let landing = terrain.gradient(position.x, position.z)?;
        position.y = floor;
        skier.velocity.y = landing.x * skier.velocity.x + landing.z * skier.velocity.z;
        skier.airborne = false;
        return Ok(if finished { StepOutcome::Finished } else { StepOutcome::Landed });
    }

    let ground = terrain.sample(position.x, position.z)?;
    let gradient = Vec2::new(ground.gradient.x, ground.gradient.z);
    let slope_accel = -gradient * settings.gravity / (1.0 + gradient.length_squared());

    let mut planar = Vec2::new(skier.velocity.x, skier.velocity.z) + slope_accel * dt;

    // 侧向速度被雪板边刃吃掉
    let forward = skier.forward();
    let along = planar.dot(forward);
    let lateral = planar - forward * along;
    planar = forward * along + lateral * (1.0 - settings.edge_grip * dt).max(0.0);

    let speed = planar.length();
    if speed > 0.0 {
        let mut decel = settings.friction * settings.gravity + settings.drag * speed * speed;
        if input.brake {
            decel += settings.brake;
        }
        let new_speed = (speed - decel * dt).clamp(0.0, settings.max_speed);
        planar *= new_speed / speed;
    }

    let climb_rate = skier.velocity.y;
    let mut next = Vec3::new(position.x + planar.x * dt, ground.height, position.z + planar.y * dt);
    let finished = clamp_to_footprint(&mut next, terrain);
    let next_ground = terrain.sample(next.x, next.z)?;
    let surface_rate = next_ground.gradient.x * planar.x + next_ground.gradient.z * planar.y;

    let outcome = if climb_rate - surface_rate > settings.launch_factor * settings.gravity * dt {
        // 雪面下坠得比重力还快，保持原有上升速度离开雪面
        skier.airborne = true;
        next.y = ground.height + climb_rate * dt;
        skier.velocity = Vec3::new(planar.x, climb_rate, planar.y);
        StepOutcome::Launched
    } else {
        next.y = next_ground.height;
        skier.velocity = Vec3::new(planar.x, surface_rate, planar.y);
        StepOutcome::Riding
    };

    *position = next;
    Ok(if finished { StepOutcome::Finished } else { outcome })
}

/// 限制在山体范围内，返回是否到达山脚一侧
fn clamp_to_footprint(position: &mut Vec3, terrain: &Terrain) -> bool {
    let surface = &terrain.config().surface;
    let half_w = surface.width / 2.0;
    let half_d = surface.depth / 2.0;
    position.x = position.x.clamp(-half_w, half_w);
    position.z = position.z.clamp(-half_d, half_d);
    position.z <= -half_d + 1.0
}
