use bevy::prelude::*;
use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};

mod camera;
mod collision;
mod forest;
mod game_state;
mod hud;
mod rendering;
mod skier;
mod slope;

use crate::game_state::GameStatePlugin;

fn main() {
    App::new()
        // 天空颜色
        .insert_resource(ClearColor(Color::rgb(0.62, 0.78, 0.93)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Ski Slope".into(),
                resolution: (1280.0, 720.0).into(),
                resizable: true,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(LogDiagnosticsPlugin::default())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // 游戏状态管理
        .add_plugins(GameStatePlugin)
        // 渲染和山体
        .add_plugins(rendering::RenderingPlugin)
        .add_plugins(slope::SlopePlugin)
        // 滑雪者、碰撞、相机
        .add_plugins(skier::SkierPlugin)
        .add_plugins(collision::CollisionPlugin)
        .add_plugins(camera::CameraPlugin)
        .add_plugins(hud::HudPlugin)
        .run();
}
