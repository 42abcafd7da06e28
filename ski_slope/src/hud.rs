use bevy::prelude::*;
use terrain_engine::CacheProbe;

use crate::game_state::GameState;
use crate::skier::Skier;
use crate::slope::ActiveTerrain;

/// HUD根节点标记
#[derive(Component)]
pub struct HudRoot;

/// 状态文本标记
#[derive(Component)]
pub struct StatusText;

/// 暂停提示标记
#[derive(Component)]
pub struct PausedBanner;

/// HUD插件
pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud)
            .add_systems(Update, update_status_text)
            .add_systems(OnEnter(GameState::Paused), show_paused_banner)
            .add_systems(OnExit(GameState::Paused), hide_paused_banner);
    }
}

fn setup_hud(mut commands: Commands) {
    // 创建HUD根节点
    let hud_root = commands
        .spawn((
            NodeBundle {
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    position_type: PositionType::Absolute,
                    flex_direction: FlexDirection::Column,
                    justify_content: JustifyContent::SpaceBetween,
                    padding: UiRect::all(Val::Px(12.0)),
                    ..default()
                },
                ..default()
            },
            HudRoot,
        ))
        .id();

    let status = commands
        .spawn((
            TextBundle::from_section(
                "",
                TextStyle {
                    font: default(),
                    font_size: 18.0,
                    color: Color::rgb(0.1, 0.1, 0.15),
                },
            ),
            StatusText,
        ))
        .id();

    let help = commands
        .spawn(TextBundle::from_section(
            "A/D steer   S brake   R new mountain   T new rocks   Esc pause",
            TextStyle {
                font: default(),
                font_size: 14.0,
                color: Color::rgba(0.1, 0.1, 0.15, 0.8),
            },
        ))
        .id();

    let banner = commands
        .spawn((
            TextBundle::from_section(
                "PAUSED",
                TextStyle {
                    font: default(),
                    font_size: 48.0,
                    color: Color::WHITE,
                },
            )
            .with_style(Style {
                position_type: PositionType::Absolute,
                left: Val::Percent(44.0),
                top: Val::Percent(45.0),
                ..default()
            }),
            PausedBanner,
        ))
        .insert(Visibility::Hidden)
        .id();

    commands.entity(hud_root).push_children(&[status, help, banner]);
}

/// 状态栏的一行文字
pub fn status_line(speed: f32, altitude: f32, cached: usize, probe: Option<&CacheProbe>) -> String {
    let cache = match probe {
        Some(p) if p.is_consistent() => "ok".to_string(),
        Some(p) => format!("diverged by {:.4}", p.divergence()),
        None => "n/a".to_string(),
    };
    format!(
        "Speed {:5.1} km/h   Altitude {:5.1} m   Cache {} heights ({})",
        speed * 3.6,
        altitude,
        cached,
        cache
    )
}

fn update_status_text(
    terrain: Option<Res<ActiveTerrain>>,
    skiers: Query<(&Skier, &Transform)>,
    mut texts: Query<&mut Text, With<StatusText>>,
) {
    let (Some(terrain), Ok((skier, transform))) = (terrain, skiers.get_single()) else {
        return;
    };
    let p = transform.translation;

    // 每帧抽查一次缓存与公式是否一致
    let probe = terrain.0.probe(p.x, p.z).ok();
    if let Some(probe) = probe.as_ref().filter(|probe| !probe.is_consistent()) {
        warn!("Height cache diverged at ({:.1}, {:.1}): {:?}", p.x, p.z, probe);
    }

    let line = status_line(skier.speed(), p.y, terrain.0.field().cache().len(), probe.as_ref());
    for mut text in texts.iter_mut() {
        text.sections[0].value = line.clone();
    }
}

fn show_paused_banner(mut banners: Query<&mut Visibility, With<PausedBanner>>) {
    for mut visibility in banners.iter_mut() {
        *visibility = Visibility::Visible;
    }
}

fn hide_paused_banner(mut banners: Query<&mut Visibility, With<PausedBanner>>) {
    for mut visibility in banners.iter_mut() {
        *visibility = Visibility::Hidden;
    }
}
