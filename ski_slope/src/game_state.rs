use bevy::prelude::*;

/// 游戏状态枚举
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    InGame,
    Paused,
}

/// 游戏状态管理插件
pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.add_state::<GameState>()
           .add_systems(Update, handle_escape_key);
    }
}

/// 处理ESC键切换暂停状态
fn handle_escape_key(
    keyboard: Res<Input<KeyCode>>,
    current_state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        match current_state.get() {
            GameState::InGame => {
                info!("Paused");
                next_state.set(GameState::Paused);
            }
            GameState::Paused => {
                info!("Resumed");
                next_state.set(GameState::InGame);
            }
        }
    }
}
