//! Per-frame action state built from the configured keybinds.
//!
//! Gameplay systems never look at raw keys; they read [`ActionState`], which
//! is rebuilt at the start of every frame from `Settings.controls`. While
//! [`InputEnabled`] is false (during a respawn) the state is left empty.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

use crate::settings::{Binding, ControlsSettings, Settings};

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct ActionState {
    /// x = strafe (right positive), y = forward.
    pub move_axis: Vec2,
    pub jump_triggered: bool,
    pub crouch_triggered: bool,
    pub crouch_held: bool,
    pub crouch_released: bool,
    pub sprint_held: bool,
    pub fire_held: bool,
    pub alt_fire_triggered: bool,
    pub pause_triggered: bool,
    pub toggle_gizmos: bool,
    pub dump_debug: bool,
    /// Mouse delta for this frame with axis inversion applied.
    pub look_delta: Vec2,
}

/// Cleared while the player is respawning.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEnabled(pub bool);

impl Default for InputEnabled {
    fn default() -> Self {
        InputEnabled(true)
    }
}

/// Raw button state for both devices.
pub struct Buttons<'a> {
    pub keys: &'a ButtonInput<KeyCode>,
    pub mouse: &'a ButtonInput<MouseButton>,
}

impl Buttons<'_> {
    fn pressed(&self, binding: Option<Binding>) -> bool {
        match binding {
            Some(Binding::Key(k)) => self.keys.pressed(k),
            Some(Binding::Mouse(b)) => self.mouse.pressed(b),
            None => false,
        }
    }

    fn just_pressed(&self, binding: Option<Binding>) -> bool {
        match binding {
            Some(Binding::Key(k)) => self.keys.just_pressed(k),
            Some(Binding::Mouse(b)) => self.mouse.just_pressed(b),
            None => false,
        }
    }

    fn just_released(&self, binding: Option<Binding>) -> bool {
        match binding {
            Some(Binding::Key(k)) => self.keys.just_released(k),
            Some(Binding::Mouse(b)) => self.mouse.just_released(b),
            None => false,
        }
    }
}

impl ActionState {
    /// Build the action state for one frame.
    #[must_use]
    pub fn sample(controls: &ControlsSettings, buttons: &Buttons, raw_look: Vec2) -> Self {
        let held = |action: &str| buttons.pressed(controls.binding(action));
        let pressed = |action: &str| buttons.just_pressed(controls.binding(action));
        let axis = |pos: &str, neg: &str| f32::from(u8::from(held(pos))) - f32::from(u8::from(held(neg)));

        let mut look_delta = raw_look;
        if controls.invert_x {
            look_delta.x = -look_delta.x;
        }
        if controls.invert_y {
            look_delta.y = -look_delta.y;
        }

        ActionState {
            move_axis: Vec2::new(axis("right", "left"), axis("forward", "back")),
            jump_triggered: pressed("jump"),
            crouch_triggered: pressed("crouch"),
            crouch_held: held("crouch"),
            crouch_released: buttons.just_released(controls.binding("crouch")),
            sprint_held: held("sprint"),
            fire_held: held("fire"),
            alt_fire_triggered: pressed("alt_fire"),
            pause_triggered: pressed("pause"),
            toggle_gizmos: pressed("toggle_gizmos"),
            dump_debug: pressed("dump_debug"),
            look_delta,
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn sample_actions(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    settings: Res<Settings>,
    enabled: Res<InputEnabled>,
    mut actions: ResMut<ActionState>,
) {
    let raw_look: Vec2 = motion.read().map(|ev| ev.delta).sum();
    if !enabled.0 {
        *actions = ActionState::default();
        return;
    }
    let buttons = Buttons { keys: &keys, mouse: &mouse };
    *actions = ActionState::sample(&settings.controls, &buttons, raw_look);
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputSet;

pub struct ActionsPlugin;

impl Plugin for ActionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActionState>()
            .init_resource::<InputEnabled>()
            .add_systems(PreUpdate, sample_actions.in_set(InputSet).after(bevy::input::InputSystem));
    }
}
