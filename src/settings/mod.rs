//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are hot-reloadable
//! using the RON watcher utilities (see `ron::setup_ron_watcher`).
use bevy::prelude::{KeyCode, MouseButton, Resource, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::physics::{LayerMask, Tag};
use crate::thermal::MeltableParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default = "GraphicsSettings::default_vsync")]
    pub vsync: bool, // Cap FPS to the display refresh rate.
    #[serde(default = "GraphicsSettings::default_gizmos")]
    pub gizmos: bool, // Draw collider and trigger outlines.
}

impl GraphicsSettings {
    fn default_vsync() -> bool { true }
    fn default_gizmos() -> bool { true }
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            vsync: Self::default_vsync(),
            gizmos: Self::default_gizmos(),
        }
    }
}

/// Controls / input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default)]
    pub invert_y: bool,
    #[serde(default)]
    pub invert_x: bool,
    #[serde(default = "ControlsSettings::default_sensitivity")]
    pub mouse_sensitivity: f32,
    /// Action name -> key or mouse button identifier. Missing actions fall
    /// back to the defaults below.
    #[serde(default = "ControlsSettings::default_keybinds")]
    pub keybinds: HashMap<String, String>,
}

impl ControlsSettings {
    fn default_sensitivity() -> f32 { 1.0 }

    fn default_keybinds() -> HashMap<String, String> {
        [
            ("forward", "W"),
            ("back", "S"),
            ("left", "A"),
            ("right", "D"),
            ("jump", "Space"),
            ("crouch", "LCtrl"),
            ("sprint", "LShift"),
            ("fire", "MouseLeft"),
            ("alt_fire", "MouseRight"),
            ("pause", "Escape"),
            ("toggle_gizmos", "F1"),
            ("dump_debug", "F3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Binding for `action`, falling back to the built-in default when the
    /// user entry is missing or unparsable.
    #[must_use]
    pub fn binding(&self, action: &str) -> Option<Binding> {
        self.keybinds
            .get(action)
            .and_then(|s| Settings::binding_from_str(s))
            .or_else(|| Self::default_keybinds().get(action).and_then(|s| Settings::binding_from_str(s)))
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            invert_y: false,
            invert_x: false,
            mouse_sensitivity: Self::default_sensitivity(),
            keybinds: Self::default_keybinds(),
        }
    }
}

/// Player locomotion tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSettings {
    #[serde(default = "MovementSettings::default_walk_speed")]
    pub walk_speed: f32,
    #[serde(default = "MovementSettings::default_sprint_speed")]
    pub sprint_speed: f32,
    #[serde(default = "MovementSettings::default_crouch_speed")]
    pub crouch_speed: f32,
    #[serde(default = "MovementSettings::default_ground_drag")]
    pub ground_drag: f32, // Linear drag while grounded; zero in the air.
    #[serde(default = "MovementSettings::default_jump_force")]
    pub jump_force: f32,
    #[serde(default = "MovementSettings::default_jump_cooldown")]
    pub jump_cooldown: f32,
    #[serde(default = "MovementSettings::default_air_multiplier")]
    pub air_multiplier: f32,
    #[serde(default = "MovementSettings::default_crouch_y_scale")]
    pub crouch_y_scale: f32,
    #[serde(default = "MovementSettings::default_player_height")]
    pub player_height: f32,
    #[serde(default = "MovementSettings::default_max_slope_angle")]
    pub max_slope_angle: f32, // Degrees.
    /// Layers the ground probe counts as standing ground.
    #[serde(default = "MovementSettings::default_ground_mask")]
    pub ground_mask: LayerMask,
}

impl MovementSettings {
    fn default_walk_speed() -> f32 { 7.0 }
    fn default_sprint_speed() -> f32 { 10.0 }
    fn default_crouch_speed() -> f32 { 3.5 }
    fn default_ground_drag() -> f32 { 5.0 }
    fn default_jump_force() -> f32 { 12.0 }
    fn default_jump_cooldown() -> f32 { 0.25 }
    fn default_air_multiplier() -> f32 { 0.4 }
    fn default_crouch_y_scale() -> f32 { 0.5 }
    fn default_player_height() -> f32 { 2.0 }
    fn default_max_slope_angle() -> f32 { 40.0 }
    fn default_ground_mask() -> LayerMask { LayerMask::GROUND }
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            walk_speed: Self::default_walk_speed(),
            sprint_speed: Self::default_sprint_speed(),
            crouch_speed: Self::default_crouch_speed(),
            ground_drag: Self::default_ground_drag(),
            jump_force: Self::default_jump_force(),
            jump_cooldown: Self::default_jump_cooldown(),
            air_multiplier: Self::default_air_multiplier(),
            crouch_y_scale: Self::default_crouch_y_scale(),
            player_height: Self::default_player_height(),
            max_slope_angle: Self::default_max_slope_angle(),
            ground_mask: Self::default_ground_mask(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSettings {
    #[serde(default = "HealthSettings::default_max_health")]
    pub max_health: f32, // -1 makes the player invulnerable.
    #[serde(default = "HealthSettings::default_damage_per_second")]
    pub damage_per_second: f32,
    #[serde(default = "HealthSettings::default_regeneration_delay")]
    pub regeneration_delay: f32,
    #[serde(default = "HealthSettings::default_regeneration_rate")]
    pub regeneration_rate: f32,
    #[serde(default = "HealthSettings::default_respawn_delay")]
    pub respawn_delay: f32,
}

impl HealthSettings {
    fn default_max_health() -> f32 { 100.0 }
    fn default_damage_per_second() -> f32 { 10.0 }
    fn default_regeneration_delay() -> f32 { 3.0 }
    fn default_regeneration_rate() -> f32 { 5.0 }
    fn default_respawn_delay() -> f32 { 2.0 }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            max_health: Self::default_max_health(),
            damage_per_second: Self::default_damage_per_second(),
            regeneration_delay: Self::default_regeneration_delay(),
            regeneration_rate: Self::default_regeneration_rate(),
            respawn_delay: Self::default_respawn_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellSettings {
    #[serde(default)]
    pub fire_angle_adjustment: f32, // Degrees of extra pitch; positive aims lower.
    #[serde(default = "SpellSettings::default_fire_toggle_interval")]
    pub fire_toggle_interval: f32,
    #[serde(default = "SpellSettings::default_fire_reach")]
    pub fire_reach: f32, // Distance from the player to the hitbox centre.
    #[serde(default = "SpellSettings::default_fire_half_extents")]
    pub fire_half_extents: Vec3,
    #[serde(default = "SpellSettings::default_ice_cooldown")]
    pub ice_cooldown: f32,
    #[serde(default = "SpellSettings::default_ice_clearance")]
    pub ice_clearance: f32, // Radius that must be free of ignore-tagged colliders.
    #[serde(default = "SpellSettings::default_ice_ignore_tags")]
    pub ice_ignore_tags: Vec<Tag>,
    #[serde(default = "SpellSettings::default_ice_half_extents")]
    pub ice_half_extents: Vec3,
    #[serde(default = "SpellSettings::default_ice_block")]
    pub ice_block: MeltableParams,
}

impl SpellSettings {
    fn default_fire_toggle_interval() -> f32 { 0.1 }
    fn default_fire_reach() -> f32 { 2.5 }
    fn default_fire_half_extents() -> Vec3 { Vec3::new(0.75, 0.75, 1.5) }
    fn default_ice_cooldown() -> f32 { 0.2 }
    fn default_ice_clearance() -> f32 { 1.0 }
    fn default_ice_ignore_tags() -> Vec<Tag> { vec![Tag::Wall, Tag::Teleporter] }
    fn default_ice_half_extents() -> Vec3 { Vec3::new(1.0, 0.25, 1.0) }
    fn default_ice_block() -> MeltableParams {
        MeltableParams {
            melt_speed: 0.25,
            min_scale: Vec3::new(0.1, 0.1, 0.1),
            residual_melt_time: 1.0,
            melts_naturally: true,
            melting_delay: 8.0,
        }
    }
}

impl Default for SpellSettings {
    fn default() -> Self {
        Self {
            fire_angle_adjustment: 0.0,
            fire_toggle_interval: Self::default_fire_toggle_interval(),
            fire_reach: Self::default_fire_reach(),
            fire_half_extents: Self::default_fire_half_extents(),
            ice_cooldown: Self::default_ice_cooldown(),
            ice_clearance: Self::default_ice_clearance(),
            ice_ignore_tags: Self::default_ice_ignore_tags(),
            ice_half_extents: Self::default_ice_half_extents(),
            ice_block: Self::default_ice_block(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "CameraSettings::default_distance")]
    pub distance: f32,
    #[serde(default = "CameraSettings::default_height")]
    pub height: f32, // Orbit pivot above the player origin.
    #[serde(default = "CameraSettings::default_max_pitch")]
    pub max_pitch: f32, // Degrees.
    #[serde(default = "CameraSettings::default_rotation_speed")]
    pub rotation_speed: f32, // Player model turn rate.
}

impl CameraSettings {
    fn default_distance() -> f32 { 6.0 }
    fn default_height() -> f32 { 1.5 }
    fn default_max_pitch() -> f32 { 70.0 }
    fn default_rotation_speed() -> f32 { 7.0 }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: Self::default_distance(),
            height: Self::default_height(),
            max_pitch: Self::default_max_pitch(),
            rotation_speed: Self::default_rotation_speed(),
        }
    }
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub movement: MovementSettings,
    #[serde(default)]
    pub health: HealthSettings,
    #[serde(default)]
    pub spells: SpellSettings,
    #[serde(default)]
    pub camera: CameraSettings,
}

/// A keyboard key or mouse button an action can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Key(KeyCode),
    Mouse(MouseButton),
}

const NAMED_KEYS: &[(&[&str], KeyCode)] = &[
    (&["F1"], KeyCode::F1),
    (&["F2"], KeyCode::F2),
    (&["F3"], KeyCode::F3),
    (&["F4"], KeyCode::F4),
    (&["F5"], KeyCode::F5),
    (&["F6"], KeyCode::F6),
    (&["F7"], KeyCode::F7),
    (&["F8"], KeyCode::F8),
    (&["F9"], KeyCode::F9),
    (&["F10"], KeyCode::F10),
    (&["F11"], KeyCode::F11),
    (&["F12"], KeyCode::F12),
    (&["LEFT", "ARROWLEFT"], KeyCode::ArrowLeft),
    (&["RIGHT", "ARROWRIGHT"], KeyCode::ArrowRight),
    (&["UP", "ARROWUP"], KeyCode::ArrowUp),
    (&["DOWN", "ARROWDOWN"], KeyCode::ArrowDown),
    (&["ESC", "ESCAPE"], KeyCode::Escape),
    (&["SPACE"], KeyCode::Space),
    (&["TAB"], KeyCode::Tab),
    (&["ENTER", "RETURN"], KeyCode::Enter),
    (&["BACKSPACE"], KeyCode::Backspace),
    (&["LSHIFT", "SHIFT"], KeyCode::ShiftLeft),
    (&["RSHIFT"], KeyCode::ShiftRight),
    (&["LCTRL", "CTRL", "CONTROL"], KeyCode::ControlLeft),
    (&["RCTRL"], KeyCode::ControlRight),
    (&["LALT", "ALT"], KeyCode::AltLeft),
    (&["RALT"], KeyCode::AltRight),
    (&["CAPSLOCK"], KeyCode::CapsLock),
];

const LETTER_KEYS: [KeyCode; 26] = [
    KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE, KeyCode::KeyF,
    KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ, KeyCode::KeyK, KeyCode::KeyL,
    KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO, KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR,
    KeyCode::KeyS, KeyCode::KeyT, KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX,
    KeyCode::KeyY, KeyCode::KeyZ,
];

const DIGIT_KEYS: [KeyCode; 10] = [
    KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
    KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
];

impl Settings {
    #[must_use]
    pub fn defaults() -> Self { Settings::default() }

    /// Convert a key identifier from `controls.keybinds` ("W", "Space", "F3")
    /// into a `KeyCode`. Case-insensitive.
    #[must_use]
    pub fn keycode_from_str(name: &str) -> Option<KeyCode> {
        let s = name.to_ascii_uppercase();
        if let &[c] = s.as_bytes() {
            return match c {
                b'A'..=b'Z' => Some(LETTER_KEYS[usize::from(c - b'A')]),
                b'0'..=b'9' => Some(DIGIT_KEYS[usize::from(c - b'0')]),
                _ => None,
            };
        }
        NAMED_KEYS
            .iter()
            .find(|(names, _)| names.contains(&s.as_str()))
            .map(|(_, kc)| *kc)
    }

    /// Like [`Settings::keycode_from_str`] but also accepts mouse buttons
    /// (`MouseLeft`, `MouseRight`, `MouseMiddle`).
    #[must_use]
    pub fn binding_from_str(name: &str) -> Option<Binding> {
        match name.to_ascii_uppercase().as_str() {
            "MOUSELEFT" | "LMB" => Some(Binding::Mouse(MouseButton::Left)),
            "MOUSERIGHT" | "RMB" => Some(Binding::Mouse(MouseButton::Right)),
            "MOUSEMIDDLE" | "MMB" => Some(Binding::Mouse(MouseButton::Middle)),
            _ => Self::keycode_from_str(name).map(Binding::Key),
        }
    }
}

pub mod loader;
