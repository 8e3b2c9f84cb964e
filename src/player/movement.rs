//! Slope-aware player locomotion.
//!
//! Input is sampled every frame (`locomotion_frame`): ground and slope
//! probes, jump, crouch, speed clamp, state classification and drag.
//! Movement forces are applied on the fixed physics step
//! (`locomotion_fixed`) from the last sampled input, so the force applied per
//! second does not depend on the frame rate.

use bevy::prelude::*;

use crate::input::ActionState;
use crate::physics::body::SOLID_LAYERS;
use crate::physics::{Body, ColliderSet, LayerMask, SpatialQuery};
use crate::player::{Orientation, Player};
use crate::settings::{MovementSettings, Settings};

/// Extra ground probe length beyond half the player height.
pub const GROUND_PROBE_MARGIN: f32 = 0.2;
/// Extra slope probe length beyond half the player height.
pub const SLOPE_PROBE_MARGIN: f32 = 0.3;
/// Downward impulse applied when crouching starts.
pub const CROUCH_IMPULSE: f32 = 5.0;
/// Downward force keeping the player on a slope while moving up it.
pub const SLOPE_HOLD_DOWN: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementState {
    #[default]
    Walking,
    Sprinting,
    Crouching,
    Airborne,
}

/// Movement state from this frame's inputs alone.
///
/// Priority: crouch, then sprint (grounded), then walk (grounded), else airborne.
#[must_use]
pub fn classify(grounded: bool, crouch_held: bool, sprint_held: bool) -> MovementState {
    if crouch_held {
        MovementState::Crouching
    } else if grounded && sprint_held {
        MovementState::Sprinting
    } else if grounded {
        MovementState::Walking
    } else {
        MovementState::Airborne
    }
}

/// Result of the two downward probes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundProbe {
    pub grounded: bool,
    /// Normal of the walkable slope under the player, if any. Flat ground
    /// is not a slope.
    pub slope_normal: Option<Vec3>,
}

#[must_use]
pub fn probe_ground(position: Vec3, params: &MovementSettings, query: &impl SpatialQuery) -> GroundProbe {
    let half = params.player_height * 0.5;
    let grounded = query
        .raycast(position, Vec3::NEG_Y, half + GROUND_PROBE_MARGIN, params.ground_mask)
        .is_some();

    let slope_normal = query
        .raycast(position, Vec3::NEG_Y, half + SLOPE_PROBE_MARGIN, SOLID_LAYERS)
        .map(|hit| hit.normal)
        .filter(|normal| {
            let angle = Vec3::Y.angle_between(*normal).to_degrees();
            angle > 1e-3 && angle < params.max_slope_angle
        });

    GroundProbe { grounded, slope_normal }
}

#[derive(Component, Debug, Clone)]
pub struct Locomotion {
    pub state: MovementState,
    /// Speed cap for the current state. Airborne keeps the previous cap.
    pub move_speed: f32,
    pub grounded: bool,
    pub slope_normal: Option<Vec3>,
    /// Set by a jump so slope handling does not pin the player down; cleared
    /// when the jump cooldown ends.
    pub exiting_slope: bool,
    /// Seconds until the next jump is allowed.
    pub jump_cooldown: Option<f32>,
    pub start_y_scale: f32,
    /// Last sampled move axis, consumed by the fixed step.
    pub input: Vec2,
}

impl Locomotion {
    #[must_use]
    pub fn new(params: &MovementSettings, start_y_scale: f32) -> Self {
        Locomotion {
            state: MovementState::Walking,
            move_speed: params.walk_speed,
            grounded: false,
            slope_normal: None,
            exiting_slope: false,
            jump_cooldown: None,
            start_y_scale,
            input: Vec2::ZERO,
        }
    }

    #[must_use]
    pub fn can_jump(&self) -> bool {
        self.jump_cooldown.is_none()
    }

    /// On a walkable slope and not leaving it through a jump.
    #[must_use]
    pub fn slope_active(&self) -> bool {
        self.slope_normal.is_some() && !self.exiting_slope
    }

    fn tick_jump_cooldown(&mut self, dt: f32) {
        if let Some(remaining) = self.jump_cooldown.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.jump_cooldown = None;
                self.exiting_slope = false;
            }
        }
    }

    fn jump(&mut self, body: &mut Body, params: &MovementSettings) {
        self.exiting_slope = true;
        body.velocity.y = 0.0;
        body.add_impulse(Vec3::Y * params.jump_force);
        self.jump_cooldown = Some(params.jump_cooldown);
    }

    fn clamp_speed(&self, body: &mut Body) {
        if self.slope_active() {
            body.velocity = body.velocity.clamp_length_max(self.move_speed);
        } else {
            let flat = Vec3::new(body.velocity.x, 0.0, body.velocity.z).clamp_length_max(self.move_speed);
            body.velocity = Vec3::new(flat.x, body.velocity.y, flat.z);
        }
    }

    /// Per-frame update. `scale` is the player's transform scale; crouching
    /// changes its Y component.
    pub fn frame_tick(
        &mut self,
        dt: f32,
        actions: &ActionState,
        probe: GroundProbe,
        body: &mut Body,
        scale: &mut Vec3,
        params: &MovementSettings,
    ) {
        self.grounded = probe.grounded;
        self.slope_normal = probe.slope_normal;
        self.input = actions.move_axis;

        self.tick_jump_cooldown(dt);
        if actions.jump_triggered && self.can_jump() && self.grounded {
            self.jump(body, params);
        }

        if actions.crouch_triggered {
            scale.y = params.crouch_y_scale;
            body.add_impulse(Vec3::NEG_Y * CROUCH_IMPULSE);
        }
        if actions.crouch_released {
            scale.y = self.start_y_scale;
        }
        body.half_height = params.player_height * 0.5 * scale.y / self.start_y_scale.max(f32::EPSILON);

        self.clamp_speed(body);

        self.state = classify(self.grounded, actions.crouch_held, actions.sprint_held);
        self.move_speed = match self.state {
            MovementState::Crouching => params.crouch_speed,
            MovementState::Sprinting => params.sprint_speed,
            MovementState::Walking => params.walk_speed,
            MovementState::Airborne => self.move_speed,
        };

        body.drag = if self.grounded { params.ground_drag } else { 0.0 };
    }

    /// Fixed-step force from the last sampled input. Returns the force to add
    /// and whether gravity should apply this step.
    #[must_use]
    pub fn movement_force(&self, orientation: &Orientation, body_velocity: Vec3, params: &MovementSettings) -> (Vec3, bool) {
        let dir = (orientation.forward * self.input.y + orientation.right() * self.input.x).normalize_or_zero();

        let force = match self.slope_normal {
            Some(normal) if !self.exiting_slope => {
                let along = (dir - normal * dir.dot(normal)).normalize_or_zero();
                let mut f = along * self.move_speed * 20.0;
                if body_velocity.y > 0.0 {
                    f += Vec3::NEG_Y * SLOPE_HOLD_DOWN;
                }
                f
            }
            _ if self.grounded => dir * self.move_speed * 10.0,
            _ => dir * self.move_speed * 10.0 * params.air_multiplier,
        };

        (force, self.slope_normal.is_none())
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn locomotion_frame(
    time: Res<Time>,
    actions: Res<ActionState>,
    colliders: Res<ColliderSet>,
    settings: Res<Settings>,
    mut players: Query<(&mut Locomotion, &mut Body, &mut Transform), With<Player>>,
) {
    let dt = time.delta_seconds();
    for (mut locomotion, mut body, mut tf) in &mut players {
        let probe = probe_ground(tf.translation, &settings.movement, &*colliders);
        let previous = locomotion.state;
        locomotion.frame_tick(dt, &actions, probe, &mut body, &mut tf.scale, &settings.movement);
        if locomotion.state != previous {
            debug!("movement state {:?} -> {:?}", previous, locomotion.state);
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn locomotion_fixed(settings: Res<Settings>, mut players: Query<(&Locomotion, &Orientation, &mut Body), With<Player>>) {
    for (locomotion, orientation, mut body) in &mut players {
        let (force, use_gravity) = locomotion.movement_force(orientation, body.velocity, &settings.movement);
        body.add_force(force);
        body.use_gravity = use_gravity;
    }
}
