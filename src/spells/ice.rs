//! Ice spell: place a meltable ice block where the camera is looking.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::input::ActionState;
use crate::physics::{Collider, ColliderSet, LayerMask, Sensor, Shape, SpatialQuery, Tag, TriggerVolume};
use crate::player::{Player, ThirdPersonCamera};
use crate::scene::SceneEntity;
use crate::settings::{Settings, SpellSettings};
use crate::thermal::Meltable;

/// Cooldown between successful casts. Lives on the player.
#[derive(Component, Debug, Clone, Default)]
pub struct IceCaster {
    pub cooldown: f32,
}

impl IceCaster {
    pub fn tick(&mut self, dt: f32) {
        self.cooldown -= dt;
    }

    #[must_use]
    pub fn ready(&self) -> bool {
        self.cooldown <= 0.0
    }
}

/// Result of aiming an ice cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IcePlacement {
    Miss,
    /// The ray hit the player or an ignore-tagged collider.
    Rejected(Tag),
    /// An ignore-tagged collider is too close to the hit point.
    Blocked(Tag),
    Place(Vec3),
}

/// Decide where (and whether) an ice block goes for a ray from `origin`
/// along `dir`.
///
/// # Example:
///
/// ```
/// use bevy::prelude::*;
/// use cinderfrost::physics::{Collider, ColliderSet, LayerMask, Tag};
/// use cinderfrost::spells::{IcePlacement, plan_ice_placement};
///
/// let mut set = ColliderSet::default();
/// set.push(None, Collider::cuboid(Vec3::new(5.0, 0.5, 5.0), Tag::Ground, LayerMask::GROUND), Vec3::ZERO, Quat::IDENTITY);
/// let plan = plan_ice_placement(&set, Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, &[Tag::Wall], 1.0);
/// assert_eq!(plan, IcePlacement::Place(Vec3::new(0.0, 0.5, 0.0)));
/// ```
pub fn plan_ice_placement(query: &impl SpatialQuery, origin: Vec3, dir: Vec3, ignore_tags: &[Tag], clearance: f32) -> IcePlacement {
    let Some(hit) = query.raycast(origin, dir, f32::INFINITY, LayerMask::ALL) else {
        return IcePlacement::Miss;
    };
    if hit.tag == Tag::Player || ignore_tags.contains(&hit.tag) {
        return IcePlacement::Rejected(hit.tag);
    }
    if let Some(near) = query.overlap_sphere(hit.point, clearance).into_iter().find(|o| ignore_tags.contains(&o.tag)) {
        return IcePlacement::Blocked(near.tag);
    }
    IcePlacement::Place(hit.point)
}

/// Ice block entity: solid, extinguishes what it touches, melts under fire.
pub fn spawn_ice_block(commands: &mut Commands, spells: &SpellSettings, at: Vec3) -> Entity {
    let half_extents = spells.ice_half_extents;
    commands
        .spawn((
            Name::new("ice block"),
            SceneEntity,
            SpatialBundle::from_transform(Transform::from_translation(at)),
            Collider::cuboid(half_extents, Tag::Ice, LayerMask::GROUND),
            TriggerVolume::new(Shape::Cuboid { half_extents }, Tag::Ice),
            Sensor::new(half_extents.max_element()),
            Meltable::new(&spells.ice_block, Vec3::ONE),
        ))
        .id()
}

#[derive(SystemParam)]
pub struct IceCastCtx<'w, 's> {
    pub time: Res<'w, Time>,
    pub actions: Res<'w, ActionState>,
    pub settings: Res<'w, Settings>,
    pub colliders: Res<'w, ColliderSet>,
    pub cameras: Query<'w, 's, &'static Transform, With<ThirdPersonCamera>>,
    pub casters: Query<'w, 's, &'static mut IceCaster, With<Player>>,
    pub commands: Commands<'w, 's>,
}

pub fn cast_ice(mut ctx: IceCastCtx) {
    let dt = ctx.time.delta_seconds();
    let Ok(mut caster) = ctx.casters.get_single_mut() else { return };
    caster.tick(dt);
    if !ctx.actions.alt_fire_triggered || !caster.ready() {
        return;
    }
    let Ok(camera) = ctx.cameras.get_single() else {
        warn!("ice cast without a camera");
        return;
    };

    let spells = &ctx.settings.spells;
    match plan_ice_placement(&*ctx.colliders, camera.translation, *camera.forward(), &spells.ice_ignore_tags, spells.ice_clearance) {
        IcePlacement::Miss => info!("ice spell hit nothing"),
        IcePlacement::Rejected(tag) => debug!("ice spell cannot target {:?}", tag),
        IcePlacement::Blocked(tag) => debug!("ice block too close to {:?}", tag),
        IcePlacement::Place(point) => {
            spawn_ice_block(&mut ctx.commands, spells, point);
            caster.cooldown = spells.ice_cooldown;
            debug!("ice block placed at {:?}", point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> ColliderSet {
        let mut set = ColliderSet::default();
        set.push(None, Collider::cuboid(Vec3::new(20.0, 0.5, 20.0), Tag::Ground, LayerMask::GROUND), Vec3::ZERO, Quat::IDENTITY);
        set.push(None, Collider::cuboid(Vec3::new(0.5, 3.0, 5.0), Tag::Wall, LayerMask::DEFAULT), Vec3::new(5.0, 3.0, 0.0), Quat::IDENTITY);
        set
    }

    const IGNORE: [Tag; 2] = [Tag::Wall, Tag::Teleporter];

    #[test]
    fn places_on_open_ground() {
        let plan = plan_ice_placement(&world(), Vec3::new(-5.0, 5.0, 0.0), Vec3::NEG_Y, &IGNORE, 1.0);
        assert_eq!(plan, IcePlacement::Place(Vec3::new(-5.0, 0.5, 0.0)));
    }

    #[test]
    fn rejects_direct_wall_hits() {
        let plan = plan_ice_placement(&world(), Vec3::new(0.0, 3.0, 0.0), Vec3::X, &IGNORE, 1.0);
        assert_eq!(plan, IcePlacement::Rejected(Tag::Wall));
    }

    #[test]
    fn rejects_ground_next_to_a_wall() {
        let plan = plan_ice_placement(&world(), Vec3::new(4.2, 5.0, 0.0), Vec3::NEG_Y, &IGNORE, 1.0);
        assert_eq!(plan, IcePlacement::Blocked(Tag::Wall));
    }

    #[test]
    fn misses_into_the_sky() {
        assert_eq!(plan_ice_placement(&world(), Vec3::new(0.0, 5.0, 0.0), Vec3::Y, &IGNORE, 1.0), IcePlacement::Miss);
    }

    #[test]
    fn cooldown_only_arms_after_a_successful_cast() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .insert_resource(ActionState { alt_fire_triggered: true, ..Default::default() })
            .insert_resource(Settings::default())
            .insert_resource(world())
            .add_systems(Update, cast_ice);
        app.world_mut().spawn((Player, IceCaster::default()));
        let camera = app
            .world_mut()
            .spawn((ThirdPersonCamera::default(), Transform::from_xyz(0.0, 3.0, 0.0).looking_to(Vec3::X, Vec3::Y)))
            .id();

        app.update();
        let mut casters = app.world_mut().query::<&IceCaster>();
        assert!(casters.single(app.world()).ready());

        *app.world_mut().get_mut::<Transform>(camera).unwrap() = Transform::from_xyz(-5.0, 5.0, 0.0).looking_to(Vec3::NEG_Y, Vec3::X);
        app.update();
        let mut blocks = app.world_mut().query::<&Meltable>();
        assert_eq!(blocks.iter(app.world()).count(), 1);
        assert!(!casters.single(app.world()).ready());

        app.update();
        assert_eq!(blocks.iter(app.world()).count(), 1);
    }
}
