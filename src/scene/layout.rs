//! Level layouts: the static geometry and gameplay entities of one level.
//!
//! Layouts are data (RON under `data/levels`). Spawning a layout creates
//! top-level entities tagged [`SceneEntity`] so the next load can remove
//! them in one sweep.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Level, SceneEntity, Teleporter};
use crate::physics::{Collider, LayerMask, Sensor, Shape, Tag, TriggerVolume};
use crate::thermal::{BurnLimit, Flammable, FlammableParams, Meltable, MeltableParams, SpreadParams};

/// Trigger volumes on solid objects are this much larger than the collider
/// so bodies resting against them still register contact.
pub const TRIGGER_SKIN: f32 = 0.25;

/// A solid box: floors, platforms, ramps, walls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidDef {
    pub translation: Vec3,
    pub half_extents: Vec3,
    #[serde(default = "SolidDef::default_tag")]
    pub tag: Tag,
    /// Tilt about the X axis in degrees (ramps).
    #[serde(default)]
    pub pitch: f32,
    #[serde(default)]
    pub yaw: f32,
}

impl SolidDef {
    fn default_tag() -> Tag { Tag::Ground }

    fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw.to_radians(), self.pitch.to_radians(), 0.0)
    }
}

/// A trigger-only box (hazard area, kill plane).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeDef {
    pub translation: Vec3,
    pub half_extents: Vec3,
    /// Also block movement, like a lava floor.
    #[serde(default)]
    pub solid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlammableDef {
    pub name: String,
    pub translation: Vec3,
    pub half_extents: Vec3,
    #[serde(default)]
    pub params: FlammableParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeltableDef {
    pub name: String,
    pub translation: Vec3,
    pub half_extents: Vec3,
    #[serde(default)]
    pub params: MeltableParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeleporterDef {
    pub translation: Vec3,
    pub half_extents: Vec3,
    pub destination: Level,
    #[serde(default)]
    pub set_completion_flag: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelLayout {
    pub level: Level,
    #[serde(default)]
    pub spawn_point: Vec3,
    #[serde(default)]
    pub solids: Vec<SolidDef>,
    #[serde(default)]
    pub hazards: Vec<VolumeDef>,
    #[serde(default)]
    pub kill_planes: Vec<VolumeDef>,
    #[serde(default)]
    pub flammables: Vec<FlammableDef>,
    #[serde(default)]
    pub meltables: Vec<MeltableDef>,
    #[serde(default)]
    pub teleporters: Vec<TeleporterDef>,
}

fn cuboid(half_extents: Vec3) -> Shape {
    Shape::Cuboid { half_extents }
}

fn skinned(half_extents: Vec3) -> Shape {
    cuboid(half_extents + Vec3::splat(TRIGGER_SKIN))
}

impl LevelLayout {
    /// Empty layout for `level` with the player at `spawn_point`.
    #[must_use]
    pub fn empty(level: Level, spawn_point: Vec3) -> Self {
        LevelLayout {
            level,
            spawn_point,
            solids: Vec::new(),
            hazards: Vec::new(),
            kill_planes: Vec::new(),
            flammables: Vec::new(),
            meltables: Vec::new(),
            teleporters: Vec::new(),
        }
    }

    /// Small test arena used when no layout file exists for a level.
    #[must_use]
    pub fn builtin(level: Level) -> Self {
        let crate_params = |lit: bool| FlammableParams {
            lit,
            destructible: true,
            burn_limit: BurnLimit::Seconds(6.0),
            spread: SpreadParams { enabled: true, ..Default::default() },
            ..Default::default()
        };
        let mut layout = LevelLayout::empty(level, Vec3::new(0.0, 2.0, 0.0));
        layout.solids = vec![
            SolidDef { translation: Vec3::new(0.0, -0.5, 0.0), half_extents: Vec3::new(20.0, 0.5, 20.0), tag: Tag::Ground, pitch: 0.0, yaw: 0.0 },
            SolidDef { translation: Vec3::new(-8.0, 1.0, -6.0), half_extents: Vec3::new(2.0, 0.25, 4.0), tag: Tag::Ground, pitch: 25.0, yaw: 0.0 },
            SolidDef { translation: Vec3::new(0.0, 2.0, -20.0), half_extents: Vec3::new(20.0, 2.0, 0.5), tag: Tag::Wall, pitch: 0.0, yaw: 0.0 },
        ];
        layout.hazards = vec![VolumeDef { translation: Vec3::new(8.0, 0.0, 6.0), half_extents: Vec3::new(2.0, 0.1, 2.0), solid: true }];
        layout.kill_planes = vec![VolumeDef { translation: Vec3::new(0.0, -30.0, 0.0), half_extents: Vec3::new(200.0, 1.0, 200.0), solid: false }];
        layout.flammables = (0..3)
            .map(|i| FlammableDef {
                name: format!("crate {i}"),
                translation: Vec3::new(4.0 + 2.0 * i as f32, 0.5, -4.0),
                half_extents: Vec3::splat(0.5),
                params: crate_params(i == 0),
            })
            .collect();
        layout.meltables = vec![MeltableDef {
            name: "ice pillar".into(),
            translation: Vec3::new(-4.0, 1.5, 4.0),
            half_extents: Vec3::new(0.75, 1.5, 0.75),
            params: MeltableParams { min_scale: Vec3::splat(0.2), ..Default::default() },
        }];
        layout.teleporters = vec![TeleporterDef {
            translation: Vec3::new(0.0, 0.1, 12.0),
            half_extents: Vec3::new(1.0, 0.1, 1.0),
            destination: Level::Hub,
            set_completion_flag: false,
        }];
        layout
    }
}

/// Spawn every entity described by `layout`.
pub fn spawn_layout(commands: &mut Commands, layout: &LevelLayout) {
    for solid in &layout.solids {
        commands.spawn((
            SceneEntity,
            Name::new(format!("{:?}", solid.tag).to_lowercase()),
            SpatialBundle::from_transform(Transform::from_translation(solid.translation).with_rotation(solid.rotation())),
            Collider::cuboid(solid.half_extents, solid.tag, if solid.tag == Tag::Ground { LayerMask::GROUND } else { LayerMask::DEFAULT }),
        ));
    }

    let volumes = layout.hazards.iter().map(|v| (v, Tag::Hazard)).chain(layout.kill_planes.iter().map(|v| (v, Tag::KillPlane)));
    for (volume, tag) in volumes {
        let tf = Transform::from_translation(volume.translation);
        let mut entity = commands.spawn((SceneEntity, Name::new(format!("{tag:?}").to_lowercase()), SpatialBundle::from_transform(tf)));
        if volume.solid {
            entity.insert((Collider::cuboid(volume.half_extents, tag, LayerMask::GROUND), TriggerVolume::new(skinned(volume.half_extents), tag)));
        } else {
            entity.insert(TriggerVolume::new(cuboid(volume.half_extents), tag));
        }
    }

    for def in &layout.flammables {
        commands.spawn((
            SceneEntity,
            Name::new(def.name.clone()),
            SpatialBundle::from_transform(Transform::from_translation(def.translation)),
            Collider::cuboid(def.half_extents, Tag::Flammable, LayerMask::DEFAULT),
            Sensor::new(def.half_extents.max_element() + TRIGGER_SKIN),
            Flammable::new(&def.params),
        ));
    }

    for def in &layout.meltables {
        commands.spawn((
            SceneEntity,
            Name::new(def.name.clone()),
            SpatialBundle::from_transform(Transform::from_translation(def.translation)),
            Collider::cuboid(def.half_extents, Tag::Ice, LayerMask::GROUND),
            TriggerVolume::new(skinned(def.half_extents), Tag::Ice),
            Sensor::new(def.half_extents.max_element() + TRIGGER_SKIN),
            Meltable::new(&def.params, Vec3::ONE),
        ));
    }

    for def in &layout.teleporters {
        commands.spawn((
            SceneEntity,
            Name::new(format!("teleporter to {:?}", def.destination)),
            SpatialBundle::from_transform(Transform::from_translation(def.translation)),
            Collider::cuboid(def.half_extents, Tag::Teleporter, LayerMask::GROUND),
            TriggerVolume::new(skinned(def.half_extents), Tag::Teleporter),
            Teleporter { destination: def.destination, set_completion_flag: def.set_completion_flag },
        ));
    }
}
