pub mod setup;
pub mod display;
pub mod visuals;

pub use setup::setup;
pub use display::{draw_gizmos, sync_vsync_settings, toggle_gizmos};
pub use visuals::{attach_collider_meshes, attach_fire_meshes, attach_player_mesh};
