pub mod physics;
pub mod thermal;
pub mod player;
pub mod health;
pub mod spells;
pub mod scene;
pub mod input;
pub mod ron;
pub use crate::ron as ron_loader;

pub mod settings;
pub mod debug;
