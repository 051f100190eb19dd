pub mod cvars;
pub mod renderer;
pub mod world;

pub mod components;
pub mod entities;
pub mod inf;

mod animated_textures;
mod sector_accel;

pub(crate) mod helpers;

#[cfg(test)]
mod test_level;

pub use animated_textures::*;
pub use helpers::{Angle14, CameraView, Fixed16, Movable, Stopwatch, Vec2Fixed};
pub use sector_accel::*;
