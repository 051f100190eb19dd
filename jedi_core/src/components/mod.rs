mod sector;
mod wall;

use ultraviolet::Vec3;

pub use sector::*;
pub use wall::*;

use crate::helpers::Movable;

/// Index into the level texture list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

#[derive(Debug)]
pub struct CWorldPos {
    /// Y is the height of the feet.
    pub pos: Vec3,
    /// Between 0 and 360.
    pub yaw: f32,
}

impl Movable for CWorldPos {
    fn pos(&self) -> Vec3 {
        self.pos
    }

    fn set_pos(&mut self, pos: Vec3) {
        self.pos = pos;
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn rotate_yaw(&mut self, delta: f32) {
        self.yaw = (self.yaw + delta).rem_euclid(360.0);
    }
}

#[derive(Debug)]
pub struct CPlayer {
    /// Last sector the player was found in.
    pub sector: hecs::Entity,
    pub light_source: bool,
}
