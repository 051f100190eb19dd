use crate::helpers::Vec2Fixed;

use super::TextureId;

/// Portal link to the sector behind a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CAdjoin {
    pub sector: hecs::Entity,
    /// The same edge seen from the other sector.
    pub mirror: Option<hecs::Entity>,
}

#[derive(Debug)]
pub struct CWall {
    pub sector: hecs::Entity,
    /// Index of the wall inside its sector.
    pub index: usize,

    pub v0: usize,
    pub v1: usize,

    pub adjoin: Option<CAdjoin>,

    pub mid_texture: Option<TextureId>,
    pub top_texture: Option<TextureId>,
    pub bottom_texture: Option<TextureId>,
    pub texture_offset: Vec2Fixed,

    pub light: i32,
    pub flags: [u32; 3],
}
