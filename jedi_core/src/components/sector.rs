use crate::helpers::{ChangedField, Fixed16, Vec2Fixed};

use super::TextureId;

#[derive(Debug)]
pub struct CSector {
    /// Index of the sector in the level.
    pub index: usize,
    pub name: Option<String>,

    pub ambient: i32,

    pub floor_height: Fixed16,
    pub ceiling_height: Fixed16,
    pub second_height: Fixed16,

    pub floor_texture: Option<TextureId>,
    pub ceiling_texture: Option<TextureId>,
    pub floor_offset: Vec2Fixed,
    pub ceiling_offset: Vec2Fixed,

    pub flags: [u32; 3],

    /// Morphing elevators move these; the sector BVH is rebuilt when they change.
    pub vertices: ChangedField<Vec<Vec2Fixed>>,
    /// Wall entities, in level order.
    pub walls: Vec<hecs::Entity>,
}

impl CSector {
    pub fn wall_vertices(&self, wall: &super::CWall) -> Option<(Vec2Fixed, Vec2Fixed)> {
        Some((*self.vertices.get(wall.v0)?, *self.vertices.get(wall.v1)?))
    }
}
