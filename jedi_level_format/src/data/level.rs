use bitflags::bitflags;
use indexmap::IndexMap;

use crate::{AnimatedTextureDef, InfItemDef, LevelError, TextureData};

bitflags! {
    /// Sector flag word 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SectorFlags: u32 {
        const EXTERIOR = 1 << 0;
        const DOOR = 1 << 1;
        const MAG_SEAL = 1 << 2;
        const EXTERIOR_ADJOIN = 1 << 3;
        const ICE_FLOOR = 1 << 4;
        const SNOW_FLOOR = 1 << 5;
        const EXPLODING_WALL = 1 << 6;
        const EXTERIOR_FLOOR = 1 << 7;
        const CRUSHING = 1 << 8;
        const NO_WALL_DRAW = 1 << 9;
        const SECRET = 1 << 19;
    }
}

bitflags! {
    /// Wall flag word 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WallFlags: u32 {
        const ADJ_MID_TEX = 1 << 0;
        const ILLUM_SIGN = 1 << 1;
        const FLIP_HORIZ = 1 << 2;
        const CHANGE_WALL_LIGHT = 1 << 3;
        const TEX_ANCHORED = 1 << 4;
        const WALL_MORPHS = 1 << 5;
        const SCROLL_TOP_TEX = 1 << 6;
        const SCROLL_MID_TEX = 1 << 7;
        const SCROLL_BOT_TEX = 1 << 8;
        const SCROLL_SIGN_TEX = 1 << 9;
        const HIDE_ON_MAP = 1 << 10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureOffset {
    pub u: f32,
    pub v: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Wall {
    /// Indices into the owning sector's vertex list.
    pub v0: usize,
    pub v1: usize,

    /// Sector on the other side, if this wall is a portal.
    pub adjoin: Option<usize>,
    /// Matching wall index inside the adjoined sector.
    pub mirror: Option<usize>,

    pub mid_texture: Option<String>,
    pub top_texture: Option<String>,
    pub bottom_texture: Option<String>,
    pub texture_offset: TextureOffset,

    /// Added to the sector ambient when lighting this wall.
    pub light: i32,
    pub flags: WallFlags,
    pub flags2: u32,
    pub flags3: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Sector {
    pub name: Option<String>,

    /// Baseline light level, 0..=31. 32 and above draw fullbright.
    pub ambient: i32,

    pub floor_height: f32,
    pub ceiling_height: f32,
    /// Second height, used for water depth and `move_offset` elevators.
    pub second_height: f32,

    pub floor_texture: Option<String>,
    pub ceiling_texture: Option<String>,
    pub floor_offset: TextureOffset,
    pub ceiling_offset: TextureOffset,

    pub flags: SectorFlags,
    pub flags2: u32,
    pub flags3: u32,

    pub vertices: Vec<Vertex>,
    /// Walls wind clockwise seen from above; the interior is on the right.
    pub walls: Vec<Wall>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartPosition {
    pub x: f32,
    pub z: f32,
    /// Authored feet height. The player is placed on the floor of the
    /// sector containing (x, z).
    pub y: f32,
    /// In degrees, clockwise from +Z.
    pub yaw: f32,
}

#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,

    pub sectors: Vec<Sector>,
    pub textures: Vec<TextureData>,
    pub animated_textures: Vec<AnimatedTextureDef>,

    /// INF items, in script order. Creation order decides message delivery
    /// order for sectors with more than one item.
    pub inf: Vec<InfItemDef>,

    pub start: StartPosition,
}

impl Level {
    /// Checks every cross reference the runtime relies on. INF items are not
    /// checked here: they are allowed to be broken and get skipped at load.
    pub fn validate(&self) -> Result<(), LevelError> {
        self.sector_index_by_name()?;

        for (sector_idx, sector) in self.sectors.iter().enumerate() {
            for (wall_idx, wall) in sector.walls.iter().enumerate() {
                for vertex in [wall.v0, wall.v1] {
                    if vertex >= sector.vertices.len() {
                        return Err(LevelError::MissingVertex {
                            sector: sector_idx,
                            wall: wall_idx,
                            vertex,
                        });
                    }
                }

                if let Some(adjoin) = wall.adjoin {
                    let Some(other) = self.sectors.get(adjoin) else {
                        return Err(LevelError::MissingAdjoin {
                            sector: sector_idx,
                            wall: wall_idx,
                            adjoin,
                        });
                    };

                    if let Some(mirror) = wall.mirror {
                        if mirror >= other.walls.len() {
                            return Err(LevelError::MissingMirror {
                                sector: sector_idx,
                                wall: wall_idx,
                                mirror,
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Named sectors, in level order. INF scripts address sectors by name.
    pub fn sector_index_by_name(&self) -> Result<IndexMap<String, usize>, LevelError> {
        let mut names = IndexMap::new();
        for (i, sector) in self.sectors.iter().enumerate() {
            if let Some(name) = &sector.name {
                if names.insert(name.to_lowercase(), i).is_some() {
                    return Err(LevelError::DuplicateSectorName(name.clone()));
                }
            }
        }

        Ok(names)
    }
}
