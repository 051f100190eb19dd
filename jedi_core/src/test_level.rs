//! Small hand-built levels shared by unit tests.

use jedi_level_format::{
    AnimatedTextureDef, Level, Sector, StartPosition, TextureData, Vertex, Wall,
};

use indexmap::IndexMap;

use crate::{
    components::TextureId,
    entities::{init_sector_entities, texture_ids},
    helpers::ChangedSet,
    inf::InfWorld,
    AnimatedTextures,
};

pub const WALL_COLOR: u8 = 10;
pub const FLOOR_COLOR: u8 = 20;
pub const CEIL_COLOR: u8 = 30;
pub const STEP_COLOR: u8 = 40;

/// Square sector with clockwise walls: top, right, bottom, left.
pub fn square(name: &str, x0: f32, z0: f32, size: f32, floor: f32, ceiling: f32) -> Sector {
    let x1 = x0 + size;
    let z1 = z0 + size;

    let wall = |v0, v1| Wall {
        v0,
        v1,
        mid_texture: Some("WALL".to_string()),
        top_texture: Some("STEP".to_string()),
        bottom_texture: Some("STEP".to_string()),
        ..Default::default()
    };

    Sector {
        name: Some(name.to_string()),
        ambient: 20,
        floor_height: floor,
        ceiling_height: ceiling,
        floor_texture: Some("FLOOR".to_string()),
        ceiling_texture: Some("CEIL".to_string()),
        vertices: vec![
            Vertex { x: x0, z: z1 },
            Vertex { x: x1, z: z1 },
            Vertex { x: x1, z: z0 },
            Vertex { x: x0, z: z0 },
        ],
        walls: vec![wall(0, 1), wall(1, 2), wall(2, 3), wall(3, 0)],
        ..Default::default()
    }
}

/// Regular polygon around the origin, walls running clockwise.
pub fn polygon(name: &str, sides: usize, radius: f32, floor: f32, ceiling: f32) -> Sector {
    let vertices = (0..sides)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / sides as f32;
            Vertex {
                x: radius * angle.sin(),
                z: radius * angle.cos(),
            }
        })
        .collect();
    let walls = (0..sides)
        .map(|i| Wall {
            v0: i,
            v1: (i + 1) % sides,
            mid_texture: Some("WALL".to_string()),
            ..Default::default()
        })
        .collect();

    Sector {
        name: Some(name.to_string()),
        ambient: 20,
        floor_height: floor,
        ceiling_height: ceiling,
        floor_texture: Some("FLOOR".to_string()),
        ceiling_texture: Some("CEIL".to_string()),
        vertices,
        walls,
        ..Default::default()
    }
}

/// A level made of one sector, starting at the origin.
pub fn one_room(sector: Sector) -> Level {
    Level {
        name: "test".to_string(),
        sectors: vec![sector],
        textures: textures(),
        animated_textures: vec![],
        inf: vec![],
        start: StartPosition {
            x: 0.0,
            z: 0.0,
            y: 0.0,
            yaw: 0.0,
        },
    }
}

pub fn textures() -> Vec<TextureData> {
    vec![
        TextureData::solid("WALL", 64, 64, WALL_COLOR),
        TextureData::solid("FLOOR", 64, 64, FLOOR_COLOR),
        TextureData::solid("CEIL", 64, 64, CEIL_COLOR),
        TextureData::solid("STEP", 64, 64, STEP_COLOR),
        TextureData::solid("SWITCH0", 8, 8, 50),
        TextureData::solid("SWITCH1", 8, 8, 51),
        TextureData::solid("SWITCH", 8, 8, 50),
    ]
}

/// Room "a" around the origin, with room "b" north of it through a portal.
/// "b" is lower and brighter.
pub fn two_rooms() -> Level {
    let mut a = square("a", -16.0, -16.0, 32.0, 0.0, 16.0);
    let mut b = square("b", -16.0, 16.0, 32.0, 2.0, 12.0);
    b.ambient = 28;

    a.walls[0].adjoin = Some(1);
    a.walls[0].mirror = Some(2);
    a.walls[0].mid_texture = None;
    b.walls[2].adjoin = Some(0);
    b.walls[2].mirror = Some(0);
    b.walls[2].mid_texture = None;

    Level {
        name: "test".to_string(),
        sectors: vec![a, b],
        textures: textures(),
        animated_textures: vec![AnimatedTextureDef {
            name: "SWITCH".to_string(),
            frames: vec!["SWITCH0".to_string(), "SWITCH1".to_string()],
            delay: 0,
        }],
        inf: vec![],
        start: StartPosition {
            x: 0.0,
            z: 0.0,
            y: 0.0,
            yaw: 0.0,
        },
    }
}

/// ECS state for INF tests, without a renderer or player.
pub struct TestGeometry {
    pub world: hecs::World,
    pub sectors: Vec<hecs::Entity>,
    pub animations: AnimatedTextures,
    pub changes: ChangedSet<hecs::Entity>,
    pub texture_ids: IndexMap<String, TextureId>,
}

impl TestGeometry {
    pub fn new(level: &Level) -> Self {
        let mut world = hecs::World::new();
        let texture_ids = texture_ids(&level.textures);
        let sectors = init_sector_entities(&mut world, level, &texture_ids);
        let animations = AnimatedTextures::from_level(&level.animated_textures, &texture_ids);

        Self {
            world,
            sectors,
            animations,
            changes: ChangedSet::default(),
            texture_ids,
        }
    }

    pub fn inf_world(&mut self) -> InfWorld<'_> {
        InfWorld {
            world: &mut self.world,
            sectors: &self.sectors,
            animations: &mut self.animations,
            changes: &mut self.changes,
        }
    }
}
