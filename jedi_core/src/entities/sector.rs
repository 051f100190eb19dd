use rayon::prelude::*;

use jedi_level_format::{Level, TextureOffset};

use indexmap::IndexMap;

use crate::{
    components::{CAdjoin, CSector, CWall, TextureId},
    helpers::{ChangedField, Fixed16, Vec2Fixed},
};

use super::lookup_texture;

fn offset(offset: TextureOffset) -> Vec2Fixed {
    Vec2Fixed::from_f32(offset.u, offset.v)
}

/// Spawns one entity per sector and per wall. Returns sector entities in
/// level order.
///
/// Adjoins are resolved after every wall exists, so a wall can point at
/// any other sector's walls.
pub fn init_sector_entities(
    world: &mut hecs::World,
    level: &Level,
    texture_ids: &IndexMap<String, TextureId>,
) -> Vec<hecs::Entity> {
    let sectors = level
        .sectors
        .iter()
        .enumerate()
        .map(|(i, sector)| {
            world.spawn((CSector {
                index: i,
                name: sector.name.clone(),
                ambient: sector.ambient,
                floor_height: Fixed16::from_f32(sector.floor_height),
                ceiling_height: Fixed16::from_f32(sector.ceiling_height),
                second_height: Fixed16::from_f32(sector.second_height),
                floor_texture: lookup_texture(texture_ids, sector.floor_texture.as_deref()),
                ceiling_texture: lookup_texture(texture_ids, sector.ceiling_texture.as_deref()),
                floor_offset: offset(sector.floor_offset),
                ceiling_offset: offset(sector.ceiling_offset),
                flags: [sector.flags.bits(), sector.flags2, sector.flags3],
                vertices: ChangedField::new(
                    sector
                        .vertices
                        .iter()
                        .map(|v| Vec2Fixed::from_f32(v.x, v.z))
                        .collect(),
                ),
                walls: Vec::new(),
            },))
        })
        .collect::<Vec<_>>();

    // Build wall components.
    let walls_by_sector = level
        .sectors
        .par_iter()
        .enumerate()
        .map(|(i, sector)| {
            sector
                .walls
                .iter()
                .enumerate()
                .map(|(w, wall)| CWall {
                    sector: sectors[i],
                    index: w,
                    v0: wall.v0,
                    v1: wall.v1,
                    adjoin: None,
                    mid_texture: lookup_texture(texture_ids, wall.mid_texture.as_deref()),
                    top_texture: lookup_texture(texture_ids, wall.top_texture.as_deref()),
                    bottom_texture: lookup_texture(texture_ids, wall.bottom_texture.as_deref()),
                    texture_offset: offset(wall.texture_offset),
                    light: wall.light,
                    flags: [wall.flags.bits(), wall.flags2, wall.flags3],
                })
                .collect::<Vec<CWall>>()
        })
        .collect::<Vec<Vec<CWall>>>();

    let wall_entities = walls_by_sector
        .into_iter()
        .map(|walls| {
            world
                .spawn_batch(walls.into_iter().map(|wall| (wall,)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<Vec<hecs::Entity>>>();

    for (i, sector) in level.sectors.iter().enumerate() {
        if let Ok(mut c_sector) = world.get::<&mut CSector>(sectors[i]) {
            c_sector.walls = wall_entities[i].clone();
        }

        for (w, wall) in sector.walls.iter().enumerate() {
            let Some(adjoin) = wall.adjoin else {
                continue;
            };
            let Some(&adjoin_sector) = sectors.get(adjoin) else {
                log::warn!("Sector {} wall {} adjoins missing sector {}", i, w, adjoin);
                continue;
            };

            let mirror = wall
                .mirror
                .and_then(|m| wall_entities.get(adjoin).and_then(|walls| walls.get(m)))
                .copied();

            if let Ok(mut c_wall) = world.get::<&mut CWall>(wall_entities[i][w]) {
                c_wall.adjoin = Some(CAdjoin {
                    sector: adjoin_sector,
                    mirror,
                });
            }
        }
    }

    sectors
}
