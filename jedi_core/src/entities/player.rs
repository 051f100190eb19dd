use jedi_level_format::Level;

use anyhow::Result;
use ultraviolet::{Vec2, Vec3};

use crate::{
    components::{CPlayer, CSector, CWorldPos},
    SectorAccel,
};

pub fn init_player_entities(
    world: &mut hecs::World,
    sector_accel: &SectorAccel,
    level: &Level,
) -> Result<hecs::Entity> {
    let start = &level.start;
    let player_xz = Vec2::new(start.x, start.z);

    let sector = sector_accel
        .query(world, player_xz)
        .ok_or(anyhow::anyhow!("Player start isn't in a sector!"))?;

    let player_y = world.get::<&CSector>(sector)?.floor_height.to_f32();

    let entity = world.spawn((
        CWorldPos {
            pos: Vec3::new(player_xz.x, player_y, player_xz.y),
            yaw: start.yaw.rem_euclid(360.0),
        },
        CPlayer {
            sector,
            light_source: false,
        },
    ));

    Ok(entity)
}
