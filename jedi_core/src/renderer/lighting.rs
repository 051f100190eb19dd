use jedi_level_format::LIGHT_SOURCE_LEVELS;

use crate::helpers::Fixed16;

use super::{FULLBRIGHT_ROW, MAX_LIGHT_LEVEL};

/// Picks the colormap row for a surface of one sector.
#[derive(Debug, Clone, Copy)]
pub struct LightingResolver<'a> {
    pub sector_ambient: i32,
    /// Ambient never drops below 7/8 of the sector's.
    pub scaled_ambient: i32,
    pub camera_light_source: bool,
    pub world_ambient: i32,
    /// Depth over which ambient loses one level.
    pub falloff: Fixed16,
    pub fullbright: bool,
    pub light_source_ramp: &'a [u8; LIGHT_SOURCE_LEVELS],
}

impl<'a> LightingResolver<'a> {
    pub fn new(
        sector_ambient: i32,
        camera_light_source: bool,
        world_ambient: i32,
        falloff: Fixed16,
        fullbright: bool,
        light_source_ramp: &'a [u8; LIGHT_SOURCE_LEVELS],
    ) -> Self {
        Self {
            sector_ambient,
            scaled_ambient: sector_ambient * 7 / 8,
            camera_light_source,
            world_ambient,
            falloff,
            fullbright,
            light_source_ramp,
        }
    }

    /// Colormap row for a surface at `depth`, 0 darkest, 31 fullbright.
    pub fn resolve(&self, depth: Fixed16, light_offset: i32) -> u8 {
        if self.fullbright || self.sector_ambient >= MAX_LIGHT_LEVEL {
            return FULLBRIGHT_ROW;
        }

        let depth = depth.max(Fixed16::ZERO);

        let camera = if self.camera_light_source {
            // Ramp is indexed in quarter units.
            let index = ((depth.0 >> 14) as usize).min(LIGHT_SOURCE_LEVELS - 1);
            (MAX_LIGHT_LEVEL - (self.light_source_ramp[index] as i32 + self.world_ambient)).max(0)
        } else {
            0
        };

        let attenuation = (depth / self.falloff).floor();
        let ambient = (self.sector_ambient - attenuation).max(self.scaled_ambient);

        (camera.max(ambient) + light_offset).clamp(0, FULLBRIGHT_ROW as i32) as u8
    }
}
