use crate::LevelError;

pub const COLORMAP_LIGHT_LEVELS: usize = 32;
pub const LIGHT_SOURCE_LEVELS: usize = 128;

const COLORMAP_TABLE_SIZE: usize = COLORMAP_LIGHT_LEVELS * 256;

/// LUT for converting colors to their closest darker color, based on lighting.
///
/// Row 0 is the darkest, row 31 is fullbright. The trailing 128 bytes are the
/// headlamp ramp: how many light levels the camera light source loses at a
/// given depth (indexed by depth in quarter units).
///
/// How to use:
/// `new_index = colors[row * 256 + index]`
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub colors: Vec<u8>,
    pub light_source_ramp: [u8; LIGHT_SOURCE_LEVELS],
}

impl ColorMap {
    pub const BYTE_SIZE: usize = COLORMAP_TABLE_SIZE + LIGHT_SOURCE_LEVELS;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LevelError> {
        if bytes.len() != Self::BYTE_SIZE {
            return Err(LevelError::InvalidColormapSize {
                expected: Self::BYTE_SIZE,
                actual: bytes.len(),
            });
        }

        let mut light_source_ramp = [0u8; LIGHT_SOURCE_LEVELS];
        light_source_ramp.copy_from_slice(&bytes[COLORMAP_TABLE_SIZE..]);

        Ok(Self {
            colors: bytes[..COLORMAP_TABLE_SIZE].to_vec(),
            light_source_ramp,
        })
    }

    /// Every row maps a color to itself and the headlamp fades out linearly.
    /// Handy when no colormap was shipped with a level.
    pub fn identity() -> Self {
        let mut colors = Vec::with_capacity(COLORMAP_TABLE_SIZE);
        for _ in 0..COLORMAP_LIGHT_LEVELS {
            colors.extend(0..=255u8);
        }

        let mut light_source_ramp = [0u8; LIGHT_SOURCE_LEVELS];
        for (i, level) in light_source_ramp.iter_mut().enumerate() {
            *level = (i / 4).min(COLORMAP_LIGHT_LEVELS - 1) as u8;
        }

        Self {
            colors,
            light_source_ramp,
        }
    }

    #[inline]
    pub fn remap(&self, row: u8, color: u8) -> u8 {
        self.colors[(row as usize) * 256 + color as usize]
    }

    pub fn row(&self, row: u8) -> &[u8] {
        let start = (row as usize).min(COLORMAP_LIGHT_LEVELS - 1) * 256;
        &self.colors[start..start + 256]
    }
}
