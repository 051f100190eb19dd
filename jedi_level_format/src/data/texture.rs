use crate::LevelError;

/// An 8-bit indexed image, stored column-major with row 0 at the bottom.
/// Walls sample it one column at a time, which keeps the inner loop a
/// single stride-1 walk.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub image: Vec<u8>,
}

impl TextureData {
    pub fn new(name: &str, width: u32, height: u32, image: Vec<u8>) -> Result<Self, LevelError> {
        let expected = width as usize * height as usize;
        if expected == 0 || image.len() != expected {
            return Err(LevelError::InvalidTextureSize {
                name: name.to_string(),
                expected,
                actual: image.len(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            width,
            height,
            image,
        })
    }

    pub fn solid(name: &str, width: u32, height: u32, color: u8) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            image: vec![color; width as usize * height as usize],
        }
    }

    /// Texel lookup with wrapping in both directions.
    #[inline]
    pub fn texel(&self, u: i32, v: i32) -> u8 {
        let u = u.rem_euclid(self.width as i32) as usize;
        let v = v.rem_euclid(self.height as i32) as usize;
        self.image[u * self.height as usize + v]
    }
}

/// An animated texture as described by the level: the name walls and flats
/// refer to, and the frames it cycles through.
#[derive(Debug, Clone)]
pub struct AnimatedTextureDef {
    pub name: String,
    pub frames: Vec<String>,
    /// Ticks between frames. Zero marks a switch texture that only changes
    /// when an INF trigger flips it.
    pub delay: u32,
}
