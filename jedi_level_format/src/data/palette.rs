use crate::LevelError;

/// 256 RGB colors, expanded from the 6-bit VGA values stored on disk.
pub type Palette = [(u8, u8, u8); 256];

pub const PALETTE_BYTE_SIZE: usize = 256 * 3;

pub fn parse_palette(bytes: &[u8]) -> Result<Palette, LevelError> {
    if bytes.len() != PALETTE_BYTE_SIZE {
        return Err(LevelError::InvalidPaletteSize {
            expected: PALETTE_BYTE_SIZE,
            actual: bytes.len(),
        });
    }

    let mut palette = [(0, 0, 0); 256];
    for (i, color) in palette.iter_mut().enumerate() {
        let offset = i * 3;
        *color = (
            vga_to_8bit(bytes[offset]),
            vga_to_8bit(bytes[offset + 1]),
            vga_to_8bit(bytes[offset + 2]),
        );
    }

    Ok(palette)
}

// 0..63 -> 0..255, keeping 63 at full intensity.
fn vga_to_8bit(value: u8) -> u8 {
    let value = value & 0x3f;
    (value << 2) | (value >> 4)
}
