use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("Corrupted bytes in {0}")]
    CorruptedBytes(String),

    #[error("Colormap must be {expected} bytes, got {actual}.")]
    InvalidColormapSize { expected: usize, actual: usize },
    #[error("Palette must be {expected} bytes, got {actual}.")]
    InvalidPaletteSize { expected: usize, actual: usize },

    #[error("Texture {name} expects {expected} texels, got {actual}.")]
    InvalidTextureSize {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Sector {sector} wall {wall} references missing vertex {vertex}.")]
    MissingVertex {
        sector: usize,
        wall: usize,
        vertex: usize,
    },
    #[error("Sector {sector} wall {wall} adjoins missing sector {adjoin}.")]
    MissingAdjoin {
        sector: usize,
        wall: usize,
        adjoin: usize,
    },
    #[error("Sector {sector} wall {wall} mirrors missing wall {mirror}.")]
    MissingMirror {
        sector: usize,
        wall: usize,
        mirror: usize,
    },
    #[error("Duplicate sector name {0}.")]
    DuplicateSectorName(String),

    #[error("Unknown name {0}.")]
    UnknownName(String),
}
