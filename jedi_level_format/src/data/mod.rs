mod colormap;
mod inf;
mod level;
mod palette;
mod texture;

pub use colormap::*;
pub use inf::*;
pub use level::*;
pub use palette::*;
pub use texture::*;
