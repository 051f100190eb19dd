mod player;
mod sector;

use jedi_level_format::TextureData;

use indexmap::IndexMap;

pub use player::*;
pub use sector::*;

use crate::components::TextureId;

/// Texture names are matched case-insensitively.
pub fn texture_key(name: &str) -> String {
    name.to_uppercase()
}

/// Texture ids follow the level texture list.
pub fn texture_ids(textures: &[TextureData]) -> IndexMap<String, TextureId> {
    textures
        .iter()
        .enumerate()
        .map(|(i, texture)| (texture_key(&texture.name), TextureId(i)))
        .collect()
}

pub fn lookup_texture(
    texture_ids: &IndexMap<String, TextureId>,
    name: Option<&str>,
) -> Option<TextureId> {
    let name = name?;
    let id = texture_ids.get(&texture_key(name)).copied();
    if id.is_none() {
        log::warn!("Unknown texture {}", name);
    }
    id
}
