use std::collections::HashMap;

use jedi_level_format::AnimatedTextureDef;

use indexmap::IndexMap;

use crate::{components::TextureId, entities::lookup_texture, inf::Tick};

#[derive(Debug, Clone)]
pub struct AnimatedTexture {
    pub frames: Vec<TextureId>,
    pub index: usize,
    /// Ticks per frame. Zero marks a switch, only moved by triggers.
    pub delay: Tick,
    pub next_time: Tick,
}

/// Maps a texture referenced by level geometry to the frame it shows now.
pub struct AnimatedTextures {
    states: HashMap<TextureId, AnimatedTexture>,
}

impl AnimatedTextures {
    pub fn from_level(
        defs: &[AnimatedTextureDef],
        texture_ids: &IndexMap<String, TextureId>,
    ) -> Self {
        let mut states = HashMap::new();

        for def in defs {
            let Some(id) = lookup_texture(texture_ids, Some(def.name.as_str())) else {
                continue;
            };

            let frames = def
                .frames
                .iter()
                .filter_map(|frame| lookup_texture(texture_ids, Some(frame.as_str())))
                .collect::<Vec<_>>();

            if frames.is_empty() {
                log::warn!("Animated texture {} has no frames", def.name);
                continue;
            }

            states.insert(
                id,
                AnimatedTexture {
                    frames,
                    index: 0,
                    delay: def.delay,
                    next_time: def.delay,
                },
            );
        }

        Self { states }
    }

    pub fn is_animated(&self, id: TextureId) -> bool {
        self.states.contains_key(&id)
    }

    /// The frame currently shown for `id`, or `id` itself.
    pub fn resolve(&self, id: TextureId) -> TextureId {
        match self.states.get(&id) {
            Some(anim) => anim.frames[anim.index],
            None => id,
        }
    }

    pub fn frame(&self, id: TextureId) -> Option<usize> {
        self.states.get(&id).map(|anim| anim.index)
    }

    /// Shows `frame` of a switch texture. Out of range frames clamp to the last one.
    pub fn set_frame(&mut self, id: TextureId, frame: usize) {
        if let Some(anim) = self.states.get_mut(&id) {
            anim.index = frame.min(anim.frames.len() - 1);
        }
    }

    /// Advances timed animations to `now`. Returns how many changed frame.
    pub fn animate(&mut self, now: Tick) -> usize {
        let mut changed = 0;
        for anim in self.states.values_mut() {
            if anim.delay == 0 || now < anim.next_time {
                continue;
            }

            let steps = (now - anim.next_time) / anim.delay + 1;
            anim.index = (anim.index + steps as usize) % anim.frames.len();
            anim.next_time += steps * anim.delay;
            changed += 1;
        }
        changed
    }
}
