use std::collections::HashMap;

use anyhow::{anyhow, Error, Result};

pub const DEFAULT_CVARS: &[(&str, CVar)] = &[
    // #############################
    // RENDERING VARIABLES:
    // Read into RenderSettings when the renderer is created.
    // #############################
    (
        "r_width",
        CVar {
            description: "Width of the software framebuffer, in pixels.",
            value: CVarValue::U32(320),
        },
    ),
    (
        "r_height",
        CVar {
            description: "Height of the software framebuffer, in pixels.",
            value: CVarValue::U32(200),
        },
    ),
    // 0 picks half the width, a 90 degree horizontal field of view.
    (
        "r_focallength",
        CVar {
            description: "Distance from the eye to the projection plane, in pixels.",
            value: CVarValue::F32(0.0),
        },
    ),
    (
        "r_aspect",
        CVar {
            description: "Vertical stretch applied to the focal length.",
            value: CVarValue::F32(1.0),
        },
    ),
    (
        "r_fullbright",
        CVar {
            description: "Ignore lighting and draw every surface at full brightness.",
            value: CVarValue::Bool(false),
        },
    ),
    // Every 16 units, the light level falls off by 1.
    (
        "r_lightfalloff",
        CVar {
            description: "",
            value: CVarValue::F32(16.0),
        },
    ),
    (
        "r_camlight",
        CVar {
            description: "Force the player's headlamp on.",
            value: CVarValue::Bool(false),
        },
    ),
    (
        "r_maxadjoindepth",
        CVar {
            description: "Deepest portal recursion per frame.",
            value: CVarValue::U32(40),
        },
    ),
    // #############################
    // INF VARIABLES:
    // #############################
    (
        "inf_maxmessages",
        CVar {
            description: "Messages processed per update before the queue is dropped.",
            value: CVarValue::U32(4096),
        },
    ),
];

pub type CVarsMap = HashMap<&'static str, CVar>;

pub fn default_cvars() -> CVarsMap {
    DEFAULT_CVARS.iter().copied().collect::<CVarsMap>()
}

fn get<'a>(cvars: &'a CVarsMap, name: &str) -> Result<&'a CVarValue> {
    cvars
        .get(name)
        .map(|cvar| &cvar.value)
        .ok_or_else(|| anyhow!("Missing cvar {}", name))
}

pub fn cvar_bool(cvars: &CVarsMap, name: &str) -> Result<bool> {
    get(cvars, name)?
        .as_bool()
        .ok_or_else(|| anyhow!("Cvar {} is not a bool", name))
}

pub fn cvar_u32(cvars: &CVarsMap, name: &str) -> Result<u32> {
    get(cvars, name)?
        .as_u32()
        .ok_or_else(|| anyhow!("Cvar {} is not an integer", name))
}

pub fn cvar_f32(cvars: &CVarsMap, name: &str) -> Result<f32> {
    get(cvars, name)?
        .as_f32()
        .ok_or_else(|| anyhow!("Cvar {} is not a float", name))
}

#[derive(Debug, Clone, Copy)]
pub struct CVar {
    pub description: &'static str,
    pub value: CVarValue,
}

#[derive(Debug, Clone, Copy)]
pub enum CVarValue {
    Bool(bool),
    U32(u32),
    F32(f32),
}

impl CVarValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CVarValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            CVarValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            CVarValue::F32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn set_from_str(&mut self, value: &str) -> Result<(), Error> {
        match self {
            CVarValue::Bool(ref mut v) => *v = value.parse()?,
            CVarValue::U32(ref mut v) => *v = value.parse()?,
            CVarValue::F32(ref mut v) => *v = value.parse()?,
        };

        Ok(())
    }
}
