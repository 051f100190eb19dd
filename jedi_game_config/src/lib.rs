use jedi_level_format::{
    ElevTrigMove, ElevatorDef, InfElevatorFlags, InfElevatorType, InfEntityMask, InfEventMask,
    LevelError, StopDef,
};

use bitflags::bitflags;
use serde::Deserialize;

#[derive(Debug, Clone, Copy)]
pub enum Game {
    /// Dark Forces, including the retail and demo releases.
    DarkForces,
}

impl Game {
    pub fn name(&self) -> &str {
        match self {
            Game::DarkForces => "Dark Forces",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GameConfig {
    /// Presets selected by the `class` keyword of an INF elevator.
    pub elevator_classes: Vec<ElevatorClassConfig>,
    /// Elevator created for every sector flagged as a door.
    pub door: DoorConfig,
}

#[derive(Debug, Deserialize)]
pub struct DoorConfig {
    pub class: String,
    /// Ticks a door stays open before closing again.
    pub open_delay: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElevatorClassConfig {
    pub class: String,

    pub elevator_type: ElevatorTypeConfig,
    pub trig_move: TrigMoveConfig,

    /// Units per second.
    pub speed: f32,

    pub event_mask: EventMaskConfig,
    pub entity_mask: EntityMaskConfig,

    pub flags: ClassFlags,
}

bitflags! {
    #[derive(Debug, Deserialize, Copy, Clone, PartialEq, Eq)]
    #[serde(try_from = "String")]
    pub struct ClassFlags: u32 {
        /// Starts moving as soon as the level loads.
        ///
        /// String code: A
        const AutoStart = 0b00000001;
        /// Door, closes itself after opening.
        ///
        /// String code: D
        const Door = 0b00000010;
    }
}

impl TryFrom<String> for ClassFlags {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let mut flags = ClassFlags::empty();
        for c in s.chars() {
            match c {
                'A' => flags |= ClassFlags::AutoStart,
                'D' => flags |= ClassFlags::Door,
                _ => return Err("Invalid flag"),
            }
        }

        Ok(flags)
    }
}

#[derive(Debug, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct ElevatorTypeConfig(pub InfElevatorType);

impl TryFrom<String> for ElevatorTypeConfig {
    type Error = LevelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(ElevatorTypeConfig(s.parse()?))
    }
}

#[derive(Debug, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct TrigMoveConfig(pub ElevTrigMove);

impl TryFrom<String> for TrigMoveConfig {
    type Error = LevelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(TrigMoveConfig(s.parse()?))
    }
}

#[derive(Debug, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct EventMaskConfig(pub InfEventMask);

impl TryFrom<String> for EventMaskConfig {
    type Error = LevelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(EventMaskConfig(s.parse()?))
    }
}

#[derive(Debug, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct EntityMaskConfig(pub InfEntityMask);

impl TryFrom<String> for EntityMaskConfig {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let mut mask = InfEntityMask::empty();
        for name in s.split('|') {
            match name.trim() {
                "player" => mask |= InfEntityMask::PLAYER,
                "enemy" => mask |= InfEntityMask::ENEMY,
                "weapon" => mask |= InfEntityMask::WEAPON,
                "any" => mask |= InfEntityMask::ANY,
                _ => return Err("Invalid entity mask"),
            }
        }

        Ok(EntityMaskConfig(mask))
    }
}

impl ElevatorClassConfig {
    /// Builds an elevator definition for `sector` with this preset's defaults.
    /// Scripts override individual fields afterwards.
    pub fn to_elevator_def(&self, sector: &str, stops: Vec<StopDef>) -> ElevatorDef {
        let mut flags = InfElevatorFlags::empty();
        if self.flags.contains(ClassFlags::Door) {
            flags |= InfElevatorFlags::DOOR;
        }

        ElevatorDef {
            sector: sector.to_string(),
            elevator_type: self.elevator_type.0,
            trig_move: self.trig_move.0,
            speed: self.speed,
            fixed_step: 0.0,
            event_mask: self.event_mask.0,
            entity_mask: self.entity_mask.0,
            key: None,
            start_stop: 0,
            master: true,
            auto_start: self.auto_start(),
            flags,
            stops,
            slaves: vec![],
            center: (0.0, 0.0),
            angle: 0.0,
        }
    }

    pub fn auto_start(&self) -> bool {
        self.flags.contains(ClassFlags::AutoStart)
    }
}

impl GameConfig {
    pub fn from_game(game: Game) -> serde_json::Result<Self> {
        let config_str = match game {
            Game::DarkForces => include_str!("../config/dark_forces.json"),
        };

        Self::from_json(config_str)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn elevator_class(&self, class: &str) -> Option<&ElevatorClassConfig> {
        self.elevator_classes
            .iter()
            .find(|c| c.class.eq_ignore_ascii_case(class))
    }

    pub fn door_class(&self) -> Option<&ElevatorClassConfig> {
        self.elevator_class(&self.door.class)
    }
}
