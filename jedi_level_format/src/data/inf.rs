use bitflags::bitflags;
use lazy_static::lazy_static;

use std::{collections::HashMap, str::FromStr};

use crate::LevelError;

/// What an elevator moves. Discriminants match the level data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfElevatorType {
    MoveCeiling = 0,
    MoveFloor = 1,
    MoveOffset = 2,
    MoveWall = 3,
    RotateWall = 4,
    ScrollWall = 5,
    ScrollFloor = 6,
    ScrollCeiling = 7,
    ChangeLight = 8,
    MoveFc = 9,
    ChangeWallLight = 10,
}

/// How an elevator reacts to a plain trigger message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElevTrigMove {
    Hold = -1,
    Cont = 0,
    Last = 1,
    Next = 2,
    Prev = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerType {
    Standard = 0,
    Sector = 1,
    Switch1 = 2,
    Toggle = 3,
    Single = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfMessageType {
    Trigger,
    NextStop,
    PrevStop,
    GotoStop,
    MasterOn,
    MasterOff,
    SetBits,
    ClearBits,
    Complete,
    Done,
    Wakeup,
    Lights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    Sector = 0,
    Trigger = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyItem {
    Red = 23,
    Yellow = 24,
    Blue = 25,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InfEventMask: u32 {
        const CROSS_LINE_FRONT = 1 << 0;
        const CROSS_LINE_BACK = 1 << 1;
        const ENTER_SECTOR = 1 << 2;
        const LEAVE_SECTOR = 1 << 3;
        const NUDGE_FRONT = 1 << 4;
        const NUDGE_BACK = 1 << 5;
        const EXPLOSION = 1 << 6;
        const UNKNOWN = 1 << 7;
        const SHOOT_LINE = 1 << 8;
        const LAND = 1 << 9;
        const EVENT_10 = 1 << 10;
        const EVENT_11 = 1 << 11;
        const EVENT_31 = 1 << 31;
        const ANY = 0xffff_ffff;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InfEntityMask: u32 {
        const ENEMY = 1 << 0;
        const WEAPON = 1 << 3;
        const ENTITY_11 = 1 << 11;
        const PLAYER = 1 << 31;
        const ANY = 0xffff_ffff;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InfElevatorFlags: u32 {
        const MOVE_FLOOR = 1 << 0;
        const MOVE_SECHT = 1 << 1;
        const MOVE_CEIL = 1 << 2;
        const DOOR = 1 << 3;
    }
}

/// Stop delay. The raw encoding reserves the top three values as sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopDelay {
    Ticks(u32),
    Hold,
    Terminate,
    Complete,
}

impl StopDelay {
    pub const RAW_HOLD: u32 = 0xffff_ffff;
    pub const RAW_TERMINATE: u32 = 0xffff_fffe;
    pub const RAW_COMPLETE: u32 = 0xffff_fffd;

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            Self::RAW_HOLD => StopDelay::Hold,
            Self::RAW_TERMINATE => StopDelay::Terminate,
            Self::RAW_COMPLETE => StopDelay::Complete,
            ticks => StopDelay::Ticks(ticks),
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            StopDelay::Ticks(ticks) => ticks,
            StopDelay::Hold => Self::RAW_HOLD,
            StopDelay::Terminate => Self::RAW_TERMINATE,
            StopDelay::Complete => Self::RAW_COMPLETE,
        }
    }
}

lazy_static! {
    static ref ELEVATOR_TYPE_NAMES: HashMap<&'static str, InfElevatorType> = HashMap::from([
        ("move_ceiling", InfElevatorType::MoveCeiling),
        ("move_floor", InfElevatorType::MoveFloor),
        ("move_offset", InfElevatorType::MoveOffset),
        ("move_wall", InfElevatorType::MoveWall),
        ("rotate_wall", InfElevatorType::RotateWall),
        ("scroll_wall", InfElevatorType::ScrollWall),
        ("scroll_floor", InfElevatorType::ScrollFloor),
        ("scroll_ceiling", InfElevatorType::ScrollCeiling),
        ("change_light", InfElevatorType::ChangeLight),
        ("move_fc", InfElevatorType::MoveFc),
        ("change_wall_light", InfElevatorType::ChangeWallLight),
    ]);
    static ref MESSAGE_NAMES: HashMap<&'static str, InfMessageType> = HashMap::from([
        ("m_trigger", InfMessageType::Trigger),
        ("next_stop", InfMessageType::NextStop),
        ("prev_stop", InfMessageType::PrevStop),
        ("goto_stop", InfMessageType::GotoStop),
        ("master_on", InfMessageType::MasterOn),
        ("master_off", InfMessageType::MasterOff),
        ("set_bits", InfMessageType::SetBits),
        ("clear_bits", InfMessageType::ClearBits),
        ("complete", InfMessageType::Complete),
        ("done", InfMessageType::Done),
        ("wakeup", InfMessageType::Wakeup),
        ("lights", InfMessageType::Lights),
    ]);
    static ref TRIGGER_TYPE_NAMES: HashMap<&'static str, TriggerType> = HashMap::from([
        ("standard", TriggerType::Standard),
        ("sector", TriggerType::Sector),
        ("switch1", TriggerType::Switch1),
        ("toggle", TriggerType::Toggle),
        ("single", TriggerType::Single),
    ]);
    static ref EVENT_NAMES: HashMap<&'static str, InfEventMask> = HashMap::from([
        ("cross_front", InfEventMask::CROSS_LINE_FRONT),
        ("cross_back", InfEventMask::CROSS_LINE_BACK),
        ("enter", InfEventMask::ENTER_SECTOR),
        ("leave", InfEventMask::LEAVE_SECTOR),
        ("nudge_front", InfEventMask::NUDGE_FRONT),
        ("nudge_back", InfEventMask::NUDGE_BACK),
        ("explosion", InfEventMask::EXPLOSION),
        ("shoot", InfEventMask::SHOOT_LINE),
        ("land", InfEventMask::LAND),
        ("any", InfEventMask::ANY),
    ]);
}

fn lookup<T: Copy>(table: &HashMap<&'static str, T>, name: &str) -> Result<T, LevelError> {
    table
        .get(name.trim().to_lowercase().as_str())
        .copied()
        .ok_or_else(|| LevelError::UnknownName(name.to_string()))
}

impl FromStr for InfElevatorType {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&ELEVATOR_TYPE_NAMES, s)
    }
}

impl FromStr for InfMessageType {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&MESSAGE_NAMES, s)
    }
}

impl FromStr for TriggerType {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&TRIGGER_TYPE_NAMES, s)
    }
}

impl FromStr for ElevTrigMove {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hold" | "-1" => Ok(ElevTrigMove::Hold),
            "cont" | "0" => Ok(ElevTrigMove::Cont),
            "last" | "1" => Ok(ElevTrigMove::Last),
            "next" | "2" => Ok(ElevTrigMove::Next),
            "prev" | "3" => Ok(ElevTrigMove::Prev),
            _ => Err(LevelError::UnknownName(s.to_string())),
        }
    }
}

/// Event masks are written either as a number or as `|` separated names.
impl FromStr for InfEventMask {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(bits) = s.trim().parse::<u32>() {
            return Ok(InfEventMask::from_bits_retain(bits));
        }

        s.split('|').try_fold(InfEventMask::empty(), |mask, name| {
            Ok(mask | lookup(&EVENT_NAMES, name)?)
        })
    }
}

/// Where an elevator stop's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum StopValue {
    Absolute(f32),
    /// Offset from the sector's value at load.
    Relative(f32),
    /// Copies the named sector's value at load.
    Sector(String),
}

/// Address of a message target or trigger location: a sector, optionally a
/// single wall of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetRef {
    pub sector: String,
    pub wall: Option<usize>,
}

impl TargetRef {
    pub fn sector(name: &str) -> Self {
        TargetRef {
            sector: name.to_string(),
            wall: None,
        }
    }

    pub fn wall(name: &str, wall: usize) -> Self {
        TargetRef {
            sector: name.to_string(),
            wall: Some(wall),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageDef {
    pub target: TargetRef,
    pub msg: InfMessageType,
    pub arg1: u32,
    pub arg2: u32,
    /// Event bits carried by the message; empty means any.
    pub event: InfEventMask,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjoinDef {
    pub sector0: String,
    pub wall0: usize,
    pub sector1: String,
    pub wall1: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopDef {
    pub value: StopValue,
    pub delay: StopDelay,
    pub messages: Vec<MessageDef>,
    pub adjoins: Vec<AdjoinDef>,
    pub floor_texture: Option<String>,
    pub ceiling_texture: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlaveDef {
    pub sector: String,
    /// Angle offset for rotating slaves, in degrees.
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevatorDef {
    pub sector: String,
    pub elevator_type: InfElevatorType,
    pub trig_move: ElevTrigMove,

    /// Units per second; 0 moves instantly.
    pub speed: f32,
    /// Snaps motion to multiples of this step, 0 disables.
    pub fixed_step: f32,

    pub event_mask: InfEventMask,
    pub entity_mask: InfEntityMask,
    pub key: Option<KeyItem>,

    pub start_stop: usize,
    pub master: bool,
    /// Starts moving as soon as the level loads.
    pub auto_start: bool,
    pub flags: InfElevatorFlags,

    pub stops: Vec<StopDef>,
    pub slaves: Vec<SlaveDef>,

    /// Pivot for `rotate_wall`.
    pub center: (f32, f32),
    /// Direction for `move_wall` and the scrolling types, in degrees.
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerClientDef {
    pub target: TargetRef,
    pub event_mask: InfEventMask,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDef {
    pub location: TargetRef,
    pub trigger_type: TriggerType,

    pub event_mask: InfEventMask,
    pub entity_mask: InfEntityMask,

    pub clients: Vec<TriggerClientDef>,

    pub cmd: InfMessageType,
    pub arg0: u32,
    pub arg1: u32,
    pub event: InfEventMask,

    pub master: bool,
    pub key: Option<KeyItem>,
    pub text_id: Option<u32>,

    /// Sign texture of a switch; frame 1 of it shows the "on" state.
    pub switch_texture: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfItemDef {
    Elevator(ElevatorDef),
    Trigger(TriggerDef),
}
