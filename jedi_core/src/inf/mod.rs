//! INF scripting: elevators and triggers hung off sectors and walls, talking
//! to each other through a FIFO message queue.

mod elevator;
mod link;
mod loader;
mod trigger;

use std::{
    collections::{HashSet, VecDeque},
    time::Duration,
};

use jedi_level_format::{InfEntityMask, InfEventMask, InfMessageType, KeyItem};

use multimap::MultiMap;
use thiserror::Error;

pub use elevator::*;
pub use link::*;
pub use loader::build_inf_system;
pub use trigger::*;

use crate::{
    components::{CSector, CWall},
    helpers::ChangedSet,
    AnimatedTextures,
};

/// INF time unit.
pub type Tick = u32;

pub const TICKS_PER_SECOND: f64 = 145.5;

/// Converts frame time into INF ticks without drifting.
#[derive(Debug, Default)]
pub struct InfClock {
    seconds: f64,
    now: Tick,
}

impl InfClock {
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Returns the new time.
    pub fn advance(&mut self, delta: Duration) -> Tick {
        self.seconds += delta.as_secs_f64();
        self.now = (self.seconds * TICKS_PER_SECOND).floor() as Tick;
        self.now
    }
}

/// Where links hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkTarget {
    Sector(usize),
    Wall { sector: usize, wall: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTarget {
    Sector(usize),
    Wall { sector: usize, wall: usize },
    Link(LinkId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfMessage {
    pub target: MessageTarget,
    pub msg_type: InfMessageType,
    /// Empty means any.
    pub event: InfEventMask,
    /// Empty means any.
    pub entity: InfEntityMask,
    pub arg1: u32,
    pub arg2: u32,
    /// Link that sent the message, answered with `Done` by elevators.
    pub sender: Option<LinkId>,
}

impl InfMessage {
    pub fn new(target: MessageTarget, msg_type: InfMessageType) -> Self {
        Self {
            target,
            msg_type,
            event: InfEventMask::empty(),
            entity: InfEntityMask::empty(),
            arg1: 0,
            arg2: 0,
            sender: None,
        }
    }

    pub fn with_event(mut self, event: InfEventMask, entity: InfEntityMask) -> Self {
        self.event = event;
        self.entity = entity;
        self
    }

    pub fn with_args(mut self, arg1: u32, arg2: u32) -> Self {
        self.arg1 = arg1;
        self.arg2 = arg2;
        self
    }
}

/// Things the game has to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfEvent {
    LevelComplete,
    Wakeup { sector: Option<usize> },
    Lights,
    KeyRequired(KeyItem),
    Text(u32),
}

#[derive(Debug, Error)]
pub enum InfError {
    #[error("Unknown sector {0}.")]
    UnknownSector(String),
    #[error("Sector {sector} has no wall {wall}.")]
    MissingWall { sector: String, wall: usize },
    #[error("Elevator in sector {0} has no stops.")]
    NoStops(String),
    #[error("Elevator in sector {sector} starts at stop {start_stop} of {stops}.")]
    InvalidStartStop {
        sector: String,
        start_stop: usize,
        stops: usize,
    },
    #[error("Missing elevator class {0}.")]
    MissingClass(String),
}

/// Mutable level state INF writes to.
pub struct InfWorld<'a> {
    pub world: &'a mut hecs::World,
    /// Sector entities in level order.
    pub sectors: &'a [hecs::Entity],
    pub animations: &'a mut AnimatedTextures,
    /// Sectors whose geometry changed.
    pub changes: &'a mut ChangedSet<hecs::Entity>,
}

impl InfWorld<'_> {
    pub fn sector_entity(&self, index: usize) -> Option<hecs::Entity> {
        self.sectors.get(index).copied()
    }

    pub fn wall_entity(&self, sector: usize, wall: usize) -> Option<hecs::Entity> {
        let entity = self.sector_entity(sector)?;
        let c_sector = self.world.get::<&CSector>(entity).ok()?;
        c_sector.walls.get(wall).copied()
    }
}

/// Handed to a link while it handles a message or updates.
pub struct InfContext<'a, 'w> {
    pub geometry: &'a mut InfWorld<'w>,
    pub now: Tick,
    /// Ticks since the previous update.
    pub elapsed: Tick,
    /// The link being run.
    pub link: LinkId,
    keys: &'a HashSet<KeyItem>,
    outbox: &'a mut VecDeque<InfMessage>,
    events: &'a mut Vec<InfEvent>,
}

impl InfContext<'_, '_> {
    pub fn send(&mut self, msg: InfMessage) {
        self.outbox.push_back(msg);
    }

    pub fn emit(&mut self, event: InfEvent) {
        self.events.push(event);
    }

    /// Player activations of locked links need the key. Script messages
    /// carry no entity and always pass.
    pub fn check_key(&mut self, key: Option<KeyItem>, msg: &InfMessage) -> bool {
        let Some(key) = key else {
            return true;
        };
        if !msg.entity.contains(InfEntityMask::PLAYER) || self.keys.contains(&key) {
            return true;
        }

        self.emit(InfEvent::KeyRequired(key));
        false
    }
}

pub struct InfSystem {
    links: Vec<Option<InfLink>>,
    by_target: MultiMap<LinkTarget, LinkId>,

    queue: VecDeque<InfMessage>,
    events: Vec<InfEvent>,
    keys: HashSet<KeyItem>,

    /// Message budget for one update.
    pub max_messages: usize,
    now: Tick,
    elapsed: Tick,
}

impl Default for InfSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InfSystem {
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            by_target: MultiMap::new(),
            queue: VecDeque::new(),
            events: Vec::new(),
            keys: HashSet::new(),
            max_messages: 4096,
            now: 0,
            elapsed: 0,
        }
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn add_link(&mut self, link: InfLink) -> LinkId {
        let id = LinkId(self.links.len());
        self.by_target.insert(link.target, id);
        self.links.push(Some(link));
        id
    }

    pub fn link(&self, id: LinkId) -> Option<&InfLink> {
        self.links.get(id.0)?.as_ref()
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut InfLink> {
        self.links.get_mut(id.0)?.as_mut()
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkId, &InfLink)> {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(i, link)| Some((LinkId(i), link.as_ref()?)))
    }

    /// Links registered on `target`, in creation order.
    pub fn links_for(&self, target: LinkTarget) -> &[LinkId] {
        self.by_target
            .get_vec(&target)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn free_link(&mut self, id: LinkId) {
        let Some(link) = self.links.get_mut(id.0).and_then(|slot| slot.take()) else {
            return;
        };
        if let Some(ids) = self.by_target.get_vec_mut(&link.target) {
            ids.retain(|other| *other != id);
        }
    }

    pub fn give_key(&mut self, key: KeyItem) {
        self.keys.insert(key);
    }

    pub fn send(&mut self, msg: InfMessage) {
        self.queue.push_back(msg);
    }

    /// Queues a trigger caused by `entity` entering, leaving or nudging a sector.
    pub fn send_sector_event(&mut self, sector: usize, event: InfEventMask, entity: InfEntityMask) {
        self.send(
            InfMessage::new(MessageTarget::Sector(sector), InfMessageType::Trigger)
                .with_event(event, entity),
        );
    }

    /// Queues a trigger caused by `entity` crossing, nudging or shooting a wall.
    pub fn send_wall_event(
        &mut self,
        sector: usize,
        wall: usize,
        event: InfEventMask,
        entity: InfEntityMask,
    ) {
        self.send(
            InfMessage::new(MessageTarget::Wall { sector, wall }, InfMessageType::Trigger)
                .with_event(event, entity),
        );
    }

    pub fn take_events(&mut self) -> Vec<InfEvent> {
        std::mem::take(&mut self.events)
    }

    /// Runs one INF update at time `now`: pending messages, then every
    /// elevator, then whatever the elevators sent.
    pub fn update(&mut self, geometry: &mut InfWorld, now: Tick) {
        self.elapsed = now.saturating_sub(self.now);
        self.now = now;

        let mut budget = self.max_messages;
        self.dispatch(geometry, &mut budget);

        for i in 0..self.links.len() {
            let id = LinkId(i);
            let is_elevator = matches!(
                self.links[i].as_ref().map(|link| &link.item),
                Some(InfLinkItem::Elevator(_))
            );
            if is_elevator {
                self.run_link(id, geometry, |link, ctx| link.item.handler_mut().update(ctx));
            }
        }

        self.dispatch(geometry, &mut budget);
    }

    /// Processes one message immediately, outside of [InfSystem::update].
    pub fn deliver_now(&mut self, geometry: &mut InfWorld, msg: InfMessage) {
        self.queue.push_back(msg);
        let mut budget = self.max_messages;
        self.dispatch(geometry, &mut budget);
    }

    fn dispatch(&mut self, geometry: &mut InfWorld, budget: &mut usize) {
        while let Some(msg) = self.queue.pop_front() {
            if *budget == 0 {
                log::warn!(
                    "INF message budget exhausted, dropping {} messages",
                    self.queue.len() + 1
                );
                self.queue.clear();
                return;
            }
            *budget -= 1;

            self.deliver(geometry, msg);
        }
    }

    fn deliver(&mut self, geometry: &mut InfWorld, msg: InfMessage) {
        match msg.msg_type {
            InfMessageType::SetBits | InfMessageType::ClearBits => {
                apply_bits(geometry, &msg);
                return;
            }
            InfMessageType::Complete => {
                self.events.push(InfEvent::LevelComplete);
                return;
            }
            InfMessageType::Wakeup => {
                let sector = match msg.target {
                    MessageTarget::Sector(sector) | MessageTarget::Wall { sector, .. } => {
                        Some(sector)
                    }
                    MessageTarget::Link(_) => None,
                };
                self.events.push(InfEvent::Wakeup { sector });
                return;
            }
            InfMessageType::Lights => {
                self.events.push(InfEvent::Lights);
                return;
            }
            _ => {}
        }

        let ids = match msg.target {
            MessageTarget::Sector(sector) => self.links_for(LinkTarget::Sector(sector)).to_vec(),
            MessageTarget::Wall { sector, wall } => {
                self.links_for(LinkTarget::Wall { sector, wall }).to_vec()
            }
            MessageTarget::Link(id) => vec![id],
        };

        for id in ids {
            self.run_link(id, geometry, |link, ctx| {
                if !link.accepts(&msg) {
                    return LinkOutcome::Keep;
                }
                link.item.handler_mut().handle_message(&msg, ctx)
            });
        }
    }

    /// Takes the link out of the arena while it runs, so it can queue
    /// messages to itself.
    fn run_link<F>(&mut self, id: LinkId, geometry: &mut InfWorld, f: F)
    where
        F: FnOnce(&mut InfLink, &mut InfContext) -> LinkOutcome,
    {
        let Some(mut link) = self.links.get_mut(id.0).and_then(|slot| slot.take()) else {
            log::debug!("Skipping freed INF link {}", id.0);
            return;
        };

        let outcome = {
            let mut ctx = InfContext {
                geometry,
                now: self.now,
                elapsed: self.elapsed,
                link: id,
                keys: &self.keys,
                outbox: &mut self.queue,
                events: &mut self.events,
            };
            f(&mut link, &mut ctx)
        };

        match outcome {
            LinkOutcome::Keep => self.links[id.0] = Some(link),
            LinkOutcome::Free => {
                log::debug!("Freeing INF link {}", id.0);
                if let Some(ids) = self.by_target.get_vec_mut(&link.target) {
                    ids.retain(|other| *other != id);
                }
            }
        }
    }
}

/// `arg1` picks the flag word (1 to 3), `arg2` holds the bits.
fn apply_bits(geometry: &mut InfWorld, msg: &InfMessage) {
    let word = (msg.arg1.clamp(1, 3) - 1) as usize;
    let set = msg.msg_type == InfMessageType::SetBits;
    let update = |flags: &mut [u32; 3]| {
        if set {
            flags[word] |= msg.arg2;
        } else {
            flags[word] &= !msg.arg2;
        }
    };

    match msg.target {
        MessageTarget::Sector(sector) => {
            let Some(entity) = geometry.sector_entity(sector) else {
                log::warn!("Flag message for missing sector {}", sector);
                return;
            };
            if let Ok(mut c_sector) = geometry.world.get::<&mut CSector>(entity) {
                update(&mut c_sector.flags);
            }
        }
        MessageTarget::Wall { sector, wall } => {
            let Some(entity) = geometry.wall_entity(sector, wall) else {
                log::warn!("Flag message for missing wall {} in sector {}", wall, sector);
                return;
            };
            if let Ok(mut c_wall) = geometry.world.get::<&mut CWall>(entity) {
                update(&mut c_wall.flags);
            }
        }
        MessageTarget::Link(_) => log::warn!("Flag message sent to a link"),
    }
}
