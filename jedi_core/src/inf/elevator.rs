use bitflags::bitflags;

use jedi_level_format::{
    ElevTrigMove, InfElevatorFlags, InfElevatorType, InfMessageType, KeyItem, StopDelay, WallFlags,
};

use crate::{
    components::{CAdjoin, CSector, CWall, TextureId},
    helpers::{Angle14, Fixed16, Vec2Fixed},
};

use super::{
    InfContext, InfEvent, InfLinkHandler, InfMessage, InfWorld, LinkId, LinkOutcome,
    MessageTarget, Tick,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ElevUpdateFlags: u32 {
        const MOVING = 1 << 0;
        const MASTER_ON = 1 << 1;
        const MOVING_REVERSE = 1 << 2;
    }
}

/// Re-links two walls as a portal pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjoinCmd {
    pub sector0: hecs::Entity,
    pub wall0: hecs::Entity,
    pub sector1: hecs::Entity,
    pub wall1: hecs::Entity,
}

impl AdjoinCmd {
    pub fn apply(&self, world: &hecs::World) {
        for (wall, sector, mirror) in [
            (self.wall0, self.sector1, self.wall1),
            (self.wall1, self.sector0, self.wall0),
        ] {
            match world.get::<&mut CWall>(wall) {
                Ok(mut c_wall) => {
                    c_wall.adjoin = Some(CAdjoin {
                        sector,
                        mirror: Some(mirror),
                    })
                }
                Err(_) => log::warn!("Adjoin command references a missing wall"),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub value: Fixed16,
    pub delay: StopDelay,
    /// Sent once on every arrival.
    pub messages: Vec<InfMessage>,
    pub adjoin_cmds: Vec<AdjoinCmd>,
    pub floor_texture: Option<TextureId>,
    pub ceiling_texture: Option<TextureId>,
}

impl Stop {
    pub fn new(value: Fixed16, delay: StopDelay) -> Self {
        Self {
            value,
            delay,
            messages: vec![],
            adjoin_cmds: vec![],
            floor_texture: None,
            ceiling_texture: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slave {
    pub sector: hecs::Entity,
    /// Extra angle for rotating slaves, in degrees.
    pub value: Fixed16,
}

/// Geometry of one moved sector at load. Relative motion (morphs, scrolls)
/// is applied on top of it.
#[derive(Debug, Clone)]
struct SectorBase {
    sector: hecs::Entity,
    floor: Fixed16,
    ceiling: Fixed16,
    floor_offset: Vec2Fixed,
    ceiling_offset: Vec2Fixed,
    vertices: Vec<Vec2Fixed>,
    morph_vertices: Vec<usize>,
    scroll_walls: Vec<(hecs::Entity, Vec2Fixed)>,
    light_walls: Vec<hecs::Entity>,
}

impl SectorBase {
    fn capture(world: &hecs::World, sector: hecs::Entity) -> Option<Self> {
        let c_sector = world.get::<&CSector>(sector).ok()?;

        let walls = c_sector
            .walls
            .iter()
            .filter_map(|&wall| {
                let c_wall = world.get::<&CWall>(wall).ok()?;
                Some((
                    wall,
                    WallFlags::from_bits_retain(c_wall.flags[0]),
                    c_wall.v0,
                    c_wall.v1,
                    c_wall.texture_offset,
                ))
            })
            .collect::<Vec<_>>();

        // Only flagged walls move. With no flags at all, the whole sector does.
        let flagged = |flag: WallFlags| {
            let any = walls.iter().any(|(_, flags, ..)| flags.intersects(flag));
            walls
                .iter()
                .filter(move |(_, flags, ..)| !any || flags.intersects(flag))
        };

        let mut morph_vertices = flagged(WallFlags::WALL_MORPHS)
            .flat_map(|(_, _, v0, v1, _)| [*v0, *v1])
            .collect::<Vec<_>>();
        morph_vertices.sort_unstable();
        morph_vertices.dedup();

        let scroll = WallFlags::SCROLL_TOP_TEX
            | WallFlags::SCROLL_MID_TEX
            | WallFlags::SCROLL_BOT_TEX
            | WallFlags::SCROLL_SIGN_TEX;

        Some(Self {
            sector,
            floor: c_sector.floor_height,
            ceiling: c_sector.ceiling_height,
            floor_offset: c_sector.floor_offset,
            ceiling_offset: c_sector.ceiling_offset,
            vertices: c_sector.vertices.to_vec(),
            morph_vertices,
            scroll_walls: flagged(scroll)
                .map(|(wall, _, _, _, offset)| (*wall, *offset))
                .collect(),
            light_walls: flagged(WallFlags::CHANGE_WALL_LIGHT)
                .map(|(wall, ..)| *wall)
                .collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct InfElevator {
    pub elevator_type: InfElevatorType,
    pub trig_move: ElevTrigMove,
    pub sector: hecs::Entity,
    pub key: Option<KeyItem>,

    /// Units per second. Zero moves instantly.
    pub speed: Fixed16,
    /// Geometry snaps to multiples of this while moving. Zero disables.
    pub fixed_step: Fixed16,

    /// The elevator waits until this tick before moving on.
    pub next_time: Tick,
    pub stops: Vec<Stop>,
    pub slaves: Vec<Slave>,
    pub next_stop: usize,

    pub value: Fixed16,
    /// Pivot for `rotate_wall`.
    pub center: Vec2Fixed,
    /// Unit direction for `move_wall` and the scrolling types.
    pub dir: Vec2Fixed,

    pub flags: InfElevatorFlags,
    pub update_flags: ElevUpdateFlags,

    last_sender: Option<LinkId>,
    bases: Vec<SectorBase>,
}

impl InfElevator {
    pub fn new(elevator_type: InfElevatorType, sector: hecs::Entity) -> Self {
        Self {
            elevator_type,
            trig_move: ElevTrigMove::Next,
            sector,
            key: None,
            speed: Fixed16::from_int(30),
            fixed_step: Fixed16::ZERO,
            next_time: 0,
            stops: vec![],
            slaves: vec![],
            next_stop: 0,
            value: Fixed16::ZERO,
            center: Vec2Fixed::ZERO,
            dir: Vec2Fixed::new(Fixed16::ZERO, Fixed16::ONE),
            flags: InfElevatorFlags::empty(),
            update_flags: ElevUpdateFlags::MASTER_ON,
            last_sender: None,
            bases: vec![],
        }
    }

    /// Records the geometry of the sector and its slaves, then moves them to
    /// the value of the current stop.
    pub fn init(&mut self, geometry: &mut InfWorld) {
        self.bases = std::iter::once(self.sector)
            .chain(self.slaves.iter().map(|slave| slave.sector))
            .filter_map(|sector| {
                let base = SectorBase::capture(geometry.world, sector);
                if base.is_none() {
                    log::error!("Elevator references a missing sector");
                }
                base
            })
            .collect();

        if let Some(stop) = self.stops.get(self.next_stop) {
            self.value = stop.value;
            self.apply(geometry, self.value);
        }
    }

    pub fn is_moving(&self) -> bool {
        self.update_flags.contains(ElevUpdateFlags::MOVING)
    }

    /// Parked at a stop with a delay still running.
    pub fn is_waiting(&self, now: Tick) -> bool {
        self.is_moving() && now < self.next_time
    }

    pub fn at_next_stop(&self) -> bool {
        self.stops
            .get(self.next_stop)
            .is_some_and(|stop| stop.value == self.value)
    }

    /// Moves `next_stop` by `step`, wrapping, backwards when reversed.
    pub fn advance_stop(&mut self, step: isize) {
        let len = self.stops.len() as isize;
        if len == 0 {
            return;
        }

        let step = if self.update_flags.contains(ElevUpdateFlags::MOVING_REVERSE) {
            -step
        } else {
            step
        };
        self.next_stop = (self.next_stop as isize + step).rem_euclid(len) as usize;
    }

    /// Stop the elevator waits at. Arrival has already moved `next_stop`
    /// one past it.
    fn parked_stop(&self) -> usize {
        let len = self.stops.len() as isize;
        if len == 0 {
            return 0;
        }
        let step = if self.update_flags.contains(ElevUpdateFlags::MOVING_REVERSE) {
            -1
        } else {
            1
        };
        (self.next_stop as isize - step).rem_euclid(len) as usize
    }

    /// `back` stops against the direction of travel, clamped to the list.
    fn stop_back(&self, stop: usize, back: usize) -> usize {
        if self.update_flags.contains(ElevUpdateFlags::MOVING_REVERSE) {
            (stop + back).min(self.stops.len().saturating_sub(1))
        } else {
            stop.saturating_sub(back)
        }
    }

    fn start(&mut self, msg: &InfMessage) {
        self.last_sender = msg.sender;
        self.update_flags.insert(ElevUpdateFlags::MOVING);
    }

    fn trigger(&mut self, msg: &InfMessage, ctx: &mut InfContext) {
        if !ctx.check_key(self.key, msg) {
            return;
        }

        let waiting = self.is_waiting(ctx.now);
        match self.trig_move {
            ElevTrigMove::Hold => return,
            ElevTrigMove::Cont => {
                if self.is_moving() {
                    return;
                }
                if self.at_next_stop() {
                    self.advance_stop(1);
                }
            }
            ElevTrigMove::Last => self.next_stop = self.stops.len().saturating_sub(1),
            ElevTrigMove::Next => {
                if waiting {
                    return;
                }
                self.advance_stop(1);
            }
            // Back one stop from the one it is parked on, two from the
            // one it is heading for.
            ElevTrigMove::Prev => {
                if waiting {
                    let parked = self.parked_stop();
                    self.next_stop = self.stop_back(parked, 1);
                } else {
                    self.next_stop = self.stop_back(self.next_stop, 2);
                }
            }
        }

        self.start(msg);
    }

    /// Returns true on arrival.
    fn step_toward(&mut self, target: Fixed16, elapsed: Tick) -> bool {
        if self.speed <= Fixed16::ZERO {
            self.value = target;
            return true;
        }

        // speed * elapsed / 145.5
        let delta = (self.speed.0 as i64 * elapsed as i64 * 2 / 291).min(i32::MAX as i64);
        let delta = Fixed16(delta as i32);

        let remaining = target - self.value;
        if remaining.abs() <= delta {
            self.value = target;
            true
        } else {
            if remaining.is_negative() {
                self.value -= delta;
            } else {
                self.value += delta;
            }
            false
        }
    }

    fn snapped_value(&self) -> Fixed16 {
        if self.fixed_step <= Fixed16::ZERO {
            return self.value;
        }
        Fixed16(self.value.0 / self.fixed_step.0 * self.fixed_step.0)
    }

    fn apply(&self, geometry: &mut InfWorld, value: Fixed16) {
        for (i, base) in self.bases.iter().enumerate() {
            let slave_value = match i {
                0 => Fixed16::ZERO,
                _ => self.slaves.get(i - 1).map(|s| s.value).unwrap_or_default(),
            };

            let Ok(mut sector) = geometry.world.get::<&mut CSector>(base.sector) else {
                log::error!("Elevator references a missing sector");
                debug_assert!(false, "elevator references a missing sector");
                continue;
            };

            match self.elevator_type {
                InfElevatorType::MoveFloor => sector.floor_height = value,
                InfElevatorType::MoveCeiling => sector.ceiling_height = value,
                InfElevatorType::MoveOffset => sector.second_height = value,
                InfElevatorType::MoveFc => {
                    sector.floor_height = value;
                    sector.ceiling_height = value + (base.ceiling - base.floor);
                }
                InfElevatorType::ChangeLight => sector.ambient = value.round(),
                InfElevatorType::ScrollFloor => {
                    sector.floor_offset = base.floor_offset + self.dir.scale(value)
                }
                InfElevatorType::ScrollCeiling => {
                    sector.ceiling_offset = base.ceiling_offset + self.dir.scale(value)
                }
                InfElevatorType::MoveWall => {
                    let offset = self.dir.scale(value);
                    for &v in &base.morph_vertices {
                        if let Some(vertex) = sector.vertices.get_mut(v) {
                            *vertex = base.vertices[v] + offset;
                        }
                    }
                }
                InfElevatorType::RotateWall => {
                    let angle = Angle14::from_degrees((value + slave_value).to_f32());
                    for &v in &base.morph_vertices {
                        if let Some(vertex) = sector.vertices.get_mut(v) {
                            *vertex = self.center + (base.vertices[v] - self.center).rotate(angle);
                        }
                    }
                }
                InfElevatorType::ScrollWall | InfElevatorType::ChangeWallLight => {}
            }
            drop(sector);

            match self.elevator_type {
                InfElevatorType::ScrollWall => {
                    for (wall, offset) in &base.scroll_walls {
                        if let Ok(mut c_wall) = geometry.world.get::<&mut CWall>(*wall) {
                            c_wall.texture_offset = *offset + self.dir.scale(value);
                        }
                    }
                }
                InfElevatorType::ChangeWallLight => {
                    for wall in &base.light_walls {
                        if let Ok(mut c_wall) = geometry.world.get::<&mut CWall>(*wall) {
                            c_wall.light = value.round();
                        }
                    }
                }
                _ => {}
            }

            geometry.changes.change(base.sector);
        }
    }

    fn arrive(&mut self, ctx: &mut InfContext) -> LinkOutcome {
        let Some(stop) = self.stops.get(self.next_stop) else {
            return LinkOutcome::Keep;
        };

        for msg in &stop.messages {
            let mut msg = msg.clone();
            msg.sender = Some(ctx.link);
            ctx.send(msg);
        }

        for cmd in &stop.adjoin_cmds {
            cmd.apply(ctx.geometry.world);
        }

        if stop.floor_texture.is_some() || stop.ceiling_texture.is_some() {
            if let Ok(mut sector) = ctx.geometry.world.get::<&mut CSector>(self.sector) {
                if let Some(texture) = stop.floor_texture {
                    sector.floor_texture = Some(texture);
                }
                if let Some(texture) = stop.ceiling_texture {
                    sector.ceiling_texture = Some(texture);
                }
            }
        }

        let delay = stop.delay;
        match delay {
            StopDelay::Hold => {
                self.stop_moving(ctx);
                LinkOutcome::Keep
            }
            StopDelay::Terminate => {
                self.stop_moving(ctx);
                LinkOutcome::Free
            }
            StopDelay::Complete => {
                ctx.emit(InfEvent::LevelComplete);
                self.stop_moving(ctx);
                LinkOutcome::Keep
            }
            StopDelay::Ticks(ticks) => {
                self.next_time = ctx.now.saturating_add(ticks);
                self.advance_stop(1);
                LinkOutcome::Keep
            }
        }
    }

    fn stop_moving(&mut self, ctx: &mut InfContext) {
        self.update_flags.remove(ElevUpdateFlags::MOVING);
        if let Some(sender) = self.last_sender.take() {
            ctx.send(InfMessage::new(
                MessageTarget::Link(sender),
                InfMessageType::Done,
            ));
        }
    }
}

impl InfLinkHandler for InfElevator {
    fn handle_message(&mut self, msg: &InfMessage, ctx: &mut InfContext) -> LinkOutcome {
        match msg.msg_type {
            InfMessageType::Trigger => self.trigger(msg, ctx),
            InfMessageType::NextStop => {
                self.advance_stop(1);
                self.start(msg);
            }
            InfMessageType::PrevStop => {
                self.advance_stop(-1);
                self.start(msg);
            }
            InfMessageType::GotoStop => {
                let stop = msg.arg1 as usize;
                if stop < self.stops.len() {
                    self.next_stop = stop;
                    self.start(msg);
                } else {
                    log::warn!("goto_stop {} out of range ({} stops)", stop, self.stops.len());
                }
            }
            InfMessageType::MasterOn => self.update_flags.insert(ElevUpdateFlags::MASTER_ON),
            InfMessageType::MasterOff => self.update_flags.remove(ElevUpdateFlags::MASTER_ON),
            _ => {}
        }
        LinkOutcome::Keep
    }

    fn update(&mut self, ctx: &mut InfContext) -> LinkOutcome {
        if !self
            .update_flags
            .contains(ElevUpdateFlags::MOVING | ElevUpdateFlags::MASTER_ON)
        {
            return LinkOutcome::Keep;
        }
        if ctx.now < self.next_time {
            return LinkOutcome::Keep;
        }

        let Some(target) = self.stops.get(self.next_stop).map(|stop| stop.value) else {
            self.update_flags.remove(ElevUpdateFlags::MOVING);
            return LinkOutcome::Keep;
        };

        let arrived = self.step_toward(target, ctx.elapsed);
        let value = if arrived {
            self.value
        } else {
            self.snapped_value()
        };
        self.apply(ctx.geometry, value);

        if arrived {
            self.arrive(ctx)
        } else {
            LinkOutcome::Keep
        }
    }
}

#[cfg(test)]
mod tests {
    use jedi_level_format::{InfEntityMask, InfEventMask};

    use super::*;
    use crate::{
        inf::{InfLink, InfLinkItem, InfSystem, LinkTarget},
        test_level::{two_rooms, TestGeometry},
    };

    fn elevator(
        geometry: &TestGeometry,
        elevator_type: InfElevatorType,
        sector: usize,
        stops: &[(f32, StopDelay)],
    ) -> InfElevator {
        let mut elevator = InfElevator::new(elevator_type, geometry.sectors[sector]);
        elevator.speed = Fixed16::ZERO;
        elevator.stops = stops
            .iter()
            .map(|&(value, delay)| Stop::new(Fixed16::from_f32(value), delay))
            .collect();
        elevator
    }

    fn add(
        inf: &mut InfSystem,
        geometry: &mut TestGeometry,
        mut elevator: InfElevator,
        sector: usize,
    ) -> LinkId {
        elevator.init(&mut geometry.inf_world());
        inf.add_link(InfLink {
            item: InfLinkItem::Elevator(Box::new(elevator)),
            target: LinkTarget::Sector(sector),
            event_mask: InfEventMask::all(),
            entity_mask: InfEntityMask::all(),
        })
    }

    fn trigger(sector: usize) -> InfMessage {
        InfMessage::new(MessageTarget::Sector(sector), InfMessageType::Trigger)
    }

    fn sector<'a>(geometry: &'a TestGeometry, index: usize) -> hecs::Ref<'a, CSector> {
        geometry.world.get::<&CSector>(geometry.sectors[index]).unwrap()
    }

    #[test]
    fn moves_at_speed() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(
            &geometry,
            InfElevatorType::MoveFloor,
            1,
            &[(2.0, StopDelay::Hold), (12.0, StopDelay::Hold)],
        );
        elev.speed = Fixed16::from_int(2);
        add(&mut inf, &mut geometry, elev, 1);

        inf.send(trigger(1));
        inf.update(&mut geometry.inf_world(), 0);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(2));

        // Two seconds at two units per second.
        inf.update(&mut geometry.inf_world(), 291);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(6));
        inf.update(&mut geometry.inf_world(), 582);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(10));
        inf.update(&mut geometry.inf_world(), 873);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(12));

        assert!(geometry.changes.changed().contains(&geometry.sectors[1]));
    }

    #[test]
    fn next_stops_at_hold_and_sends_once() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(
            &geometry,
            InfElevatorType::MoveFloor,
            1,
            &[
                (2.0, StopDelay::Hold),
                (6.0, StopDelay::Hold),
                (10.0, StopDelay::Hold),
            ],
        );
        elev.stops[1].messages.push(InfMessage::new(
            MessageTarget::Sector(0),
            InfMessageType::Wakeup,
        ));
        let id = add(&mut inf, &mut geometry, elev, 1);

        inf.send(trigger(1));
        for now in 1..10 {
            inf.update(&mut geometry.inf_world(), now);
        }

        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(6));
        assert_eq!(inf.take_events(), vec![InfEvent::Wakeup { sector: Some(0) }]);

        let elev = inf.link(id).and_then(|link| link.elevator()).unwrap();
        assert!(!elev.is_moving());
        assert_eq!(elev.next_stop, 1);
    }

    #[test]
    fn timed_stops_wait_then_continue() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let elev = elevator(
            &geometry,
            InfElevatorType::MoveCeiling,
            0,
            &[(16.0, StopDelay::Hold), (24.0, StopDelay::Ticks(100))],
        );
        add(&mut inf, &mut geometry, elev, 0);

        inf.send(trigger(0));
        inf.update(&mut geometry.inf_world(), 1);
        assert_eq!(sector(&geometry, 0).ceiling_height, Fixed16::from_int(24));

        inf.update(&mut geometry.inf_world(), 50);
        assert_eq!(sector(&geometry, 0).ceiling_height, Fixed16::from_int(24));

        inf.update(&mut geometry.inf_world(), 101);
        assert_eq!(sector(&geometry, 0).ceiling_height, Fixed16::from_int(16));
    }

    fn goto(sector: usize, stop: u32) -> InfMessage {
        InfMessage::new(MessageTarget::Sector(sector), InfMessageType::GotoStop)
            .with_args(stop, 0)
    }

    fn linked(inf: &InfSystem, id: LinkId) -> &InfElevator {
        inf.link(id).and_then(|link| link.elevator()).unwrap()
    }

    const FOUR_STOPS: [(f32, StopDelay); 4] = [
        (0.0, StopDelay::Hold),
        (4.0, StopDelay::Hold),
        (8.0, StopDelay::Hold),
        (12.0, StopDelay::Hold),
    ];

    #[test]
    fn prev_while_waiting_goes_back_one() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut stops = FOUR_STOPS;
        stops[2].1 = StopDelay::Ticks(100);
        let mut elev = elevator(&geometry, InfElevatorType::MoveFloor, 1, &stops);
        elev.trig_move = ElevTrigMove::Prev;
        elev.stops[2].messages.push(InfMessage::new(
            MessageTarget::Sector(0),
            InfMessageType::Wakeup,
        ));
        let id = add(&mut inf, &mut geometry, elev, 1);

        inf.deliver_now(&mut geometry.inf_world(), goto(1, 2));
        inf.update(&mut geometry.inf_world(), 1);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(8));
        assert_eq!(inf.take_events(), vec![InfEvent::Wakeup { sector: Some(0) }]);
        assert!(linked(&inf, id).is_waiting(1));

        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert_eq!(linked(&inf, id).next_stop, 1);

        inf.update(&mut geometry.inf_world(), 50);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(8));

        // Stop 2 is not arrived at again, so its messages stay quiet.
        inf.update(&mut geometry.inf_world(), 200);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(4));
        assert!(inf.take_events().is_empty());
        assert!(!linked(&inf, id).is_moving());
    }

    #[test]
    fn prev_while_travelling_goes_back_two() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(&geometry, InfElevatorType::MoveFloor, 1, &FOUR_STOPS);
        elev.trig_move = ElevTrigMove::Prev;
        elev.speed = Fixed16::from_int(4);
        let id = add(&mut inf, &mut geometry, elev, 1);

        inf.deliver_now(&mut geometry.inf_world(), goto(1, 3));
        inf.update(&mut geometry.inf_world(), 1);
        assert!(linked(&inf, id).is_moving());
        assert!(!linked(&inf, id).is_waiting(1));

        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert_eq!(linked(&inf, id).next_stop, 1);

        inf.update(&mut geometry.inf_world(), 300);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(4));
        assert!(!linked(&inf, id).is_moving());

        // Two back from stop 1 clamps at the first stop.
        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert_eq!(linked(&inf, id).next_stop, 0);
        inf.update(&mut geometry.inf_world(), 600);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::ZERO);
    }

    #[test]
    fn reverse_walks_stops_backwards() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(
            &geometry,
            InfElevatorType::MoveFloor,
            1,
            &[
                (0.0, StopDelay::Hold),
                (4.0, StopDelay::Ticks(100)),
                (8.0, StopDelay::Ticks(100)),
            ],
        );
        elev.update_flags.insert(ElevUpdateFlags::MOVING_REVERSE);
        let id = add(&mut inf, &mut geometry, elev, 1);

        // Next from the first stop wraps to the last one.
        inf.send(trigger(1));
        inf.update(&mut geometry.inf_world(), 1);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(8));
        assert_eq!(linked(&inf, id).next_stop, 1);

        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert_eq!(linked(&inf, id).next_stop, 1);

        inf.update(&mut geometry.inf_world(), 101);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(4));
        assert_eq!(linked(&inf, id).next_stop, 0);

        inf.update(&mut geometry.inf_world(), 201);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::ZERO);
        assert!(!linked(&inf, id).is_moving());

        let values = linked(&inf, id)
            .stops
            .iter()
            .map(|stop| stop.value)
            .collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![Fixed16::ZERO, Fixed16::from_int(4), Fixed16::from_int(8)]
        );
    }

    #[test]
    fn hold_ignores_triggers() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(&geometry, InfElevatorType::MoveFloor, 1, &FOUR_STOPS);
        elev.trig_move = ElevTrigMove::Hold;
        elev.speed = Fixed16::from_int(4);
        let id = add(&mut inf, &mut geometry, elev, 1);

        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert!(!linked(&inf, id).is_moving());
        assert_eq!(linked(&inf, id).next_stop, 0);
        inf.update(&mut geometry.inf_world(), 300);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::ZERO);

        inf.deliver_now(&mut geometry.inf_world(), goto(1, 2));
        inf.update(&mut geometry.inf_world(), 301);
        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert!(linked(&inf, id).is_moving());
        assert_eq!(linked(&inf, id).next_stop, 2);
    }

    #[test]
    fn cont_only_starts_idle_elevators() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(&geometry, InfElevatorType::MoveFloor, 1, &FOUR_STOPS);
        elev.trig_move = ElevTrigMove::Cont;
        elev.speed = Fixed16::from_int(4);
        let id = add(&mut inf, &mut geometry, elev, 1);

        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert!(linked(&inf, id).is_moving());
        assert_eq!(linked(&inf, id).next_stop, 1);

        inf.update(&mut geometry.inf_world(), 1);
        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert_eq!(linked(&inf, id).next_stop, 1);

        inf.update(&mut geometry.inf_world(), 300);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(4));
        assert!(!linked(&inf, id).is_moving());
    }

    #[test]
    fn last_retargets_the_final_stop() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(&geometry, InfElevatorType::MoveFloor, 1, &FOUR_STOPS);
        elev.trig_move = ElevTrigMove::Last;
        elev.speed = Fixed16::from_int(4);
        let id = add(&mut inf, &mut geometry, elev, 1);

        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert!(linked(&inf, id).is_moving());
        assert_eq!(linked(&inf, id).next_stop, 3);
        inf.update(&mut geometry.inf_world(), 1);
        inf.update(&mut geometry.inf_world(), 600);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(12));

        // Heading down to the first stop, then sent back up.
        inf.deliver_now(&mut geometry.inf_world(), goto(1, 0));
        inf.update(&mut geometry.inf_world(), 601);
        assert!(linked(&inf, id).is_moving());
        inf.deliver_now(&mut geometry.inf_world(), trigger(1));
        assert_eq!(linked(&inf, id).next_stop, 3);
        inf.update(&mut geometry.inf_world(), 1200);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(12));
    }

    #[test]
    fn next_ignored_while_waiting() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let elev = elevator(
            &geometry,
            InfElevatorType::MoveFloor,
            1,
            &[
                (2.0, StopDelay::Hold),
                (4.0, StopDelay::Ticks(100)),
                (6.0, StopDelay::Hold),
            ],
        );
        let id = add(&mut inf, &mut geometry, elev, 1);

        inf.send(trigger(1));
        inf.update(&mut geometry.inf_world(), 1);
        inf.deliver_now(&mut geometry.inf_world(), trigger(1));

        let elev = inf.link(id).and_then(|link| link.elevator()).unwrap();
        assert!(elev.is_waiting(1));
        assert_eq!(elev.next_stop, 2);
    }

    #[test]
    fn master_off_freezes() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let elev = elevator(
            &geometry,
            InfElevatorType::MoveFloor,
            1,
            &[(2.0, StopDelay::Hold), (6.0, StopDelay::Hold)],
        );
        add(&mut inf, &mut geometry, elev, 1);

        inf.send(InfMessage::new(MessageTarget::Sector(1), InfMessageType::MasterOff));
        inf.send(trigger(1));
        inf.update(&mut geometry.inf_world(), 1);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(2));

        inf.send(InfMessage::new(MessageTarget::Sector(1), InfMessageType::MasterOn));
        inf.update(&mut geometry.inf_world(), 2);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(6));
    }

    #[test]
    fn terminate_frees_and_complete_ends_level() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let elev = elevator(
            &geometry,
            InfElevatorType::MoveFloor,
            1,
            &[(2.0, StopDelay::Hold), (6.0, StopDelay::Terminate)],
        );
        let terminated = add(&mut inf, &mut geometry, elev, 1);

        let elev = elevator(
            &geometry,
            InfElevatorType::MoveCeiling,
            0,
            &[(16.0, StopDelay::Hold), (20.0, StopDelay::Complete)],
        );
        add(&mut inf, &mut geometry, elev, 0);

        inf.send(trigger(1));
        inf.send(trigger(0));
        inf.update(&mut geometry.inf_world(), 1);

        assert!(inf.link(terminated).is_none());
        assert!(inf.links_for(LinkTarget::Sector(1)).is_empty());
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(6));
        assert_eq!(inf.take_events(), vec![InfEvent::LevelComplete]);
    }

    #[test]
    fn locked_elevators_need_the_key() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(
            &geometry,
            InfElevatorType::MoveFloor,
            1,
            &[(2.0, StopDelay::Hold), (6.0, StopDelay::Hold)],
        );
        elev.key = Some(KeyItem::Red);
        add(&mut inf, &mut geometry, elev, 1);

        let nudge = trigger(1).with_event(InfEventMask::NUDGE_FRONT, InfEntityMask::PLAYER);
        inf.send(nudge.clone());
        inf.update(&mut geometry.inf_world(), 1);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(2));
        assert_eq!(inf.take_events(), vec![InfEvent::KeyRequired(KeyItem::Red)]);

        inf.give_key(KeyItem::Red);
        inf.send(nudge);
        inf.update(&mut geometry.inf_world(), 2);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(6));
    }

    #[test]
    fn light_and_scroll_write_geometry() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let elev = elevator(
            &geometry,
            InfElevatorType::ChangeLight,
            0,
            &[(4.0, StopDelay::Hold), (30.0, StopDelay::Hold)],
        );
        add(&mut inf, &mut geometry, elev, 0);
        assert_eq!(sector(&geometry, 0).ambient, 4);

        let elev = elevator(
            &geometry,
            InfElevatorType::ScrollWall,
            1,
            &[(0.0, StopDelay::Hold), (8.0, StopDelay::Hold)],
        );
        add(&mut inf, &mut geometry, elev, 1);

        inf.send(trigger(0));
        inf.send(trigger(1));
        inf.update(&mut geometry.inf_world(), 1);

        assert_eq!(sector(&geometry, 0).ambient, 30);
        for &wall in &sector(&geometry, 1).walls {
            let c_wall = geometry.world.get::<&CWall>(wall).unwrap();
            assert_eq!(c_wall.texture_offset, Vec2Fixed::from_f32(0.0, 8.0));
        }
    }

    #[test]
    fn move_wall_only_moves_morphing_walls() {
        let mut level = two_rooms();
        level.sectors[1].walls[0].flags = WallFlags::WALL_MORPHS;
        let mut geometry = TestGeometry::new(&level);
        let mut inf = InfSystem::new();

        let elev = elevator(
            &geometry,
            InfElevatorType::MoveWall,
            1,
            &[(0.0, StopDelay::Hold), (4.0, StopDelay::Hold)],
        );
        add(&mut inf, &mut geometry, elev, 1);

        inf.send(trigger(1));
        inf.update(&mut geometry.inf_world(), 1);

        let c_sector = sector(&geometry, 1);
        assert!(c_sector.vertices.changed());
        assert_eq!(c_sector.vertices[0], Vec2Fixed::from_f32(-16.0, 52.0));
        assert_eq!(c_sector.vertices[1], Vec2Fixed::from_f32(16.0, 52.0));
        assert_eq!(c_sector.vertices[2], Vec2Fixed::from_f32(16.0, 16.0));
    }

    #[test]
    fn fixed_step_snaps_while_moving() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let mut elev = elevator(
            &geometry,
            InfElevatorType::MoveFloor,
            1,
            &[(0.0, StopDelay::Hold), (8.0, StopDelay::Hold)],
        );
        elev.speed = Fixed16::from_int(4);
        elev.fixed_step = Fixed16::from_int(2);
        add(&mut inf, &mut geometry, elev, 1);

        inf.send(trigger(1));
        inf.update(&mut geometry.inf_world(), 1);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::ZERO);
        inf.update(&mut geometry.inf_world(), 60);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::ZERO);
        inf.update(&mut geometry.inf_world(), 100);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(2));

        // The stop itself is reached exactly.
        inf.update(&mut geometry.inf_world(), 400);
        assert_eq!(sector(&geometry, 1).floor_height, Fixed16::from_int(8));
    }

    #[test]
    fn rotate_wall_turns_around_center() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let elev = elevator(
            &geometry,
            InfElevatorType::RotateWall,
            0,
            &[(0.0, StopDelay::Hold), (90.0, StopDelay::Hold)],
        );
        add(&mut inf, &mut geometry, elev, 0);

        inf.send(trigger(0));
        inf.update(&mut geometry.inf_world(), 1);

        // A quarter turn moves each corner of the square to the next one.
        let c_sector = sector(&geometry, 0);
        assert!(c_sector.vertices.changed());
        assert_eq!(c_sector.vertices[0], Vec2Fixed::from_f32(16.0, 16.0));
        assert_eq!(c_sector.vertices[1], Vec2Fixed::from_f32(16.0, -16.0));
        assert_eq!(c_sector.vertices[3], Vec2Fixed::from_f32(-16.0, 16.0));
    }

    #[test]
    fn move_fc_keeps_room_height() {
        let mut geometry = TestGeometry::new(&two_rooms());
        let mut inf = InfSystem::new();

        let elev = elevator(
            &geometry,
            InfElevatorType::MoveFc,
            1,
            &[(2.0, StopDelay::Hold), (6.0, StopDelay::Hold)],
        );
        add(&mut inf, &mut geometry, elev, 1);

        inf.send(trigger(1));
        inf.update(&mut geometry.inf_world(), 1);

        let c_sector = sector(&geometry, 1);
        assert_eq!(c_sector.floor_height, Fixed16::from_int(6));
        assert_eq!(c_sector.ceiling_height, Fixed16::from_int(16));
    }

    #[test]
    fn adjoin_command_relinks_walls() {
        let geometry = TestGeometry::new(&two_rooms());
        let wall0 = sector(&geometry, 0).walls[1];
        let wall1 = sector(&geometry, 1).walls[3];

        AdjoinCmd {
            sector0: geometry.sectors[0],
            wall0,
            sector1: geometry.sectors[1],
            wall1,
        }
        .apply(&geometry.world);

        let c_wall = geometry.world.get::<&CWall>(wall0).unwrap();
        assert_eq!(
            c_wall.adjoin,
            Some(CAdjoin {
                sector: geometry.sectors[1],
                mirror: Some(wall1),
            })
        );
    }
}
