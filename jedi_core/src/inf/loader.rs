use jedi_game_config::GameConfig;
use jedi_level_format::{
    ElevatorDef, InfElevatorType, InfEntityMask, InfItemDef, Level, LevelError, MessageDef, Sector,
    SectorFlags, StopDef, StopDelay, StopValue, TargetRef, TriggerDef,
};

use indexmap::IndexMap;

use crate::{
    components::TextureId,
    entities::lookup_texture,
    helpers::{Angle14, Fixed16, Stopwatch, Vec2Fixed},
};

use super::{
    AdjoinCmd, ElevUpdateFlags, InfElevator, InfError, InfLink, InfLinkItem, InfMessage,
    InfSystem, InfTrigger, InfWorld, LinkTarget, MessageTarget, Slave, Stop, TriggerTarget,
};

/// Name lookups for one level.
struct Resolver<'a> {
    level: &'a Level,
    names: IndexMap<String, usize>,
}

impl<'a> Resolver<'a> {
    fn new(level: &'a Level) -> Result<Self, LevelError> {
        Ok(Self {
            level,
            names: level.sector_index_by_name()?,
        })
    }

    fn sector(&self, name: &str) -> Result<usize, InfError> {
        self.names
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| InfError::UnknownSector(name.to_string()))
    }

    fn sector_def(&self, name: &str) -> Result<&'a Sector, InfError> {
        let index = self.sector(name)?;
        Ok(&self.level.sectors[index])
    }

    fn wall(&self, name: &str, wall: usize) -> Result<(usize, usize), InfError> {
        let sector = self.sector(name)?;
        if wall >= self.level.sectors[sector].walls.len() {
            return Err(InfError::MissingWall {
                sector: name.to_string(),
                wall,
            });
        }
        Ok((sector, wall))
    }

    fn link_target(&self, target: &TargetRef) -> Result<LinkTarget, InfError> {
        Ok(match target.wall {
            Some(wall) => {
                let (sector, wall) = self.wall(&target.sector, wall)?;
                LinkTarget::Wall { sector, wall }
            }
            None => LinkTarget::Sector(self.sector(&target.sector)?),
        })
    }

    fn message_target(&self, target: &TargetRef) -> Result<MessageTarget, InfError> {
        Ok(match self.link_target(target)? {
            LinkTarget::Sector(sector) => MessageTarget::Sector(sector),
            LinkTarget::Wall { sector, wall } => MessageTarget::Wall { sector, wall },
        })
    }

    fn message(&self, def: &MessageDef) -> Result<InfMessage, InfError> {
        Ok(InfMessage::new(self.message_target(&def.target)?, def.msg)
            .with_event(def.event, InfEntityMask::empty())
            .with_args(def.arg1, def.arg2))
    }
}

/// What a stop value is relative to.
fn base_value(sector: &Sector, elevator_type: InfElevatorType) -> f32 {
    match elevator_type {
        InfElevatorType::MoveFloor | InfElevatorType::MoveFc => sector.floor_height,
        InfElevatorType::MoveCeiling => sector.ceiling_height,
        InfElevatorType::MoveOffset => sector.second_height,
        InfElevatorType::ChangeLight => sector.ambient as f32,
        _ => 0.0,
    }
}

fn build_stop(
    def: &StopDef,
    sector: &Sector,
    elevator_type: InfElevatorType,
    resolver: &Resolver,
    geometry: &InfWorld,
    texture_ids: &IndexMap<String, TextureId>,
) -> Result<Stop, InfError> {
    let value = match &def.value {
        StopValue::Absolute(value) => *value,
        StopValue::Relative(offset) => base_value(sector, elevator_type) + offset,
        StopValue::Sector(name) => base_value(resolver.sector_def(name)?, elevator_type),
    };

    let mut stop = Stop::new(Fixed16::from_f32(value), def.delay);

    stop.messages = def
        .messages
        .iter()
        .map(|msg| resolver.message(msg))
        .collect::<Result<_, _>>()?;

    for adjoin in &def.adjoins {
        let (sector0, wall0) = resolver.wall(&adjoin.sector0, adjoin.wall0)?;
        let (sector1, wall1) = resolver.wall(&adjoin.sector1, adjoin.wall1)?;
        let missing = || InfError::UnknownSector(adjoin.sector0.clone());
        stop.adjoin_cmds.push(AdjoinCmd {
            sector0: geometry.sector_entity(sector0).ok_or_else(missing)?,
            wall0: geometry.wall_entity(sector0, wall0).ok_or_else(missing)?,
            sector1: geometry.sector_entity(sector1).ok_or_else(missing)?,
            wall1: geometry.wall_entity(sector1, wall1).ok_or_else(missing)?,
        });
    }

    stop.floor_texture = lookup_texture(texture_ids, def.floor_texture.as_deref());
    stop.ceiling_texture = lookup_texture(texture_ids, def.ceiling_texture.as_deref());

    Ok(stop)
}

fn build_elevator(
    def: &ElevatorDef,
    sector_index: usize,
    resolver: &Resolver,
    geometry: &mut InfWorld,
    texture_ids: &IndexMap<String, TextureId>,
) -> Result<InfLink, InfError> {
    if def.stops.is_empty() {
        return Err(InfError::NoStops(def.sector.clone()));
    }
    if def.start_stop >= def.stops.len() {
        return Err(InfError::InvalidStartStop {
            sector: def.sector.clone(),
            start_stop: def.start_stop,
            stops: def.stops.len(),
        });
    }

    let sector = geometry
        .sector_entity(sector_index)
        .ok_or_else(|| InfError::UnknownSector(def.sector.clone()))?;
    let sector_def = &resolver.level.sectors[sector_index];

    let mut elevator = InfElevator::new(def.elevator_type, sector);
    elevator.trig_move = def.trig_move;
    elevator.key = def.key;
    elevator.speed = Fixed16::from_f32(def.speed);
    elevator.fixed_step = Fixed16::from_f32(def.fixed_step);
    elevator.center = Vec2Fixed::from_f32(def.center.0, def.center.1);
    elevator.flags = def.flags;

    let (sin, cos) = Angle14::from_degrees(def.angle).sin_cos();
    elevator.dir = Vec2Fixed::new(sin, cos);

    elevator.stops = def
        .stops
        .iter()
        .map(|stop| {
            build_stop(
                stop,
                sector_def,
                def.elevator_type,
                resolver,
                geometry,
                texture_ids,
            )
        })
        .collect::<Result<_, _>>()?;

    elevator.slaves = def
        .slaves
        .iter()
        .map(|slave| {
            let index = resolver.sector(&slave.sector)?;
            Ok(Slave {
                sector: geometry
                    .sector_entity(index)
                    .ok_or_else(|| InfError::UnknownSector(slave.sector.clone()))?,
                value: Fixed16::from_f32(slave.value),
            })
        })
        .collect::<Result<_, InfError>>()?;

    elevator.next_stop = def.start_stop;
    elevator.update_flags = ElevUpdateFlags::empty();
    if def.master {
        elevator.update_flags |= ElevUpdateFlags::MASTER_ON;
    }
    if def.auto_start {
        elevator.update_flags |= ElevUpdateFlags::MOVING;
    }

    elevator.init(geometry);

    Ok(InfLink {
        item: InfLinkItem::Elevator(Box::new(elevator)),
        target: LinkTarget::Sector(sector_index),
        event_mask: def.event_mask,
        entity_mask: def.entity_mask,
    })
}

fn build_trigger(
    def: &TriggerDef,
    resolver: &Resolver,
    texture_ids: &IndexMap<String, TextureId>,
) -> Result<InfLink, InfError> {
    let target = resolver.link_target(&def.location)?;

    let mut trigger = InfTrigger::new(def.trigger_type);
    trigger.cmd = def.cmd;
    trigger.arg0 = def.arg0;
    trigger.arg1 = def.arg1;
    trigger.event = def.event;
    trigger.master = def.master;
    trigger.key = def.key;
    trigger.text_id = def.text_id;
    trigger.switch_texture = lookup_texture(texture_ids, def.switch_texture.as_deref());
    trigger.targets = def
        .clients
        .iter()
        .map(|client| {
            Ok(TriggerTarget {
                target: resolver.message_target(&client.target)?,
                event_mask: client.event_mask,
            })
        })
        .collect::<Result<_, InfError>>()?;

    Ok(InfLink {
        item: InfLinkItem::Trigger(Box::new(trigger)),
        target,
        event_mask: def.event_mask,
        entity_mask: def.entity_mask,
    })
}

/// Door flagged sectors without a scripted elevator open on a nudge, wait
/// and close again.
fn door_def(
    game_config: &GameConfig,
    name: &str,
    sector: &Sector,
) -> Result<ElevatorDef, InfError> {
    let class = game_config
        .door_class()
        .ok_or_else(|| InfError::MissingClass(game_config.door.class.clone()))?;

    let stop = |value, delay| StopDef {
        value,
        delay,
        messages: vec![],
        adjoins: vec![],
        floor_texture: None,
        ceiling_texture: None,
    };

    Ok(class.to_elevator_def(
        name,
        vec![
            stop(StopValue::Absolute(sector.floor_height), StopDelay::Hold),
            stop(
                StopValue::Relative(0.0),
                StopDelay::Ticks(game_config.door.open_delay),
            ),
        ],
    ))
}

/// Creates every INF link of `level`, in script order, followed by the
/// implicit doors. Broken items are logged and skipped.
pub fn build_inf_system(
    level: &Level,
    game_config: &GameConfig,
    geometry: &mut InfWorld,
    texture_ids: &IndexMap<String, TextureId>,
) -> Result<InfSystem, LevelError> {
    let mut stopwatch = Stopwatch::new();
    let resolver = Resolver::new(level)?;
    let mut inf = InfSystem::new();
    let mut skipped = 0;

    for item in &level.inf {
        let link = match item {
            InfItemDef::Elevator(def) => resolver.sector(&def.sector).and_then(|sector| {
                build_elevator(def, sector, &resolver, geometry, texture_ids)
            }),
            InfItemDef::Trigger(def) => build_trigger(def, &resolver, texture_ids),
        };

        match link {
            Ok(link) => {
                inf.add_link(link);
            }
            Err(err) => {
                log::warn!("Skipping INF item: {}", err);
                skipped += 1;
            }
        }
    }

    for (i, sector) in level.sectors.iter().enumerate() {
        if !sector.flags.contains(SectorFlags::DOOR)
            || !inf.links_for(LinkTarget::Sector(i)).is_empty()
        {
            continue;
        }

        let name = sector.name.clone().unwrap_or_else(|| format!("#{}", i));
        let link = door_def(game_config, &name, sector)
            .and_then(|def| build_elevator(&def, i, &resolver, geometry, texture_ids));

        match link {
            Ok(link) => {
                inf.add_link(link);
            }
            Err(err) => {
                log::warn!("Skipping door: {}", err);
                skipped += 1;
            }
        }
    }

    log::info!(
        "Built {} INF links ({} skipped) in {:?}",
        inf.links().count(),
        skipped,
        stopwatch.lap()
    );

    Ok(inf)
}

#[cfg(test)]
mod tests {
    use jedi_game_config::Game;
    use jedi_level_format::{InfEventMask, InfMessageType, TriggerClientDef, TriggerType};

    use super::*;
    use crate::{
        components::CSector,
        test_level::{two_rooms, TestGeometry},
    };

    fn config() -> GameConfig {
        GameConfig::from_game(Game::DarkForces).unwrap()
    }

    fn stop(value: StopValue, delay: StopDelay) -> StopDef {
        StopDef {
            value,
            delay,
            messages: vec![],
            adjoins: vec![],
            floor_texture: None,
            ceiling_texture: None,
        }
    }

    fn switch_def(location: TargetRef) -> TriggerDef {
        TriggerDef {
            location,
            trigger_type: TriggerType::Switch1,
            event_mask: InfEventMask::NUDGE_FRONT,
            entity_mask: InfEntityMask::PLAYER,
            clients: vec![TriggerClientDef {
                target: TargetRef::sector("b"),
                event_mask: InfEventMask::empty(),
            }],
            cmd: InfMessageType::Trigger,
            arg0: 0,
            arg1: 0,
            event: InfEventMask::empty(),
            master: true,
            key: None,
            text_id: None,
            switch_texture: Some("switch".to_string()),
        }
    }

    fn ceiling(geometry: &TestGeometry, sector: usize) -> Fixed16 {
        geometry
            .world
            .get::<&CSector>(geometry.sectors[sector])
            .unwrap()
            .ceiling_height
    }

    #[test]
    fn resolves_stop_values() {
        let config = config();
        let mut level = two_rooms();
        let mut def = config.elevator_class("basic").unwrap().to_elevator_def(
            "A",
            vec![
                stop(StopValue::Relative(1.0), StopDelay::Hold),
                stop(StopValue::Sector("b".to_string()), StopDelay::Hold),
                stop(StopValue::Absolute(8.0), StopDelay::Ticks(10)),
            ],
        );
        def.start_stop = 2;
        level.inf.push(InfItemDef::Elevator(def));

        let mut geometry = TestGeometry::new(&level);
        let texture_ids = geometry.texture_ids.clone();
        let inf =
            build_inf_system(&level, &config, &mut geometry.inf_world(), &texture_ids).unwrap();

        let (_, link) = inf.links().next().unwrap();
        assert_eq!(link.target, LinkTarget::Sector(0));
        let elevator = link.elevator().unwrap();
        let values = elevator.stops.iter().map(|s| s.value).collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![Fixed16::from_int(1), Fixed16::from_int(2), Fixed16::from_int(8)]
        );

        // Placed at the start stop right away.
        let floor = geometry
            .world
            .get::<&CSector>(geometry.sectors[0])
            .unwrap()
            .floor_height;
        assert_eq!(floor, Fixed16::from_int(8));
    }

    #[test]
    fn skips_broken_items() {
        let config = config();
        let mut level = two_rooms();
        let class = config.elevator_class("basic").unwrap();

        level.inf.push(InfItemDef::Elevator(class.to_elevator_def(
            "nowhere",
            vec![stop(StopValue::Relative(0.0), StopDelay::Hold)],
        )));
        level
            .inf
            .push(InfItemDef::Elevator(class.to_elevator_def("a", vec![])));
        let mut bad_start = class.to_elevator_def(
            "a",
            vec![stop(StopValue::Relative(0.0), StopDelay::Hold)],
        );
        bad_start.start_stop = 3;
        level.inf.push(InfItemDef::Elevator(bad_start));
        level
            .inf
            .push(InfItemDef::Trigger(switch_def(TargetRef::wall("a", 9))));
        level
            .inf
            .push(InfItemDef::Trigger(switch_def(TargetRef::wall("a", 1))));

        let mut geometry = TestGeometry::new(&level);
        let texture_ids = geometry.texture_ids.clone();
        let inf =
            build_inf_system(&level, &config, &mut geometry.inf_world(), &texture_ids).unwrap();

        let links = inf.links().collect::<Vec<_>>();
        assert_eq!(links.len(), 1);

        let (id, link) = links[0];
        assert_eq!(inf.links_for(LinkTarget::Wall { sector: 0, wall: 1 }), &[id]);
        let trigger = link.trigger().unwrap();
        assert_eq!(trigger.targets[0].target, MessageTarget::Sector(1));
        assert_eq!(trigger.switch_texture, texture_ids.get("SWITCH").copied());
    }

    #[test]
    fn door_sectors_open_and_close() {
        let config = config();
        let mut level = two_rooms();
        level.sectors[1].flags = SectorFlags::DOOR;

        let mut geometry = TestGeometry::new(&level);
        let texture_ids = geometry.texture_ids.clone();
        let mut inf =
            build_inf_system(&level, &config, &mut geometry.inf_world(), &texture_ids).unwrap();

        // Closed at load.
        assert_eq!(ceiling(&geometry, 1), Fixed16::from_int(2));

        inf.send_sector_event(1, InfEventMask::NUDGE_FRONT, InfEntityMask::PLAYER);
        inf.update(&mut geometry.inf_world(), 0);
        inf.update(&mut geometry.inf_world(), 100);
        assert_eq!(ceiling(&geometry, 1), Fixed16::from_int(12));

        inf.update(&mut geometry.inf_world(), 300);
        assert_eq!(ceiling(&geometry, 1), Fixed16::from_int(12));

        inf.update(&mut geometry.inf_world(), 536);
        assert_eq!(ceiling(&geometry, 1), Fixed16::from_int(2));
    }
}
