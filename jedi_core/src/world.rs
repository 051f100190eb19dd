use std::time::Duration;

use jedi_game_config::GameConfig;
use jedi_level_format::{ColorMap, InfEntityMask, InfEventMask, KeyItem, Level, TextureData};

use anyhow::Result;
use indexmap::IndexMap;
use ultraviolet::Vec2;

use crate::{
    components::{CPlayer, CSector, CWorldPos, TextureId},
    cvars::{cvar_u32, default_cvars, CVarsMap},
    entities::{init_player_entities, init_sector_entities, texture_ids},
    helpers::{CameraView, ChangedSet},
    inf::{build_inf_system, InfClock, InfEvent, InfSystem, InfWorld},
    renderer::{FrameStats, RenderScene, RendererClassic},
    AnimatedTextures, SectorAccel, Stopwatch,
};

/// Eye height above the feet.
pub const EYE_HEIGHT: f32 = 5.8;

pub struct World {
    pub game_config: GameConfig,
    pub level: Level,
    pub colormap: ColorMap,

    /// Actual game state is maintained in the ECS "world".
    pub world: hecs::World,
    pub player: hecs::Entity,
    /// Sector entities, indexed like `level.sectors`.
    pub sectors: Vec<hecs::Entity>,

    pub sector_accel: SectorAccel,
    pub animations: AnimatedTextures,
    pub texture_ids: IndexMap<String, TextureId>,

    pub inf: InfSystem,
    clock: InfClock,
    changes: ChangedSet<hecs::Entity>,

    pub cvars: CVarsMap,
}

impl World {
    pub fn new(level: Level, game_config: GameConfig, colormap: ColorMap) -> Result<Self> {
        level.validate()?;

        let mut world = hecs::World::new();

        // Time how long it takes to spawn the entities.
        let mut stopwatch = Stopwatch::new();

        let texture_ids = texture_ids(&level.textures);
        let mut animations = AnimatedTextures::from_level(&level.animated_textures, &texture_ids);

        // Add sectors and their walls to the world.
        let sectors = init_sector_entities(&mut world, &level, &texture_ids);

        // Elevators move their sectors to the first stop here, so this
        // has to run before the sector accel is built.
        let mut changes = ChangedSet::default();
        let mut inf = build_inf_system(
            &level,
            &game_config,
            &mut InfWorld {
                world: &mut world,
                sectors: &sectors,
                animations: &mut animations,
                changes: &mut changes,
            },
            &texture_ids,
        )?;
        clear_vertex_changes(&mut world, &mut changes);

        // Build acceleration structure for sectors.
        let sector_accel = SectorAccel::new(&world);

        // Requires we've already initialized sector accel.
        let player = init_player_entities(&mut world, &sector_accel, &level)?;

        log::info!("Added {} entities to the world.", world.len());
        log::info!("Setup time: {:?}", stopwatch.lap());

        let cvars = default_cvars();
        inf.max_messages = cvar_u32(&cvars, "inf_maxmessages")? as usize;

        Ok(Self {
            game_config,
            level,
            colormap,

            world,
            player,
            sectors,

            sector_accel,
            animations,
            texture_ids,

            inf,
            clock: InfClock::default(),
            changes,

            cvars,
        })
    }

    pub fn textures(&self) -> &[TextureData] {
        &self.level.textures
    }

    /// Advances the level by `delta` of wall-clock time. Returns what INF
    /// wants the game to know about.
    pub fn update(&mut self, delta: Duration) -> Result<Vec<InfEvent>> {
        let now = self.clock.advance(delta);
        self.animations.animate(now);

        self.inf.max_messages = cvar_u32(&self.cvars, "inf_maxmessages")? as usize;
        self.inf.update(
            &mut InfWorld {
                world: &mut self.world,
                sectors: &self.sectors,
                animations: &mut self.animations,
                changes: &mut self.changes,
            },
            now,
        );

        if clear_vertex_changes(&mut self.world, &mut self.changes) {
            self.sector_accel = SectorAccel::new(&self.world);
        }
        self.track_player_sector()?;

        Ok(self.inf.take_events())
    }

    fn track_player_sector(&mut self) -> Result<()> {
        let pos = self.world.get::<&CWorldPos>(self.player)?.pos;
        if let Some(sector) = self
            .sector_accel
            .query(&self.world, Vec2::new(pos.x, pos.z))
        {
            self.world.get::<&mut CPlayer>(self.player)?.sector = sector;
        }
        Ok(())
    }

    pub fn camera_view(&self) -> Result<CameraView> {
        let pos = self.world.get::<&CWorldPos>(self.player)?;
        let player = self.world.get::<&CPlayer>(self.player)?;

        // The player may stand in a sector that moved since the last update.
        let sector = self
            .sector_accel
            .query(&self.world, Vec2::new(pos.pos.x, pos.pos.z))
            .unwrap_or(player.sector);

        Ok(CameraView::from_movable(
            &*pos,
            EYE_HEIGHT,
            player.light_source,
            sector,
        ))
    }

    pub fn render(&self, renderer: &mut RendererClassic) -> Result<FrameStats> {
        let camera = self.camera_view()?;
        let scene = RenderScene {
            world: &self.world,
            textures: &self.level.textures,
            animations: &self.animations,
            colormap: &self.colormap,
        };
        Ok(renderer.render_frame(&scene, &camera))
    }

    pub fn with_player_pos<RT, F: FnOnce(&mut CWorldPos) -> RT>(
        &mut self,
        callback: F,
    ) -> Result<RT> {
        let player_pos = self.world.query_one_mut::<&mut CWorldPos>(self.player)?;
        Ok(callback(player_pos))
    }

    pub fn set_light_source(&mut self, on: bool) -> Result<()> {
        self.world.query_one_mut::<&mut CPlayer>(self.player)?.light_source = on;
        Ok(())
    }

    pub fn give_key(&mut self, key: KeyItem) {
        self.inf.give_key(key);
    }

    /// Queued until the next [World::update].
    pub fn send_sector_event(&mut self, sector: usize, event: InfEventMask, entity: InfEntityMask) {
        self.inf.send_sector_event(sector, event, entity);
    }

    /// Queued until the next [World::update].
    pub fn send_wall_event(
        &mut self,
        sector: usize,
        wall: usize,
        event: InfEventMask,
        entity: InfEntityMask,
    ) {
        self.inf.send_wall_event(sector, wall, event, entity);
    }
}

/// Clears the change flags INF left behind. Returns true if any sector
/// outline moved.
fn clear_vertex_changes(world: &mut hecs::World, changes: &mut ChangedSet<hecs::Entity>) -> bool {
    let mut moved = false;
    for entity in changes.changed().iter() {
        if let Ok(mut sector) = world.get::<&mut CSector>(*entity) {
            moved |= sector.vertices.changed();
            sector.vertices.clear_changed();
        }
    }
    changes.clear();
    moved
}

#[cfg(test)]
mod tests {
    use jedi_game_config::Game;
    use jedi_level_format::SectorFlags;

    use super::*;
    use crate::{helpers::Fixed16, renderer::RenderSettings, test_level::two_rooms};

    fn config() -> GameConfig {
        GameConfig::from_game(Game::DarkForces).unwrap()
    }

    #[test]
    fn camera_follows_player_between_sectors() {
        let mut world = World::new(two_rooms(), config(), ColorMap::identity()).unwrap();

        let camera = world.camera_view().unwrap();
        assert_eq!(camera.sector, world.sectors[0]);
        assert_eq!(camera.eye_height, Fixed16::from_f32(EYE_HEIGHT));

        world
            .with_player_pos(|pos| pos.pos = ultraviolet::Vec3::new(0.0, 2.0, 20.0))
            .unwrap();
        assert_eq!(world.camera_view().unwrap().sector, world.sectors[1]);

        world.update(Duration::from_millis(16)).unwrap();
        let player = world.world.get::<&CPlayer>(world.player).unwrap();
        assert_eq!(player.sector, world.sectors[1]);
    }

    #[test]
    fn renders_from_player() {
        let world = World::new(two_rooms(), config(), ColorMap::identity()).unwrap();
        let mut renderer = RendererClassic::new(RenderSettings::default());

        let stats = world.render(&mut renderer).unwrap();
        assert_eq!(stats.sectors_drawn, 2);
        assert_eq!(stats.draw_frame, 1);
    }

    #[test]
    fn door_sectors_start_closed() {
        let mut level = two_rooms();
        level.sectors[1].flags |= SectorFlags::DOOR;
        let mut world = World::new(level, config(), ColorMap::identity()).unwrap();

        let events = world.update(Duration::from_secs(1)).unwrap();
        assert!(events.is_empty());

        let sector = world.world.get::<&CSector>(world.sectors[1]).unwrap();
        assert_eq!(sector.ceiling_height, sector.floor_height);
    }
}
