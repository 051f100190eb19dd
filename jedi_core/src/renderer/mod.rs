//! The classic software renderer: fixed-point walls, flats and portals
//! drawn into an 8-bit indexed framebuffer.

mod flat;
mod frame;
mod lighting;
mod sector;
mod wall;

use anyhow::Result;

use jedi_level_format::Palette;

pub use flat::*;
pub use frame::*;
pub use lighting::*;
pub use sector::RenderScene;
pub use wall::*;

use crate::{
    cvars::{cvar_bool, cvar_f32, cvar_u32, CVarsMap},
    helpers::CameraView,
};

use sector::SectorTraversal;

/// Segment and flat capacity of one sector.
pub const MAX_SEG: usize = 384;
/// Portals followed out of one sector.
pub const MAX_ADJOIN_SEG: usize = 10;
pub const MAX_ADJOIN_DEPTH: usize = 40;

pub const TEXELS_PER_UNIT: i32 = 8;

pub const MAX_LIGHT_LEVEL: i32 = 32;
pub const FULLBRIGHT_ROW: u8 = 31;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub width: usize,
    pub height: usize,
    /// 0 picks half the width.
    pub focal_length: f32,
    pub aspect: f32,
    pub fullbright: bool,
    pub light_falloff: f32,
    pub camera_light: bool,
    pub max_adjoin_depth: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 320,
            height: 200,
            focal_length: 0.0,
            aspect: 1.0,
            fullbright: false,
            light_falloff: 16.0,
            camera_light: false,
            max_adjoin_depth: MAX_ADJOIN_DEPTH,
        }
    }
}

impl RenderSettings {
    pub fn from_cvars(cvars: &CVarsMap) -> Result<Self> {
        Ok(Self {
            width: cvar_u32(cvars, "r_width")? as usize,
            height: cvar_u32(cvars, "r_height")? as usize,
            focal_length: cvar_f32(cvars, "r_focallength")?,
            aspect: cvar_f32(cvars, "r_aspect")?,
            fullbright: cvar_bool(cvars, "r_fullbright")?,
            light_falloff: cvar_f32(cvars, "r_lightfalloff")?,
            camera_light: cvar_bool(cvars, "r_camlight")?,
            max_adjoin_depth: cvar_u32(cvars, "r_maxadjoindepth")? as usize,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_frame: u32,
    pub sectors_drawn: usize,
    pub segments: usize,
    /// Segments dropped because a sector ran out of room.
    pub clamped_segments: usize,
    pub flats: usize,
    pub clamped_flats: usize,
    pub max_wall_count: usize,
}

/// A finished frame, ready to be shown.
pub struct Frame<'a> {
    pub display: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub palette: &'a Palette,
}

/// Whatever puts frames on a screen.
pub trait FramePresenter {
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

pub struct RendererClassic {
    ctx: RenderFrameContext,
    settings: RenderSettings,
    /// Light level of the open sky, added to the headlamp falloff.
    pub world_ambient: i32,
}

impl RendererClassic {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            ctx: RenderFrameContext::new(&settings),
            settings,
            world_ambient: 0,
        }
    }

    pub fn from_cvars(cvars: &CVarsMap) -> Result<Self> {
        Ok(Self::new(RenderSettings::from_cvars(cvars)?))
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn context(&self) -> &RenderFrameContext {
        &self.ctx
    }

    /// Resets the frame, then draws everything visible from `camera`.
    pub fn render_frame(&mut self, scene: &RenderScene, camera: &CameraView) -> FrameStats {
        self.ctx.begin_frame();

        let mut traversal = SectorTraversal {
            scene,
            camera,
            settings: &self.settings,
            world_ambient: self.world_ambient,
            stats: FrameStats::default(),
        };

        let (x0, x1) = (self.ctx.window_min_x, self.ctx.window_max_x);
        traversal.draw_sector(&mut self.ctx, camera.sector, x0, x1, 0);

        debug_assert!(self.ctx.columns_valid(), "inverted column range");

        FrameStats {
            draw_frame: self.ctx.draw_frame,
            max_wall_count: self.ctx.max_wall_count,
            ..traversal.stats
        }
    }

    pub fn frame<'a>(&'a self, palette: &'a Palette) -> Frame<'a> {
        Frame {
            display: &self.ctx.display,
            width: self.ctx.width,
            height: self.ctx.height,
            palette,
        }
    }

    pub fn present(&self, presenter: &mut impl FramePresenter, palette: &Palette) -> Result<()> {
        presenter.present(&self.frame(palette))
    }
}

#[cfg(test)]
mod tests {
    use jedi_level_format::ColorMap;

    use super::*;
    use crate::{
        cvars::default_cvars,
        helpers::{Angle14, Fixed16, Vec2Fixed},
        test_level::{
            one_room, polygon, two_rooms, TestGeometry, CEIL_COLOR, FLOOR_COLOR, STEP_COLOR,
            WALL_COLOR,
        },
    };

    fn camera(geometry: &TestGeometry) -> CameraView {
        CameraView {
            pos: Vec2Fixed::ZERO,
            eye_height: Fixed16::from_f32(5.8),
            yaw: Angle14(0),
            light_source: false,
            sector: geometry.sectors[0],
        }
    }

    #[test]
    fn draws_through_portal() {
        let level = two_rooms();
        let geometry = TestGeometry::new(&level);
        let colormap = ColorMap::identity();
        let scene = RenderScene {
            world: &geometry.world,
            textures: &level.textures,
            animations: &geometry.animations,
            colormap: &colormap,
        };

        let mut renderer = RendererClassic::from_cvars(&default_cvars()).unwrap();
        let stats = renderer.render_frame(&scene, &camera(&geometry));

        assert_eq!(stats.sectors_drawn, 2);
        assert_eq!(stats.clamped_segments, 0);
        assert!(renderer.context().columns_valid());

        let ctx = renderer.context();
        let at = |x: usize, y: usize| ctx.display[y * ctx.width + x];

        // Step above the portal, the far room, then the step below it.
        assert_eq!(at(160, 0), STEP_COLOR);
        assert_eq!(at(160, 60), CEIL_COLOR);
        assert_eq!(at(160, 100), WALL_COLOR);
        assert_eq!(at(160, 120), FLOOR_COLOR);
        assert_eq!(at(160, 150), STEP_COLOR);
        assert_eq!(at(160, 199), FLOOR_COLOR);
    }

    #[test]
    fn frames_are_deterministic() {
        let level = two_rooms();
        let geometry = TestGeometry::new(&level);
        let colormap = ColorMap::identity();
        let scene = RenderScene {
            world: &geometry.world,
            textures: &level.textures,
            animations: &geometry.animations,
            colormap: &colormap,
        };

        let mut camera = camera(&geometry);
        camera.yaw = Angle14::from_degrees(35.0);
        camera.pos = Vec2Fixed::from_f32(-3.0, 2.5);

        let mut renderer = RendererClassic::new(RenderSettings::default());
        let first = renderer.render_frame(&scene, &camera);
        let display = renderer.context().display.clone();
        let second = renderer.render_frame(&scene, &camera);

        assert_eq!(second.draw_frame, first.draw_frame + 1);
        assert_eq!(FrameStats { draw_frame: 0, ..first }, FrameStats { draw_frame: 0, ..second });
        assert_eq!(display, renderer.context().display);
        assert!(renderer.context().columns_valid());
    }

    #[test]
    fn adjoin_depth_limits_traversal() {
        let level = two_rooms();
        let geometry = TestGeometry::new(&level);
        let colormap = ColorMap::identity();
        let scene = RenderScene {
            world: &geometry.world,
            textures: &level.textures,
            animations: &geometry.animations,
            colormap: &colormap,
        };

        let mut renderer = RendererClassic::new(RenderSettings {
            max_adjoin_depth: 1,
            ..Default::default()
        });
        let stats = renderer.render_frame(&scene, &camera(&geometry));
        assert_eq!(stats.sectors_drawn, 1);
    }

    #[test]
    fn clamps_segments_to_capacity() {
        // About 500 walls face the camera, each several columns wide.
        let level = one_room(polygon("ring", 2000, 32.0, 0.0, 16.0));
        let geometry = TestGeometry::new(&level);
        let colormap = ColorMap::identity();
        let scene = RenderScene {
            world: &geometry.world,
            textures: &level.textures,
            animations: &geometry.animations,
            colormap: &colormap,
        };

        let mut renderer = RendererClassic::new(RenderSettings {
            width: 4000,
            ..Default::default()
        });
        let stats = renderer.render_frame(&scene, &camera(&geometry));

        assert_eq!(stats.sectors_drawn, 1);
        assert_eq!(stats.segments, MAX_SEG);
        assert!(stats.clamped_segments > 0);
        assert!(stats.max_wall_count > MAX_SEG);

        let ctx = renderer.context();
        assert_eq!(ctx.seg_list_src.len(), MAX_SEG);
        assert!(ctx.seg_list_dst.len() <= MAX_SEG);
        assert!(ctx.columns_valid());
    }

    #[test]
    fn clamps_flats_to_capacity() {
        let level = two_rooms();
        let geometry = TestGeometry::new(&level);
        let colormap = ColorMap::identity();
        let scene = RenderScene {
            world: &geometry.world,
            textures: &level.textures,
            animations: &geometry.animations,
            colormap: &colormap,
        };

        let mut renderer = RendererClassic::new(RenderSettings::default());
        renderer.ctx.seg_capacity = 2;
        let stats = renderer.render_frame(&scene, &camera(&geometry));

        // Floor of "a", then the ceiling of "b"; the floor of "b" has no room.
        assert_eq!(stats.sectors_drawn, 2);
        assert_eq!(stats.flats, 2);
        assert!(stats.clamped_flats >= 1);
        assert!(renderer.context().seg_list_dst.len() <= 2);
        assert!(renderer.context().columns_valid());
    }

    struct Capture(Vec<u8>, usize);

    impl FramePresenter for Capture {
        fn present(&mut self, frame: &Frame) -> Result<()> {
            self.0 = frame.display.to_vec();
            self.1 = frame.width;
            Ok(())
        }
    }

    #[test]
    fn presents_display() {
        let level = two_rooms();
        let geometry = TestGeometry::new(&level);
        let colormap = ColorMap::identity();
        let scene = RenderScene {
            world: &geometry.world,
            textures: &level.textures,
            animations: &geometry.animations,
            colormap: &colormap,
        };

        let mut renderer = RendererClassic::new(RenderSettings::default());
        renderer.render_frame(&scene, &camera(&geometry));

        let palette = [(0, 0, 0); 256];
        let mut capture = Capture(vec![], 0);
        renderer.present(&mut capture, &palette).unwrap();
        assert_eq!(capture.1, 320);
        assert_eq!(capture.0, renderer.context().display);
    }
}
