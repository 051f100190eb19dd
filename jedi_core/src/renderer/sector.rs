use jedi_level_format::{ColorMap, TextureData};

use crate::{
    components::{CSector, CWall, TextureId},
    helpers::{CameraView, Fixed16},
    AnimatedTextures,
};

use super::{
    flat::{draw_flat, FlatSurface},
    frame::RenderFrameContext,
    lighting::LightingResolver,
    wall::{build_segment, draw_wall_column, merge_segments, WallTexture},
    FrameStats, RenderSettings, MAX_ADJOIN_SEG,
};

/// Read-only inputs of one frame.
pub struct RenderScene<'a> {
    pub world: &'a hecs::World,
    /// Indexed by [TextureId].
    pub textures: &'a [TextureData],
    pub animations: &'a AnimatedTextures,
    pub colormap: &'a ColorMap,
}

impl RenderScene<'_> {
    fn texture(&self, id: Option<TextureId>) -> Option<&TextureData> {
        let id = self.animations.resolve(id?);
        self.textures.get(id.0)
    }
}

/// Portal seen in a sector: columns `x0..=x1` continue into `sector`.
struct PortalRun {
    sector: hecs::Entity,
    x0: i32,
    x1: i32,
}

/// Walks the sector graph front to back from the camera sector.
pub(super) struct SectorTraversal<'a> {
    pub scene: &'a RenderScene<'a>,
    pub camera: &'a CameraView,
    pub settings: &'a RenderSettings,
    pub world_ambient: i32,
    pub stats: FrameStats,
}

impl SectorTraversal<'_> {
    /// Draws `sector` inside the current window over columns `x0..=x1`, then
    /// recurses into the sectors visible through its portals.
    pub fn draw_sector(
        &mut self,
        ctx: &mut RenderFrameContext,
        sector: hecs::Entity,
        x0: i32,
        x1: i32,
        depth: usize,
    ) {
        let scene = self.scene;
        let camera = self.camera;
        let world = scene.world;
        let Ok(c_sector) = world.get::<&CSector>(sector) else {
            log::warn!("Portal leads to a missing sector");
            return;
        };

        self.stats.sectors_drawn += 1;
        ctx.seg_list_src.clear();

        let mut wall_count = 0;
        for &wall in &c_sector.walls {
            let Ok(c_wall) = world.get::<&CWall>(wall) else {
                continue;
            };
            let Some(vertices) = c_sector.wall_vertices(&c_wall) else {
                continue;
            };
            let Some(seg) = build_segment(ctx, camera, wall, sector, vertices, (x0, x1))
            else {
                continue;
            };

            wall_count += 1;
            if ctx.seg_list_src.len() >= ctx.seg_capacity {
                self.stats.clamped_segments += 1;
                continue;
            }
            ctx.seg_list_src.push(seg);
        }
        ctx.next_wall += ctx.seg_list_src.len();
        ctx.max_wall_count = ctx.max_wall_count.max(wall_count);
        self.stats.segments += ctx.seg_list_src.len();

        self.stats.clamped_segments += merge_segments(ctx, x0, x1);

        ctx.ceiling_edges.reset();
        ctx.floor_edges.reset();

        let eye = camera.eye_height;
        let lighting = LightingResolver::new(
            c_sector.ambient,
            camera.light_source || self.settings.camera_light,
            self.world_ambient,
            Fixed16::from_f32(self.settings.light_falloff),
            self.settings.fullbright,
            &scene.colormap.light_source_ramp,
        );

        let mut portals: Vec<PortalRun> = Vec::new();

        let segments = std::mem::take(&mut ctx.seg_list_dst);
        for (i, seg) in segments.iter().enumerate() {
            ctx.cur_wall_seg = i;

            let Ok(c_wall) = world.get::<&CWall>(seg.wall) else {
                continue;
            };

            let next = c_wall.adjoin.and_then(|adjoin| {
                let next = world.get::<&CSector>(adjoin.sector).ok()?;
                Some((adjoin.sector, next.floor_height, next.ceiling_height))
            });

            let part = |texture: Option<TextureId>, base: Fixed16| {
                scene.texture(texture).map(|texture| WallTexture {
                    texture,
                    base,
                    offset: c_wall.texture_offset,
                })
            };
            let mid = part(c_wall.mid_texture, c_sector.floor_height);
            let (top, bottom) = match next {
                Some((_, _, next_ceiling)) => (
                    part(c_wall.top_texture, next_ceiling),
                    part(c_wall.bottom_texture, c_sector.floor_height),
                ),
                None => (None, None),
            };

            let mut open_from: Option<i32> = None;

            for x in seg.wall_x0..=seg.wall_x1 {
                let c = x as usize;
                let z = seg.depth_at(ctx, x);
                let u = seg.u_at(ctx, x, z);
                let row = scene.colormap.row(lighting.resolve(z, c_wall.light));

                let top_y = ctx.window_top[c];
                let bot_y = ctx.window_bot[c];

                let y_ceil = ctx.project_row(c_sector.ceiling_height - eye, z);
                let y_floor = ctx.project_row(c_sector.floor_height - eye, z);

                ctx.ceiling_edges.add(x, top_y, (y_ceil - 1).min(bot_y));
                ctx.floor_edges.add(x, y_floor.max(top_y), bot_y);

                let wall_top = y_ceil.max(top_y);
                let wall_bot = (y_floor - 1).min(bot_y);

                let opening = match next {
                    None => {
                        if let Some(mid) = &mid {
                            draw_wall_column(ctx, x, (wall_top, wall_bot), z, u, eye, mid, row);
                        }
                        ctx.depth1d[c] = z;
                        None
                    }
                    Some((_, next_floor, next_ceiling)) => {
                        let y_next_ceil = ctx.project_row(next_ceiling - eye, z);
                        let y_next_floor = ctx.project_row(next_floor - eye, z);

                        if next_ceiling < c_sector.ceiling_height {
                            if let Some(top) = &top {
                                let y1 = (y_next_ceil - 1).min(wall_bot);
                                draw_wall_column(ctx, x, (wall_top, y1), z, u, eye, top, row);
                            }
                        }
                        if next_floor > c_sector.floor_height {
                            if let Some(bottom) = &bottom {
                                let y0 = y_next_floor.max(wall_top);
                                draw_wall_column(ctx, x, (y0, wall_bot), z, u, eye, bottom, row);
                            }
                        }

                        let open_top = wall_top.max(y_next_ceil);
                        let open_bot = wall_bot.min(y_next_floor - 1);
                        (open_top <= open_bot).then_some((open_top, open_bot))
                    }
                };

                match opening {
                    Some((open_top, open_bot)) => {
                        ctx.column_top[c] = open_top;
                        ctx.column_bot[c] = open_bot;
                        ctx.column_open[c] = true;
                        open_from.get_or_insert(x);
                    }
                    None => {
                        ctx.column_open[c] = false;
                        if let Some(start) = open_from.take() {
                            if let Some((next_sector, ..)) = next {
                                portals.push(PortalRun {
                                    sector: next_sector,
                                    x0: start,
                                    x1: x - 1,
                                });
                            }
                        }
                    }
                }
            }

            if let (Some(start), Some((next_sector, ..))) = (open_from, next) {
                portals.push(PortalRun {
                    sector: next_sector,
                    x0: start,
                    x1: seg.wall_x1,
                });
            }
        }
        ctx.seg_list_dst = segments;

        self.draw_flats(ctx, &c_sector, &lighting);

        drop(c_sector);

        if depth + 1 >= self.settings.max_adjoin_depth {
            return;
        }
        for portal in portals.into_iter().take(MAX_ADJOIN_SEG) {
            ctx.push_window(portal.x0, portal.x1);
            self.draw_sector(ctx, portal.sector, portal.x0, portal.x1, depth + 1);
        }
    }

    fn draw_flats(
        &mut self,
        ctx: &mut RenderFrameContext,
        c_sector: &CSector,
        lighting: &LightingResolver,
    ) {
        let scene = self.scene;
        let ceiling_edges = std::mem::take(&mut ctx.ceiling_edges);
        let floor_edges = std::mem::take(&mut ctx.floor_edges);

        for (edges, height, texture, offset) in [
            (
                &ceiling_edges,
                c_sector.ceiling_height,
                c_sector.ceiling_texture,
                c_sector.ceiling_offset,
            ),
            (
                &floor_edges,
                c_sector.floor_height,
                c_sector.floor_texture,
                c_sector.floor_offset,
            ),
        ] {
            if edges.is_empty() {
                continue;
            }
            if ctx.flat_count >= ctx.seg_capacity {
                self.stats.clamped_flats += 1;
                continue;
            }
            let Some(texture) = scene.texture(texture) else {
                continue;
            };

            ctx.flat_count += 1;
            self.stats.flats += 1;
            let flat = FlatSurface {
                height,
                texture,
                offset,
            };
            draw_flat(ctx, edges, &flat, self.camera, lighting, scene.colormap);
        }

        ctx.ceiling_edges = ceiling_edges;
        ctx.floor_edges = floor_edges;
    }
}
