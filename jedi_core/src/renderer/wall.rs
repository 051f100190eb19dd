use jedi_level_format::TextureData;

use crate::helpers::{CameraView, Fixed16, Vec2Fixed};

use super::{frame::RenderFrameContext, TEXELS_PER_UNIT};

/// Which axis per-column depth and U are solved along. Walls running
/// across the view solve along X, walls running into it along Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallOrient {
    DzDx,
    DxDz,
}

/// One wall clipped to the near plane and projected to a column range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RWallSegment {
    pub wall: hecs::Entity,
    pub sector: hecs::Entity,

    /// Columns before clipping to the window.
    pub wall_x0_raw: i32,
    pub wall_x1_raw: i32,
    /// Inclusive column range to draw.
    pub wall_x0: i32,
    pub wall_x1: i32,

    /// View-space endpoints after near clipping.
    pub v0: Vec2Fixed,
    pub v1: Vec2Fixed,
    pub z0: Fixed16,
    pub z1: Fixed16,
    pub orient: WallOrient,

    /// World distance along the wall at `v0`, and the length from there to `v1`.
    pub u_start: Fixed16,
    pub u_len: Fixed16,
}

impl RWallSegment {
    /// Depth where the centre ray of `column` hits the wall line.
    pub fn depth_at(&self, ctx: &RenderFrameContext, column: i32) -> Fixed16 {
        let c = column as usize;
        let x0 = self.v0.x.0 as i128;
        let z0 = self.v0.z.0 as i128;
        let dx = (self.v1.x - self.v0.x).0 as i128;
        let dz = (self.v1.z - self.v0.z).0 as i128;

        // Both in 32.32.
        let num = z0 * dx - x0 * dz;
        let (num, den) = match self.orient {
            WallOrient::DzDx => {
                let slope = ctx.column_y_over_x[c].0 as i128;
                (num << 16, (dx << 16) - slope * dz)
            }
            WallOrient::DxDz => {
                let inv_slope = ctx.column_x_over_y[c].0 as i128;
                (num * inv_slope, dx * inv_slope - (dz << 16))
            }
        };

        if den == 0 {
            return Fixed16::MAX;
        }
        let z = num / den;
        if z <= 0 {
            return Fixed16::MAX;
        }
        Fixed16(z.min(i32::MAX as i128) as i32).max(ctx.min_seg_z)
    }

    /// Distance along the wall, in world units, seen by `column` at `depth`.
    pub fn u_at(&self, ctx: &RenderFrameContext, column: i32, depth: Fixed16) -> Fixed16 {
        let d = self.v1 - self.v0;
        let t = match self.orient {
            WallOrient::DzDx => {
                let lateral = depth * ctx.column_y_over_x[column as usize];
                (lateral - self.v0.x) / d.x
            }
            WallOrient::DxDz => (depth - self.v0.z) / d.z,
        };
        self.u_start + self.u_len * t.clamp(Fixed16::ZERO, Fixed16::ONE)
    }
}

/// Transforms, culls, clips and projects one wall against the columns
/// `x_min..=x_max`. Returns `None` for walls facing away, behind the camera
/// or outside the range.
pub fn build_segment(
    ctx: &RenderFrameContext,
    camera: &CameraView,
    wall: hecs::Entity,
    sector: hecs::Entity,
    (world_v0, world_v1): (Vec2Fixed, Vec2Fixed),
    (x_min, x_max): (i32, i32),
) -> Option<RWallSegment> {
    let mut v0 = camera.to_view(world_v0);
    let mut v1 = camera.to_view(world_v1);

    // The inside of a sector is to the right of its walls.
    if v0.cross_wide(v1) >= 0 {
        return None;
    }

    let min_z = ctx.min_seg_z;
    if v0.z <= min_z && v1.z <= min_z {
        return None;
    }

    let mut u_start = Fixed16::ZERO;
    let mut u_len = (world_v1 - world_v0).length();

    if v0.z <= min_z {
        let t = (min_z - v0.z) / (v1.z - v0.z);
        v0 = v0 + (v1 - v0).scale(t);
        v0.z = min_z;
        u_start = u_len * t;
        u_len -= u_start;
    } else if v1.z <= min_z {
        let t = (min_z - v0.z) / (v1.z - v0.z);
        v1 = v0 + (v1 - v0).scale(t);
        v1.z = min_z;
        u_len = u_len * t;
    }

    let project = |v: Vec2Fixed| ctx.half_width + v.x.mul_div(ctx.focal_length, v.z);
    let wall_x0_raw = (project(v0) - Fixed16::HALF).ceil();
    let wall_x1_raw = (project(v1) - Fixed16::HALF).ceil() - 1;
    if wall_x1_raw < wall_x0_raw {
        return None;
    }

    let wall_x0 = wall_x0_raw.max(x_min);
    let wall_x1 = wall_x1_raw.min(x_max);
    if wall_x0 > wall_x1 {
        return None;
    }

    let d = v1 - v0;
    let orient = if d.x.abs() >= d.z.abs() {
        WallOrient::DzDx
    } else {
        WallOrient::DxDz
    };

    Some(RWallSegment {
        wall,
        sector,
        wall_x0_raw,
        wall_x1_raw,
        wall_x0,
        wall_x1,
        v0,
        v1,
        z0: v0.z,
        z1: v1.z,
        orient,
        u_start,
        u_len,
    })
}

/// Splits `ctx.seg_list_src` into non-overlapping `ctx.seg_list_dst`
/// segments over `x_min..=x_max`. Each column goes to the nearest segment;
/// ties keep the earlier one. Returns how many pieces did not fit.
pub fn merge_segments(ctx: &mut RenderFrameContext, x_min: i32, x_max: i32) -> usize {
    ctx.seg_list_dst.clear();
    if x_min > x_max {
        return 0;
    }

    for x in x_min..=x_max {
        ctx.column_owner[x as usize] = None;
        ctx.column_owner_depth[x as usize] = Fixed16::MAX;
    }

    for (i, seg) in ctx.seg_list_src.iter().enumerate() {
        for x in seg.wall_x0..=seg.wall_x1 {
            let depth = seg.depth_at(ctx, x);
            let c = x as usize;
            if ctx.column_owner[c].is_none() || depth < ctx.column_owner_depth[c] {
                ctx.column_owner[c] = Some(i);
                ctx.column_owner_depth[c] = depth;
            }
        }
    }

    let mut dropped = 0;
    let mut run: Option<(usize, i32)> = None;
    for x in x_min..=x_max + 1 {
        let owner = if x <= x_max {
            ctx.column_owner[x as usize]
        } else {
            None
        };

        if let Some((seg, start)) = run {
            if owner == Some(seg) {
                continue;
            }
            if ctx.seg_list_dst.len() < ctx.seg_capacity {
                let mut dst = ctx.seg_list_src[seg];
                dst.wall_x0 = start;
                dst.wall_x1 = x - 1;
                ctx.seg_list_dst.push(dst);
            } else {
                dropped += 1;
            }
            run = None;
        }

        if let Some(seg) = owner {
            run = Some((seg, x));
        }
    }

    dropped
}

/// Vertical texture placement of one wall part.
#[derive(Debug, Clone, Copy)]
pub struct WallTexture<'a> {
    pub texture: &'a TextureData,
    /// World height that maps to texel row `offset.z * 8`.
    pub base: Fixed16,
    pub offset: Vec2Fixed,
}

/// Fills rows `y0..=y1` of `column` with a wall texture column seen at
/// `depth`, shaded through `colormap_row`.
#[allow(clippy::too_many_arguments)]
pub fn draw_wall_column(
    ctx: &mut RenderFrameContext,
    column: i32,
    (y0, y1): (i32, i32),
    depth: Fixed16,
    u: Fixed16,
    eye_height: Fixed16,
    part: &WallTexture,
    colormap_row: &[u8],
) {
    if y0 > y1 {
        return;
    }

    let texel_u = (u + part.offset.x).mul_int(TEXELS_PER_UNIT).floor();

    // World units covered by one row at this depth.
    let row_height = depth / ctx.focal_len_aspect;
    let first_row = ctx.half_height - Fixed16::from_int(y0) - Fixed16::HALF;
    let height = eye_height + first_row * row_height;

    let mut v = (height - part.base + part.offset.z).mul_int(TEXELS_PER_UNIT);
    let v_step = row_height.mul_int(TEXELS_PER_UNIT);

    for y in y0..=y1 {
        let texel = part.texture.texel(texel_u, v.floor());
        ctx.put_pixel(column, y, colormap_row[texel as usize]);
        v -= v_step;
    }
}
