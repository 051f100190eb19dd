use jedi_level_format::TextureData;

use crate::helpers::{CameraView, Fixed16, Vec2Fixed};

use super::{frame::FlatEdges, frame::RenderFrameContext, lighting::LightingResolver, TEXELS_PER_UNIT};

/// A floor or ceiling plane of one sector.
#[derive(Debug, Clone, Copy)]
pub struct FlatSurface<'a> {
    pub height: Fixed16,
    pub texture: &'a TextureData,
    pub offset: Vec2Fixed,
}

/// Scans `edges` row by row and fills each horizontal span of `flat`.
pub fn draw_flat(
    ctx: &mut RenderFrameContext,
    edges: &FlatEdges,
    flat: &FlatSurface,
    camera: &CameraView,
    lighting: &LightingResolver,
    colormap: &jedi_level_format::ColorMap,
) {
    if edges.is_empty() {
        return;
    }

    for y in edges.y_min..=edges.y_max {
        let mut x = edges.x_min;
        while x <= edges.x_max {
            if !edges.covers(x, y) {
                x += 1;
                continue;
            }

            let start = x;
            while x <= edges.x_max && edges.covers(x, y) {
                x += 1;
            }
            draw_span(ctx, y, start, x - 1, flat, camera, lighting, colormap);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_span(
    ctx: &mut RenderFrameContext,
    y: i32,
    x0: i32,
    x1: i32,
    flat: &FlatSurface,
    camera: &CameraView,
    lighting: &LightingResolver,
    colormap: &jedi_level_format::ColorMap,
) {
    // Depth of the whole row, no division per pixel.
    let rel_height = camera.eye_height - flat.height;
    let depth = rel_height * ctx.focal_len_aspect * ctx.rcp_y_minus_half_height[y as usize];
    if depth <= Fixed16::ZERO {
        return;
    }

    let row = colormap.row(lighting.resolve(depth, 0));

    let slope = ctx.column_y_over_x[x0 as usize];
    let mut pos = camera.to_world(Vec2Fixed::new(depth * slope, depth)) + flat.offset;
    let step = camera.to_world(Vec2Fixed::new(depth / ctx.focal_length, Fixed16::ZERO)) - camera.pos;

    for x in x0..=x1 {
        let u = pos.x.mul_int(TEXELS_PER_UNIT).floor();
        let v = pos.z.mul_int(TEXELS_PER_UNIT).floor();
        let texel = flat.texture.texel(u, v);
        ctx.put_pixel(x, y, row[texel as usize]);
        pos = pos + step;
    }
}
