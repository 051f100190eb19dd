use crate::helpers::Fixed16;

use super::{wall::RWallSegment, RenderSettings, MAX_SEG};

/// Per-column rows of one floor or ceiling, gathered while its sector's
/// walls are drawn.
#[derive(Debug, Clone, Default)]
pub struct FlatEdges {
    pub top: Vec<i32>,
    pub bot: Vec<i32>,
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl FlatEdges {
    fn new(width: usize) -> Self {
        let mut edges = Self {
            top: vec![0; width],
            bot: vec![-1; width],
            ..Default::default()
        };
        edges.reset();
        edges
    }

    pub fn reset(&mut self) {
        self.top.fill(0);
        self.bot.fill(-1);
        self.x_min = i32::MAX;
        self.x_max = i32::MIN;
        self.y_min = i32::MAX;
        self.y_max = i32::MIN;
    }

    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max
    }

    /// Records rows `top..=bot` of column `x`. Empty ranges are ignored.
    pub fn add(&mut self, x: i32, top: i32, bot: i32) {
        if top > bot {
            return;
        }

        self.top[x as usize] = top;
        self.bot[x as usize] = bot;
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(top);
        self.y_max = self.y_max.max(bot);
    }

    pub fn covers(&self, x: i32, y: i32) -> bool {
        self.top[x as usize] <= y && y <= self.bot[x as usize]
    }
}

/// Everything one frame of the classic renderer reads and writes.
///
/// Column buffers hold inclusive row ranges. `window_*` is what the sector
/// being drawn may touch. `column_*` is what is left visible behind it,
/// handed on to the sectors seen through its portals.
pub struct RenderFrameContext {
    pub width: usize,
    pub height: usize,
    pub half_width: Fixed16,
    pub half_height: Fixed16,
    pub focal_length: Fixed16,
    pub focal_len_aspect: Fixed16,
    /// Near plane. Points at or behind it are clipped.
    pub min_seg_z: Fixed16,

    pub window_min_x: i32,
    pub window_max_x: i32,
    pub window_min_y: i32,
    pub window_max_y: i32,

    /// 8-bit indexed, row-major.
    pub display: Vec<u8>,

    pub column_top: Vec<i32>,
    pub column_bot: Vec<i32>,
    /// Columns that can still see through a portal of the current sector.
    pub column_open: Vec<bool>,
    pub window_top: Vec<i32>,
    pub window_bot: Vec<i32>,
    /// Depth of the nearest solid wall per column.
    pub depth1d: Vec<Fixed16>,

    /// Slope of the ray through the centre of each column.
    pub column_y_over_x: Vec<Fixed16>,
    pub column_x_over_y: Vec<Fixed16>,
    /// `1 / (y + 0.5 - half_height)` per row.
    pub rcp_y_minus_half_height: Vec<Fixed16>,

    pub seg_list_src: Vec<RWallSegment>,
    pub seg_list_dst: Vec<RWallSegment>,
    /// Room in each segment list, and flats per frame.
    pub seg_capacity: usize,
    pub(super) column_owner: Vec<Option<usize>>,
    pub(super) column_owner_depth: Vec<Fixed16>,

    pub ceiling_edges: FlatEdges,
    pub floor_edges: FlatEdges,

    pub draw_frame: u32,
    /// Segments built this frame.
    pub next_wall: usize,
    /// Destination segment being drawn.
    pub cur_wall_seg: usize,
    pub flat_count: usize,
    /// Most walls a single sector tried to emit this frame.
    pub max_wall_count: usize,
}

impl RenderFrameContext {
    pub fn new(settings: &RenderSettings) -> Self {
        let width = settings.width.max(1);
        let height = settings.height.max(1);

        let half_width = Fixed16::from_int(width as i32) / Fixed16::from_int(2);
        let half_height = Fixed16::from_int(height as i32) / Fixed16::from_int(2);
        let focal_length = if settings.focal_length > 0.0 {
            Fixed16::from_f32(settings.focal_length)
        } else {
            half_width
        };
        let focal_len_aspect = focal_length * Fixed16::from_f32(settings.aspect);

        let column_y_over_x = (0..width as i32)
            .map(|c| (Fixed16::from_int(c) + Fixed16::HALF - half_width) / focal_length)
            .collect::<Vec<_>>();
        let column_x_over_y = column_y_over_x.iter().map(|s| s.recip()).collect();
        let rcp_y_minus_half_height = (0..height as i32)
            .map(|y| (Fixed16::from_int(y) + Fixed16::HALF - half_height).recip())
            .collect();

        Self {
            width,
            height,
            half_width,
            half_height,
            focal_length,
            focal_len_aspect,
            min_seg_z: Fixed16::ONE / Fixed16::from_int(4),
            window_min_x: 0,
            window_max_x: width as i32 - 1,
            window_min_y: 0,
            window_max_y: height as i32 - 1,
            display: vec![0; width * height],
            column_top: vec![0; width],
            column_bot: vec![height as i32 - 1; width],
            column_open: vec![false; width],
            window_top: vec![0; width],
            window_bot: vec![height as i32 - 1; width],
            depth1d: vec![Fixed16::MAX; width],
            column_y_over_x,
            column_x_over_y,
            rcp_y_minus_half_height,
            seg_list_src: Vec::with_capacity(MAX_SEG),
            seg_list_dst: Vec::with_capacity(MAX_SEG),
            seg_capacity: MAX_SEG,
            column_owner: vec![None; width],
            column_owner_depth: vec![Fixed16::MAX; width],
            ceiling_edges: FlatEdges::new(width),
            floor_edges: FlatEdges::new(width),
            draw_frame: 0,
            next_wall: 0,
            cur_wall_seg: 0,
            flat_count: 0,
            max_wall_count: 0,
        }
    }

    /// Resets every per-frame buffer. Nothing carries over between frames.
    pub fn begin_frame(&mut self) {
        let bot = self.height as i32 - 1;

        self.draw_frame = self.draw_frame.wrapping_add(1);
        self.display.fill(0);
        self.column_top.fill(0);
        self.column_bot.fill(bot);
        self.column_open.fill(false);
        self.window_top.fill(0);
        self.window_bot.fill(bot);
        self.depth1d.fill(Fixed16::MAX);
        self.seg_list_src.clear();
        self.seg_list_dst.clear();
        self.ceiling_edges.reset();
        self.floor_edges.reset();

        self.window_min_x = 0;
        self.window_max_x = self.width as i32 - 1;
        self.window_min_y = 0;
        self.window_max_y = bot;

        self.next_wall = 0;
        self.cur_wall_seg = 0;
        self.flat_count = 0;
        self.max_wall_count = 0;
    }

    /// Screen row of the first pixel centre at or below a world height
    /// `rel_height` (relative to the eye) seen at `depth`.
    pub fn project_row(&self, rel_height: Fixed16, depth: Fixed16) -> i32 {
        let y_edge = self.half_height - rel_height.mul_div(self.focal_len_aspect, depth);
        (y_edge - Fixed16::HALF).ceil()
    }

    /// Narrows the window of columns `x0..=x1` to what the last sector left
    /// visible.
    pub fn push_window(&mut self, x0: i32, x1: i32) {
        for x in x0..=x1 {
            let x = x as usize;
            self.window_top[x] = self.column_top[x];
            self.window_bot[x] = self.column_bot[x];
        }
        self.window_min_x = x0;
        self.window_max_x = x1;
    }

    /// Every column buffer range is well formed.
    pub fn columns_valid(&self) -> bool {
        self.column_top
            .iter()
            .zip(&self.column_bot)
            .all(|(top, bot)| top <= bot)
            && self
                .window_top
                .iter()
                .zip(&self.window_bot)
                .all(|(top, bot)| top <= bot)
    }

    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: u8) {
        self.display[y as usize * self.width + x as usize] = color;
    }
}
