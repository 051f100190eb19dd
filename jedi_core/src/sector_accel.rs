use bvh_arena::{volumes::Aabb, Bvh};
use ultraviolet::Vec2;

use crate::{
    components::{CSector, CWall},
    helpers::geom::{point_in_edges, Bounds2d},
};

pub struct SectorAccel {
    bvh: Bvh<hecs::Entity, Aabb<2>>,
}

impl SectorAccel {
    pub fn new(world: &hecs::World) -> Self {
        let mut bvh = Bvh::default();
        for (id, sector) in &mut world.query::<&CSector>() {
            let bbox = Bounds2d::from_points(sector.vertices.iter().map(|v| v.to_vec2()));
            if !bbox.is_valid() {
                log::warn!("Sector {} has invalid bounding box", sector.index);
            } else {
                let aabb = Aabb::from_min_max(bbox.min, bbox.max);
                bvh.insert(id, aabb);
            }
        }
        Self { bvh }
    }

    /// Sector containing `point_xz`. Overlapping sectors (stacked rooms)
    /// resolve to the first hit.
    pub fn query(&self, world: &hecs::World, point_xz: Vec2) -> Option<hecs::Entity> {
        let mut found_sector: Option<hecs::Entity> = None;
        self.bvh
            .for_each_overlaps(&Aabb::from_min_max(point_xz, point_xz), |sector| {
                if found_sector.is_some() {
                    return;
                }

                if sector_has_point(world, *sector, point_xz) {
                    found_sector = Some(*sector);
                }
            });

        found_sector
    }
}

pub fn sector_has_point(world: &hecs::World, sector: hecs::Entity, point_xz: Vec2) -> bool {
    let Ok(c_sector) = world.get::<&CSector>(sector) else {
        return false;
    };

    let edges = c_sector.walls.iter().filter_map(|&wall| {
        let c_wall = world.get::<&CWall>(wall).ok()?;
        let (v0, v1) = c_sector.wall_vertices(&c_wall)?;
        Some((v0.to_vec2(), v1.to_vec2()))
    });

    point_in_edges(point_xz, edges)
}
