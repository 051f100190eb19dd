use ultraviolet::Vec3;

use super::{Angle14, Fixed16, Vec2Fixed};

pub trait Movable {
    fn pos(&self) -> Vec3;
    fn set_pos(&mut self, pos: Vec3);

    /// Degrees, clockwise from +Z seen from above.
    fn yaw(&self) -> f32;
    fn rotate_yaw(&mut self, delta: f32);

    fn forward(&self) -> Vec3 {
        let (sin, cos) = self.yaw().to_radians().sin_cos();
        Vec3::new(sin, 0.0, cos)
    }

    fn right(&self) -> Vec3 {
        let (sin, cos) = self.yaw().to_radians().sin_cos();
        Vec3::new(cos, 0.0, -sin)
    }

    /// Moves by `delta` given as (right, up, forward).
    fn move_relative(&mut self, delta: Vec3) {
        let pos = self.pos()
            + self.right() * delta.x
            + Vec3::unit_y() * delta.y
            + self.forward() * delta.z;
        self.set_pos(pos);
    }
}

/// Camera state handed to the renderer, already converted to fixed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub pos: Vec2Fixed,
    /// Absolute height of the eye.
    pub eye_height: Fixed16,
    pub yaw: Angle14,
    /// Headlamp style light carried by the player.
    pub light_source: bool,
    pub sector: hecs::Entity,
}

impl CameraView {
    pub fn from_movable(
        movable: &impl Movable,
        eye_offset: f32,
        light_source: bool,
        sector: hecs::Entity,
    ) -> Self {
        let pos = movable.pos();
        Self {
            pos: Vec2Fixed::from_f32(pos.x, pos.z),
            eye_height: Fixed16::from_f32(pos.y + eye_offset),
            yaw: Angle14::from_degrees(movable.yaw()),
            light_source,
            sector,
        }
    }

    /// Rotates a world-space point into view space: +X right, +Z forward.
    pub fn to_view(&self, point: Vec2Fixed) -> Vec2Fixed {
        let rel = point - self.pos;
        let (sin, cos) = self.yaw.sin_cos();
        Vec2Fixed {
            x: rel.x * cos - rel.z * sin,
            z: rel.x * sin + rel.z * cos,
        }
    }

    /// Inverse of [CameraView::to_view] for a view-space offset.
    pub fn to_world(&self, view: Vec2Fixed) -> Vec2Fixed {
        let (sin, cos) = self.yaw.sin_cos();
        Vec2Fixed {
            x: self.pos.x + view.x * cos + view.z * sin,
            z: self.pos.z - view.x * sin + view.z * cos,
        }
    }
}
