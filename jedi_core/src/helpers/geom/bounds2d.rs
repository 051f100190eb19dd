use ultraviolet::Vec2;

#[derive(Debug, Clone)]
pub struct Bounds2d {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds2d {
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut bounds = Bounds2d {
            min: Vec2::broadcast(f32::MAX),
            max: Vec2::broadcast(f32::MIN),
        };

        for point in points {
            bounds.min = bounds.min.min_by_component(point);
            bounds.max = bounds.max.max_by_component(point);
        }

        bounds
    }

    /// False for bounds built from no points.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn has_point(&self, point: Vec2) -> bool {
        (point - self.min).component_min() >= 0. && (point - self.max).component_max() <= 0.
    }
}
