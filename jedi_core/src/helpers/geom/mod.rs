mod bounds2d;
mod point_in_polygon;

pub use bounds2d::*;
pub use point_in_polygon::*;
