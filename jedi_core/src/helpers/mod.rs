pub mod geom;

mod camera;
mod changed_field;
mod changed_set;
mod fixed;
mod stopwatch;

pub use camera::{CameraView, Movable};
pub use changed_field::ChangedField;
pub use changed_set::ChangedSet;
pub use fixed::*;
pub use stopwatch::Stopwatch;
