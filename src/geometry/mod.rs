pub mod intersector;
pub mod line;
pub mod plane;

pub use intersector::{CurveTag, IntersectionFailure, PlanarIntersector, SpaceCurve, SurfaceIntersector};
pub use line::{Line, Segment};
pub use plane::Plane;
