pub mod aabb;
pub mod intersect_2d;
pub mod intersect_3d;
pub mod polygon_2d;
pub mod polygon_3d;

pub use aabb::Aabb;

/// 2D point type (face parameter space).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Default spatial tolerance for deciding that two points coincide.
pub const LINEAR_TOLERANCE: f64 = 1e-7;

/// Tolerance on the sine of the angle between two directions.
pub const ANGULAR_TOLERANCE: f64 = 1e-9;

/// Factor applied to a tolerance when a failed intersection is retried.
pub const RELAX_FACTOR: f64 = 10.0;
