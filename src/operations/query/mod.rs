mod bounding_box;
mod topology_counts;
mod volume;

pub use bounding_box::BoundingBox;
pub use topology_counts::{TopologyCounts, TopologyCountsResult};
pub use volume::{signed_volume, Volume};
