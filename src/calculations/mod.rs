pub mod placement_pass;

pub use placement_pass::{PlacementPass, coalesce_segments};
