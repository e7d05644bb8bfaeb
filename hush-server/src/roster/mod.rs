mod roster_tracker;

pub use roster_tracker::*;
