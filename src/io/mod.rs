//! File system I/O stages: walking (C1), pattern matching (C3), and
//! technology detection (C4).

pub mod pattern;
pub mod technology;
pub mod walker;

pub use pattern::{find_matches, MatchOptions, PatternSpec};
pub use technology::{detect_technologies, TechnologyMap};
pub use walker::{walk_files, WalkOptions};
