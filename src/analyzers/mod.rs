pub mod heuristic;
pub mod tag_map;
#[cfg(feature = "tag-model")]
pub mod tagger;
