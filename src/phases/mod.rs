// Pure per-image steps of the overlay pipeline

pub mod artifact_namer;
pub mod erasure;
pub mod region_filter;

pub use artifact_namer::{artifact_name, is_artifact_name};
pub use erasure::{erase_region, sample_fill_color};
pub use region_filter::filter_regions;
