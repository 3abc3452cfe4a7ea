pub mod normalize;
pub mod segment;

pub use normalize::{check_lengths, normalize_all, normalize_card};
pub use segment::{segment, Segmentation, TrailingPolicy};
