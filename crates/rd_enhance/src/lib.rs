pub mod patterns;
pub mod restructure;
pub mod segment;

pub use patterns::{PatternDescriptor, PatternDetector};
pub use restructure::{RestructureOptions, Restructurer};
pub use segment::{RegexSegmenter, Segmenter};

pub mod prelude {
    pub use super::patterns::{PatternDescriptor, PatternDetector};
    pub use super::restructure::{RestructureOptions, Restructurer};
    pub use super::segment::Segmenter;
    pub use rd_core::{Error, Result};
}
