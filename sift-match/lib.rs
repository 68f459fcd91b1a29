//! Descriptor matching between two keypoint sets.
//!
//! [`DescriptorMatcher`] pairs each descriptor of image A with its nearest
//! neighbour in image B when the match passes the distance-ratio test.
//! [`ConsistencyFilter`] then samples seed matches and keeps the largest
//! group whose scale and orientation agree with its seed.

pub mod error;
pub mod types;
pub mod distance;
pub mod neighbors;
pub mod matcher;
pub mod consistency;
pub mod config;
pub mod builder;
pub mod configured_matcher;

pub use error::{MatchError, MatchResult};
pub use types::{ConsistencySet, MatchOutcome, Neighbors};
pub use distance::{angular_distance, wrap_angle};
pub use neighbors::{BruteForceIndex, NearestNeighbors};
pub use matcher::{CandidatePolicy, DescriptorMatcher};
pub use consistency::{AgreementModel, ConsistencyFilter};
pub use config::PipelineConfig;
pub use builder::MatcherBuilder;
pub use configured_matcher::ConfiguredMatcher;
