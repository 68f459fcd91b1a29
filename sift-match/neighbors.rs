use sift_core::Descriptor;
use crate::distance::angular_distance;
use crate::error::{MatchError, MatchResult};
use crate::types::Neighbors;

/// Two-nearest-neighbour search over a fixed descriptor collection.
///
/// Implementations must report the lowest index among equally near
/// candidates as `best_index`, so results do not depend on search order.
pub trait NearestNeighbors {
    /// Number of indexed descriptors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails with [`MatchError::InsufficientCandidates`] when fewer than two
    /// descriptors are indexed.
    fn nearest_two(&self, query: &Descriptor) -> MatchResult<Neighbors>;
}

/// Exhaustive scan over every indexed descriptor
#[derive(Debug, Clone, Copy)]
pub struct BruteForceIndex<'a> {
    descriptors: &'a [Descriptor],
}

impl<'a> BruteForceIndex<'a> {
    pub fn new(descriptors: &'a [Descriptor]) -> Self {
        Self { descriptors }
    }
}

impl NearestNeighbors for BruteForceIndex<'_> {
    fn len(&self) -> usize {
        self.descriptors.len()
    }

    fn nearest_two(&self, query: &Descriptor) -> MatchResult<Neighbors> {
        if self.descriptors.len() < 2 {
            return Err(MatchError::InsufficientCandidates {
                available: self.descriptors.len(),
            });
        }

        let mut best = f32::INFINITY;
        let mut second = f32::INFINITY;
        let mut best_index = 0usize;

        // Strict comparisons keep the first index on ties
        for (j, candidate) in self.descriptors.iter().enumerate() {
            let d = angular_distance(query, candidate);
            if d < best {
                second = best;
                best = d;
                best_index = j;
            } else if d < second {
                second = d;
            }
        }

        Ok(Neighbors {
            best_index,
            best_distance: best,
            second_distance: second,
        })
    }
}
