use sift_core::MatchedPair;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of a two-nearest-neighbour query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbors {
    pub best_index: usize,
    pub best_distance: f32,
    pub second_distance: f32,
}

/// Matches judged compatible with one seed hypothesis
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsistencySet {
    /// Position of the seed within the raw match list
    pub seed_index: usize,
    /// Members in raw match list order
    pub pairs: Vec<MatchedPair>,
}

impl ConsistencySet {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Output of the full matching pipeline.
///
/// `consistent` is `None` only when the ratio test accepted nothing, which
/// is a valid empty result rather than an error.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchOutcome {
    pub raw_matches: Vec<MatchedPair>,
    pub consistent: Option<ConsistencySet>,
}

impl MatchOutcome {
    /// Final geometrically consistent pairs
    pub fn pairs(&self) -> &[MatchedPair] {
        self.consistent.as_ref().map_or(&[], |set| set.pairs.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::Keypoint;

    fn pair(i: f32) -> MatchedPair {
        MatchedPair::new(Keypoint::new(i, i, 1.0, 0.0), Keypoint::new(i, i + 1.0, 1.0, 0.0))
    }

    #[test]
    fn test_empty_outcome() {
        let outcome = MatchOutcome { raw_matches: vec![], consistent: None };
        assert!(outcome.is_empty());
        assert!(outcome.pairs().is_empty());
    }

    #[test]
    fn test_outcome_pairs_come_from_consistent_set() {
        let outcome = MatchOutcome {
            raw_matches: vec![pair(1.0), pair(2.0), pair(3.0)],
            consistent: Some(ConsistencySet { seed_index: 1, pairs: vec![pair(2.0)] }),
        };
        assert_eq!(outcome.pairs(), &[pair(2.0)]);
        assert!(!outcome.is_empty());
    }
}
