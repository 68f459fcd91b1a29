use log::{debug, info, warn};
use rayon::prelude::*;
use sift_core::{CancelToken, Descriptor, Keypoint, KeypointSet, MatchedPair};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MatchResult};
use crate::neighbors::{BruteForceIndex, NearestNeighbors};
use crate::types::Neighbors;

/// What to do with a query when image B offers fewer than two candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CandidatePolicy {
    /// Abort matching with [`MatchError::InsufficientCandidates`]
    #[default]
    Fail,
    /// Leave the query unmatched and carry on
    Skip,
}

/// Outcome of the ratio test for one query descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Index of the accepted neighbour in image B
    Accept(usize),
    Reject,
    /// Second-best distance is zero, so the ratio is undefined
    Ambiguous,
    Skipped,
}

/// Nearest-neighbour matcher with a distance-ratio acceptance test
#[derive(Debug, Clone)]
pub struct DescriptorMatcher {
    ratio_threshold: f32,
    policy: CandidatePolicy,
    parallel: bool,
}

impl DescriptorMatcher {
    pub fn new(ratio_threshold: f32, policy: CandidatePolicy, parallel: bool) -> Self {
        Self {
            ratio_threshold,
            policy,
            parallel,
        }
    }

    pub fn ratio_threshold(&self) -> f32 {
        self.ratio_threshold
    }

    pub fn policy(&self) -> CandidatePolicy {
        self.policy
    }

    /// Match every descriptor of `a` against `b` by exhaustive search.
    ///
    /// Output follows the index order of `a`. An empty result is a valid
    /// outcome when no query passes the ratio test.
    pub fn match_sets(&self, a: &KeypointSet, b: &KeypointSet, cancel: &CancelToken) -> MatchResult<Vec<MatchedPair>> {
        let index = BruteForceIndex::new(b.descriptors());
        self.match_with_index(a, &index, b.keypoints(), cancel)
    }

    /// Match `a` against any nearest-neighbour index built over `train`'s descriptors
    pub fn match_with_index<I>(
        &self,
        a: &KeypointSet,
        index: &I,
        train: &[Keypoint],
        cancel: &CancelToken,
    ) -> MatchResult<Vec<MatchedPair>>
    where
        I: NearestNeighbors + Sync,
    {
        if index.len() != train.len() {
            return Err(MatchError::InvalidConfig(format!(
                "index holds {} descriptors but {} keypoints were given",
                index.len(),
                train.len()
            )));
        }

        let query = |d: &Descriptor| -> MatchResult<Verdict> {
            if cancel.is_cancelled() {
                return Err(MatchError::Cancelled);
            }
            self.query(d, index)
        };

        let verdicts: Vec<Verdict> = if self.parallel {
            a.descriptors().par_iter().map(query).collect::<MatchResult<_>>()?
        } else {
            a.descriptors().iter().map(query).collect::<MatchResult<_>>()?
        };

        let mut rejected = 0usize;
        let mut ambiguous = 0usize;
        let mut skipped = 0usize;
        let mut pairs = Vec::new();
        for (kp, verdict) in a.keypoints().iter().zip(verdicts) {
            match verdict {
                Verdict::Accept(j) => pairs.push(MatchedPair::new(*kp, train[j])),
                Verdict::Reject => rejected += 1,
                Verdict::Ambiguous => ambiguous += 1,
                Verdict::Skipped => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(
                "{}: skipped {} queries, only {} candidate descriptors to rank against",
                a.image_id(),
                skipped,
                index.len()
            );
        }
        debug!(
            "{}: {} rejected by ratio test, {} ambiguous",
            a.image_id(),
            rejected,
            ambiguous
        );
        info!("{}: {} of {} descriptors matched", a.image_id(), pairs.len(), a.len());
        Ok(pairs)
    }

    /// Look up one descriptor and apply the candidate policy and ratio test
    pub fn query<I: NearestNeighbors + ?Sized>(&self, descriptor: &Descriptor, index: &I) -> MatchResult<Verdict> {
        match index.nearest_two(descriptor) {
            Ok(neighbors) => Ok(self.ratio_test(&neighbors)),
            Err(MatchError::InsufficientCandidates { .. }) if self.policy == CandidatePolicy::Skip => Ok(Verdict::Skipped),
            Err(e) => Err(e),
        }
    }

    /// Accept iff `best / second < ratio_threshold`; a zero second-best
    /// distance means two identical candidates and is never accepted.
    pub fn ratio_test(&self, neighbors: &Neighbors) -> Verdict {
        if neighbors.second_distance == 0.0 {
            return Verdict::Ambiguous;
        }
        let ratio = neighbors.best_distance / neighbors.second_distance;
        if ratio < self.ratio_threshold {
            Verdict::Accept(neighbors.best_index)
        } else {
            Verdict::Reject
        }
    }
}

impl Default for DescriptorMatcher {
    fn default() -> Self {
        Self::new(0.82, CandidatePolicy::Fail, cfg!(feature = "parallel"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::DESCRIPTOR_LEN;

    fn axis(i: usize) -> Descriptor {
        let mut d = [0.0; DESCRIPTOR_LEN];
        d[i] = 1.0;
        d
    }

    /// Unit vector at `angle` radians from `axis(i)` towards `axis(j)`
    fn tilted(i: usize, j: usize, angle: f32) -> Descriptor {
        let mut d = [0.0; DESCRIPTOR_LEN];
        d[i] = angle.cos();
        d[j] = angle.sin();
        d
    }

    fn kp(n: f32) -> Keypoint {
        Keypoint::new(n, n * 2.0, 1.0 + n, 0.0)
    }

    fn set(id: &str, descriptors: Vec<Descriptor>) -> KeypointSet {
        let keypoints = (0..descriptors.len()).map(|i| kp(i as f32)).collect();
        KeypointSet::new(id, keypoints, descriptors)
    }

    fn matchers() -> [DescriptorMatcher; 2] {
        [
            DescriptorMatcher::new(0.82, CandidatePolicy::Fail, false),
            DescriptorMatcher::new(0.82, CandidatePolicy::Fail, true),
        ]
    }

    #[test]
    fn test_identical_descriptor_is_matched() {
        // a[1] equals b[2] exactly; every other b is at least 1 radian away
        let a = set("a", vec![axis(10), axis(0), axis(20)]);
        let b = set("b", vec![tilted(0, 1, 1.2), axis(30), axis(0), tilted(0, 2, 1.0)]);

        for matcher in matchers() {
            let pairs = matcher.match_sets(&a, &b, &CancelToken::new()).unwrap();
            assert!(pairs.contains(&MatchedPair::new(a.keypoints()[1], b.keypoints()[2])));
        }
    }

    #[test]
    fn test_duplicate_candidates_are_ambiguous() {
        let a = set("a", vec![tilted(0, 1, 0.1)]);
        let b = set("b", vec![axis(0), axis(0), axis(5)]);
        let matcher = DescriptorMatcher::default();
        let pairs = matcher.match_sets(&a, &b, &CancelToken::new()).unwrap();
        assert!(pairs.is_empty());

        let exact = set("exact", vec![axis(0)]);
        let index = BruteForceIndex::new(b.descriptors());
        assert_eq!(matcher.query(&exact.descriptors()[0], &index).unwrap(), Verdict::Ambiguous);
    }

    #[test]
    fn test_ratio_threshold_boundary() {
        let matcher = DescriptorMatcher::default();
        let n = |best: f32, second: f32| Neighbors {
            best_index: 3,
            best_distance: best,
            second_distance: second,
        };
        assert_eq!(matcher.ratio_test(&n(0.5, 1.0)), Verdict::Accept(3));
        assert_eq!(matcher.ratio_test(&n(0.82, 1.0)), Verdict::Reject);
        assert_eq!(matcher.ratio_test(&n(0.9, 1.0)), Verdict::Reject);
        assert_eq!(matcher.ratio_test(&n(0.0, 0.0)), Verdict::Ambiguous);
        assert_eq!(matcher.ratio_test(&n(0.0, 0.4)), Verdict::Accept(3));
    }

    #[test]
    fn test_repetitive_texture_rejected() {
        // Two candidates at almost the same angle from the query
        let a = set("a", vec![axis(0)]);
        let b = set("b", vec![tilted(0, 1, 0.50), tilted(0, 2, 0.52), axis(9)]);
        let pairs = DescriptorMatcher::default().match_sets(&a, &b, &CancelToken::new()).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_output_follows_query_order() {
        let a = set("a", vec![axis(3), axis(9), axis(1), axis(4)]);
        let b = set("b", vec![axis(1), axis(3), axis(4), axis(9), axis(100)]);
        for matcher in matchers() {
            let pairs = matcher.match_sets(&a, &b, &CancelToken::new()).unwrap();
            let expected = vec![
                MatchedPair::new(a.keypoints()[0], b.keypoints()[1]),
                MatchedPair::new(a.keypoints()[1], b.keypoints()[3]),
                MatchedPair::new(a.keypoints()[2], b.keypoints()[0]),
                MatchedPair::new(a.keypoints()[3], b.keypoints()[2]),
            ];
            assert_eq!(pairs, expected);
        }
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let a = set("a", (0..64).map(|i| tilted(i % 16, 16 + i % 7, 0.05 * (i % 5) as f32)).collect());
        let b = set("b", (0..48).map(|i| tilted(i % 16, 30 + i % 5, 0.3 * (i % 3) as f32)).collect());
        let [seq, par] = matchers();
        let token = CancelToken::new();
        assert_eq!(seq.match_sets(&a, &b, &token).unwrap(), par.match_sets(&a, &b, &token).unwrap());
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let a = set("a", vec![axis(0)]);
        let b = set("b", vec![axis(1), axis(2)]);
        let pairs = DescriptorMatcher::default().match_sets(&a, &b, &CancelToken::new()).unwrap();
        assert!(pairs.is_empty());

        let none = set("none", vec![]);
        assert!(DescriptorMatcher::default().match_sets(&none, &b, &CancelToken::new()).unwrap().is_empty());
    }

    #[test]
    fn test_insufficient_candidates_policy() {
        let a = set("a", vec![axis(0), axis(1)]);
        let b = set("b", vec![axis(0)]);

        let strict = DescriptorMatcher::new(0.82, CandidatePolicy::Fail, false);
        assert_eq!(
            strict.match_sets(&a, &b, &CancelToken::new()),
            Err(MatchError::InsufficientCandidates { available: 1 })
        );

        let lenient = DescriptorMatcher::new(0.82, CandidatePolicy::Skip, true);
        assert!(lenient.match_sets(&a, &b, &CancelToken::new()).unwrap().is_empty());
    }

    #[test]
    fn test_cancellation() {
        let a = set("a", vec![axis(0), axis(1)]);
        let b = set("b", vec![axis(0), axis(1)]);
        let token = CancelToken::new();
        token.cancel();
        for matcher in matchers() {
            assert_eq!(matcher.match_sets(&a, &b, &token), Err(MatchError::Cancelled));
        }
    }

    #[test]
    fn test_index_keypoint_mismatch() {
        let a = set("a", vec![axis(0)]);
        let b = set("b", vec![axis(0), axis(1)]);
        let index = BruteForceIndex::new(b.descriptors());
        let result = DescriptorMatcher::default().match_with_index(&a, &index, &b.keypoints()[..1], &CancelToken::new());
        assert!(matches!(result, Err(MatchError::InvalidConfig(_))));
    }

    #[test]
    fn test_repeatable() {
        let a = set("a", (0..32).map(|i| tilted(i % 8, 8 + i % 3, 0.1 * (i % 4) as f32)).collect());
        let b = set("b", (0..32).map(|i| tilted(i % 8, 20 + i % 3, 0.2 * (i % 2) as f32)).collect());
        let matcher = DescriptorMatcher::default();
        let first = matcher.match_sets(&a, &b, &CancelToken::new()).unwrap();
        let second = matcher.match_sets(&a, &b, &CancelToken::new()).unwrap();
        assert_eq!(first, second);
    }
}
