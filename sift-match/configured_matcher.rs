use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sift_core::{CancelToken, KeypointSet, MatchedPair};
use crate::builder::MatcherBuilder;
use crate::consistency::ConsistencyFilter;
use crate::error::MatchResult;
use crate::matcher::DescriptorMatcher;
use crate::types::{ConsistencySet, MatchOutcome};

/// A matcher and consistency filter built from one configuration.
///
/// Holds the ratio-test `DescriptorMatcher`, the `ConsistencyFilter` and the
/// `MatcherBuilder` they came from, so a full pass can be run with one call.
#[derive(Debug, Clone)]
pub struct ConfiguredMatcher {
    pub(crate) matcher: DescriptorMatcher,
    pub(crate) filter: ConsistencyFilter,
    pub(crate) config: MatcherBuilder,
}

impl ConfiguredMatcher {
    /// Ratio-test matches of `a` against `b`, in `a` order
    pub fn match_sets(&self, a: &KeypointSet, b: &KeypointSet, cancel: &CancelToken) -> MatchResult<Vec<MatchedPair>> {
        self.matcher.match_sets(a, b, cancel)
    }

    /// Largest consistency set among the raw matches
    pub fn filter_matches<R: Rng + ?Sized>(
        &self,
        pairs: &[MatchedPair],
        rng: &mut R,
        cancel: &CancelToken,
    ) -> MatchResult<ConsistencySet> {
        self.filter.filter(pairs, rng, cancel)
    }

    /// Match then filter.
    ///
    /// # Returns
    /// A `MatchOutcome` whose `consistent` set is `None` only when the ratio
    /// test accepted nothing. Any other shortfall, such as fewer raw matches
    /// than the sample size, is an error.
    pub fn run<R: Rng + ?Sized>(
        &self,
        a: &KeypointSet,
        b: &KeypointSet,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> MatchResult<MatchOutcome> {
        let raw_matches = self.match_sets(a, b, cancel)?;
        if raw_matches.is_empty() {
            info!("no matches between {} and {}", a.image_id(), b.image_id());
            return Ok(MatchOutcome {
                raw_matches,
                consistent: None,
            });
        }
        let consistent = self.filter_matches(&raw_matches, rng, cancel)?;
        Ok(MatchOutcome {
            raw_matches,
            consistent: Some(consistent),
        })
    }

    /// Generator for the filter: seeded when configured, else from entropy
    pub fn rng(&self) -> StdRng {
        match self.config.seed_value() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn matcher(&self) -> &DescriptorMatcher {
        &self.matcher
    }

    pub fn filter(&self) -> &ConsistencyFilter {
        &self.filter
    }

    /// Get a summary of the matcher's configuration.
    pub fn config_summary(&self) -> String {
        self.config.summary()
    }

    pub fn seed(&self) -> Option<u64> {
        self.config.seed_value()
    }

    pub fn n_threads(&self) -> usize {
        self.config.n_threads()
    }
}
