use sift_core::MatchConfig;
use crate::config::PipelineConfig;
use crate::configured_matcher::ConfiguredMatcher;
use crate::consistency::{AgreementModel, ConsistencyFilter};
use crate::error::MatchResult;
use crate::matcher::{CandidatePolicy, DescriptorMatcher};

/// Builder for creating a `ConfiguredMatcher`
#[derive(Debug, Clone)]
pub struct MatcherBuilder {
    config: MatchConfig,
    candidate_policy: CandidatePolicy,
    agreement: AgreementModel,
    parallel: bool,
    seed: Option<u64>,
}

impl MatcherBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::from_config(PipelineConfig::new())
    }

    /// Set the best/second-best distance ratio below which a match is accepted
    pub fn ratio_threshold(mut self, ratio: f32) -> Self {
        self.config.ratio_threshold = ratio;
        self
    }

    /// Set the number of seed hypotheses drawn by the consistency filter
    pub fn sample_size(mut self, sample_size: usize) -> Self {
        self.config.sample_size = sample_size;
        self
    }

    /// Set the orientation agreement tolerance (radians)
    pub fn orientation_tolerance(mut self, tolerance: f32) -> Self {
        self.config.orientation_tolerance = tolerance;
        self
    }

    /// Set the relative scale agreement tolerance
    pub fn scale_tolerance(mut self, tolerance: f32) -> Self {
        self.config.scale_tolerance = tolerance;
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads;
        self
    }

    pub fn candidate_policy(mut self, policy: CandidatePolicy) -> Self {
        self.candidate_policy = policy;
        self
    }

    /// Leave queries unmatched instead of failing when image B is too small
    pub fn skip_insufficient_candidates(self) -> Self {
        self.candidate_policy(CandidatePolicy::Skip)
    }

    pub fn agreement(mut self, agreement: AgreementModel) -> Self {
        self.agreement = agreement;
        self
    }

    /// Enable or disable rayon parallelism
    pub fn parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Fix the sampling seed for reproducible filtering
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Apply the strict preset
    pub fn preset_strict(self) -> Self {
        self.with_preset(PipelineConfig::strict_preset())
    }

    /// Apply the permissive preset
    pub fn preset_permissive(self) -> Self {
        self.with_preset(PipelineConfig::permissive_preset())
    }

    /// Presets replace thresholds and policies but keep thread count,
    /// parallelism and seed
    fn with_preset(mut self, preset: PipelineConfig) -> Self {
        let n_threads = self.config.n_threads;
        self.config = preset.core;
        self.config.n_threads = n_threads;
        self.candidate_policy = preset.candidate_policy;
        self.agreement = preset.agreement;
        self
    }

    /// Build the `ConfiguredMatcher`
    pub fn build(self) -> MatchResult<ConfiguredMatcher> {
        self.clone().to_config().validate()?;
        let matcher = DescriptorMatcher::new(self.config.ratio_threshold, self.candidate_policy, self.parallel);
        let filter = ConsistencyFilter::new(
            self.config.sample_size,
            self.config.orientation_tolerance,
            self.config.scale_tolerance,
            self.agreement,
            self.parallel,
        );
        Ok(ConfiguredMatcher {
            matcher,
            filter,
            config: self,
        })
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.clone().to_config().summary()
    }

    /// Create a builder from an existing `PipelineConfig`
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            config: config.core,
            candidate_policy: config.candidate_policy,
            agreement: config.agreement,
            parallel: config.parallel,
            seed: config.seed,
        }
    }

    /// Convert the builder into a `PipelineConfig`
    pub fn to_config(self) -> PipelineConfig {
        PipelineConfig {
            core: self.config,
            candidate_policy: self.candidate_policy,
            agreement: self.agreement,
            parallel: self.parallel,
            seed: self.seed,
            name: None,
            description: None,
            version: None,
        }
    }

    pub fn seed_value(&self) -> Option<u64> {
        self.seed
    }

    pub fn n_threads(&self) -> usize {
        self.config.n_threads
    }
}

impl Default for MatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
