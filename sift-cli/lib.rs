use std::path::{Path, PathBuf};

use log::debug;
use sift_core::{CancelToken, KeypointSet, MatchedPair};
use sift_keys::{KeyFileLoader, LoadError, KEY_EXTENSION};
use sift_match::{ConfiguredMatcher, MatchError, MatchOutcome, PipelineConfig};
use thiserror::Error;

pub mod overlay;

pub use sift_core::{self, Keypoint as SiftKeypoint, Descriptor as SiftDescriptor, MatchConfig as Config};
pub use sift_match::{AgreementModel, CandidatePolicy, MatcherBuilder};

#[derive(Debug, Error)]
pub enum SiftError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid configuration file {path}: {reason}")]
    Config { path: PathBuf, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

impl SiftError {
    /// Process exit status: 1 for bad input or configuration, 2 when the
    /// matching pipeline itself fails
    pub fn exit_code(&self) -> u8 {
        match self {
            SiftError::Load(_)
            | SiftError::Image(_)
            | SiftError::Config { .. }
            | SiftError::Io(_)
            | SiftError::Match(MatchError::InvalidConfig(_)) => 1,
            SiftError::Match(_) | SiftError::ThreadPool(_) | SiftError::Json(_) => 2,
        }
    }
}

pub type SiftResult<T> = Result<T, SiftError>;

/// High-level matcher: loads two keypoint datasets, ratio-test matches them
/// and keeps the largest geometrically consistent group
pub struct SiftMatch {
    matcher: ConfiguredMatcher,
    cancel: CancelToken,
}

impl SiftMatch {
    /// Validate `config` and build the matcher. The global rayon pool is not
    /// touched; call `sift_core::init_thread_pool` first to size it.
    pub fn new(config: PipelineConfig) -> SiftResult<Self> {
        let matcher = config.to_builder().build()?;
        debug!("{}", matcher.config_summary());
        Ok(Self {
            matcher,
            cancel: CancelToken::new(),
        })
    }

    /// Load a keypoint dataset given either its base name or its `.key` path
    pub fn load<P: AsRef<Path>>(&self, path: P) -> SiftResult<KeypointSet> {
        let path = path.as_ref();
        let set = if path.extension().is_some_and(|ext| ext == KEY_EXTENSION) {
            KeyFileLoader::load_path(path)?
        } else {
            KeyFileLoader::load(path)?
        };
        Ok(set)
    }

    /// Ratio-test matches only, in image A order
    pub fn raw_matches(&self, a: &KeypointSet, b: &KeypointSet) -> SiftResult<Vec<MatchedPair>> {
        Ok(self.matcher.match_sets(a, b, &self.cancel)?)
    }

    /// Match then filter with a fresh generator from the configured seed
    pub fn match_sets(&self, a: &KeypointSet, b: &KeypointSet) -> SiftResult<MatchOutcome> {
        let mut rng = self.matcher.rng();
        Ok(self.matcher.run(a, b, &mut rng, &self.cancel)?)
    }

    /// Load both datasets and run the full pipeline
    pub fn match_files<P: AsRef<Path>, Q: AsRef<Path>>(&self, base_a: P, base_b: Q) -> SiftResult<MatchOutcome> {
        let a = self.load(base_a)?;
        let b = self.load(base_b)?;
        self.match_sets(&a, &b)
    }

    /// Handle for stopping a running match from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn matcher(&self) -> &ConfiguredMatcher {
        &self.matcher
    }

    pub fn config_summary(&self) -> String {
        self.matcher.config_summary()
    }
}
