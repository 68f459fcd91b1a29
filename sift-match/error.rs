use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("need at least 2 candidate descriptors to rank against, found {available}")]
    InsufficientCandidates { available: usize },
    #[error("need at least {required} raw matches to draw seed hypotheses, found {available}")]
    InsufficientMatches { available: usize, required: usize },
    #[error("every consistency set is empty")]
    NoConsistentMatches,
    #[error("seed index {index} out of range for {len} matches")]
    InvalidSeed { index: usize, len: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("matching cancelled")]
    Cancelled,
}

pub type MatchResult<T> = Result<T, MatchError>;
