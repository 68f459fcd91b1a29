use log::{debug, info};
use rand::Rng;
use rayon::prelude::*;
use sift_core::{CancelToken, MatchedPair};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::distance::wrap_angle;
use crate::error::{MatchError, MatchResult};
use crate::types::ConsistencySet;

/// Which keypoint quantities a candidate must share with its seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AgreementModel {
    /// Seed and candidate keypoints agree in orientation and scale,
    /// compared separately within image A and within image B.
    #[default]
    PerImage,
    /// The A→B change of orientation and the A→B scale ratio of the
    /// candidate agree with those of the seed.
    RelativeChange,
}

/// Seeded hypothesis-and-vote filter over raw matches.
///
/// Draws `sample_size` distinct seeds, collects one consistency set per
/// seed and keeps the largest. No transform is fitted, so clusters that
/// agree on scale and orientation but not on translation survive.
#[derive(Debug, Clone)]
pub struct ConsistencyFilter {
    sample_size: usize,
    orientation_tolerance: f32,
    scale_tolerance: f32,
    agreement: AgreementModel,
    parallel: bool,
}

impl ConsistencyFilter {
    pub fn new(
        sample_size: usize,
        orientation_tolerance: f32,
        scale_tolerance: f32,
        agreement: AgreementModel,
        parallel: bool,
    ) -> Self {
        Self {
            sample_size,
            orientation_tolerance,
            scale_tolerance,
            agreement,
            parallel,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn agreement(&self) -> AgreementModel {
        self.agreement
    }

    /// Sample seeds from `rng` and return the largest consistency set
    pub fn filter<R: Rng + ?Sized>(
        &self,
        pairs: &[MatchedPair],
        rng: &mut R,
        cancel: &CancelToken,
    ) -> MatchResult<ConsistencySet> {
        let seeds = self.sample_seeds(pairs.len(), rng)?;
        self.filter_with_seeds(pairs, &seeds, cancel)
    }

    /// `sample_size` distinct indices into a list of `available` matches,
    /// uniformly without replacement
    pub fn sample_seeds<R: Rng + ?Sized>(&self, available: usize, rng: &mut R) -> MatchResult<Vec<usize>> {
        if available < self.sample_size {
            return Err(MatchError::InsufficientMatches {
                available,
                required: self.sample_size,
            });
        }
        Ok(rand::seq::index::sample(rng, available, self.sample_size).into_vec())
    }

    /// Build one set per seed and pick the largest; the earliest seed wins ties
    pub fn filter_with_seeds(
        &self,
        pairs: &[MatchedPair],
        seeds: &[usize],
        cancel: &CancelToken,
    ) -> MatchResult<ConsistencySet> {
        if let Some(&index) = seeds.iter().find(|&&s| s >= pairs.len()) {
            return Err(MatchError::InvalidSeed { index, len: pairs.len() });
        }

        let build = |&seed: &usize| -> MatchResult<ConsistencySet> {
            if cancel.is_cancelled() {
                return Err(MatchError::Cancelled);
            }
            Ok(self.consistency_set(pairs, seed))
        };

        let sets: Vec<ConsistencySet> = if self.parallel {
            seeds.par_iter().map(build).collect::<MatchResult<_>>()?
        } else {
            seeds.iter().map(build).collect::<MatchResult<_>>()?
        };

        for (k, set) in sets.iter().enumerate() {
            debug!("seed {} (match {}): {} consistent matches", k, set.seed_index, set.len());
        }

        let mut winner: Option<ConsistencySet> = None;
        for set in sets {
            if winner.as_ref().map_or(true, |w| set.len() > w.len()) {
                winner = Some(set);
            }
        }

        match winner {
            Some(set) if !set.is_empty() => {
                info!(
                    "kept {} of {} matches consistent with match {}",
                    set.len(),
                    pairs.len(),
                    set.seed_index
                );
                Ok(set)
            }
            _ => Err(MatchError::NoConsistentMatches),
        }
    }

    /// Every match in `pairs` (in order) that agrees with `pairs[seed]`
    pub fn consistency_set(&self, pairs: &[MatchedPair], seed: usize) -> ConsistencySet {
        let reference = &pairs[seed];
        ConsistencySet {
            seed_index: seed,
            pairs: pairs
                .iter()
                .filter(|candidate| self.agrees(reference, candidate))
                .copied()
                .collect(),
        }
    }

    pub fn agrees(&self, seed: &MatchedPair, candidate: &MatchedPair) -> bool {
        match self.agreement {
            AgreementModel::PerImage => {
                self.orientation_agrees(seed.a.orientation, candidate.a.orientation)
                    && self.orientation_agrees(seed.b.orientation, candidate.b.orientation)
                    && self.scale_agrees(seed.a.scale, candidate.a.scale)
                    && self.scale_agrees(seed.b.scale, candidate.b.scale)
            }
            AgreementModel::RelativeChange => {
                let rotation = |m: &MatchedPair| wrap_angle(m.b.orientation - m.a.orientation);
                let zoom = |m: &MatchedPair| m.b.scale / m.a.scale;
                self.orientation_agrees(rotation(seed), rotation(candidate))
                    && self.scale_agrees(zoom(seed), zoom(candidate))
            }
        }
    }

    fn orientation_agrees(&self, reference: f32, other: f32) -> bool {
        wrap_angle(reference - other).abs() < self.orientation_tolerance
    }

    /// Relative change against `reference`; a non-positive or non-finite
    /// reference agrees with nothing
    fn scale_agrees(&self, reference: f32, other: f32) -> bool {
        if !(reference > 0.0 && reference.is_finite()) {
            return false;
        }
        ((reference - other) / reference).abs() < self.scale_tolerance
    }
}

impl Default for ConsistencyFilter {
    fn default() -> Self {
        Self::new(
            10,
            std::f32::consts::PI / 8.0,
            0.4,
            AgreementModel::PerImage,
            cfg!(feature = "parallel"),
        )
    }
}
