use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of values in a SIFT descriptor
pub const DESCRIPTOR_LEN: usize = 128;

/// Extension of the companion raster image
pub const IMAGE_EXTENSION: &str = "pgm";

/// Key-point ≙ SIFT location + scale + dominant orientation (radians, [-π, π])
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub row: f32,
    pub col: f32,
    pub scale: f32,
    pub orientation: f32,
}

impl Keypoint {
    pub fn new(row: f32, col: f32, scale: f32, orientation: f32) -> Self {
        Self { row, col, scale, orientation }
    }

    /// Pixel position as `(row, col)`
    pub fn position(&self) -> (f32, f32) {
        (self.row, self.col)
    }
}

/// Unit-length 128-dimensional descriptor
pub type Descriptor = [f32; DESCRIPTOR_LEN];

/// Keypoints and descriptors of one image, index-aligned.
///
/// Read-only once built; the loader is the only producer in this workspace.
#[derive(Debug, Clone)]
pub struct KeypointSet {
    image_id: String,
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl KeypointSet {
    /// Panics if `keypoints` and `descriptors` differ in length.
    pub fn new(image_id: impl Into<String>, keypoints: Vec<Keypoint>, descriptors: Vec<Descriptor>) -> Self {
        assert_eq!(
            keypoints.len(),
            descriptors.len(),
            "keypoints and descriptors must be index-aligned"
        );
        Self {
            image_id: image_id.into(),
            keypoints,
            descriptors,
        }
    }

    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Keypoint and descriptor at `index`
    pub fn get(&self, index: usize) -> Option<(&Keypoint, &Descriptor)> {
        Some((self.keypoints.get(index)?, self.descriptors.get(index)?))
    }

    /// Path of the raster image paired with this dataset by base name
    pub fn companion_image(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("{}.{}", self.image_id, IMAGE_EXTENSION))
    }
}

/// One keypoint from image A matched to one keypoint from image B
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchedPair {
    pub a: Keypoint,
    pub b: Keypoint,
}

impl MatchedPair {
    pub fn new(a: Keypoint, b: Keypoint) -> Self {
        Self { a, b }
    }

    /// `((rowA, colA), (rowB, colB))`, the renderer's view of a match
    pub fn endpoints(&self) -> ((f32, f32), (f32, f32)) {
        (self.a.position(), self.b.position())
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchConfig {
    /// Best / second-best distance must fall below this
    pub ratio_threshold: f32,
    /// Number of seed hypotheses drawn by the consistency filter
    pub sample_size: usize,
    /// Radians
    pub orientation_tolerance: f32,
    /// Relative scale change
    pub scale_tolerance: f32,
    pub n_threads: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.82,
            sample_size: 10,
            orientation_tolerance: std::f32::consts::PI / 8.0,
            scale_tolerance: 0.4,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Shared flag polled between outer-loop iterations of long computations
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(axis: usize) -> Descriptor {
        let mut d = [0.0; DESCRIPTOR_LEN];
        d[axis] = 1.0;
        d
    }

    #[test]
    fn test_keypoint_set_alignment() {
        let set = KeypointSet::new(
            "scene",
            vec![Keypoint::new(1.0, 2.0, 3.0, 0.5), Keypoint::new(4.0, 5.0, 6.0, -0.5)],
            vec![unit(0), unit(1)],
        );
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
        assert_eq!(set.image_id(), "scene");
        let (kp, desc) = set.get(1).unwrap();
        assert_eq!(kp.row, 4.0);
        assert_eq!(desc[1], 1.0);
        assert!(set.get(2).is_none());
    }

    #[test]
    #[should_panic(expected = "index-aligned")]
    fn test_keypoint_set_rejects_misaligned() {
        KeypointSet::new("scene", vec![Keypoint::new(0.0, 0.0, 1.0, 0.0)], vec![]);
    }

    #[test]
    fn test_companion_image_path() {
        let set = KeypointSet::new("library", vec![], vec![]);
        assert_eq!(set.companion_image("data"), Path::new("data").join("library.pgm"));
    }

    #[test]
    fn test_matched_pair_endpoints() {
        let pair = MatchedPair::new(Keypoint::new(10.0, 20.0, 1.0, 0.0), Keypoint::new(30.0, 40.0, 2.0, 0.1));
        assert_eq!(pair.endpoints(), ((10.0, 20.0), (30.0, 40.0)));
    }

    #[test]
    fn test_default_config() {
        let cfg = MatchConfig::default();
        assert_eq!(cfg.ratio_threshold, 0.82);
        assert_eq!(cfg.sample_size, 10);
        assert!((cfg.orientation_tolerance - std::f32::consts::FRAC_PI_8).abs() < 1e-7);
        assert_eq!(cfg.scale_tolerance, 0.4);
        assert!(cfg.n_threads >= 1);
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_pair_serialization() {
        let pair = MatchedPair::new(Keypoint::new(1.0, 2.0, 3.0, 0.25), Keypoint::new(4.0, 5.0, 6.0, -0.25));
        let json = serde_json::to_string(&pair).unwrap();
        let back: MatchedPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
    }
}
