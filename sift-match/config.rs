use std::f32::consts::PI;

use sift_core::MatchConfig;
use crate::builder::MatcherBuilder;
use crate::consistency::AgreementModel;
use crate::error::{MatchError, MatchResult};
use crate::matcher::CandidatePolicy;

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Complete matching pipeline configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Numeric thresholds
    pub core: MatchConfig,
    /// Policy when image B has fewer than two descriptors
    #[cfg_attr(feature = "serde", serde(default))]
    pub candidate_policy: CandidatePolicy,
    /// Consistency test flavour
    #[cfg_attr(feature = "serde", serde(default))]
    pub agreement: AgreementModel,
    /// Spread queries and seeds over the rayon pool
    pub parallel: bool,
    /// Fixed seed for hypothesis sampling; fresh entropy when absent
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub seed: Option<u64>,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub version: Option<String>,
}

impl PipelineConfig {
    /// Create new configuration with default settings
    pub fn new() -> Self {
        Self {
            core: MatchConfig::default(),
            candidate_policy: CandidatePolicy::Fail,
            agreement: AgreementModel::PerImage,
            parallel: cfg!(feature = "parallel"),
            seed: None,
            name: None,
            description: None,
            version: None,
        }
    }

    /// Fewer, more reliable matches
    pub fn strict_preset() -> Self {
        Self {
            core: MatchConfig {
                ratio_threshold: 0.7,
                sample_size: 20,
                orientation_tolerance: PI / 12.0,
                scale_tolerance: 0.25,
                ..MatchConfig::default()
            },
            candidate_policy: CandidatePolicy::Fail,
            agreement: AgreementModel::PerImage,
            parallel: cfg!(feature = "parallel"),
            seed: None,
            name: Some("Strict".to_string()),
            description: Some("Tight ratio test and narrow geometric tolerances".to_string()),
            version: Some("1.0".to_string()),
        }
    }

    /// More matches on repetitive or low-texture scenes
    pub fn permissive_preset() -> Self {
        Self {
            core: MatchConfig {
                ratio_threshold: 0.9,
                sample_size: 10,
                orientation_tolerance: PI / 6.0,
                scale_tolerance: 0.5,
                ..MatchConfig::default()
            },
            candidate_policy: CandidatePolicy::Skip,
            agreement: AgreementModel::PerImage,
            parallel: cfg!(feature = "parallel"),
            seed: None,
            name: Some("Permissive".to_string()),
            description: Some("Loose ratio test, wide tolerances, tolerates tiny candidate sets".to_string()),
            version: Some("1.0".to_string()),
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Convert to MatcherBuilder for further customization
    pub fn to_builder(self) -> MatcherBuilder {
        MatcherBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "PipelineConfig: ratio<{:.2}, samples={}, orientation±{:.3}rad, scale±{:.2}, agreement={:?}, candidates={:?}, threads={}, parallel={}, seed={}",
            self.core.ratio_threshold,
            self.core.sample_size,
            self.core.orientation_tolerance,
            self.core.scale_tolerance,
            self.agreement,
            self.candidate_policy,
            self.core.n_threads,
            self.parallel,
            self.seed.map_or_else(|| "random".to_string(), |s| s.to_string())
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> MatchResult<()> {
        let core = &self.core;
        if !(core.ratio_threshold > 0.0 && core.ratio_threshold <= 1.0) {
            return Err(MatchError::InvalidConfig(format!(
                "ratio threshold {} outside (0, 1]",
                core.ratio_threshold
            )));
        }
        if core.sample_size == 0 {
            return Err(MatchError::InvalidConfig("sample size must be at least 1".to_string()));
        }
        if !(core.orientation_tolerance > 0.0 && core.orientation_tolerance.is_finite()) {
            return Err(MatchError::InvalidConfig(format!(
                "orientation tolerance {} must be positive",
                core.orientation_tolerance
            )));
        }
        if !(core.scale_tolerance > 0.0 && core.scale_tolerance.is_finite()) {
            return Err(MatchError::InvalidConfig(format!(
                "scale tolerance {} must be positive",
                core.scale_tolerance
            )));
        }
        if core.n_threads == 0 {
            return Err(MatchError::InvalidConfig("thread count must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `.json` or `.toml`, chosen by extension
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::load_json(path),
            Some("toml") => Self::load_toml(path),
            other => Err(format!("unsupported config extension {:?} (expected json or toml)", other).into()),
        }
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let cfg = PipelineConfig::new();
        assert_eq!(cfg.core.ratio_threshold, 0.82);
        assert_eq!(cfg.core.sample_size, 10);
        assert_eq!(cfg.core.scale_tolerance, 0.4);
        assert_eq!(cfg.candidate_policy, CandidatePolicy::Fail);
        assert_eq!(cfg.agreement, AgreementModel::PerImage);
        assert!(cfg.seed.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(PipelineConfig::strict_preset().validate().is_ok());
        assert!(PipelineConfig::permissive_preset().validate().is_ok());
        assert_eq!(PipelineConfig::permissive_preset().candidate_policy, CandidatePolicy::Skip);
    }

    #[test]
    fn test_validation_failures() {
        let mut cfg = PipelineConfig::new();
        cfg.core.ratio_threshold = 0.0;
        assert!(matches!(cfg.validate(), Err(MatchError::InvalidConfig(_))));
        cfg.core.ratio_threshold = 1.5;
        assert!(cfg.validate().is_err());
        cfg.core.ratio_threshold = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::new();
        cfg.core.sample_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::new();
        cfg.core.orientation_tolerance = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::new();
        cfg.core.scale_tolerance = f32::INFINITY;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::new();
        cfg.core.n_threads = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_metadata_and_summary() {
        let cfg = PipelineConfig::new().with_metadata("Lab", "Bench setup").with_seed(7);
        assert_eq!(cfg.name.as_deref(), Some("Lab"));
        assert_eq!(cfg.version.as_deref(), Some("1.0"));
        let summary = cfg.summary();
        assert!(summary.contains("ratio<0.82"));
        assert!(summary.contains("seed=7"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let cfg = PipelineConfig::strict_preset().with_seed(99);
        let json = cfg.to_json().unwrap();
        let back = PipelineConfig::from_json(&json).unwrap();
        assert_eq!(back.core.ratio_threshold, cfg.core.ratio_threshold);
        assert_eq!(back.seed, Some(99));
        assert_eq!(back.name, cfg.name);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_enums_are_kebab_case() {
        let mut cfg = PipelineConfig::new();
        cfg.agreement = AgreementModel::RelativeChange;
        cfg.candidate_policy = CandidatePolicy::Skip;
        let text = cfg.to_toml().unwrap();
        assert!(text.contains("agreement = \"relative-change\""));
        assert!(text.contains("candidate_policy = \"skip\""));
        let back = PipelineConfig::from_toml(&text).unwrap();
        assert_eq!(back.agreement, AgreementModel::RelativeChange);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_invalid_config_rejected_on_load() {
        let mut cfg = PipelineConfig::new();
        cfg.core.sample_size = 0;
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(PipelineConfig::from_json(&json).is_err());
    }
}
