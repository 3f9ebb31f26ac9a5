// TOML configuration, loaded once at startup

use crate::feature_matching::{ConfidenceMetric, FeatureConfig, MatcherConfig, RansacConfig};
use crate::platform::MouseButton;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "auto-click.toml";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pause between iterations
    pub refresh_time_ms: u64,
    pub template_directory: PathBuf,
    pub templates: TemplateConfig,
    pub features: FeatureConfig,
    pub matcher: MatcherConfig,
    pub ransac: RansacConfig,
    pub decision: DecisionConfig,
    pub click: ClickConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_time_ms: 1000,
            template_directory: PathBuf::from("templates"),
            templates: TemplateConfig::default(),
            features: FeatureConfig::default(),
            matcher: MatcherConfig::default(),
            ransac: RansacConfig::default(),
            decision: DecisionConfig::default(),
            click: ClickConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Template names (file stems) tried before all others, in this order
    pub priority: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// A match is acted on only when its confidence is strictly above this
    pub acceptance_threshold: f32,
    pub confidence_metric: ConfidenceMetric,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.7,
            confidence_metric: ConfidenceMetric::Inliers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    /// Capture pixels per screen point
    pub capture_scale: f32,
    /// Standard deviation of the click position, in screen points
    pub spread: f64,
    pub button: MouseButton,
    pub max_resample_attempts: u32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            capture_scale: 2.0,
            spread: 10.0,
            button: MouseButton::Left,
            max_resample_attempts: 16,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigResult<()> {
            Err(ConfigError::Invalid {
                key,
                reason: reason.into(),
            })
        }

        let ratio = self.matcher.ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return invalid("matcher.ratio", format!("{ratio} is not in (0, 1)"));
        }
        let confidence = self.ransac.confidence;
        if !(confidence > 0.0 && confidence < 1.0) {
            return invalid("ransac.confidence", format!("{confidence} is not in (0, 1)"));
        }
        if !(self.ransac.reprojection_threshold > 0.0) {
            return invalid("ransac.reprojection_threshold", "must be positive");
        }
        if self.ransac.min_correspondences < 4 {
            return invalid("ransac.min_correspondences", "a homography needs at least 4");
        }
        if self.ransac.max_iterations == 0 {
            return invalid("ransac.max_iterations", "must be at least 1");
        }
        if !(self.click.capture_scale > 0.0) {
            return invalid("click.capture_scale", "must be positive");
        }
        if !(self.click.spread >= 0.0) {
            return invalid("click.spread", "must not be negative");
        }
        if self.features.patch_size == 0 {
            return invalid("features.patch_size", "must be positive");
        }
        if self.features.smoothing_radius > 8 {
            return invalid("features.smoothing_radius", "must be at most 8");
        }
        if !self.decision.acceptance_threshold.is_finite() {
            return invalid("decision.acceptance_threshold", "must be finite");
        }
        Ok(())
    }
}
