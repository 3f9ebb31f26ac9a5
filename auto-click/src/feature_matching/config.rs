// Tunables for feature extraction, matching and geometric verification

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Intensity difference for the FAST-9 segment test
    pub fast_threshold: u8,
    /// Upper bound on keypoints kept per image, strongest first
    pub max_keypoints: usize,
    /// Corners closer than this (pixels) to a stronger corner are dropped
    pub nms_radius: f32,
    /// Side of the square window sampled by the descriptor, shrunk for small templates
    pub patch_size: u32,
    /// Each descriptor test compares (2k+1)x(2k+1) box sums; 0 compares single pixels
    pub smoothing_radius: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            max_keypoints: 500,
            nms_radius: 3.0,
            patch_size: 31,
            smoothing_radius: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Lowe ratio: keep a match only if best < ratio * second best
    pub ratio: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { ratio: 0.75 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    /// Maximum reprojection error (pixels) for a correspondence to count as an inlier
    pub reprojection_threshold: f64,
    /// Hard cap on sampling iterations
    pub max_iterations: usize,
    /// Probability of drawing at least one outlier-free sample
    pub confidence: f64,
    /// Minimum inliers for the fitted homography to be accepted
    pub min_inliers: usize,
    /// Fewer ratio-test survivors than this skip fitting entirely
    pub min_correspondences: usize,
    /// Seed for sample selection, so localization is reproducible
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            reprojection_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            min_inliers: 5,
            min_correspondences: 5,
            seed: 0,
        }
    }
}

/// Which count is reported as the localization confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceMetric {
    /// Correspondences consistent with the fitted homography
    #[default]
    Inliers,
    /// Correspondences that passed the ratio test, verified or not
    RatioSurvivors,
}
