// Feature-based localization of reference images inside screen captures
//
// FeatureExtractor finds FAST corners and describes them with 256-bit BRIEF vectors,
// DescriptorMatcher pairs template and frame descriptors, and Localizer fits a
// RANSAC homography and projects the template origin into the frame.

pub mod config;
pub mod features;
pub mod homography;
pub mod localizer;
pub mod matcher;
pub mod types;


pub use config::{ConfidenceMetric, FeatureConfig, MatcherConfig, RansacConfig};
pub use features::{Detection, FeatureExtractor};
pub use homography::{HomographyError, RansacFit, fit_ransac};
pub use localizer::Localizer;
pub use matcher::DescriptorMatcher;
pub use types::{Correspondence, Descriptor, FeatureSet, Keypoint, LocalizationResult};
