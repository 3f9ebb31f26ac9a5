// Brute-force k=2 nearest neighbour matching with Lowe's ratio test

use super::config::MatcherConfig;
use super::types::{Correspondence, Descriptor, FeatureSet, hamming_distance};

/// Pairs template descriptors with their nearest frame descriptor
#[derive(Debug, Clone)]
pub struct DescriptorMatcher {
    ratio: f32,
}

impl Default for DescriptorMatcher {
    fn default() -> Self {
        Self::new(&MatcherConfig::default())
    }
}

impl DescriptorMatcher {
    pub fn new(config: &MatcherConfig) -> Self {
        Self::with_ratio(config.ratio)
    }

    pub fn with_ratio(ratio: f32) -> Self {
        Self { ratio }
    }

    /// Find unambiguous correspondences, grouped by ascending template index.
    ///
    /// A template descriptor is kept only when its nearest frame descriptor is
    /// strictly closer than `ratio` times the second nearest. A frame with
    /// fewer than two descriptors therefore produces no correspondences.
    pub fn match_features(&self, template: &FeatureSet, frame: &FeatureSet) -> Vec<Correspondence> {
        if template.is_empty() || frame.is_empty() {
            return Vec::new();
        }

        template
            .descriptors()
            .iter()
            .enumerate()
            .filter_map(|(template_index, descriptor)| {
                let (frame_index, best, second) = two_nearest(descriptor, frame.descriptors())?;
                ((best as f32) < self.ratio * second as f32).then_some(Correspondence {
                    template_index,
                    frame_index,
                    distance: best,
                })
            })
            .collect()
    }
}

/// Index and distance of the nearest candidate, plus the second-nearest distance
fn two_nearest(query: &Descriptor, candidates: &[Descriptor]) -> Option<(usize, u32, u32)> {
    if candidates.len() < 2 {
        return None;
    }

    let mut best = (0usize, u32::MAX);
    let mut second = u32::MAX;
    for (index, candidate) in candidates.iter().enumerate() {
        let distance = hamming_distance(query, candidate);
        if distance < best.1 {
            second = best.1;
            best = (index, distance);
        } else if distance < second {
            second = distance;
        }
    }

    Some((best.0, best.1, second))
}
