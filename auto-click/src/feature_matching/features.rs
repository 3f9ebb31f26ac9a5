// FAST corner detection with upright BRIEF descriptors over box-smoothed samples

use super::config::FeatureConfig;
use super::types::{DESCRIPTOR_BYTES, Descriptor, FeatureSet, Keypoint};
use image::{GrayImage, Luma};
use imageproc::corners::{Corner, corners_fast9};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use std::cmp::Ordering;
use std::collections::HashMap;

const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;

/// Point-pair tests in units of the pattern radius.
///
/// Drawn once from an isotropic gaussian (sigma = 0.4 radius) with a
/// fixed seed, so every image is described with the same tests.
static BRIEF_PATTERN: Lazy<[[f32; 4]; DESCRIPTOR_BITS]> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(42);
    let mut pattern = [[0.0f32; 4]; DESCRIPTOR_BITS];
    for test in pattern.iter_mut() {
        for coord in test.iter_mut() {
            let v: f32 = rng.sample(StandardNormal);
            *coord = (v * 0.4).clamp(-1.0, 1.0);
        }
    }
    pattern
});

/// Keypoints of one image plus the integral image their descriptors are read from
#[derive(Debug, Clone)]
pub struct Detection {
    keypoints: Vec<Keypoint>,
    integral: Image<Luma<u64>>,
    width: u32,
    height: u32,
}

impl Detection {
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }
}

/// Turns images into keypoints and descriptors
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Detect and describe a template-sized image at the radius that fits it.
    /// A zero-area or textureless image yields an empty set.
    pub fn extract_gray(&self, gray: &GrayImage) -> FeatureSet {
        let radius = self.descriptor_radius(gray.width(), gray.height());
        self.describe(&self.detect(gray), radius)
    }

    /// Pattern radius for an image of this size.
    ///
    /// The configured patch radius, shrunk so a keypoint's sampling window
    /// spans at most a quarter of the shorter side.
    pub fn descriptor_radius(&self, width: u32, height: u32) -> u32 {
        let patch = (self.config.patch_size / 2).max(1);
        let fit = (width.min(height) / 4).saturating_sub(self.config.smoothing_radius);
        patch.min(fit).max(1)
    }

    pub fn detect(&self, gray: &GrayImage) -> Detection {
        let (width, height) = gray.dimensions();
        let keypoints = if width == 0 || height == 0 {
            Vec::new()
        } else {
            self.select_keypoints(corners_fast9(gray, self.config.fast_threshold))
        };
        log::trace!("{} keypoints kept in {width}x{height} image", keypoints.len());

        Detection {
            keypoints,
            integral: integral_image::<_, u64>(gray),
            width,
            height,
        }
    }

    /// Describe every keypoint whose sampling window lies inside the image.
    ///
    /// Descriptors read nothing outside `radius + smoothing_radius` of their
    /// keypoint, so a keypoint and its surroundings pasted into another image
    /// get the same descriptor there.
    pub fn describe(&self, detection: &Detection, radius: u32) -> FeatureSet {
        let smoothing = self.config.smoothing_radius;
        let window = radius + smoothing;
        let fits = |v: f32, size: u32| {
            let v = v as u32;
            v >= window && v + window < size
        };

        detection
            .keypoints
            .iter()
            .filter(|k| fits(k.x, detection.width) && fits(k.y, detection.height))
            .map(|k| (*k, brief_descriptor(&detection.integral, k, radius, smoothing)))
            .collect()
    }

    /// Strongest-first non-maximum suppression, capped at `max_keypoints`.
    fn select_keypoints(&self, mut corners: Vec<Corner>) -> Vec<Keypoint> {
        // Ties broken by position so the result does not depend on scan order
        corners.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
        });

        let radius = self.config.nms_radius;
        let max = self.config.max_keypoints;
        let mut selected: Vec<Keypoint> = Vec::with_capacity(max.min(corners.len()));

        if radius <= 0.0 {
            selected.extend(
                corners
                    .into_iter()
                    .take(max)
                    .map(|c| Keypoint::new(c.x as f32, c.y as f32, c.score)),
            );
            return selected;
        }

        let radius_sq = radius * radius;
        let mut grid: HashMap<(i32, i32), Vec<(f32, f32)>> = HashMap::new();

        for corner in corners {
            if selected.len() >= max {
                break;
            }
            let (x, y) = (corner.x as f32, corner.y as f32);
            let cell = ((x / radius) as i32, (y / radius) as i32);

            let suppressed = (-1..=1).any(|dy| {
                (-1..=1).any(|dx| {
                    grid.get(&(cell.0 + dx, cell.1 + dy)).is_some_and(|points| {
                        points.iter().any(|&(px, py)| {
                            let (ex, ey) = (px - x, py - y);
                            ex * ex + ey * ey < radius_sq
                        })
                    })
                })
            });

            if !suppressed {
                grid.entry(cell).or_default().push((x, y));
                selected.push(Keypoint::new(x, y, corner.score));
            }
        }

        selected
    }
}

/// Caller guarantees the window around `keypoint` is inside the image
fn brief_descriptor(integral: &Image<Luma<u64>>, keypoint: &Keypoint, radius: u32, smoothing: u32) -> Descriptor {
    let (cx, cy) = (keypoint.x as i64, keypoint.y as i64);
    let scale = radius as f32;
    let offset = |v: f32| (v * scale).round() as i64;

    let mut descriptor = [0u8; DESCRIPTOR_BYTES];
    for (bit, &[x1, y1, x2, y2]) in BRIEF_PATTERN.iter().enumerate() {
        let first = box_sum(integral, cx + offset(x1), cy + offset(y1), smoothing);
        let second = box_sum(integral, cx + offset(x2), cy + offset(y2), smoothing);
        if first < second {
            descriptor[bit / 8] |= 1 << (bit % 8);
        }
    }
    descriptor
}

/// Sum of the (2k+1)x(2k+1) box centred on (x, y)
fn box_sum(integral: &Image<Luma<u64>>, x: i64, y: i64, k: u32) -> u64 {
    let k = k as i64;
    sum_image_pixels(
        integral,
        (x - k) as u32,
        (y - k) as u32,
        (x + k) as u32,
        (y + k) as u32,
    )[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BACKGROUND, template_a};
    use image::DynamicImage;

    fn gray_template_a() -> GrayImage {
        DynamicImage::ImageRgba8(template_a()).to_luma8()
    }

    #[test]
    fn test_blank_image_has_no_features() {
        let blank = GrayImage::from_pixel(64, 64, Luma([BACKGROUND]));
        let features = FeatureExtractor::default().extract_gray(&blank);
        assert!(features.is_empty());
    }

    #[test]
    fn test_zero_area_image_has_no_features() {
        let empty = GrayImage::new(0, 0);
        assert!(FeatureExtractor::default().extract_gray(&empty).is_empty());
        let line = GrayImage::new(40, 0);
        assert!(FeatureExtractor::default().extract_gray(&line).is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = FeatureExtractor::default();
        let image = gray_template_a();
        let first = extractor.extract_gray(&image);
        let second = extractor.extract_gray(&image);

        assert!(!first.is_empty());
        assert_eq!(first.keypoints(), second.keypoints());
        assert_eq!(first.descriptors(), second.descriptors());
    }

    #[test]
    fn test_keypoint_count_is_bounded() {
        let config = FeatureConfig {
            max_keypoints: 3,
            ..FeatureConfig::default()
        };
        let features = FeatureExtractor::new(config).extract_gray(&gray_template_a());
        assert_eq!(features.len(), 3);
        assert_eq!(features.keypoints().len(), features.descriptors().len());
    }

    #[test]
    fn test_suppression_keeps_corners_apart() {
        let features = FeatureExtractor::default().extract_gray(&gray_template_a());
        let points = features.keypoints();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let d2 = (a.x - b.x).powi(2) + (a.y - b.y).powi(2);
                assert!(d2 >= 9.0, "({}, {}) too close to ({}, {})", a.x, a.y, b.x, b.y);
            }
        }
    }

    #[test]
    fn test_radius_shrinks_for_small_images() {
        let extractor = FeatureExtractor::default();
        assert_eq!(extractor.descriptor_radius(32, 32), 6);
        assert_eq!(extractor.descriptor_radius(48, 32), 6);
        assert_eq!(extractor.descriptor_radius(800, 600), 15);
        assert_eq!(extractor.descriptor_radius(8, 8), 1);
    }

    #[test]
    fn test_keypoints_near_the_border_are_not_described() {
        let extractor = FeatureExtractor::default();
        let gray = gray_template_a();
        let detection = extractor.detect(&gray);
        let radius = extractor.descriptor_radius(32, 32);
        let features = extractor.describe(&detection, radius);

        assert!(!features.is_empty());
        for k in features.keypoints() {
            assert!(k.x >= 8.0 && k.x < 24.0 && k.y >= 8.0 && k.y < 24.0, "({}, {})", k.x, k.y);
        }
        // A radius too wide for the image leaves nothing to describe
        assert!(extractor.describe(&detection, 15).is_empty());
    }

    #[test]
    fn test_descriptors_ignore_pixels_outside_the_window() {
        let extractor = FeatureExtractor::default();
        let gray = gray_template_a();
        let radius = extractor.descriptor_radius(32, 32);
        let alone = extractor.describe(&extractor.detect(&gray), radius);

        for surround in [0u8, 255] {
            let mut wide = GrayImage::from_pixel(96, 96, Luma([surround]));
            image::imageops::replace(&mut wide, &gray, 32, 32);
            let embedded = extractor.describe(&extractor.detect(&wide), radius);

            for (k, d) in alone.keypoints().iter().zip(alone.descriptors()) {
                let twin = embedded
                    .keypoints()
                    .iter()
                    .position(|e| e.x == k.x + 32.0 && e.y == k.y + 32.0);
                let Some(i) = twin else {
                    panic!("keypoint ({}, {}) lost on background {surround}", k.x, k.y);
                };
                assert_eq!(embedded.descriptors()[i], *d);
            }
        }
    }
}
