// Places a template inside a frame from its feature correspondences

use super::config::{ConfidenceMetric, RansacConfig};
use super::homography::{Point, fit_ransac, project};
use super::types::{Correspondence, FeatureSet, LocalizationResult};
use nalgebra::Matrix3;

#[derive(Debug, Clone, Default)]
pub struct Localizer {
    ransac: RansacConfig,
    metric: ConfidenceMetric,
}

impl Localizer {
    pub fn new(ransac: RansacConfig, metric: ConfidenceMetric) -> Self {
        Self { ransac, metric }
    }

    /// Fit template→frame and project the template origin.
    ///
    /// Too few correspondences, no consensus, or a transform that folds
    /// the template outline all produce a `found == false` result.
    pub fn localize(
        &self,
        correspondences: &[Correspondence],
        template: &FeatureSet,
        frame: &FeatureSet,
        template_size: (u32, u32),
    ) -> LocalizationResult {
        let survivors = correspondences.len();
        if survivors < self.ransac.min_correspondences {
            return LocalizationResult::not_found(survivors);
        }

        let (src, dst): (Vec<Point>, Vec<Point>) = correspondences
            .iter()
            .filter_map(|c| {
                let t = template.keypoint(c.template_index)?;
                let f = frame.keypoint(c.frame_index)?;
                Some(([t.x as f64, t.y as f64], [f.x as f64, f.y as f64]))
            })
            .unzip();

        let fit = match fit_ransac(&src, &dst, &self.ransac) {
            Ok(fit) => fit,
            Err(e) => {
                log::debug!("homography rejected: {e}");
                return LocalizationResult::not_found(survivors);
            }
        };

        if !outline_is_plausible(&fit.h, template_size) {
            log::debug!("homography folds the {}x{} template outline", template_size.0, template_size.1);
            return LocalizationResult::not_found(survivors);
        }

        let Some([x, y]) = project(&fit.h, [0.0, 0.0]) else {
            return LocalizationResult::not_found(survivors);
        };

        let confidence = match self.metric {
            ConfidenceMetric::Inliers => fit.inliers as f32,
            ConfidenceMetric::RatioSurvivors => survivors as f32,
        };

        LocalizationResult {
            found: true,
            top_left_x: x.round() as i32,
            top_left_y: y.round() as i32,
            confidence,
            correspondences: survivors,
            inliers: fit.inliers,
        }
    }
}

/// The projected template rectangle must stay a convex quad with some area.
fn outline_is_plausible(h: &Matrix3<f64>, (width, height): (u32, u32)) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    let (w, h_) = (width as f64, height as f64);
    let corners = [[0.0, 0.0], [w, 0.0], [w, h_], [0.0, h_]];

    let mut quad = [[0.0f64; 2]; 4];
    for (slot, corner) in quad.iter_mut().zip(corners) {
        match project(h, corner) {
            Some(p) => *slot = p,
            None => return false,
        }
    }

    let mut sign = 0.0f64;
    let mut area = 0.0;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let c = quad[(i + 2) % 4];
        let cross = (b[0] - a[0]) * (c[1] - b[1]) - (b[1] - a[1]) * (c[0] - b[0]);
        if cross.abs() < 1e-9 || (sign != 0.0 && cross.signum() != sign) {
            return false;
        }
        sign = cross.signum();
        area += a[0] * b[1] - b[0] * a[1];
    }

    (area / 2.0).abs() >= 1.0
}
