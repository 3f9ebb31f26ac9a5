// Homography estimation: normalized DLT inside a RANSAC loop.

use super::config::RansacConfig;
use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;

/// Four pairs determine a homography
pub const MIN_SAMPLE: usize = 4;

pub type Point = [f64; 2];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomographyError {
    #[error("too few point pairs: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    #[error("point sets differ in length ({src} vs {dst})")]
    LengthMismatch { src: usize, dst: usize },

    #[error("point configuration is degenerate")]
    Degenerate,

    #[error("insufficient inliers: need {needed}, found {found}")]
    InsufficientInliers { needed: usize, found: usize },
}

/// Map a point through `h`. `None` when it lands at infinity.
pub fn project(h: &Matrix3<f64>, point: Point) -> Option<Point> {
    let p = h * Vector3::new(point[0], point[1], 1.0);
    if p[2].abs() < 1e-12 {
        return None;
    }
    let mapped = [p[0] / p[2], p[1] / p[2]];
    (mapped[0].is_finite() && mapped[1].is_finite()).then_some(mapped)
}

pub fn reprojection_error(h: &Matrix3<f64>, src: &Point, dst: &Point) -> f64 {
    match project(h, *src) {
        Some(p) => ((p[0] - dst[0]).powi(2) + (p[1] - dst[1]).powi(2)).sqrt(),
        None => f64::INFINITY,
    }
}

/// Finite and invertible
pub fn is_usable(h: &Matrix3<f64>) -> bool {
    h.iter().all(|v| v.is_finite()) && h.determinant().abs() > 1e-10
}

/// Translate the centroid to the origin and scale the mean distance to sqrt(2).
fn normalize_points(points: &[Point]) -> (Matrix3<f64>, Vec<Point>) {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = points
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();

    (t, normalized)
}

/// Direct linear transform from four or more pairs, `dst ≈ project(H, src)`.
pub fn estimate_dlt(src: &[Point], dst: &[Point]) -> Result<Matrix3<f64>, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < MIN_SAMPLE {
        return Err(HomographyError::TooFewPoints {
            needed: MIN_SAMPLE,
            got: n,
        });
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for i in 0..n {
        let [sx, sy] = src_n[i];
        let [dx, dy] = dst_n[i];

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // Null vector of A = eigenvector of AᵀA with the smallest eigenvalue.
    // A 4-point system is 8x9, too short for a thin SVD to expose it.
    let eig = SymmetricEigen::new(a.transpose() * &a);
    let min_idx = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.abs().total_cmp(&y.1.abs()))
        .map(|(i, _)| i)
        .ok_or(HomographyError::Degenerate)?;
    let v = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], v[8]);

    let t_dst_inv = t_dst.try_inverse().ok_or(HomographyError::Degenerate)?;
    let h = t_dst_inv * h_norm * t_src;

    let scale = h[(2, 2)];
    let h = if scale.abs() > 1e-12 { h / scale } else { h };
    if is_usable(&h) {
        Ok(h)
    } else {
        Err(HomographyError::Degenerate)
    }
}

/// Largest |sin| of the angle between two sides for a triple to count as collinear
const COLLINEAR_SINE: f64 = 1e-3;

/// True when any three of the points are (nearly) collinear, at any scale
fn has_collinear_triple(points: &[Point]) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let [ax, ay] = points[i];
                let [bx, by] = points[j];
                let [cx, cy] = points[k];
                let (ab, ac) = ([bx - ax, by - ay], [cx - ax, cy - ay]);
                let cross = ab[0] * ac[1] - ab[1] * ac[0];
                let sides = ab[0].hypot(ab[1]) * ac[0].hypot(ac[1]);
                if cross.abs() <= COLLINEAR_SINE * sides {
                    return true;
                }
            }
        }
    }
    false
}

/// Iterations needed to draw an all-inlier sample with the given confidence
fn adaptive_iterations(inliers: usize, total: usize, confidence: f64, cap: usize) -> usize {
    let w = inliers as f64 / total as f64;
    let p_clean = w.powi(MIN_SAMPLE as i32);
    if p_clean >= 1.0 {
        return 1.min(cap);
    }
    if p_clean <= f64::EPSILON {
        return cap;
    }
    let k = ((1.0 - confidence).ln() / (1.0 - p_clean).ln()).ceil();
    if k.is_finite() && k >= 1.0 {
        (k as usize).min(cap)
    } else {
        cap
    }
}

#[derive(Debug, Clone)]
pub struct RansacFit {
    pub h: Matrix3<f64>,
    pub inlier_mask: Vec<bool>,
    pub inliers: usize,
    /// Samples drawn before stopping
    pub iterations: usize,
}

fn score(h: &Matrix3<f64>, src: &[Point], dst: &[Point], threshold: f64) -> (usize, Vec<bool>) {
    let mask: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(s, d)| reprojection_error(h, s, d) <= threshold)
        .collect();
    let count = mask.iter().filter(|&&inlier| inlier).count();
    (count, mask)
}

/// Robust fit: the model with the most support among random minimal
/// samples, refit on all of its inliers.
pub fn fit_ransac(src: &[Point], dst: &[Point], config: &RansacConfig) -> Result<RansacFit, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < MIN_SAMPLE {
        return Err(HomographyError::TooFewPoints {
            needed: MIN_SAMPLE,
            got: n,
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let threshold = config.reprojection_threshold;

    let mut best: Option<(Matrix3<f64>, usize, Vec<bool>)> = None;
    let mut limit = config.max_iterations;
    let mut iterations = 0;

    while iterations < limit {
        iterations += 1;

        let sample = rand::seq::index::sample(&mut rng, n, MIN_SAMPLE);
        let s4: Vec<Point> = sample.iter().map(|i| src[i]).collect();
        let d4: Vec<Point> = sample.iter().map(|i| dst[i]).collect();
        if has_collinear_triple(&s4) || has_collinear_triple(&d4) {
            continue;
        }

        let Ok(h) = estimate_dlt(&s4, &d4) else {
            continue;
        };

        let (count, mask) = score(&h, src, dst, threshold);
        if best.as_ref().is_none_or(|(_, best_count, _)| count > *best_count) {
            limit = adaptive_iterations(count, n, config.confidence, config.max_iterations).max(iterations);
            best = Some((h, count, mask));
        }
    }

    let needed = config.min_inliers.max(MIN_SAMPLE);
    let Some((best_h, best_count, best_mask)) = best else {
        return Err(HomographyError::Degenerate);
    };
    if best_count < needed {
        return Err(HomographyError::InsufficientInliers {
            needed,
            found: best_count,
        });
    }

    let inlier_src: Vec<Point> = (0..n).filter(|&i| best_mask[i]).map(|i| src[i]).collect();
    let inlier_dst: Vec<Point> = (0..n).filter(|&i| best_mask[i]).map(|i| dst[i]).collect();

    // Keep the sampled model if the refit loses support
    let (h, inliers, inlier_mask) = match estimate_dlt(&inlier_src, &inlier_dst) {
        Ok(refit) => {
            let (count, mask) = score(&refit, src, dst, threshold);
            if count >= best_count {
                (refit, count, mask)
            } else {
                (best_h, best_count, best_mask)
            }
        }
        Err(_) => (best_h, best_count, best_mask),
    };

    Ok(RansacFit {
        h,
        inlier_mask,
        inliers,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn known_homography() -> Matrix3<f64> {
        Matrix3::new(1.1, 0.05, 40.0, -0.03, 0.95, 25.0, 0.0001, -0.0002, 1.0)
    }

    fn grid_points() -> Vec<Point> {
        let mut points = Vec::new();
        for gy in 0..5 {
            for gx in 0..6 {
                points.push([gx as f64 * 17.0 + (gy as f64) * 1.3, gy as f64 * 13.0 + (gx as f64) * 0.7]);
            }
        }
        points
    }

    #[test]
    fn test_project_identity() {
        let p = project(&Matrix3::identity(), [12.5, -3.0]).unwrap();
        assert!((p[0] - 12.5).abs() < 1e-12);
        assert!((p[1] + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_project_at_infinity_is_none() {
        let h = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
        assert!(project(&h, [0.0, 5.0]).is_none());
    }

    #[test]
    fn test_dlt_recovers_exact_homography() {
        let h_true = known_homography();
        let src = grid_points();
        let dst: Vec<Point> = src.iter().map(|p| project(&h_true, *p).unwrap()).collect();

        let h = estimate_dlt(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(&dst) {
            assert!(reprojection_error(&h, s, d) < 1e-6);
        }
    }

    #[test]
    fn test_dlt_rejects_too_few_points() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            estimate_dlt(&pts, &pts),
            Err(HomographyError::TooFewPoints { needed: 4, got: 3 })
        );
    }

    #[test]
    fn test_collinear_triples_are_detected() {
        assert!(has_collinear_triple(&[[0.0, 0.0], [1.0, 1.0], [5.0, 5.0], [0.0, 3.0]]));
        assert!(!has_collinear_triple(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]));
    }

    #[test]
    fn test_collinearity_tolerance_follows_point_spread() {
        // 0.05 px off a 2000 px line
        let nearly = [[0.0, 0.0], [1000.0, 0.0], [2000.0, 0.05], [0.0, 500.0]];
        assert!(has_collinear_triple(&nearly));

        let tiny_square = [[0.0, 0.0], [1e-4, 0.0], [1e-4, 1e-4], [0.0, 1e-4]];
        assert!(!has_collinear_triple(&tiny_square));
        assert!(has_collinear_triple(&[[3.0, 3.0], [3.0, 3.0], [7.0, 1.0], [0.0, 9.0]]));
    }

    #[test]
    fn test_ransac_ignores_outliers() {
        let h_true = known_homography();
        let mut src = grid_points();
        let mut dst: Vec<Point> = src.iter().map(|p| project(&h_true, *p).unwrap()).collect();

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            src.push([rng.random_range(0.0..100.0), rng.random_range(0.0..60.0)]);
            dst.push([rng.random_range(0.0..300.0), rng.random_range(0.0..300.0)]);
        }

        let fit = fit_ransac(&src, &dst, &RansacConfig::default()).unwrap();
        assert!(fit.inliers >= 30, "only {} inliers", fit.inliers);
        assert!(fit.inlier_mask[..30].iter().all(|&m| m));
        for p in grid_points() {
            let expected = project(&h_true, p).unwrap();
            let got = project(&fit.h, p).unwrap();
            assert!((expected[0] - got[0]).abs() < 0.5);
            assert!((expected[1] - got[1]).abs() < 0.5);
        }
    }

    #[test]
    fn test_ransac_fails_on_collinear_points() {
        let src: Vec<Point> = (0..8).map(|i| [i as f64 * 5.0, i as f64 * 2.0]).collect();
        let dst: Vec<Point> = src.iter().map(|p| [p[0] + 10.0, p[1] + 10.0]).collect();
        assert!(fit_ransac(&src, &dst, &RansacConfig::default()).is_err());
    }

    #[test]
    fn test_ransac_is_reproducible_for_a_seed() {
        let h_true = known_homography();
        let src = grid_points();
        let dst: Vec<Point> = src.iter().map(|p| project(&h_true, *p).unwrap()).collect();
        let config = RansacConfig {
            seed: 99,
            ..RansacConfig::default()
        };

        let a = fit_ransac(&src, &dst, &config).unwrap();
        let b = fit_ransac(&src, &dst, &config).unwrap();
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.h, b.h);
    }

    #[test]
    fn test_adaptive_iterations_shrink_with_inlier_ratio() {
        let low = adaptive_iterations(10, 100, 0.995, 2000);
        let high = adaptive_iterations(90, 100, 0.995, 2000);
        assert!(high < low);
        assert_eq!(adaptive_iterations(0, 100, 0.995, 2000), 2000);
        assert_eq!(adaptive_iterations(100, 100, 0.995, 2000), 1);
    }
}
