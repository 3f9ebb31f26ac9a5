// Randomized click placement inside a matched region

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Screen rectangle a click must land in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ClickRegion {
    /// Map a match found in capture pixels to screen coordinates.
    ///
    /// Captures can be larger than the logical screen (HiDPI), so the
    /// top-left and size are divided by `scale` and floored.
    pub fn from_match(top_left_x: i32, top_left_y: i32, template_size: (u32, u32), scale: f32) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        Self {
            x: (top_left_x as f32 / scale).floor() as i32,
            y: (top_left_y as f32 / scale).floor() as i32,
            width: (template_size.0 as f32 / scale).floor() as u32,
            height: (template_size.1 as f32 / scale).floor() as u32,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Inclusive of the far edges
    pub fn contains(&self, target: &ClickTarget) -> bool {
        target.x >= self.x
            && target.x <= self.x + self.width as i32
            && target.y >= self.y
            && target.y <= self.y + self.height as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickTarget {
    pub x: i32,
    pub y: i32,
}

/// Draws click points from a normal distribution centred on the region
#[derive(Debug, Clone)]
pub struct ClickSampler {
    spread: f64,
    max_attempts: u32,
}

impl Default for ClickSampler {
    fn default() -> Self {
        Self::new(10.0, 16)
    }
}

impl ClickSampler {
    pub fn new(spread: f64, max_attempts: u32) -> Self {
        Self {
            spread: if spread.is_finite() { spread.max(0.0) } else { 0.0 },
            max_attempts,
        }
    }

    pub fn spread(&self) -> f64 {
        self.spread
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, region: &ClickRegion) -> ClickTarget {
        let (cx, cy) = region.center();
        ClickTarget {
            x: self.sample_axis(rng, cx, region.x, region.width),
            y: self.sample_axis(rng, cy, region.y, region.height),
        }
    }

    /// One coordinate in `[start, start + len]`: resample while out of range,
    /// then clamp
    fn sample_axis<R: Rng + ?Sized>(&self, rng: &mut R, mean: f64, start: i32, len: u32) -> i32 {
        let low = start as f64;
        let high = start as f64 + len as f64;

        let Ok(normal) = Normal::new(mean, self.spread) else {
            return mean.round().clamp(low, high) as i32;
        };

        let mut value = mean;
        for _ in 0..self.max_attempts.max(1) {
            value = normal.sample(rng).round();
            if (low..=high).contains(&value) {
                return value as i32;
            }
        }
        value.clamp(low, high) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_from_match_floors_after_scaling() {
        let region = ClickRegion::from_match(101, 99, (33, 32), 2.0);
        assert_eq!(region, ClickRegion { x: 50, y: 49, width: 16, height: 16 });

        let unscaled = ClickRegion::from_match(7, 9, (10, 12), 1.0);
        assert_eq!(unscaled, ClickRegion { x: 7, y: 9, width: 10, height: 12 });
    }

    #[test]
    fn test_clicks_stay_inside_region() {
        let sampler = ClickSampler::default();
        let region = ClickRegion { x: 40, y: 300, width: 12, height: 5 };
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10_000 {
            let target = sampler.sample(&mut rng, &region);
            assert!(region.contains(&target), "{target:?} outside {region:?}");
        }
    }

    #[test]
    fn test_mean_converges_to_centre() {
        let sampler = ClickSampler::new(3.0, 16);
        let region = ClickRegion { x: 100, y: 200, width: 60, height: 40 };
        let mut rng = StdRng::seed_from_u64(11);

        let n = 10_000;
        let (mut sx, mut sy) = (0i64, 0i64);
        for _ in 0..n {
            let t = sampler.sample(&mut rng, &region);
            sx += t.x as i64;
            sy += t.y as i64;
        }
        let (mx, my) = (sx as f64 / n as f64, sy as f64 / n as f64);
        assert!((mx - 130.0).abs() < 0.5, "mean x {mx}");
        assert!((my - 220.0).abs() < 0.5, "mean y {my}");
    }

    #[test]
    fn test_zero_spread_returns_centre() {
        let sampler = ClickSampler::new(0.0, 16);
        let region = ClickRegion { x: 10, y: 20, width: 8, height: 6 };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sampler.sample(&mut rng, &region), ClickTarget { x: 14, y: 23 });
    }

    #[test]
    fn test_zero_size_region_returns_its_corner() {
        let sampler = ClickSampler::default();
        let region = ClickRegion { x: 5, y: 9, width: 0, height: 0 };
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(sampler.sample(&mut rng, &region), ClickTarget { x: 5, y: 9 });
        }
    }

    #[test]
    fn test_negative_spread_is_treated_as_zero() {
        assert_eq!(ClickSampler::new(-4.0, 16).spread(), 0.0);
        assert_eq!(ClickSampler::new(f64::NAN, 16).spread(), 0.0);
    }
}
