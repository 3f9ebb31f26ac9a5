// Finite state machine driving capture -> match -> click
use super::channels::shutdown_requested;
use super::click::{ClickRegion, ClickSampler};
use super::decision::DecisionPolicy;
use super::template::{TemplateImage, TemplateStore};
use super::types::{IterationReport, LoopState, TemplateEvaluation};
use crate::config::AppConfig;
use crate::feature_matching::{DescriptorMatcher, FeatureExtractor, FeatureSet, LocalizationResult, Localizer};
use crate::platform::{MouseButton, PointerInjector, ScreenCapture};
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;

pub struct ControlLoop<'a, C, P, R> {
    state: LoopState,
    store: &'a TemplateStore,
    extractor: FeatureExtractor,
    matcher: DescriptorMatcher,
    localizer: Localizer,
    policy: DecisionPolicy,
    sampler: ClickSampler,
    capture_scale: f32,
    button: MouseButton,
    refresh: Duration,
    capture: C,
    pointer: P,
    rng: R,
    iterations: u64,
}

impl<'a, C, P, R> ControlLoop<'a, C, P, R>
where
    C: ScreenCapture,
    P: PointerInjector,
    R: Rng,
{
    pub fn new(config: &AppConfig, store: &'a TemplateStore, capture: C, pointer: P, rng: R) -> Self {
        Self {
            state: LoopState::Idle,
            store,
            extractor: FeatureExtractor::new(config.features.clone()),
            matcher: DescriptorMatcher::new(&config.matcher),
            localizer: Localizer::new(config.ransac.clone(), config.decision.confidence_metric),
            policy: DecisionPolicy::new(config.decision.acceptance_threshold),
            sampler: ClickSampler::new(config.click.spread, config.click.max_resample_attempts),
            capture_scale: config.click.capture_scale,
            button: config.click.button,
            refresh: Duration::from_millis(config.refresh_time_ms),
            capture,
            pointer,
            rng,
            iterations: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn pointer(&self) -> &P {
        &self.pointer
    }

    fn change_state(&mut self, new_state: LoopState) {
        if self.state != new_state {
            log::trace!("🎮 Loop state: {:?} -> {:?}", self.state, new_state);
            self.state = new_state;
        }
    }

    /// Iterate until shutdown is requested or `max_iterations` have run
    /// (`None` for no limit). Returns the number of completed iterations.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>, max_iterations: Option<u64>) -> u64 {
        log::info!(
            "🚀 Control loop started: {} templates, refresh {:?}",
            self.store.len(),
            self.refresh
        );
        if self.store.is_empty() {
            log::warn!("⚠️ No templates loaded, nothing can be clicked");
        }

        loop {
            if *shutdown.borrow() {
                log::info!("🛑 Shutdown requested");
                break;
            }

            let report = self.run_iteration();
            if let Some(name) = &report.matched {
                log::debug!("Iteration {} clicked '{name}'", report.iteration);
            }

            if let Some(max) = max_iterations
                && self.iterations >= max
            {
                log::info!("⏹️ Completed {max} iterations");
                break;
            }

            self.change_state(LoopState::Sleeping);
            tokio::select! {
                _ = sleep(self.refresh) => {}
                _ = shutdown_requested(&mut shutdown) => {
                    log::info!("🛑 Shutdown requested");
                    break;
                }
            }
        }

        self.change_state(LoopState::Stopped);
        log::info!("🎮 Control loop ended after {} iterations", self.iterations);
        self.iterations
    }

    /// Capture once, try templates in priority order and click the first accepted one
    pub fn run_iteration(&mut self) -> IterationReport {
        self.iterations += 1;
        let mut report = IterationReport::new(self.iterations);

        self.change_state(LoopState::Capturing);
        let started = Instant::now();
        let frame = match self.capture.capture_screen() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("❌ Capture failed: {e}");
                report.capture_error = Some(e.to_string());
                self.change_state(LoopState::Idle);
                return report;
            }
        };
        let capture_time = started.elapsed();
        report.capture_time = Some(capture_time);
        log::debug!("📸 Captured {}x{} in {:?}", frame.width(), frame.height(), capture_time);

        let detection = self.extractor.detect(&image::imageops::grayscale(&frame));
        log::debug!("{} frame keypoints", detection.keypoints().len());
        // Frame descriptors per template radius, described on first use
        let mut described: HashMap<u32, FeatureSet> = HashMap::new();

        let store = self.store;
        for (index, template) in store.templates().iter().enumerate() {
            self.change_state(LoopState::Matching(index));
            let started = Instant::now();
            let frame_features = described
                .entry(template.descriptor_radius)
                .or_insert_with(|| self.extractor.describe(&detection, template.descriptor_radius));
            let correspondences = self.matcher.match_features(&template.features, frame_features);
            let result = self
                .localizer
                .localize(&correspondences, &template.features, frame_features, template.size());
            let elapsed = started.elapsed();

            log::info!(
                "🔍 '{}' confidence {:.2} ({} matches, {} inliers) in {:?}",
                template.name,
                result.confidence,
                result.correspondences,
                result.inliers,
                elapsed
            );
            report.evaluated.push(TemplateEvaluation {
                name: template.name.clone(),
                result,
                elapsed,
            });

            self.change_state(LoopState::Deciding);
            if self.policy.accepts(&result) {
                report.matched = Some(template.name.clone());
                self.click(template, &result, &mut report);
                break;
            }
        }

        if report.matched.is_none() {
            log::debug!("👀 No template above threshold {:.2}", self.policy.threshold());
        }
        report
    }

    fn click(&mut self, template: &TemplateImage, result: &LocalizationResult, report: &mut IterationReport) {
        self.change_state(LoopState::Clicking);
        let region = ClickRegion::from_match(
            result.top_left_x,
            result.top_left_y,
            template.size(),
            self.capture_scale,
        );
        let target = self.sampler.sample(&mut self.rng, &region);

        let started = Instant::now();
        let outcome = self.pointer.move_and_click(target.x, target.y, self.button);
        let click_time = started.elapsed();

        match outcome {
            Ok(()) => log::info!(
                "🎯 Clicked '{}' at ({}, {}) in {:?}",
                template.name,
                target.x,
                target.y,
                click_time
            ),
            Err(e) => {
                log::warn!("❌ {e}");
                report.click_error = Some(e.to_string());
            }
        }
        report.click = Some(target);
        report.click_time = Some(click_time);
    }
}
