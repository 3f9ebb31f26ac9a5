// Types shared by the control loop and its callers
use super::click::ClickTarget;
use crate::feature_matching::LocalizationResult;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Capturing,
    /// Evaluating the template at this store index
    Matching(usize),
    Deciding,
    Clicking,
    Sleeping,
    Stopped,
}

/// Outcome of evaluating one template against one frame
#[derive(Debug, Clone)]
pub struct TemplateEvaluation {
    pub name: String,
    pub result: LocalizationResult,
    pub elapsed: Duration,
}

/// Everything observable about a single loop iteration
#[derive(Debug, Clone, Default)]
pub struct IterationReport {
    pub iteration: u64,
    /// Templates in the order they were tried
    pub evaluated: Vec<TemplateEvaluation>,
    pub matched: Option<String>,
    pub click: Option<ClickTarget>,
    pub capture_time: Option<Duration>,
    pub click_time: Option<Duration>,
    pub capture_error: Option<String>,
    pub click_error: Option<String>,
}

impl IterationReport {
    pub fn new(iteration: u64) -> Self {
        Self {
            iteration,
            ..Self::default()
        }
    }

    pub fn evaluated_names(&self) -> Vec<&str> {
        self.evaluated.iter().map(|e| e.name.as_str()).collect()
    }
}
