use crate::feature_matching::LocalizationResult;

/// Accept a localization when its confidence is strictly above the threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    threshold: f32,
}

impl DecisionPolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn accepts(&self, result: &LocalizationResult) -> bool {
        result.found && result.confidence > self.threshold
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(0.7)
    }
}
