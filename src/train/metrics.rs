//! Evaluation metrics and running accumulators

use crate::Tensor;

/// Trait for evaluation metrics.
pub trait Metric {
    /// Compute the metric given predictions and targets.
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32;

    /// Name of the metric.
    fn name(&self) -> &'static str;

    /// Whether higher values are better.
    fn higher_is_better(&self) -> bool {
        true
    }
}

/// Elementwise-equality accuracy.
///
/// Returns the fraction of positions where prediction equals label, in
/// [0, 1]. With `exact()`, values are compared as-is — the caller is
/// expected to have discretized predictions already. A thresholding variant
/// is available for models that emit probabilities.
#[derive(Debug, Clone)]
pub struct Accuracy {
    threshold: Option<f32>,
}

impl Accuracy {
    /// Compare predictions to labels without any rounding.
    pub fn exact() -> Self {
        Self { threshold: None }
    }

    /// Discretize both sides at `threshold` before comparing.
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold: Some(threshold),
        }
    }
}

impl Metric for Accuracy {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "predictions and targets must have the same length"
        );

        if predictions.is_empty() {
            return 0.0;
        }

        let pred = predictions.data();
        let target = targets.data();
        let matches = pred
            .iter()
            .zip(target.iter())
            .filter(|(&p, &t)| match self.threshold {
                Some(th) => (p >= th) == (t >= th),
                None => p == t,
            })
            .count();

        matches as f32 / predictions.len() as f32
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}

/// Reset-on-interval running accumulator for windowed progress averages.
///
/// The training loop resets one of these at the start of every validation
/// window; the progress line shows its mean.
#[derive(Debug, Clone, Default)]
pub struct RunningAverage {
    sum: f64,
    count: u64,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample.
    pub fn push(&mut self, value: f32) {
        self.sum += f64::from(value);
        self.count += 1;
    }

    /// Mean of the samples pushed since the last reset, 0 if none.
    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum / self.count as f64) as f32
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Start a new window.
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}
