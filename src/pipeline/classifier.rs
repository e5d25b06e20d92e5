//! Classifier port and the built-in centroid model
//!
//! The pipeline consumes any model through [`ClassifierPort`]. Implementations
//! must be deterministic, cover their full label set in every distribution and
//! leave the input untouched.

use crate::config::ClassifierConfig;
use crate::error::{GestureError, Result};
use crate::types::{FeatureVector, LabelSet, ProbabilityDistribution};

/// Opaque model capability: features in, probability distribution out
///
/// Implementations must be `Send + Sync` so one model instance can be shared
/// between the acquisition worker and other consumers.
#[cfg_attr(test, mockall::automock)]
pub trait ClassifierPort: Send + Sync {
    /// Labels in the order used by returned distributions
    fn labels(&self) -> &LabelSet;

    /// Number of features the model expects
    fn input_arity(&self) -> usize;

    /// Classify one feature vector
    ///
    /// Fails with [`GestureError::Inference`] when the vector length differs
    /// from [`input_arity`](Self::input_arity).
    fn classify(&self, features: &FeatureVector) -> Result<ProbabilityDistribution>;
}

/// Nearest-centroid model with a softmax over negative squared distances
#[derive(Debug, Clone)]
pub struct CentroidClassifier {
    labels: LabelSet,
    feature_names: Vec<String>,
    centroids: Vec<Vec<f64>>,
    temperature: f64,
}

impl CentroidClassifier {
    /// Build the model from its config section
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let arity = config.feature_names.len();
        if config.labels.is_empty() || config.centroids.len() != config.labels.len() {
            return Err(GestureError::Config(format!(
                "centroid model needs one centroid per label ({} labels, {} centroids)",
                config.labels.len(),
                config.centroids.len()
            )));
        }
        if config.centroids.iter().any(|c| c.len() != arity) {
            return Err(GestureError::Config(format!(
                "every centroid must have {} values",
                arity
            )));
        }
        if !(config.temperature > 0.0) {
            return Err(GestureError::Config(
                "centroid model temperature must be positive".to_string(),
            ));
        }

        Ok(Self {
            labels: LabelSet::new(config.labels.iter().cloned()),
            feature_names: config.feature_names.clone(),
            centroids: config.centroids.clone(),
            temperature: config.temperature,
        })
    }

    /// Feature names in training order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

impl ClassifierPort for CentroidClassifier {
    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn input_arity(&self) -> usize {
        self.feature_names.len()
    }

    fn classify(&self, features: &FeatureVector) -> Result<ProbabilityDistribution> {
        let input = features.as_slice();
        if input.len() != self.input_arity() {
            return Err(GestureError::Inference {
                expected: self.input_arity(),
                actual: input.len(),
            });
        }

        let logits: Vec<f64> = self
            .centroids
            .iter()
            .map(|centroid| {
                let dist_sq: f64 = centroid
                    .iter()
                    .zip(input)
                    .map(|(c, x)| (c - x).powi(2))
                    .sum();
                -dist_sq / self.temperature
            })
            .collect();

        // Shift by the max logit so exp() cannot overflow
        let max_logit = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max_logit).exp()).collect();
        let total: f64 = exps.iter().sum();

        Ok(ProbabilityDistribution::new(
            exps.into_iter().map(|e| e / total).collect(),
        ))
    }
}
