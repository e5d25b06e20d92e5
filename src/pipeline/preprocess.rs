//! Feature preprocessing strategies
//!
//! Each deployed model expects its inputs transformed exactly the way its
//! training data was. The strategy is chosen once when the pipeline is built
//! (see [`build_preprocessor`]); downstream stages only see [`FeatureVector`]s.
//!
//! All strategies preserve channel order: feature `i` is derived from channel
//! `i` only.

use crate::config::{ChannelGroup, PreprocessingConfig};
use crate::types::{FeatureVector, RawFrame};

/// Maps a validated frame to the classifier's feature space
pub trait FeaturePreprocessor: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Transform one frame; pure arithmetic, cannot fail
    fn preprocess(&self, raw: &RawFrame) -> FeatureVector;
}

/// Passes channels through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFeatures;

impl FeaturePreprocessor for RawFeatures {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn preprocess(&self, raw: &RawFrame) -> FeatureVector {
        FeatureVector::new(raw.values().to_vec())
    }
}

/// Per-group min-max normalization: `(v - min) / (max - min)`
///
/// Values outside the training range are not clamped.
#[derive(Debug, Clone)]
pub struct MinMaxNormalizer {
    groups: Vec<ChannelGroup>,
}

impl MinMaxNormalizer {
    pub fn new(groups: Vec<ChannelGroup>) -> Self {
        Self { groups }
    }

    fn normalize_in_place(&self, values: &mut [f64]) {
        for group in &self.groups {
            let span = group.max - group.min;
            let end = group.end.min(values.len());
            if group.start >= end || span == 0.0 {
                continue;
            }
            for v in &mut values[group.start..end] {
                *v = (*v - group.min) / span;
            }
        }
    }
}

impl FeaturePreprocessor for MinMaxNormalizer {
    fn name(&self) -> &'static str {
        "min_max"
    }

    fn preprocess(&self, raw: &RawFrame) -> FeatureVector {
        let mut values = raw.values().to_vec();
        self.normalize_in_place(&mut values);
        FeatureVector::new(values)
    }
}

/// Fitted standard scaler: `(v - mean) / scale`
///
/// A zero scale is treated as 1.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    fn scale_in_place(&self, values: &mut [f64]) {
        for (i, v) in values.iter_mut().enumerate() {
            let mean = self.mean.get(i).copied().unwrap_or(0.0);
            let scale = match self.scale.get(i).copied() {
                Some(s) if s != 0.0 => s,
                _ => 1.0,
            };
            *v = (*v - mean) / scale;
        }
    }
}

impl FeaturePreprocessor for StandardScaler {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn preprocess(&self, raw: &RawFrame) -> FeatureVector {
        let mut values = raw.values().to_vec();
        self.scale_in_place(&mut values);
        FeatureVector::new(values)
    }
}

/// Min-max normalization followed by a fitted scaler
#[derive(Debug, Clone)]
pub struct NormalizeThenScale {
    normalizer: MinMaxNormalizer,
    scaler: StandardScaler,
}

impl NormalizeThenScale {
    pub fn new(normalizer: MinMaxNormalizer, scaler: StandardScaler) -> Self {
        Self { normalizer, scaler }
    }
}

impl FeaturePreprocessor for NormalizeThenScale {
    fn name(&self) -> &'static str {
        "min_max_standard"
    }

    fn preprocess(&self, raw: &RawFrame) -> FeatureVector {
        let mut values = raw.values().to_vec();
        self.normalizer.normalize_in_place(&mut values);
        self.scaler.scale_in_place(&mut values);
        FeatureVector::new(values)
    }
}

/// Build the preprocessor selected by the config
pub fn build_preprocessor(config: &PreprocessingConfig) -> Box<dyn FeaturePreprocessor> {
    match config {
        PreprocessingConfig::Raw => Box::new(RawFeatures),
        PreprocessingConfig::MinMax { groups } => Box::new(MinMaxNormalizer::new(groups.clone())),
        PreprocessingConfig::Standard { mean, scale } => {
            Box::new(StandardScaler::new(mean.clone(), scale.clone()))
        }
        PreprocessingConfig::MinMaxStandard {
            groups,
            mean,
            scale,
        } => Box::new(NormalizeThenScale::new(
            MinMaxNormalizer::new(groups.clone()),
            StandardScaler::new(mean.clone(), scale.clone()),
        )),
    }
}
