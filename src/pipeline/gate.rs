//! Confidence gating of classifier output
//!
//! The gate takes the arg-max of a distribution and accepts it only when its
//! probability reaches the threshold. The threshold lives outside the gate in
//! a [`SharedThreshold`], so a control surface can move it while the worker
//! keeps running; the worker snapshots it once per frame.

use crate::types::{LabelDecision, ProbabilityDistribution};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Arg-max + threshold decision rule
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceGate;

impl ConfidenceGate {
    /// Decide a label for one distribution
    ///
    /// Ties go to the label that comes first in enumeration order. NaN
    /// probabilities never win. An empty distribution is `Unknown` at 0.
    pub fn decide(dist: &ProbabilityDistribution, threshold: f64) -> LabelDecision {
        let mut best = None;
        for (label, p) in dist.iter() {
            if p.is_nan() {
                continue;
            }
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((label, p)),
            }
        }

        match best {
            Some((label, confidence)) if confidence >= threshold => {
                LabelDecision::Label { label, confidence }
            }
            Some((_, confidence)) => LabelDecision::Unknown { confidence },
            None => LabelDecision::Unknown { confidence: 0.0 },
        }
    }
}

/// Threshold shared between the control surface and the acquisition worker
///
/// Stored as `f64` bits in an atomic, so reads are always a consistent
/// snapshot. Values are clamped to [0, 1].
#[derive(Debug, Clone)]
pub struct SharedThreshold {
    bits: Arc<AtomicU64>,
}

impl SharedThreshold {
    pub fn new(threshold: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(clamp_unit(threshold).to_bits())),
        }
    }

    /// Current threshold in [0, 1]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Set the threshold as a fraction; takes effect on the next frame
    pub fn set(&self, threshold: f64) {
        self.bits
            .store(clamp_unit(threshold).to_bits(), Ordering::Release);
    }

    /// Current threshold in percent
    pub fn percent(&self) -> f64 {
        self.get() * 100.0
    }

    /// Set the threshold from a percent value in [0, 100]
    pub fn set_percent(&self, percent: f64) {
        self.set(percent / 100.0);
    }
}

impl Default for SharedThreshold {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_THRESHOLD)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
