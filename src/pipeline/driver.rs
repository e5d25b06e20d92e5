//! Per-frame orchestration of the classification pipeline
//!
//! [`PipelineDriver`] sequences parse → preprocess → classify → gate → smooth
//! for one line. It owns no cross-frame state: the smoothing window and the
//! threshold are handed in by the caller. [`PipelineSession`] bundles a driver
//! with the window and the shared threshold for a single acquisition session.

use crate::config::AppConfig;
use crate::error::{Result, ResultExt};
use crate::pipeline::classifier::ClassifierPort;
use crate::pipeline::gate::{ConfidenceGate, SharedThreshold};
use crate::pipeline::parser::FrameParser;
use crate::pipeline::preprocess::FeaturePreprocessor;
use crate::pipeline::smoothing::SmoothingWindow;
use crate::types::{LabelSet, PipelineResult};
use std::sync::Arc;

/// Stateless pipeline orchestrator
#[derive(Clone)]
pub struct PipelineDriver {
    parser: FrameParser,
    preprocessor: Arc<dyn FeaturePreprocessor>,
    classifier: Arc<dyn ClassifierPort>,
}

impl std::fmt::Debug for PipelineDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineDriver")
            .field("parser", &self.parser)
            .field("preprocessor", &self.preprocessor.name())
            .field("labels", &self.classifier.labels().len())
            .finish()
    }
}

impl PipelineDriver {
    pub fn new(
        parser: FrameParser,
        preprocessor: Arc<dyn FeaturePreprocessor>,
        classifier: Arc<dyn ClassifierPort>,
    ) -> Self {
        Self {
            parser,
            preprocessor,
            classifier,
        }
    }

    /// Label set of the underlying classifier
    pub fn labels(&self) -> &LabelSet {
        self.classifier.labels()
    }

    /// Process one line against `window`, using `threshold` for the gate
    ///
    /// Never fails: every per-frame problem maps to a [`PipelineResult`]
    /// variant and the caller keeps going.
    pub fn process(
        &self,
        line: &str,
        threshold: f64,
        window: &mut SmoothingWindow,
    ) -> PipelineResult {
        let raw = match self.parser.parse(line) {
            Ok(frame) => frame,
            Err(rejection) if rejection.is_noise() => {
                tracing::trace!("Ignored line {:?}: {}", line, rejection);
                return PipelineResult::Ignored;
            }
            Err(rejection) => {
                tracing::debug!("Malformed frame {:?}: {}", line, rejection);
                return PipelineResult::Malformed;
            }
        };

        let features = self.preprocessor.preprocess(&raw);

        let dist = match self.classifier.classify(&features) {
            Ok(dist) => dist,
            Err(e) => {
                tracing::warn!("Inference failed, skipping frame: {}", e);
                return PipelineResult::InferenceFailed;
            }
        };

        let decision = ConfidenceGate::decide(&dist, threshold);
        let stable = window.observe(decision.label());

        tracing::trace!(
            "Raw {} ({:.0}%) | Smoothed {}",
            self.labels().display(decision.label()),
            decision.confidence() * 100.0,
            self.labels().display(stable.label())
        );

        PipelineResult::Decided {
            raw: decision,
            stable,
        }
    }
}

/// A driver together with the state of one acquisition session
#[derive(Debug)]
pub struct PipelineSession {
    driver: PipelineDriver,
    window: SmoothingWindow,
    threshold: SharedThreshold,
}

impl PipelineSession {
    pub fn new(driver: PipelineDriver, window: SmoothingWindow, threshold: SharedThreshold) -> Self {
        Self {
            driver,
            window,
            threshold,
        }
    }

    /// Build a session from config, preprocessor and classifier
    pub fn from_config(
        config: &AppConfig,
        preprocessor: Arc<dyn FeaturePreprocessor>,
        classifier: Arc<dyn ClassifierPort>,
        threshold: SharedThreshold,
    ) -> Result<Self> {
        let driver = PipelineDriver::new(
            FrameParser::from_config(&config.frame),
            preprocessor,
            classifier,
        );
        let window =
            SmoothingWindow::new(config.smoothing.window_size, config.smoothing.min_support)
                .context("Invalid smoothing settings")?;
        Ok(Self::new(driver, window, threshold))
    }

    /// Process one line with the current threshold snapshot
    pub fn process(&mut self, line: &str) -> PipelineResult {
        let threshold = self.threshold.get();
        self.driver.process(line, threshold, &mut self.window)
    }

    /// Clear the smoothing history
    pub fn reset(&mut self) {
        self.window.reset();
    }

    pub fn driver(&self) -> &PipelineDriver {
        &self.driver
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    pub fn threshold(&self) -> &SharedThreshold {
        &self.threshold
    }
}
