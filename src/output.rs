//! Rendering of frame updates for presentation consumers
//!
//! [`render_console`] produces the human readable line printed by the CLI,
//! [`render_json`] one JSON object per update for piping to other tools.

use crate::error::Result;
use crate::types::{FrameUpdate, LabelSet, PipelineResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Console line for an update, `None` for ignored noise lines
pub fn render_console(update: &FrameUpdate, labels: &LabelSet) -> Option<String> {
    let smoothed = labels.display(update.latest_stable.label());
    match update.result {
        PipelineResult::Ignored => None,
        PipelineResult::Malformed => {
            Some(format!("Raw Pred: malformed frame | Smoothed: {}", smoothed))
        }
        PipelineResult::InferenceFailed => {
            Some(format!("Raw Pred: inference failed | Smoothed: {}", smoothed))
        }
        PipelineResult::Decided { raw, stable } => Some(format!(
            "Raw Pred: {} ({:.0}%) | Smoothed: {}",
            labels.display(raw.label()),
            raw.confidence() * 100.0,
            labels.display(stable.label())
        )),
    }
}

#[derive(Debug, Serialize)]
struct UpdateView<'a> {
    sequence: u64,
    received_at: DateTime<Utc>,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    stable_label: &'a str,
    stable_votes: usize,
}

/// One JSON object describing an update, with label names resolved
pub fn render_json(update: &FrameUpdate, labels: &LabelSet) -> Result<String> {
    let (outcome, raw_label, confidence) = match update.result {
        PipelineResult::Ignored => ("ignored", None, None),
        PipelineResult::Malformed => ("malformed", None, None),
        PipelineResult::InferenceFailed => ("inference_failed", None, None),
        PipelineResult::Decided { raw, .. } => (
            "decided",
            Some(labels.display(raw.label())),
            Some(raw.confidence()),
        ),
    };

    let view = UpdateView {
        sequence: update.sequence,
        received_at: update.received_at,
        outcome,
        raw_label,
        confidence,
        stable_label: labels.display(update.latest_stable.label()),
        stable_votes: update.latest_stable.votes(),
    };
    Ok(serde_json::to_string(&view)?)
}
