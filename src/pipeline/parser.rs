//! Frame parsing for the glove line protocol
//!
//! The glove firmware interleaves banner/log lines with data lines, so the
//! parser classifies every line instead of failing: noise is rejected cheaply
//! and silently, malformed data lines are rejected with a reason.

use crate::config::FrameConfig;
use crate::types::RawFrame;
use std::fmt;

/// Why a line did not produce a [`RawFrame`]
#[derive(Debug, Clone, PartialEq)]
pub enum FrameRejection {
    /// Blank line
    Empty,
    /// Banner or log text
    Noise,
    /// A field is not a finite number
    InvalidField { index: usize, field: String },
    /// Field count differs from the channel count
    WrongArity { expected: usize, actual: usize },
}

impl FrameRejection {
    /// Whether the line was non-data noise rather than a broken data line
    pub fn is_noise(&self) -> bool {
        matches!(self, FrameRejection::Empty | FrameRejection::Noise)
    }
}

impl fmt::Display for FrameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameRejection::Empty => write!(f, "empty line"),
            FrameRejection::Noise => write!(f, "non-data line"),
            FrameRejection::InvalidField { index, field } => {
                write!(f, "field {} ({:?}) is not a number", index, field)
            }
            FrameRejection::WrongArity { expected, actual } => {
                write!(f, "expected {} fields, got {}", expected, actual)
            }
        }
    }
}

/// Turns one text line into a validated [`RawFrame`]
#[derive(Debug, Clone)]
pub struct FrameParser {
    channel_count: usize,
    delimiter: char,
    noise_markers: Vec<String>,
}

impl FrameParser {
    /// Create a parser for `channel_count` fields separated by `delimiter`
    pub fn new(channel_count: usize, delimiter: char) -> Self {
        Self {
            channel_count,
            delimiter,
            noise_markers: Vec::new(),
        }
    }

    /// Add a substring that marks a line as noise
    pub fn with_noise_marker(mut self, marker: impl Into<String>) -> Self {
        self.noise_markers.push(marker.into());
        self
    }

    /// Build a parser from the frame section of the config
    pub fn from_config(config: &FrameConfig) -> Self {
        Self {
            channel_count: config.channel_count,
            delimiter: config.delimiter,
            noise_markers: config.noise_markers.clone(),
        }
    }

    /// Expected number of channels
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Parse a line; never panics
    pub fn parse(&self, line: &str) -> Result<RawFrame, FrameRejection> {
        let line = line.trim();
        if line.is_empty() {
            return Err(FrameRejection::Empty);
        }

        if self
            .noise_markers
            .iter()
            .any(|marker| !marker.is_empty() && line.contains(marker.as_str()))
        {
            return Err(FrameRejection::Noise);
        }

        // Text without a single digit cannot be a data line.
        if !line.bytes().any(|b| b.is_ascii_digit()) {
            return Err(FrameRejection::Noise);
        }

        let fields: Vec<&str> = line.split(self.delimiter).collect();
        if fields.len() != self.channel_count {
            return Err(FrameRejection::WrongArity {
                expected: self.channel_count,
                actual: fields.len(),
            });
        }

        let mut values = Vec::with_capacity(self.channel_count);
        for (index, field) in fields.iter().enumerate() {
            let field = field.trim();
            match field.parse::<f64>() {
                Ok(value) if value.is_finite() => values.push(value),
                _ => {
                    return Err(FrameRejection::InvalidField {
                        index,
                        field: field.to_string(),
                    })
                }
            }
        }

        Ok(RawFrame::new(values))
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}
