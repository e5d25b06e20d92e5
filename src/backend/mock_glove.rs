//! Mock Glove Implementation for Testing
//!
//! This module provides a synthetic glove transport that can be used for
//! testing the interpreter without real hardware. It emits the same line
//! protocol as the firmware: a boot banner followed by comma-separated data
//! lines of 5 flex readings and 3 accelerometer axes.
//!
//! # Features
//!
//! - **Pose sequence**: Cycles through configured hand poses, holding each
//!   one for a number of frames
//! - **Noise simulation**: Adds configurable jitter to every channel
//! - **Corruption**: Optionally mangles every n-th data line
//! - **Pacing**: Optionally limits the line rate like a 9600 baud link
//!
//! # Example
//!
//! ```ignore
//! use gesture_rs::backend::mock_glove::{MockGloveTransport, MockPose};
//!
//! let glove = MockGloveTransport::new(vec![
//!     MockPose::new("ILoveYou", [190.0, 190.0, 610.0, 610.0, 190.0], [0.05, 0.2, 0.95]),
//! ])
//! .with_noise(5.0)
//! .with_corruption_every(20);
//! ```
//!
//! # Enabling
//!
//! The mock glove is only available when the `mock-glove` feature is enabled:
//!
//! ```bash
//! cargo run --features mock-glove -- --mock
//! ```

use crate::config::ClassifierConfig;
use crate::error::{GestureError, Result};
use std::time::{Duration, Instant};

use super::transport::Transport;

/// Banner printed by the firmware on boot
pub const MOCK_BANNER: &str = "Initializing sensors...";

/// One hand pose in raw device units
#[derive(Debug, Clone, PartialEq)]
pub struct MockPose {
    /// Gesture this pose represents (for logs)
    pub name: String,
    /// Flex sensor readings
    pub flex: [f64; 5],
    /// Accelerometer readings in g
    pub inertial: [f64; 3],
}

impl MockPose {
    pub fn new(name: impl Into<String>, flex: [f64; 5], inertial: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            flex,
            inertial,
        }
    }
}

/// Poses matching the centroids of the default classifier config
///
/// Maps normalized centroid values back to device units using the default
/// flex range 100..700 and inertial range -1..2.
pub fn default_poses() -> Vec<MockPose> {
    let config = ClassifierConfig::default();
    config
        .labels
        .iter()
        .zip(&config.centroids)
        .filter(|(_, c)| c.len() == 8)
        .map(|(name, c)| {
            let flex = [0usize, 1, 2, 3, 4].map(|i| 100.0 + c[i] * 600.0);
            let inertial = [5usize, 6, 7].map(|i| -1.0 + c[i] * 3.0);
            MockPose::new(name.clone(), flex, inertial)
        })
        .collect()
}

/// Synthetic glove producing the firmware line protocol
#[derive(Debug, Clone)]
pub struct MockGloveTransport {
    poses: Vec<MockPose>,
    frames_per_pose: usize,
    noise_amplitude: f64,
    corrupt_every: Option<usize>,
    pacing: Option<Duration>,
    seed: u64,
    state: u64,
    open: bool,
    banner_sent: bool,
    frame_index: usize,
    next_due: Option<Instant>,
}

impl MockGloveTransport {
    /// Create a glove that cycles through `poses`
    pub fn new(poses: Vec<MockPose>) -> Self {
        Self {
            poses,
            frames_per_pose: 10,
            noise_amplitude: 0.0,
            corrupt_every: None,
            pacing: None,
            seed: 12345,
            state: 12345,
            open: false,
            banner_sent: false,
            frame_index: 0,
            next_due: None,
        }
    }

    /// Hold each pose for `frames` data lines
    pub fn with_frames_per_pose(mut self, frames: usize) -> Self {
        self.frames_per_pose = frames.max(1);
        self
    }

    /// Add uniform jitter of +/- `amplitude` (flex units; scaled down for g)
    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude;
        self
    }

    /// Replace every n-th data line with a corrupted one
    pub fn with_corruption_every(mut self, n: usize) -> Self {
        self.corrupt_every = (n > 0).then_some(n);
        self
    }

    /// Deliver at most one line per `interval`
    pub fn with_pacing(mut self, interval: Duration) -> Self {
        self.pacing = Some(interval);
        self
    }

    /// Seed for the jitter generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed.max(1);
        self.state = self.seed;
        self
    }

    /// Pose that the next data line will show
    pub fn current_pose(&self) -> Option<&MockPose> {
        if self.poses.is_empty() {
            return None;
        }
        self.poses
            .get((self.frame_index / self.frames_per_pose) % self.poses.len())
    }

    /// Simple xorshift generator in [0, 1)
    fn next_random(&mut self) -> f64 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.state = s;
        (s >> 11) as f64 / (1u64 << 53) as f64
    }

    fn jitter(&mut self, scale: f64) -> f64 {
        if self.noise_amplitude > 0.0 {
            (self.next_random() - 0.5) * 2.0 * self.noise_amplitude * scale
        } else {
            0.0
        }
    }

    fn next_data_line(&mut self) -> Option<String> {
        let pose = self.current_pose()?.clone();
        self.frame_index += 1;

        if let Some(n) = self.corrupt_every {
            if self.frame_index % n == 0 {
                return Some(format!("{:.0},{:.0},ERR", pose.flex[0], pose.flex[1]));
            }
        }

        let mut fields = Vec::with_capacity(8);
        for v in pose.flex {
            let value = v + self.jitter(1.0);
            fields.push(format!("{:.0}", value));
        }
        for v in pose.inertial {
            let value = v + self.jitter(0.005);
            fields.push(format!("{:.2}", value));
        }
        Some(fields.join(","))
    }
}

impl Default for MockGloveTransport {
    fn default() -> Self {
        Self::new(default_poses())
    }
}

impl Transport for MockGloveTransport {
    fn describe(&self) -> String {
        format!("mock glove ({} poses)", self.poses.len())
    }

    fn open(&mut self) -> Result<()> {
        if self.poses.is_empty() {
            return Err(GestureError::Transport(
                "Mock glove has no poses configured".to_string(),
            ));
        }
        self.open = true;
        self.banner_sent = false;
        self.frame_index = 0;
        self.state = self.seed;
        self.next_due = None;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if !self.open {
            return Err(GestureError::Transport("Transport is not open".to_string()));
        }

        if let Some(interval) = self.pacing {
            let now = Instant::now();
            match self.next_due {
                Some(due) if now < due => return Ok(None),
                _ => self.next_due = Some(now + interval),
            }
        }

        if !self.banner_sent {
            self.banner_sent = true;
            return Ok(Some(MOCK_BANNER.to_string()));
        }

        Ok(self.next_data_line())
    }
}
