//! Test data builders for creating glove lines and configs

use gesture_rs::config::{AppConfig, ClassifierConfig};

/// Builder for glove data lines in device units
pub struct FrameLineBuilder {
    flex: [f64; 5],
    inertial: [f64; 3],
    delimiter: char,
}

impl FrameLineBuilder {
    pub fn new() -> Self {
        Self {
            flex: [400.0; 5],
            inertial: [0.0, 0.0, 1.0],
            delimiter: ',',
        }
    }

    /// Line matching the centroid of `label` in the default classifier
    pub fn pose(label: &str) -> Self {
        let config = ClassifierConfig::default();
        let index = config
            .labels
            .iter()
            .position(|l| l == label)
            .unwrap_or_else(|| panic!("no default pose for {}", label));
        let c = &config.centroids[index];

        let mut builder = Self::new();
        for i in 0..5 {
            builder.flex[i] = 100.0 + c[i] * 600.0;
        }
        for i in 0..3 {
            builder.inertial[i] = -1.0 + c[5 + i] * 3.0;
        }
        builder
    }

    pub fn flex(mut self, flex: [f64; 5]) -> Self {
        self.flex = flex;
        self
    }

    pub fn inertial(mut self, inertial: [f64; 3]) -> Self {
        self.inertial = inertial;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn build(self) -> String {
        let fields: Vec<String> = self
            .flex
            .iter()
            .map(|v| format!("{:.0}", v))
            .chain(self.inertial.iter().map(|v| format!("{:.3}", v)))
            .collect();
        fields.join(&self.delimiter.to_string())
    }
}

impl Default for FrameLineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Default config with fast polling for thread-based tests
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.acquisition.idle_poll_ms = 1;
    config.acquisition.stats_interval_ms = 20;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_line_builder() {
        let line = FrameLineBuilder::new()
            .flex([100.0, 200.0, 300.0, 400.0, 500.0])
            .inertial([0.5, -0.25, 1.0])
            .build();

        assert_eq!(line, "100,200,300,400,500,0.500,-0.250,1.000");
    }
}
