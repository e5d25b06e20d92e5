//! Mock construction helpers

use gesture_rs::backend::ReplayTransport;
use gesture_rs::config::AppConfig;
use gesture_rs::error::Result;
use gesture_rs::pipeline::{
    build_preprocessor, CentroidClassifier, ClassifierPort, FeaturePreprocessor, FrameParser,
    PipelineDriver, RawFeatures,
};
use gesture_rs::types::{FeatureVector, LabelSet, ProbabilityDistribution};
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Classifier {}

    impl ClassifierPort for Classifier {
        fn labels(&self) -> &LabelSet;
        fn input_arity(&self) -> usize;
        fn classify(&self, features: &FeatureVector) -> Result<ProbabilityDistribution>;
    }
}

/// Classifier that always returns `probabilities` over labels `A`, `B`, ...
pub fn fixed_classifier(probabilities: Vec<f64>) -> MockClassifier {
    let names: Vec<String> = (0..probabilities.len())
        .map(|i| ((b'A' + i as u8) as char).to_string())
        .collect();
    let mut mock = MockClassifier::new();
    mock.expect_labels().return_const(LabelSet::new(names));
    mock.expect_input_arity().return_const(8usize);
    mock.expect_classify()
        .returning(move |_| Ok(ProbabilityDistribution::new(probabilities.clone())));
    mock
}

/// Driver with raw features around an arbitrary classifier
pub fn driver_with(classifier: impl ClassifierPort + 'static) -> PipelineDriver {
    PipelineDriver::new(
        FrameParser::default(),
        Arc::new(RawFeatures),
        Arc::new(classifier),
    )
}

/// Preprocessor and classifier built from `config`
pub fn default_stages(
    config: &AppConfig,
) -> (Arc<dyn FeaturePreprocessor>, Arc<dyn ClassifierPort>) {
    let classifier = CentroidClassifier::from_config(&config.classifier)
        .expect("default classifier config is valid");
    (
        build_preprocessor(&config.preprocessing).into(),
        Arc::new(classifier),
    )
}

/// Replay transport over owned lines
pub fn replay(lines: &[String]) -> ReplayTransport {
    ReplayTransport::new(lines.iter().cloned())
}
