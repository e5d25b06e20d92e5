//! Benchmarks for per-frame pipeline operations
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gesture_rs::config::{AppConfig, ClassifierConfig, PreprocessingConfig};
use gesture_rs::pipeline::{
    build_preprocessor, CentroidClassifier, ClassifierPort, FeaturePreprocessor, FrameParser,
    PipelineSession, SharedThreshold, SmoothingWindow,
};
use gesture_rs::types::LabelId;
use std::sync::Arc;

const DATA_LINE: &str = "190,190,610,610,190,0.05,0.20,0.95";

fn session(config: &AppConfig) -> PipelineSession {
    let classifier = CentroidClassifier::from_config(&config.classifier).unwrap();
    let preprocessor: Arc<dyn FeaturePreprocessor> =
        build_preprocessor(&config.preprocessing).into();
    PipelineSession::from_config(
        config,
        preprocessor,
        Arc::new(classifier),
        SharedThreshold::new(config.gate.threshold),
    )
    .unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_parsing");
    let parser = FrameParser::default();

    group.throughput(Throughput::Elements(1));
    group.bench_function("data_line", |b| {
        b.iter(|| black_box(parser.parse(black_box(DATA_LINE))));
    });
    group.bench_function("noise_line", |b| {
        b.iter(|| black_box(parser.parse(black_box("Initializing sensors..."))));
    });
    group.bench_function("malformed_line", |b| {
        b.iter(|| black_box(parser.parse(black_box("1,2,abc,4,5,6,7,8"))));
    });

    group.finish();
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");
    let frame = FrameParser::default().parse(DATA_LINE).unwrap();

    let strategies = [
        PreprocessingConfig::Raw,
        AppConfig::default().preprocessing,
        PreprocessingConfig::Standard {
            mean: vec![0.5; 8],
            scale: vec![0.25; 8],
        },
    ];
    for config in strategies.iter() {
        let preprocessor = build_preprocessor(config);
        group.bench_with_input(
            BenchmarkId::new("preprocess", config.strategy_name()),
            &frame,
            |b, frame| {
                b.iter(|| black_box(preprocessor.preprocess(frame)));
            },
        );
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");

    for labels in [8usize, 32, 128].iter() {
        let mut config = ClassifierConfig::default();
        let base = config.centroids.clone();
        config.labels = (0..*labels).map(|i| format!("gesture{}", i)).collect();
        config.centroids = (0..*labels).map(|i| base[i % base.len()].clone()).collect();
        let classifier = CentroidClassifier::from_config(&config).unwrap();

        let features = build_preprocessor(&AppConfig::default().preprocessing)
            .preprocess(&FrameParser::default().parse(DATA_LINE).unwrap());

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("centroid", labels),
            &features,
            |b, features| {
                b.iter(|| black_box(classifier.classify(features)));
            },
        );
    }

    group.finish();
}

fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothing");

    for size in [5usize, 15, 50].iter() {
        group.bench_with_input(BenchmarkId::new("observe", size), size, |b, &size| {
            let mut window = SmoothingWindow::new(size, size / 2 + 1).unwrap();
            let mut i = 0usize;
            b.iter(|| {
                let label = if i % 4 == 0 { None } else { Some(LabelId(i % 3)) };
                black_box(window.observe(label));
                i = i.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    let config = AppConfig::default();

    let lines: Vec<&str> = vec![
        "Initializing sensors...",
        DATA_LINE,
        DATA_LINE,
        "1,2,abc,4,5,6,7,8",
        DATA_LINE,
    ];

    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("mixed_stream", |b| {
        let mut session = session(&config);
        b.iter(|| {
            for line in &lines {
                black_box(session.process(black_box(line)));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_preprocess,
    bench_classify,
    bench_smoothing,
    bench_full_pipeline,
);

criterion_main!(benches);
