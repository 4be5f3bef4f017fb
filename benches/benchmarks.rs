use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use macro_regimes::config::{ColumnMap, PipelineConfig, RegimeConfig};
use macro_regimes::data::frequency::{monthly_grid, shift_months};
use macro_regimes::data::Panel;
use macro_regimes::pipeline::ResearchPipeline;
use macro_regimes::regime::thresholds::PercentileThresholds;
use macro_regimes::regime::RegimeClassifier;

const MONTHS: usize = 600;

fn synthetic_panel(months: usize) -> Panel {
    let start = NaiveDate::from_ymd_opt(1975, 1, 31).unwrap();
    let end = shift_months(start, months as i32 - 1).unwrap();
    let t = |i: usize| i as f64;

    Panel::new(
        monthly_grid(start, end),
        vec![
            (
                "policy_rate".to_string(),
                (0..months).map(|i| Some(4.0 + 3.0 * (t(i) / 20.0).sin())).collect(),
            ),
            (
                "cpi".to_string(),
                (0..months).map(|i| Some(50.0 * (1.0 + 0.003 * t(i)))).collect(),
            ),
            (
                "equity_index".to_string(),
                (0..months)
                    .map(|i| Some(100.0 * (1.0 + 0.006 * t(i)) + 8.0 * (t(i) / 4.0).cos()))
                    .collect(),
            ),
            (
                "long_yield".to_string(),
                (0..months).map(|i| Some(5.0 + (t(i) / 30.0).sin())).collect(),
            ),
            (
                "short_yield".to_string(),
                (0..months).map(|i| Some(3.5 + 2.0 * (t(i) / 25.0).sin())).collect(),
            ),
        ],
    )
    .unwrap()
}

fn benchmark_thresholds(c: &mut Criterion) {
    let values: Vec<Option<f64>> = (0..MONTHS).map(|i| Some((i as f64 * 0.37).sin())).collect();

    c.bench_function("percentile_thresholds_600", |b| {
        b.iter(|| PercentileThresholds::compute(black_box(&values), 0.25, 0.75, 24));
    });
}

fn benchmark_classify(c: &mut Criterion) {
    let panel = synthetic_panel(MONTHS);
    let classifier = RegimeClassifier::new(ColumnMap::default(), RegimeConfig::default());

    c.bench_function("classify_600_months", |b| {
        b.iter(|| classifier.classify(black_box(&panel)).unwrap());
    });
}

fn benchmark_full_run(c: &mut Criterion) {
    let panel = synthetic_panel(MONTHS);
    let pipeline = ResearchPipeline::new(PipelineConfig::default()).unwrap();

    c.bench_function("research_run_600_months", |b| {
        b.iter(|| pipeline.run(black_box(&panel)).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_thresholds,
    benchmark_classify,
    benchmark_full_run
);
criterion_main!(benches);
