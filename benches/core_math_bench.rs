use criterion::{Criterion, criterion_group, criterion_main};
use scrolly_rs::animation::{CompiledTimeline, Ease, SceneState, TimelineSpec, Tween};
use scrolly_rs::api::ScrollyConfig;
use scrolly_rs::core::density::sample_positions;
use scrolly_rs::core::{
    Aggregates, RawRecord, Viewport, build_individuals, kernel_density, normalize_records,
};
use scrolly_rs::render::{ElementId, MemoryScene, PropertyKey};
use scrolly_rs::ScrollyEngine;
use std::hint::black_box;

const DECISIONS: [&str; 4] = ["GRANTED", "DENIED", "OPEN DATE", "**********"];
const RACES: [&str; 4] = ["WHITE", "BLACK", "HISPANIC", "OTHER"];

fn rows(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|i| RawRecord {
            id: Some(format!("p{}", i % (count / 2).max(1))),
            parole_interview_date: Some(format!("20{:02}-01-15", 10 + i % 10)),
            interview_decision: Some(DECISIONS[i % DECISIONS.len()].to_owned()),
            race_ethnicity: Some(RACES[i % RACES.len()].to_owned()),
            age: Some(18.0 + (i % 60) as f64),
            prop_sent_served: Some(0.05 + (i % 19) as f64 * 0.05),
            ..RawRecord::default()
        })
        .collect()
}

fn bench_kernel_density_10k(c: &mut Criterion) {
    let values: Vec<f64> = (0..10_000).map(|i| (i % 997) as f64 / 997.0).collect();
    let sample_xs = sample_positions(0.0, 1.0, 60);

    c.bench_function("kernel_density_10k", |b| {
        b.iter(|| kernel_density(black_box(&values), black_box(&sample_xs), black_box(0.1)))
    });
}

fn bench_aggregates_10k(c: &mut Criterion) {
    let records = normalize_records(&rows(10_000));

    c.bench_function("aggregates_10k", |b| {
        b.iter(|| {
            let individuals = build_individuals(black_box(&records));
            Aggregates::build(black_box(&records), &individuals)
        })
    });
}

fn bench_timeline_sampling(c: &mut Criterion) {
    let ids: Vec<ElementId> = (0..200).map(|i| ElementId::new(format!("dot-{i}"))).collect();
    let mut base = SceneState::new();
    for id in &ids {
        base.set(id.clone(), PropertyKey::Cx, 0.0.into());
        base.set(id.clone(), PropertyKey::Cy, 0.0.into());
    }
    let spec = TimelineSpec::new().tween(
        Tween::to(ids.iter().cloned())
            .set(PropertyKey::Cx, 500.0)
            .set(PropertyKey::Cy, 300.0)
            .duration(1.0)
            .ease(Ease::Power1InOut)
            .stagger(0.01),
    );
    let timeline = CompiledTimeline::compile(&spec, &base).expect("compile");

    c.bench_function("timeline_sample_200_elements", |b| {
        b.iter(|| timeline.sample_progress(black_box(0.37)))
    });
}

fn bench_engine_scroll_sweep(c: &mut Criterion) {
    let config = ScrollyConfig::new(Viewport::new(1200, 800));
    let mut engine = ScrollyEngine::new(MemoryScene::new(), config).expect("engine");
    engine
        .load_records(normalize_records(&rows(2_000)))
        .expect("load records");

    c.bench_function("engine_scroll_sweep", |b| {
        b.iter(|| {
            for step in 0..160 {
                engine
                    .scroll_to(black_box(f64::from(step) * 80.0 - 400.0))
                    .expect("scroll down");
            }
            engine.scroll_to(-800.0).expect("scroll up");
            engine.finish_playback().expect("finish");
        })
    });
}

criterion_group!(
    benches,
    bench_kernel_density_10k,
    bench_aggregates_10k,
    bench_timeline_sampling,
    bench_engine_scroll_sweep
);
criterion_main!(benches);
