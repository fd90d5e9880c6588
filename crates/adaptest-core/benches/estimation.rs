use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::analysis::analyze;
use adaptest_core::engine::{CatEngine, SessionOverrides};
use adaptest_core::estimator::update;
use adaptest_core::irt::{information, p_correct};
use adaptest_core::model::{AbilityEstimate, Item, Submission};

fn bench_irt(c: &mut Criterion) {
    let mut group = c.benchmark_group("irt");

    group.bench_function("p_correct", |b| {
        b.iter(|| p_correct(black_box(0.4), black_box(-0.2), black_box(1.3)))
    });

    group.bench_function("information", |b| {
        b.iter(|| information(black_box(0.4), black_box(-0.2), black_box(1.3)))
    });

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimator_update");
    let start = AbilityEstimate::new(0.3, 0.7);

    group.bench_function("correct", |b| {
        b.iter(|| update(black_box(start), true, black_box(0.5), black_box(1.0)))
    });

    group.bench_function("incorrect", |b| {
        b.iter(|| update(black_box(start), false, black_box(0.5), black_box(1.0)))
    });

    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let engine = CatEngine::default();
    let mut session = engine
        .start(&SessionOverrides {
            min_items: Some(30),
            max_items: Some(30),
            ..Default::default()
        })
        .unwrap();
    for i in 0..29 {
        let item = Item::new(format!("q{i}"), (i as f64 - 15.0) / 5.0, format!("kp{}", i % 6));
        engine
            .record_answer(&mut session, &item, &Submission::new(&item.id, i % 3 != 0).with_time(15))
            .unwrap();
    }

    c.bench_function("analyze/responses=29", |b| b.iter(|| analyze(black_box(&session))));
}

criterion_group!(benches, bench_irt, bench_update, bench_analyze);
criterion_main!(benches);
