use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::config::{EngineConfig, SelectionParams};
use adaptest_core::engine::{CatEngine, SessionOverrides};
use adaptest_core::model::{Item, KnowledgePoint, Session, Submission};
use adaptest_core::prioritizer::prioritize;
use adaptest_core::selector::select_next;

fn make_pool(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| {
            let difficulty = -3.0 + 6.0 * i as f64 / n as f64;
            Item::new(format!("item-{i}"), difficulty, format!("kp-{}", i % 25))
        })
        .collect()
}

fn make_knowledge_points() -> Vec<KnowledgePoint> {
    (0..25)
        .map(|i| {
            let mut kp = KnowledgePoint::new(format!("kp-{i}"));
            kp.is_core = i % 3 == 0;
            kp.importance = Some((i % 5) as f64 / 5.0);
            if i > 0 {
                kp.prerequisites = vec![format!("kp-{}", i - 1)];
            }
            kp
        })
        .collect()
}

/// A session that has already answered `answered` items from the pool.
fn make_session(engine: &CatEngine, pool: &[Item], answered: usize) -> Session {
    let mut session = engine.start(&SessionOverrides::default()).unwrap();
    for (i, item) in pool.iter().step_by(7).take(answered).enumerate() {
        engine
            .record_answer(&mut session, item, &Submission::new(&item.id, i % 2 == 0))
            .unwrap();
    }
    session
}

fn bench_select_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_next");
    let params = SelectionParams::default();
    let engine = CatEngine::new(EngineConfig {
        session: adaptest_core::config::SessionConfig {
            min_items: 0,
            max_items: 200,
            target_precision: 0.01,
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();

    for size in [100usize, 1_000, 10_000] {
        let pool = make_pool(size);
        let session = make_session(&engine, &pool, 20);
        group.bench_function(format!("pool={size}"), |b| {
            b.iter(|| select_next(black_box(&session), black_box(&pool), &params))
        });
    }

    group.finish();
}

fn bench_next_item(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_item");
    let engine = CatEngine::new(EngineConfig::default()).unwrap();
    let pool = make_pool(1_000);
    let kps = make_knowledge_points();

    group.bench_function("pool=1000,kps=25", |b| {
        let session = make_session(&engine, &pool, 5);
        b.iter(|| {
            let mut session = session.clone();
            engine
                .next_item(black_box(&mut session), black_box(&pool), black_box(&kps))
                .is_finished()
        })
    });

    group.finish();
}

fn bench_prioritize(c: &mut Criterion) {
    let engine = CatEngine::new(EngineConfig::default()).unwrap();
    let pool = make_pool(1_000);
    let kps = make_knowledge_points();
    let session = make_session(&engine, &pool, 8);

    c.bench_function("prioritize/kps=25", |b| {
        b.iter(|| prioritize(black_box(&session), black_box(&kps)))
    });
}

criterion_group!(benches, bench_select_next, bench_next_item, bench_prioritize);
criterion_main!(benches);
