use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use fermata_rule::{JudgeProperty, JudgeTier, ScoreState};

fn bench_classify_sweep(c: &mut Criterion) {
    let prop = JudgeProperty::default();
    let deltas: Vec<i64> = (-150_000_i64..150_000).step_by(37).collect();

    c.bench_function("classify_sweep", |b| {
        b.iter(|| {
            let mut judged = 0_u32;
            for &delta in &deltas {
                if prop.classify(black_box(delta)).is_judged() {
                    judged += 1;
                }
            }
            judged
        });
    });
}

fn bench_score_accumulation(c: &mut Criterion) {
    let prop = JudgeProperty::default();
    let deltas: Vec<i64> = (0..10_000_i64)
        .map(|i| (i * 7919) % 120_000 - 60_000)
        .collect();

    c.bench_function("score_accumulation", |b| {
        b.iter(|| {
            let mut state = ScoreState::new();
            for &delta in &deltas {
                let tier = prop.classify(delta);
                if tier == JudgeTier::NotEntered {
                    state.record_expired();
                } else {
                    state.record_judged(tier, delta);
                }
            }
            black_box(state.snapshot())
        });
    });
}

criterion_group!(benches, bench_classify_sweep, bench_score_accumulation);
criterion_main!(benches);
