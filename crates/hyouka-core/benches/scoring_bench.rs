use criterion::{Criterion, black_box, criterion_group, criterion_main};
use hyouka_core::{Record, ScoringContext, rank, scoring};

fn synthetic_batch(len: usize) -> Vec<Record> {
    (0..len)
        .map(|i| {
            let mut record = Record::new(format!("Title {i}"));
            record.score = Some(5.0 + (i % 50) as f64 / 10.0);
            record.scored_by = Some(100 + (i as u64 * 37) % 500_000);
            record
        })
        .collect()
}

fn bench_scoring(c: &mut Criterion) {
    let records = synthetic_batch(1_000);
    let ctx = ScoringContext::from_records(&records, None).unwrap();

    c.bench_function("context_from_1000_records", |b| {
        b.iter(|| ScoringContext::from_records(black_box(&records), None).unwrap());
    });

    c.bench_function("score_all_1000", |b| {
        b.iter(|| scoring::score_all(black_box(&records), &ctx).unwrap());
    });

    c.bench_function("score_and_rank_1000_top_20", |b| {
        b.iter(|| {
            let scored = scoring::score_all(black_box(&records), &ctx).unwrap();
            rank::top_k(scored, 20)
        });
    });
}

criterion_group!(benches, bench_scoring);
criterion_main!(benches);
