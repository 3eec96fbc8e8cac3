use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hei_scorer::aggregation::PersonTotalRecord;
use hei_scorer::{DietScorer, NutrientCategory, NutrientVector, ParticipantIntake, PersonAggregate};

fn synthetic_intakes(n: usize) -> Vec<ParticipantIntake> {
    (0..n)
        .map(|i| {
            let id = format!("{:06}", i);
            let scale = (i % 17) as f64 / 8.0;

            let mut totals = NutrientVector::default();
            for (k, category) in NutrientCategory::ALL.iter().enumerate() {
                totals.set(*category, Some(scale * (k + 1) as f64 / 4.0));
            }
            let energy = 1200.0 + (i % 900) as f64;

            ParticipantIntake {
                participant_id: id.clone(),
                aggregate: Some(PersonAggregate::new(id.clone(), totals, energy, Some(1.0))),
                totals: Some(PersonTotalRecord {
                    participant_id: id,
                    sodium_mg: Some(2500.0 + (i % 700) as f64),
                    satfat_g: Some(20.0 + (i % 15) as f64),
                    energy_kcal: Some(energy),
                    total_diet_weight: Some(10_000.0),
                }),
            }
        })
        .collect()
}

fn benchmark_scoring(c: &mut Criterion) {
    let scorer = DietScorer::default();
    let mut group = c.benchmark_group("score_all");

    for size in [1_000, 10_000] {
        let intakes = synthetic_intakes(size);

        group.bench_with_input(BenchmarkId::new("sequential", size), &intakes, |b, intakes| {
            b.iter(|| scorer.score_all(black_box(intakes)));
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &intakes, |b, intakes| {
            b.iter(|| scorer.score_all_parallel(black_box(intakes)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_scoring);
criterion_main!(benches);
