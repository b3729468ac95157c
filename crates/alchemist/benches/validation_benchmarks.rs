//! Validation and rule application benchmarks.
//!
//! Measures full-data-set validation and rule application across table sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use alchemist::rules::apply_rules;
use alchemist::validation::{validate_data, validate_rules_advanced};
use alchemist::{DataSet, EntityType, Row, Rule, RulesConfig};

const SKILLS: &[&str] = &["coding", "ml", "etl", "ops", "design"];

/// Generate a data set with `rows` tasks, `rows / 4` workers and `rows / 2` clients.
fn generate_dataset(rows: usize) -> DataSet {
    let tasks = (0..rows)
        .map(|i| {
            Row::from_iter([
                ("TaskID".to_string(), json!(format!("T{}", i))),
                ("Category".to_string(), json!("General")),
                ("Duration".to_string(), json!((i % 3) + 1)),
                ("RequiredSkills".to_string(), json!(SKILLS[i % SKILLS.len()])),
                ("MaxConcurrent".to_string(), json!(1)),
            ])
        })
        .collect();
    let workers = (0..(rows / 4).max(1))
        .map(|i| {
            Row::from_iter([
                ("WorkerID".to_string(), json!(format!("W{}", i))),
                ("Skills".to_string(), json!(SKILLS.join(","))),
                ("AvailableSlots".to_string(), json!("[1,2,3,4,5]")),
                ("MaxLoadPerPhase".to_string(), json!(2)),
                ("WorkerGroup".to_string(), json!(if i % 2 == 0 { "GroupA" } else { "GroupB" })),
            ])
        })
        .collect();
    let clients = (0..(rows / 2).max(1))
        .map(|i| {
            Row::from_iter([
                ("ClientID".to_string(), json!(format!("C{}", i))),
                ("PriorityLevel".to_string(), json!((i % 5) + 1)),
            ])
        })
        .collect();

    DataSet::new()
        .with_table(EntityType::Tasks, tasks)
        .with_table(EntityType::Workers, workers)
        .with_table(EntityType::Clients, clients)
}

fn sample_rules() -> RulesConfig {
    RulesConfig::new()
        .with_rule(Rule::co_run(["T1", "T2", "T3"]))
        .with_rule(Rule::slot_restriction("GroupA", 3))
        .with_rule(Rule::load_limit("GroupB", 1))
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_data");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_dataset(*rows);
        group.throughput(Throughput::Elements(data.total_rows() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| black_box(validate_data(data)))
        });
    }

    group.finish();
}

fn bench_advanced(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_rules_advanced");
    let rules = sample_rules();

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_dataset(*rows);
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| black_box(validate_rules_advanced(&rules, data)))
        });
    }

    group.finish();
}

fn bench_apply_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_rules");
    let rules = sample_rules();

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_dataset(*rows);
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| black_box(apply_rules(data, &rules)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate, bench_advanced, bench_apply_rules);
criterion_main!(benches);
