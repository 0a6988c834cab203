//! Benchmarks for bulk revalidation and error remapping.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cellgrid::remap::{rows_deleted, ColumnRemap};
use cellgrid::validation::{collect_checks, RevalidationJob, RevalidationReport};
use cellgrid::{CellValue, ColumnDescriptor, Row, TableData, ValidationOutcome};

const SYMPTOMS: u32 = 12;

fn rules(value: &CellValue, column_type: &str) -> ValidationOutcome {
    match column_type {
        "number" => match value.display().trim().parse::<f64>() {
            Ok(_) => ValidationOutcome::ok(),
            Err(_) if value.is_empty() => ValidationOutcome::ok(),
            Err(_) => ValidationOutcome::invalid("Must be a number"),
        },
        "clinicalSymptom" => match value.display().as_str() {
            "" | "yes" | "no" => ValidationOutcome::ok(),
            _ => ValidationOutcome::invalid("Answer yes or no"),
        },
        _ => ValidationOutcome::ok(),
    }
}

fn columns() -> Vec<ColumnDescriptor> {
    let mut columns = vec![
        ColumnDescriptor::new(0, "shortText", "name"),
        ColumnDescriptor::new(1, "number", "age"),
    ];
    columns.extend((0..SYMPTOMS).map(|i| {
        ColumnDescriptor::new(i + 2, "clinicalSymptom", "symptoms")
            .with_cell_index(i)
            .with_header(&format!("S{i}"))
    }));
    columns
}

/// A line list where roughly one cell in twenty is invalid.
fn table(rows: usize) -> TableData {
    let rows = (0..rows)
        .map(|i| {
            let age = if i % 20 == 0 { "n/a".to_string() } else { (i % 90).to_string() };
            let symptoms = (0..SYMPTOMS as usize)
                .map(|j| match (i + j) % 20 {
                    0 => CellValue::from("sometimes"),
                    n if n % 2 == 0 => CellValue::from("yes"),
                    _ => CellValue::from("no"),
                })
                .collect();
            Row::new()
                .with("name", format!("case {i}"))
                .with("age", age.as_str())
                .with_list("symptoms", symptoms)
        })
        .collect();
    TableData::new(columns(), rows)
}

/// Single-pass revalidation across dataset sizes
fn bench_single_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("revalidate_single_pass");

    for rows in [100, 1_000, 10_000] {
        let checks = collect_checks(&table(rows));
        group.throughput(Throughput::Elements(checks.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &checks, |b, checks| {
            b.iter(|| RevalidationReport::run(black_box(checks), &rules))
        });
    }

    group.finish();
}

/// Chunked revalidation of 10k rows at several chunk sizes
fn bench_chunked(c: &mut Criterion) {
    let checks = collect_checks(&table(10_000));
    let mut group = c.benchmark_group("revalidate_chunked");
    group.throughput(Throughput::Elements(checks.len() as u64));

    for chunk in [500, 5_000] {
        group.bench_with_input(BenchmarkId::new("chunk", chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut job = RevalidationJob::new(checks.clone(), chunk);
                while !job.is_done() {
                    job.step(&rules);
                }
                job.into_report()
            })
        });
    }

    group.finish();
}

/// Snapshotting the store before a pass
fn bench_collect(c: &mut Criterion) {
    let data = table(10_000);
    c.bench_function("collect_checks_10000", |b| {
        b.iter(|| collect_checks(black_box(&data)))
    });
}

/// Rekeying a large error set after row and column mutations
fn bench_remap(c: &mut Criterion) {
    let report = RevalidationReport::run(&collect_checks(&table(10_000)), &rules);
    let errors = report.errors;
    let deleted: Vec<usize> = (0..10_000).step_by(7).collect();

    let old = columns();
    let mut widened = old.clone();
    widened.insert(
        5,
        ColumnDescriptor::new(5, "clinicalSymptom", "symptoms")
            .with_cell_index(3)
            .with_header("Inserted"),
    );
    for (i, column) in widened.iter_mut().enumerate() {
        column.col_index = i as u32;
        if column.column_type == "clinicalSymptom" {
            column.cell_index = i as u32 - 2;
        }
    }

    let mut group = c.benchmark_group("remap");
    group.throughput(Throughput::Elements(errors.len() as u64));

    group.bench_function("rows_deleted", |b| {
        let map = rows_deleted(&deleted);
        b.iter(|| errors.keys().filter_map(|key| map(key)).count())
    });

    group.bench_function("infer_column_remap", |b| {
        b.iter(|| ColumnRemap::between(black_box(&old), black_box(&widened)))
    });

    let remap = ColumnRemap::between(&old, &widened);
    group.bench_function("apply_column_remap", |b| {
        b.iter(|| errors.keys().filter_map(|key| remap.map_key(key)).count())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_pass,
    bench_chunked,
    bench_collect,
    bench_remap,
);

criterion_main!(benches);
