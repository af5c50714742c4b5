//! Benchmark suite for workloop subsystems.
//!
//! This module provides performance benchmarks for:
//! - Document validation (full-pass issue collection)
//! - Task graph conversion (priority sort + edge emission)
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Save baseline for comparison
//! cargo bench -- --save-baseline main
//!
//! # Compare against baseline
//! cargo bench -- --baseline main
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use workloop::document::WorkDocument;
use workloop::taskgraph::TaskGraph;
use workloop::validate::validate_str;

/// Generate a document with the given number of stories, three criteria
/// each, priorities deliberately shuffled.
fn generate_document(stories: usize) -> String {
    let stories_json: Vec<String> = (0..stories)
        .map(|n| {
            format!(
                r#"{{
                  "id": "US-{:03}",
                  "title": "Story {}",
                  "description": "generated",
                  "acceptanceCriteria": ["one", "two", "three"],
                  "priority": {},
                  "passes": false,
                  "notes": ""
                }}"#,
                n,
                n,
                stories - n
            )
        })
        .collect();

    format!(
        r#"{{
          "project": "Bench",
          "branchName": "workloop/bench",
          "description": "generated plan",
          "userStories": [{}]
        }}"#,
        stories_json.join(",")
    )
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    for size in [10, 100, 500] {
        let content = generate_document(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("validate_str", size), &content, |b, content| {
            b.iter(|| black_box(validate_str(black_box(content))));
        });
    }

    group.finish();
}

fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");

    for size in [10, 100, 500] {
        let doc = WorkDocument::from_json(&generate_document(size)).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("from_document", size), &doc, |b, doc| {
            b.iter(|| black_box(TaskGraph::from_document(black_box(doc))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validation, bench_conversion);
criterion_main!(benches);
