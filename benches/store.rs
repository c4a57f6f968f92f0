// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use proteus::model::Document;
use proteus::store::{DocumentPackage, InMemoryPackage, BODY_FILENAME};

mod fixtures;
mod profiler;

use fixtures::TempDir;

fn checksum_compute_only_save(document: &Document) -> u64 {
    let package = InMemoryPackage::from_document(black_box(document)).expect("from_document");

    let mut acc = 0u64;
    for name in package.member_names() {
        acc = acc.wrapping_mul(131).wrapping_add(name.len() as u64);
        if let Some(bytes) = package.member(name) {
            acc = acc.wrapping_mul(131).wrapping_add(bytes.len() as u64);
        }
    }
    acc
}

// Benchmark identity (keep stable):
// - Group names in this file: `store.save_package`, `store.load_package`
// - Case IDs (the string after the `/`) must remain stable across refactors so
//   results stay comparable over time (e.g. `compute_only_small`, `io_medium`).
// - If implementations move/deduplicate, update the wiring but do not rename
//   group or case IDs.
fn benches_store(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("store.save_package");

        let document_small = fixtures::doc::fixture(fixtures::doc::Case::Small);
        let document_small_compute = document_small.clone();
        group.bench_function("compute_only_small", move |b| {
            b.iter(|| black_box(checksum_compute_only_save(black_box(&document_small_compute))))
        });
        group.bench_function("io_small", move |b| {
            b.iter_batched_ref(
                || TempDir::new("store_save_package_io_small"),
                |tmp| {
                    let package = DocumentPackage::at(tmp.path().join("bench.rtfdsl"));
                    package.save(black_box(&document_small)).expect("save");
                    let body = package.path().join(BODY_FILENAME);
                    black_box(std::fs::metadata(body).expect("body metadata").len())
                },
                BatchSize::SmallInput,
            )
        });

        let document_medium = fixtures::doc::fixture(fixtures::doc::Case::Medium);
        let document_medium_compute = document_medium.clone();
        group.bench_function("compute_only_medium", move |b| {
            b.iter(|| black_box(checksum_compute_only_save(black_box(&document_medium_compute))))
        });
        group.bench_function("io_medium", move |b| {
            b.iter_batched_ref(
                || TempDir::new("store_save_package_io_medium"),
                |tmp| {
                    let package = DocumentPackage::at(tmp.path().join("bench.rtfdsl"));
                    package.save(black_box(&document_medium)).expect("save");
                    let body = package.path().join(BODY_FILENAME);
                    black_box(std::fs::metadata(body).expect("body metadata").len())
                },
                BatchSize::SmallInput,
            )
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("store.load_package");

        for (case_id, case) in [
            ("small", fixtures::doc::Case::Small),
            ("medium", fixtures::doc::Case::Medium),
        ] {
            let tmp = TempDir::new("store_load_package");
            let package = DocumentPackage::at(tmp.path().join("bench.rtfdsl"));
            package.save(&fixtures::doc::fixture(case)).expect("save");
            group.bench_function(case_id, move |b| {
                // tmp lives inside the closure so the package survives
                // until the bench is done.
                let _tmp = &tmp;
                b.iter(|| {
                    let loaded = package.load().expect("load");
                    black_box(fixtures::checksum_document(black_box(&loaded.document)))
                })
            });
        }

        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_store
}
criterion_main!(benches);
