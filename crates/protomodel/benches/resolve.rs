// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::unwrap_used)] // Benchmark setup

//! Serializer resolution and serialization hot paths.
//!
//! Run with: `cargo bench -p protomodel --bench resolve`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protomodel::{
    MessageShape, MessageValue, ShapeCatalog, TypeKey, TypeModel, TypeShape, Value,
};
use std::sync::Arc;

fn point_model() -> TypeModel {
    let catalog = Arc::new(ShapeCatalog::new());
    catalog.insert(
        "Demo.Point",
        TypeShape::Message(
            MessageShape::contract()
                .field(1, "x", "builtin.i32")
                .field(2, "y", "builtin.i32"),
        ),
    );
    catalog.insert(
        "Demo.Path",
        TypeShape::Message(MessageShape::contract().field(1, "points", "Demo.Points")),
    );
    catalog.insert("Demo.Points", TypeShape::Collection(TypeKey::new("Demo.Point")));
    TypeModel::new(catalog)
}

// ============================================================================
// Resolution
// ============================================================================

/// Cached resolution: one DashMap hit, no lock.
///
/// Target: < 100 ns
fn bench_resolve_cached(c: &mut Criterion) {
    let model = point_model();
    let key = TypeKey::new("Demo.Point");
    model.resolve(&key).unwrap();

    c.bench_function("resolve_cached", |b| {
        b.iter(|| black_box(model.resolve(black_box(&key)).unwrap()))
    });
}

/// Cold path: registration plus serializer build after a reset.
fn bench_resolve_after_reset(c: &mut Criterion) {
    let model = point_model();
    let key = TypeKey::new("Demo.Point");
    model.resolve(&key).unwrap();

    c.bench_function("resolve_after_reset", |b| {
        b.iter(|| {
            model.reset_serializer(&key);
            black_box(model.resolve(&key).unwrap())
        })
    });
}

// ============================================================================
// Serialization
// ============================================================================

fn bench_serialize_point(c: &mut Criterion) {
    let model = point_model();
    let key = TypeKey::new("Demo.Point");
    let value = Value::Message(MessageValue::new("Demo.Point").with("x", 150).with("y", -3));
    model.resolve(&key).unwrap();

    c.bench_function("serialize_point", |b| {
        b.iter(|| black_box(model.serialize(&key, black_box(&value)).unwrap()))
    });

    let bytes = model.serialize(&key, &value).unwrap();
    c.bench_function("deserialize_point", |b| {
        b.iter(|| black_box(model.deserialize(&key, black_box(&bytes)).unwrap()))
    });
}

/// 256 nested messages through a repeated field.
fn bench_serialize_path(c: &mut Criterion) {
    let model = point_model();
    let key = TypeKey::new("Demo.Path");
    let points = (0..256)
        .map(|i| Value::Message(MessageValue::new("Demo.Point").with("x", i).with("y", -i)))
        .collect();
    let value = Value::Message(MessageValue::new("Demo.Path").with("points", Value::List(points)));

    c.bench_function("serialize_path_256", |b| {
        b.iter(|| black_box(model.serialize(&key, black_box(&value)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_resolve_cached,
    bench_resolve_after_reset,
    bench_serialize_point,
    bench_serialize_path
);
criterion_main!(benches);
