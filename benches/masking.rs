//! Benchmarks for secret masking and schema validation.
//!
//! Masking sits on every secrets read endpoint; it must stay cheap enough
//! that nobody is tempted to cache plaintext views.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use tessera::registry::{FieldSchema, FieldSpec, FieldType};
use tessera::secrets::{mask_secret, validate_bucket, SecretStore};

fn bench_mask_secret(c: &mut Criterion) {
    c.bench_function("mask_secret_short", |b| {
        b.iter(|| black_box(mask_secret(black_box("sk-12345"))));
    });

    c.bench_function("mask_secret_long", |b| {
        b.iter(|| {
            black_box(mask_secret(black_box(
                "sk-live-0123456789abcdef0123456789abcdef",
            )))
        });
    });
}

/// Full masked-bucket view: lock, clone, redact every string field.
fn bench_masked_view(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = SecretStore::open_plain(&dir.path().join("secrets.json")).unwrap();
    let mut bucket = serde_json::Map::new();
    for i in 0..10 {
        bucket.insert(
            format!("field_{i}"),
            json!(format!("secret-value-{i}-0123456789")),
        );
    }
    store
        .set("bench-widget", serde_json::Value::Object(bucket))
        .unwrap();

    c.bench_function("masked_view_10_fields", |b| {
        b.iter(|| black_box(store.masked(black_box("bench-widget"))));
    });
}

fn bench_validate_bucket(c: &mut Criterion) {
    let mut schema = FieldSchema::new();
    schema.insert("api_key".to_string(), FieldSpec::required(FieldType::String));
    schema.insert(
        "provider".to_string(),
        FieldSpec::optional(FieldType::String, json!("finnhub"))
            .with_options(&["finnhub", "alphavantage"]),
    );
    schema.insert(
        "retries".to_string(),
        FieldSpec::optional(FieldType::Number, json!(3)),
    );
    let bucket = json!({"api_key": "sk-0123456789", "provider": "finnhub", "retries": 5});

    c.bench_function("validate_bucket_3_fields", |b| {
        b.iter(|| black_box(validate_bucket(black_box(&bucket), &schema)));
    });
}

criterion_group!(benches, bench_mask_secret, bench_masked_view, bench_validate_bucket);
criterion_main!(benches);
