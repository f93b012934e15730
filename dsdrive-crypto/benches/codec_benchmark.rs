//! Benchmarks for dsdrive-crypto

use criterion::{criterion_group, criterion_main, Criterion};
use dsdrive_crypto::ChunkCodec;
use std::hint::black_box;

fn benchmark_codec_new(c: &mut Criterion) {
    c.bench_function("codec_new", |b| {
        b.iter(|| ChunkCodec::new(black_box("a reasonably long operator passphrase")))
    });
}

fn benchmark_encrypt(c: &mut Criterion) {
    let codec = ChunkCodec::new("a reasonably long operator passphrase");
    let chunk = vec![0xABu8; 64 * 1024];

    c.bench_function("encrypt_64kib", |b| {
        b.iter(|| codec.encrypt(black_box(&chunk)))
    });
}

fn benchmark_decrypt(c: &mut Criterion) {
    let codec = ChunkCodec::new("a reasonably long operator passphrase");
    let chunk = vec![0xABu8; 64 * 1024];
    let envelope = codec.encrypt(&chunk);

    c.bench_function("decrypt_64kib", |b| {
        b.iter(|| codec.decrypt(black_box(&envelope)).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_codec_new,
    benchmark_encrypt,
    benchmark_decrypt
);
criterion_main!(benches);
