use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use vigenere_provider::{
    provider_init, CoreHandle, ErrorReporter, ReasonCode, SourceLocation, UpcallTable,
    VigenereContext,
};

struct SilentReporter;

impl ErrorReporter for SilentReporter {
    fn report(&self, _reason: ReasonCode, _location: Option<SourceLocation>) {}
}

fn bench_context() -> VigenereContext {
    let provider = provider_init(
        CoreHandle::new(0),
        UpcallTable::new(Arc::new(SilentReporter)),
    )
    .expect("provider loads");
    VigenereContext::new(Arc::clone(provider.handle()))
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    let key = [0x5Au8; 16];
    for size in [64usize, 4096, 1 << 20] {
        let input = vec![0xA5u8; size];
        let mut out = vec![0u8; size];
        let mut ctx = bench_context();
        ctx.encrypt_init(Some(&key)).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("encrypt_{size}"), |b| {
            b.iter(|| {
                let written = ctx.update(&mut out, &input).unwrap();
                black_box(written)
            })
        });
    }
    group.finish();
}

fn bench_init(c: &mut Criterion) {
    let mut group = c.benchmark_group("init");
    let key = [0x5Au8; 16];
    let mut ctx = bench_context();
    group.bench_function("encrypt_init_16", |b| {
        b.iter(|| ctx.encrypt_init(Some(black_box(&key))).unwrap())
    });
    group.bench_function("decrypt_init_16", |b| {
        b.iter(|| ctx.decrypt_init(Some(black_box(&key))).unwrap())
    });
    group.finish();
}

fn bench_duplicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("duplicate");
    let mut ctx = bench_context();
    ctx.encrypt_init(Some(&[0x5Au8; 64])).unwrap();
    let mut out = [0u8; 32];
    ctx.update(&mut out, &[0u8; 32]).unwrap();
    group.bench_function("mid_stream", |b| {
        b.iter(|| {
            let dup = ctx.duplicate();
            black_box(dup)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_update, bench_init, bench_duplicate);
criterion_main!(benches);
