use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use entropy_service::EntropyService;

fn bench_generate(c: &mut Criterion) {
    let service = EntropyService::default();
    service.seed(&[0x42u8; 32]);

    let mut group = c.benchmark_group("generate");
    for size in [32i64, 1024, 64 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("strong", size), &size, |b, &n| {
            b.iter(|| service.generate_bytes(n).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("pseudo", size), &size, |b, &n| {
            b.iter(|| service.generate_pseudo_bytes(n).unwrap())
        });
    }
    group.finish();
}

fn bench_mix(c: &mut Criterion) {
    let service = EntropyService::default();
    let data = [0x17u8; 256];

    c.bench_function("add_entropy_256", |b| {
        b.iter(|| service.add_entropy(&data, 8.0))
    });
}

criterion_group!(benches, bench_generate, bench_mix);
criterion_main!(benches);
