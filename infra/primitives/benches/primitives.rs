use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use wcrypt_primitives::random::random_bytes;
use wcrypt_primitives::{HashFunction, aes, kdf};

fn bench_pbkdf2(c: &mut Criterion) {
    let mut group = c.benchmark_group("pbkdf2");

    for iterations in [1_000u32, 10_000] {
        group.bench_with_input(BenchmarkId::new("sha256", iterations), &iterations, |b, &n| {
            b.iter(|| kdf::pbkdf2(b"bench-password", b"bench-salt", n, 32, HashFunction::Sha256).unwrap());
        });
    }

    group.finish();
}

fn bench_aes_gcm(c: &mut Criterion) {
    let mut group = c.benchmark_group("aes_gcm");

    let key = random_bytes(32).expect("System RNG unavailable for benchmark key");
    let iv = [0u8; aes::GCM_IV_LEN];
    let sizes = [("256B", 256usize), ("4KB", 4 * 1024), ("64KB", 64 * 1024)];

    for (label, size) in sizes {
        let data = random_bytes(size).expect("System RNG unavailable for benchmark data");
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encrypt", label), &data, |b, d| {
            b.iter(|| aes::aes_gcm_encrypt(&key, &iv, b"", 16, d).unwrap());
        });

        let sealed = aes::aes_gcm_encrypt(&key, &iv, b"", 16, &data).expect("seal failed");
        group.bench_with_input(BenchmarkId::new("decrypt", label), &sealed, |b, s| {
            b.iter(|| aes::aes_gcm_decrypt(&key, &iv, b"", 16, s).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pbkdf2, bench_aes_gcm);
criterion_main!(benches);
