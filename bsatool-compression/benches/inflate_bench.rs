//! Reference inflate versus flate2 on the same streams.

use bsatool_compression::{uncompress_deflate, uncompress_deflate_native};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::hint::black_box;
use std::io::Write;

fn text_like(size: usize) -> Vec<u8> {
    b"#FLOORS\n*BOXCAP 0\n*BOXSIDE 1\n@WALLS\n*MENU 12\n"
        .iter()
        .copied()
        .cycle()
        .take(size)
        .collect()
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("in-memory write");
    encoder.finish().expect("in-memory finish")
}

fn bench_inflate(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflate");

    for size in [16 * 1024, 256 * 1024] {
        let compressed = deflate(&text_like(size));
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("reference", size), &compressed, |b, data| {
            b.iter(|| uncompress_deflate_native(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("flate2", size), &compressed, |b, data| {
            b.iter(|| uncompress_deflate(black_box(data)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inflate);
criterion_main!(benches);
