//! Throughput benchmarks for the Arena LZSS codec.

use bsatool_compression::{compress_lzss, uncompress_lzss};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    /// Uniform data - all bytes are the same (best compression)
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0x20; size]
    }

    /// Random data - no patterns (worst compression)
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    /// Palette indices laid out in horizontal runs, like IMG pixel data
    pub fn indexed_image(size: usize) -> Vec<u8> {
        (0..size).map(|i| ((i / 7 + i / 320) % 16) as u8).collect()
    }
}

const SIZES: [usize; 3] = [1024, 4 * 1024, 16 * 1024];

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzss_compress");
    let patterns: [(&str, PatternGenerator); 3] = [
        ("uniform", test_data::uniform),
        ("random", test_data::random),
        ("indexed_image", test_data::indexed_image),
    ];

    for (name, generator) in patterns {
        for size in SIZES {
            let data = generator(size);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
                b.iter(|| compress_lzss(black_box(data)))
            });
        }
    }

    group.finish();
}

fn bench_uncompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzss_uncompress");
    let patterns: [(&str, PatternGenerator); 2] = [
        ("random", test_data::random),
        ("indexed_image", test_data::indexed_image),
    ];

    for (name, generator) in patterns {
        for size in SIZES {
            let compressed = compress_lzss(&generator(size));
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &compressed, |b, data| {
                b.iter(|| uncompress_lzss(black_box(data)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_compress, bench_uncompress);
criterion_main!(benches);
