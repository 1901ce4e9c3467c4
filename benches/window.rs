#![allow(unused)]
extern crate chunkio;

use chunkio::prelude::*;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

const STORE_LEN: usize = 4 * 1024 * 1024;

fn store() -> Vec<u8> {
    (0..STORE_LEN).map(|i| (i % 251) as u8).collect()
}

/// Sequential `u32` reads through windows of various sizes, against direct reads.
fn bench_sequential_reads(c: &mut Criterion) {
    let data = store();

    let mut group = c.benchmark_group("sequential_u32");
    group.throughput(Throughput::Bytes(STORE_LEN as u64));

    for window in [None, Some(0x1000_u64), Some(0x10000), Some(0x100000)] {
        let label = window.map_or_else(|| "direct".to_string(), |len| format!("{:#x}", len));
        group.bench_with_input(BenchmarkId::from_parameter(label), &window, |b, window| {
            b.iter(|| {
                let mut options = StreamOptions::default();
                options.window = *window;

                let mut stream = Stream::new();
                stream.open(Source::Memory(data.clone()), options).unwrap();
                let mut sum = 0_u64;
                while stream.remaining().unwrap() >= 4 {
                    sum = sum.wrapping_add(u64::from(stream.read::<u32>().unwrap()));
                }
                black_box(sum)
            });
        });
    }
    group.finish();
}

/// Pattern search near the end of the store.
fn bench_search(c: &mut Criterion) {
    let mut data = store();
    data[STORE_LEN - 16..STORE_LEN - 12].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

    let mut stream = Stream::new();
    stream
        .open(Source::Memory(data), StreamOptions::default().with_window(0x10000))
        .unwrap();

    let mut group = c.benchmark_group("search");
    group.throughput(Throughput::Bytes(STORE_LEN as u64));
    group.bench_function("search_bytes", |b| {
        b.iter(|| black_box(stream.search_bytes(black_box(&[0xDE, 0xAD, 0xBE, 0xEF])).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_sequential_reads, bench_search);
criterion_main!(benches);
