//! Benchmarks for header parsing and name derivation

use std::fs::File;
use std::io::Write;

use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::TempDir;
use walmend::segment::{derive_canonical_name, parse_header};

fn parse_benchmarks(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("segment");

    let mut buf = vec![0u8; 8192];
    buf[0..2].copy_from_slice(&0xD061u16.to_le_bytes());
    buf[2..4].copy_from_slice(&15u16.to_le_bytes());
    buf[4..8].copy_from_slice(&1u32.to_le_bytes());
    buf[8..16].copy_from_slice(&0x0100_0000u64.to_le_bytes());
    File::create(&path).unwrap().write_all(&buf).unwrap();

    c.bench_function("parse_header", |b| {
        b.iter(|| parse_header(&path).unwrap());
    });

    c.bench_function("derive_canonical_name", |b| {
        b.iter(|| derive_canonical_name(1, 0x0100_0000, 16 * 1024 * 1024).unwrap());
    });
}

criterion_group!(benches, parse_benchmarks);
criterion_main!(benches);
