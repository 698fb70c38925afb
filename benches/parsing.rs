//! Benchmarks for CIF parsing and writing performance.

use cif_core::{parse, write, ParseOptions};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sample_document(blocks: usize, rows: usize) -> String {
    let mut s = String::from("#\\#CIF_2.0\n");
    for b in 0..blocks {
        s.push_str(&format!("data_block{b}\n_title 'a sample block'\n_count {rows}\nloop_\n_a\n_b\n_c\n"));
        for r in 0..rows {
            s.push_str(&format!("v{r} {r} 'text value {r}'\n"));
        }
    }
    s
}

fn bench_parse(c: &mut Criterion) {
    let content = sample_document(4, 500);
    c.bench_function("parse_medium_document", |b| {
        b.iter(|| {
            let cif = parse(black_box(&content), &ParseOptions::default()).expect("parse failed");
            black_box(cif)
        })
    });
}

fn bench_write(c: &mut Criterion) {
    let content = sample_document(4, 500);
    let cif = parse(&content, &ParseOptions::default()).expect("parse failed");
    c.bench_function("write_medium_document", |b| {
        b.iter(|| black_box(write(black_box(&cif))))
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let content = sample_document(1, 100);
    c.bench_function("round_trip_small_document", |b| {
        b.iter(|| {
            let cif = parse(black_box(&content), &ParseOptions::default()).expect("parse failed");
            black_box(write(&cif))
        })
    });
}

criterion_group!(benches, bench_parse, bench_write, bench_round_trip);
criterion_main!(benches);
