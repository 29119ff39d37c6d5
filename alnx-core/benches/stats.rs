use criterion::{black_box, criterion_group, criterion_main, Criterion};

use alnx_core::{AlignmentArray, Background, AMINO_GAP};

/// Deterministic synthetic alignment: position characters cycle through the
/// alphabet with a row- and column-dependent phase, giving every column a
/// mixed but reproducible composition.
fn build_alignment(n_rows: usize, n_positions: usize) -> AlignmentArray {
    let alphabet = AMINO_GAP.as_bytes();
    let names: Vec<String> = (0..n_rows).map(|i| format!("seq{}", i)).collect();
    let raws: Vec<String> = (0..n_rows)
        .map(|row| {
            (0..n_positions)
                .map(|column| alphabet[(row * 7 + column * 11) % alphabet.len()] as char)
                .collect()
        })
        .collect();
    AlignmentArray::from_rows(&names, &raws).expect("synthetic alignment")
}

fn bench_statistics(c: &mut Criterion) {
    let array = build_alignment(500, 120);
    let positions = array.to_position_array().expect("position array");
    let background = Background::blosum62();

    c.bench_function("frequency_500x120", |b| {
        b.iter(|| black_box(positions.frequency(AMINO_GAP, 0.0)))
    });

    c.bench_function("entropy_500x120", |b| {
        b.iter(|| black_box(positions.entropy(AMINO_GAP, 0.0)))
    });

    c.bench_function("jsdivergence_500x120", |b| {
        b.iter(|| black_box(positions.jsdivergence(None, &background).unwrap()))
    });

    c.bench_function("consensus_500x120", |b| {
        b.iter(|| black_box(positions.consensus(false, &background)))
    });
}

fn bench_editing(c: &mut Criterion) {
    let array = build_alignment(200, 200);

    c.bench_function("define_insertions_200x200", |b| {
        b.iter(|| black_box(array.define_insertions(0.4).unwrap()))
    });

    c.bench_function("position_array_200x200", |b| {
        b.iter(|| black_box(array.to_position_array().unwrap()))
    });
}

criterion_group!(benches, bench_statistics, bench_editing);
criterion_main!(benches);
