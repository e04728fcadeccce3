use cram_rans::{compress_4x8, compress_nx16, uncompress_4x8, uncompress_nx16, Flags, Order};

use criterion::{criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    let mut quality = Vec::<u8>::new();
    let mut bases = Vec::<u8>::new();
    rand::Rng::sample_iter(rand::thread_rng(), &rand::distributions::Standard)
        .take(1 << 20)
        .for_each(|x: u8| {
            quality.push(b'!' + (x % 40));
            bases.push(b"ACGT"[usize::from(x) % 4]);
        });

    let frame_4x8_o0 = compress_4x8(&quality, Order::Zero).unwrap();
    let frame_4x8_o1 = compress_4x8(&quality, Order::One).unwrap();
    let frame_nx16_o0 = compress_nx16(&quality, Flags::empty()).unwrap();
    let frame_nx16_o1 = compress_nx16(&quality, Flags::ORDER).unwrap();
    let frame_nx16_x32 = compress_nx16(&quality, Flags::ORDER | Flags::X32).unwrap();
    let frame_nx16_pack = compress_nx16(&bases, Flags::PACK).unwrap();

    c.bench_function("4x8 order-0 compress", |b| {
        b.iter(|| compress_4x8(&quality, Order::Zero).unwrap())
    });

    c.bench_function("4x8 order-0 uncompress", |b| {
        b.iter(|| uncompress_4x8(&frame_4x8_o0).unwrap())
    });

    c.bench_function("4x8 order-1 compress", |b| {
        b.iter(|| compress_4x8(&quality, Order::One).unwrap())
    });

    c.bench_function("4x8 order-1 uncompress", |b| {
        b.iter(|| uncompress_4x8(&frame_4x8_o1).unwrap())
    });

    c.bench_function("nx16 order-0 compress", |b| {
        b.iter(|| compress_nx16(&quality, Flags::empty()).unwrap())
    });

    c.bench_function("nx16 order-0 uncompress", |b| {
        b.iter(|| uncompress_nx16(&frame_nx16_o0, None).unwrap())
    });

    c.bench_function("nx16 order-1 compress", |b| {
        b.iter(|| compress_nx16(&quality, Flags::ORDER).unwrap())
    });

    c.bench_function("nx16 order-1 uncompress", |b| {
        b.iter(|| uncompress_nx16(&frame_nx16_o1, None).unwrap())
    });

    c.bench_function("nx16 order-1 x32 uncompress", |b| {
        b.iter(|| uncompress_nx16(&frame_nx16_x32, None).unwrap())
    });

    c.bench_function("nx16 pack compress", |b| {
        b.iter(|| compress_nx16(&bases, Flags::PACK).unwrap())
    });

    c.bench_function("nx16 pack uncompress", |b| {
        b.iter(|| uncompress_nx16(&frame_nx16_pack, None).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
