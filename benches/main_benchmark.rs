use lofloat::{decode, encode, fma, generate, mul, Float, FP16, FP32};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

// Simple LFSR for reproducible random bit patterns, independent of the
// generator's seeded RNG.
struct Lfsr {
    state: u32,
}

impl Lfsr {
    fn new() -> Lfsr {
        Lfsr { state: 0x13371337 }
    }
    fn get(&mut self) -> u32 {
        let mut res: u32 = 0;
        for _ in 0..32 {
            let a = (self.state >> 24) & 1;
            let b = (self.state >> 23) & 1;
            let c = (self.state >> 22) & 1;
            let d = (self.state >> 17) & 1;
            let n = a ^ b ^ c ^ d ^ 1;
            self.state <<= 1;
            self.state |= n;
            res <<= 1;
            res ^= self.state & 0x1;
        }
        res
    }
}

fn test_codec_round_trip() {
    for bits in 0..(1u64 << 16) {
        black_box(encode(&decode(bits, &FP16), &FP16));
    }
}

fn test_mul_fp32() {
    let mut lfsr = Lfsr::new();
    for _ in 0..1000 {
        let a = lfsr.get() as u64;
        let b = lfsr.get() as u64;
        black_box(mul(a, b, &FP32, &FP32));
    }
}

fn test_fma_widening() {
    let mut lfsr = Lfsr::new();
    for _ in 0..1000 {
        let a = (lfsr.get() & 0xffff) as u64;
        let b = (lfsr.get() & 0xffff) as u64;
        let c = (lfsr.get() & 0xffff) as u64;
        black_box(fma(a, b, c, &FP16, &FP32));
    }
}

fn test_encode_from_double() {
    for i in 0..1000u64 {
        let v = Float::from_f64(0.37 * i as f64);
        black_box(encode(&v, &FP16));
    }
}

fn test_generate_corpus() {
    black_box(generate());
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("codec_round_trip", |b| b.iter(test_codec_round_trip));
    c.bench_function("mul_fp32", |b| b.iter(test_mul_fp32));
    c.bench_function("fma_widening", |b| b.iter(test_fma_widening));
    c.bench_function("encode_from_double", |b| b.iter(test_encode_from_double));
    c.bench_function("generate_corpus", |b| b.iter(test_generate_corpus));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
