//! Deterministic construction of the golden reference corpora.
//!
//! A single RNG is seeded once and advanced in a fixed order that is part
//! of the output contract, since the emitted vectors are checked into test
//! infrastructure: the arithmetic corpus runs format by format in the
//! order fp16, bf16, ofp8e5m2, ofp8e4m3, drawing the a, b and c operands
//! interleaved per index for the normal fill and again for the subnormal
//! prefix; the narrowing corpus follows pair by pair in the order fp16,
//! bf16, ofp8e5m2, ofp8e4m3, one draw per index and then the subnormal
//! prefix. No draws are consumed anywhere else.

use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::arithmetic::{add, convert, fma, mul, sub};
use super::codec::encode;
use super::float::Float;
use super::format::{Semantics, BF16, FP16, FP32, OFP8E4M3, OFP8E5M2};

/// Elements per emitted array.
pub const COUNT: usize = 128;
/// Length of the prefix that is re-drawn from the subnormal range.
pub const SPECIAL_COUNT: usize = 20;

const SEED: u64 = 0;

/// One labeled array of bit patterns, ready for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    /// Storage width of one element in bytes (1, 2 or 4).
    pub byte_width: usize,
    pub data: Vec<u64>,
}

/// The full generated corpus: the shared element count plus every operand
/// and result array, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    pub count: usize,
    pub blocks: Vec<Block>,
}

struct ArithFormat {
    name: &'static str,
    sem: Semantics,
    /// Result format of the widening fused multiply-add.
    wide: Semantics,
    lo: f64,
    hi: f64,
}

/// The arithmetic corpus: operands drawn in the format itself, results in
/// the format (add/sub/mul) or its widened counterpart (fma).
const ARITH_FORMATS: [ArithFormat; 4] = [
    ArithFormat { name: "fp16", sem: FP16, wide: FP32, lo: -1e2, hi: 1e2 },
    ArithFormat { name: "bf16", sem: BF16, wide: FP32, lo: -1e15, hi: 1e15 },
    ArithFormat { name: "ofp8e5m2", sem: OFP8E5M2, wide: FP16, lo: -1e2, hi: 1e2 },
    ArithFormat { name: "ofp8e4m3", sem: OFP8E4M3, wide: FP16, lo: -3e1, hi: 3e1 },
];

struct NarrowPair {
    name: &'static str,
    wide: Semantics,
    narrow: Semantics,
    lo: f64,
    hi: f64,
}

/// The narrowing corpus: operands drawn in the wide format, converted down.
const NARROW_PAIRS: [NarrowPair; 4] = [
    NarrowPair { name: "fp16", wide: FP32, narrow: FP16, lo: -1e2, hi: 1e2 },
    NarrowPair { name: "bf16", wide: FP32, narrow: BF16, lo: -1e15, hi: 1e15 },
    NarrowPair { name: "ofp8e5m2", wide: BF16, narrow: OFP8E5M2, lo: -1e2, hi: 1e2 },
    NarrowPair { name: "ofp8e4m3", wide: BF16, narrow: OFP8E4M3, lo: -3e1, hi: 3e1 },
];

fn byte_width(sem: &Semantics) -> usize {
    sem.get_total_len() / 8
}

/// The smallest positive normal value of the format; draws below it in
/// magnitude encode as subnormals or zero.
fn min_normal(sem: &Semantics) -> f64 {
    (sem.get_exp_bounds().0 as f64).exp2()
}

fn pattern(v: f64, sem: &Semantics) -> u64 {
    encode(&Float::from_f64(v), sem)
}

/// Overwrite the fixed indices with the literal edge cases, so that every
/// row of the special-value tables is exercised at least once per corpus.
fn seed_specials(a: &mut [u64], b: &mut [u64], sem: &Semantics) {
    a[0] = pattern(f64::INFINITY, sem);
    a[1] = pattern(f64::NAN, sem);
    b[2] = pattern(f64::INFINITY, sem);
    b[3] = pattern(f64::NAN, sem);
    a[4] = pattern(f64::NEG_INFINITY, sem);
    a[5] = pattern(-f64::NAN, sem);
    a[6] = pattern(f64::INFINITY, sem);
    b[6] = pattern(f64::NAN, sem);
    a[7] = pattern(0.0, sem);
    a[8] = pattern(0.0, sem);
}

/// Build the full corpus. Two calls produce identical results.
pub fn generate() -> Corpus {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut blocks = Vec::new();

    for f in &ARITH_FORMATS {
        let dist = Uniform::new(f.lo, f.hi).expect("nonempty draw range");
        let m = min_normal(&f.sem);
        let sub_dist = Uniform::new(-m, m).expect("nonempty draw range");

        let mut a = vec![0u64; COUNT];
        let mut b = vec![0u64; COUNT];
        let mut c = vec![0u64; COUNT];
        for i in 0..COUNT {
            a[i] = pattern(dist.sample(&mut rng), &f.sem);
            b[i] = pattern(dist.sample(&mut rng), &f.sem);
            c[i] = pattern(dist.sample(&mut rng), &f.sem);
        }
        // Guarantee subnormal coverage in a fixed prefix.
        for i in 0..SPECIAL_COUNT {
            a[i] = pattern(sub_dist.sample(&mut rng), &f.sem);
            b[i] = pattern(sub_dist.sample(&mut rng), &f.sem);
            c[i] = pattern(sub_dist.sample(&mut rng), &f.sem);
        }
        seed_specials(&mut a, &mut b, &f.sem);

        let w = byte_width(&f.sem);
        let ww = byte_width(&f.wide);
        let results = |op: fn(u64, u64, &Semantics, &Semantics) -> u64| -> Vec<u64> {
            (0..COUNT).map(|i| op(a[i], b[i], &f.sem, &f.sem)).collect()
        };
        let fma_results: Vec<u64> = (0..COUNT)
            .map(|i| fma(a[i], b[i], c[i], &f.sem, &f.wide))
            .collect();

        blocks.push(Block { name: format!("{}a", f.name), byte_width: w, data: a.clone() });
        blocks.push(Block { name: format!("{}b", f.name), byte_width: w, data: b.clone() });
        blocks.push(Block { name: format!("{}c", f.name), byte_width: w, data: c.clone() });
        blocks.push(Block { name: format!("{}_add", f.name), byte_width: w, data: results(add) });
        blocks.push(Block { name: format!("{}_sub", f.name), byte_width: w, data: results(sub) });
        blocks.push(Block { name: format!("{}_mul", f.name), byte_width: w, data: results(mul) });
        blocks.push(Block { name: format!("{}_fma", f.name), byte_width: ww, data: fma_results });
    }

    for p in &NARROW_PAIRS {
        let dist = Uniform::new(p.lo, p.hi).expect("nonempty draw range");
        let m = min_normal(&p.narrow);
        let sub_dist = Uniform::new(-m, m).expect("nonempty draw range");

        let mut vals = vec![0u64; COUNT];
        for v in vals.iter_mut() {
            *v = pattern(dist.sample(&mut rng), &p.wide);
        }
        for v in vals.iter_mut().take(SPECIAL_COUNT) {
            *v = pattern(sub_dist.sample(&mut rng), &p.wide);
        }
        vals[0] = pattern(f64::INFINITY, &p.wide);
        vals[1] = pattern(f64::NAN, &p.wide);
        vals[2] = pattern(f64::NEG_INFINITY, &p.wide);
        vals[3] = pattern(-f64::NAN, &p.wide);
        vals[4] = pattern(0.0, &p.wide);
        vals[5] = pattern(-0.0, &p.wide);

        let out: Vec<u64> = vals
            .iter()
            .map(|&v| convert(v, &p.wide, &p.narrow))
            .collect();

        blocks.push(Block {
            name: p.name.to_string(),
            byte_width: byte_width(&p.wide),
            data: vals,
        });
        blocks.push(Block {
            name: format!("{}_out", p.name),
            byte_width: byte_width(&p.narrow),
            data: out,
        });
    }

    Corpus { count: COUNT, blocks }
}

#[cfg(test)]
use super::specials;

#[test]
fn test_generate_is_deterministic() {
    let first = generate();
    let second = generate();
    assert_eq!(first, second);
}

#[test]
fn test_corpus_shape() {
    let corpus = generate();
    assert_eq!(corpus.count, COUNT);
    // 7 blocks per arithmetic format, 2 per narrowing pair.
    assert_eq!(corpus.blocks.len(), 4 * 7 + 4 * 2);
    for block in &corpus.blocks {
        assert_eq!(block.data.len(), COUNT);
        assert!(matches!(block.byte_width, 1 | 2 | 4));
        // Every pattern fits its storage width.
        for &v in &block.data {
            assert!(v < 1u64 << (block.byte_width * 8));
        }
    }

    // The fma results are in the widened formats.
    let fma16 = corpus.blocks.iter().find(|b| b.name == "fp16_fma").unwrap();
    assert_eq!(fma16.byte_width, 4);
    let fma8 = corpus.blocks.iter().find(|b| b.name == "ofp8e4m3_fma").unwrap();
    assert_eq!(fma8.byte_width, 2);
}

#[test]
fn test_corpus_edge_seeding() {
    let corpus = generate();
    let get = |name: &str| {
        &corpus.blocks.iter().find(|b| b.name == name).unwrap().data
    };

    let a = get("fp16a");
    let b = get("fp16b");
    assert_eq!(a[0], 0x7c00);
    assert!(specials::is_nan(a[1], &FP16));
    assert_eq!(b[2], 0x7c00);
    assert!(specials::is_nan(b[3], &FP16));
    assert_eq!(a[4], 0xfc00);
    assert!(specials::is_nan(a[5], &FP16));
    assert_eq!(a[6], 0x7c00);
    assert!(specials::is_nan(b[6], &FP16));
    assert_eq!(a[7], 0x0000);
    assert_eq!(a[8], 0x0000);

    // Inf * NaN at index 6 propagates NaN into the multiply results.
    let prod = get("fp16_mul");
    assert!(specials::is_nan(prod[6], &FP16));

    // The FiniteOnly format saturates its Infinity seeds.
    let e4 = get("ofp8e4m3a");
    assert_eq!(e4[0], 0x7f);
    assert_eq!(e4[4], 0xfe);
    assert_eq!(e4[1], 0xff);

    // The narrowing corpus seeds specials in the wide format.
    let n16 = get("fp16");
    assert_eq!(n16[0], 0x7f80_0000);
    assert_eq!(n16[2], 0xff80_0000);
    assert_eq!(n16[4], 0x0000_0000);
    assert_eq!(n16[5], 0x8000_0000);
    let out16 = get("fp16_out");
    assert_eq!(out16[0], 0x7c00);
    assert_eq!(out16[2], 0xfc00);
    assert_eq!(out16[5], 0x8000);
}

#[test]
fn test_subnormal_prefix_coverage() {
    // The subnormal prefix must actually produce subnormal patterns:
    // nonzero values whose exponent field is zero (specials aside).
    let corpus = generate();
    let a = &corpus.blocks.iter().find(|b| b.name == "fp16a").unwrap().data;
    let subnormal = a[9..SPECIAL_COUNT]
        .iter()
        .filter(|&&v| {
            let exp = (v >> 10) & 0x1f;
            let mant = v & 0x3ff;
            exp == 0 && mant != 0
        })
        .count();
    assert!(subnormal > 0);
}
