//! Arithmetic on bit patterns: decode the operands, compute the
//! mathematically exact result, and encode it once into the destination
//! format. The destination may be wider (widening ops) or narrower
//! (narrowing conversions) than the source.

use core::cmp::Ordering;
use std::ops::{Add, Mul, Sub};

use super::codec::{decode, encode};
use super::float::{Category, Float};
use super::format::Semantics;

impl Float {
    /// The exact sum (or difference) of two values. Alignment shifts are
    /// exact; no bits are dropped.
    /// See Pg 247, Chapter 8. Algorithms for the Five Basic Operations.
    pub(crate) fn add_exact(a: &Self, b: &Self, subtract: bool) -> Self {
        // Table 8.2: Specification of addition for positive floating-point
        // data.
        match (a.get_category(), b.get_category()) {
            (Category::NaN, _) => Float::nan(a.get_sign()),
            (_, Category::NaN) => Float::nan(b.get_sign()),

            (Category::Infinity, Category::Infinity) => {
                if a.get_sign() ^ b.get_sign() ^ subtract {
                    return Float::nan(a.get_sign() ^ b.get_sign());
                }
                Float::inf(a.get_sign())
            }
            (Category::Infinity, _) => Float::inf(a.get_sign()),
            (_, Category::Infinity) => Float::inf(b.get_sign() ^ subtract),

            (Category::Zero, Category::Zero) => {
                Float::zero(a.get_sign() && (b.get_sign() ^ subtract))
            }
            (Category::Zero, Category::Normal) => {
                if subtract {
                    b.neg()
                } else {
                    b.clone()
                }
            }
            (Category::Normal, Category::Zero) => a.clone(),

            (Category::Normal, Category::Normal) => {
                Self::add_or_sub_exact_normals(a, b, subtract)
            }
        }
    }

    fn add_or_sub_exact_normals(a: &Self, b: &Self, subtract: bool) -> Self {
        let b_sign = b.get_sign() ^ subtract;

        // Align both significands on the smaller scale. The shift widens
        // the significand instead of discarding bits.
        let scale = a.get_scale().min(b.get_scale());
        let mut ma = a.get_significand().clone();
        ma.shift_left((a.get_scale() - scale) as usize);
        let mut mb = b.get_significand().clone();
        mb.shift_left((b.get_scale() - scale) as usize);

        if a.get_sign() == b_sign {
            ma.inplace_add(&mb);
            return Float::new(a.get_sign(), scale, ma);
        }

        // Effective subtraction: take the smaller magnitude from the
        // larger. Exact cancellation yields +0, the round-to-nearest
        // convention.
        match ma.cmp(&mb) {
            Ordering::Greater => {
                let borrow = ma.inplace_sub(&mb);
                debug_assert!(!borrow);
                Float::new(a.get_sign(), scale, ma)
            }
            Ordering::Less => {
                let borrow = mb.inplace_sub(&ma);
                debug_assert!(!borrow);
                Float::new(b_sign, scale, mb)
            }
            Ordering::Equal => Float::zero(false),
        }
    }

    /// The exact product of two values.
    /// Table 8.4: Specification of multiplication for floating-point data.
    pub(crate) fn mul_exact(a: &Self, b: &Self) -> Self {
        let sign = a.get_sign() ^ b.get_sign();

        match (a.get_category(), b.get_category()) {
            (Category::NaN, _) => Float::nan(a.get_sign()),
            (_, Category::NaN) => Float::nan(b.get_sign()),

            (Category::Zero, Category::Infinity)
            | (Category::Infinity, Category::Zero) => Float::nan(sign),

            (Category::Infinity, _) | (_, Category::Infinity) => {
                Float::inf(sign)
            }
            (Category::Zero, _) | (_, Category::Zero) => Float::zero(sign),

            (Category::Normal, Category::Normal) => {
                Self::mul_exact_normals(a, b)
            }
        }
    }

    fn mul_exact_normals(a: &Self, b: &Self) -> Self {
        let mut m = a.get_significand().clone();
        m.inplace_mul(b.get_significand());
        Float::new(
            a.get_sign() ^ b.get_sign(),
            a.get_scale() + b.get_scale(),
            m,
        )
    }

    /// The exact fused multiply-add `a*b + c`: one real-valued expression
    /// with no rounding between the multiply and the add.
    pub(crate) fn fma_exact(a: &Self, b: &Self, c: &Self) -> Self {
        if a.is_nan() {
            return Float::nan(a.get_sign());
        }
        if b.is_nan() {
            return Float::nan(b.get_sign());
        }
        if c.is_nan() {
            return Float::nan(c.get_sign());
        }

        let prod_sign = a.get_sign() ^ b.get_sign();

        // An infinite factor against a zero factor has no value.
        if (a.is_inf() && b.is_zero()) || (a.is_zero() && b.is_inf()) {
            return Float::nan(prod_sign);
        }
        if a.is_inf() || b.is_inf() {
            if c.is_inf() && c.get_sign() != prod_sign {
                return Float::nan(prod_sign);
            }
            return Float::inf(prod_sign);
        }
        if c.is_inf() {
            return Float::inf(c.get_sign());
        }

        if a.is_zero() || b.is_zero() {
            if c.is_zero() {
                return Float::zero(prod_sign && c.get_sign());
            }
            return c.clone();
        }

        let prod = Self::mul_exact_normals(a, b);
        if c.is_zero() {
            return prod;
        }
        Self::add_or_sub_exact_normals(&prod, c, false)
    }
}

// The operators compute exact, unrounded values; rounding happens when the
// result is encoded into a format.

impl Add for &Float {
    type Output = Float;

    fn add(self, rhs: Self) -> Float {
        Float::add_exact(self, rhs, false)
    }
}

impl Sub for &Float {
    type Output = Float;

    fn sub(self, rhs: Self) -> Float {
        Float::add_exact(self, rhs, true)
    }
}

impl Mul for &Float {
    type Output = Float;

    fn mul(self, rhs: Self) -> Float {
        Float::mul_exact(self, rhs)
    }
}

/// Computes `a + b` on patterns of the format `src`, rounding the result
/// into the format `dst`.
pub fn add(a: u64, b: u64, src: &Semantics, dst: &Semantics) -> u64 {
    let r = Float::add_exact(&decode(a, src), &decode(b, src), false);
    encode(&r, dst)
}

/// Computes `a - b` on patterns of the format `src`, rounding the result
/// into the format `dst`.
pub fn sub(a: u64, b: u64, src: &Semantics, dst: &Semantics) -> u64 {
    let r = Float::add_exact(&decode(a, src), &decode(b, src), true);
    encode(&r, dst)
}

/// Computes `a * b` on patterns of the format `src`, rounding the result
/// into the format `dst`.
pub fn mul(a: u64, b: u64, src: &Semantics, dst: &Semantics) -> u64 {
    let r = Float::mul_exact(&decode(a, src), &decode(b, src));
    encode(&r, dst)
}

/// Computes the fused `a * b + c` on patterns of the format `src`,
/// rounding once into the format `dst`.
pub fn fma(a: u64, b: u64, c: u64, src: &Semantics, dst: &Semantics) -> u64 {
    let r = Float::fma_exact(&decode(a, src), &decode(b, src), &decode(c, src));
    encode(&r, dst)
}

/// Re-encodes `a` from the format `src` into the format `dst` with no
/// arithmetic: a pure widening or narrowing conversion.
pub fn convert(a: u64, src: &Semantics, dst: &Semantics) -> u64 {
    encode(&decode(a, src), dst)
}

#[cfg(test)]
use super::format::{BF16, FP16, FP32, OFP8E4M3, OFP8E5M2};
#[cfg(test)]
use super::specials;

#[test]
fn test_addition() {
    fn add_helper(a: f64, b: f64) -> f64 {
        let a = Float::from_f64(a);
        let b = Float::from_f64(b);
        (&a + &b).as_f64()
    }

    assert_eq!(add_helper(0., -4.), -4.);
    assert_eq!(add_helper(-4., 0.), -4.);
    assert_eq!(add_helper(1., 1.), 2.);
    assert_eq!(add_helper(8., 4.), 12.);
    assert_eq!(add_helper(128., -8.), 120.);
    assert_eq!(add_helper(64., -60.), 4.);
    assert_eq!(add_helper(69., 69.), 138.);
    assert_eq!(add_helper(-64., -65.), -129.);
    assert_eq!(add_helper(-15., 15.), 0.);

    for i in -4..15 {
        for j in i..15 {
            assert_eq!(
                add_helper(f64::from(j), f64::from(i)),
                f64::from(i) + f64::from(j)
            );
        }
    }
}

#[test]
fn test_exact_operators() {
    let a = Float::from_f64(8.0);
    let b = Float::from_f64(2.0);
    assert_eq!((&a + &b).as_f64(), 10.0);
    assert_eq!((&a - &b).as_f64(), 6.0);
    assert_eq!((&a * &b).as_f64(), 16.0);

    // The operators are exact: no bits are lost until encode.
    let big = Float::from_f64((60.0f64).exp2());
    let one = Float::from_f64(1.0);
    let sum = &big + &one;
    let back = &sum - &big;
    assert_eq!(back.as_f64(), 1.0);
}

#[test]
fn test_add_random_vals() {
    use super::utils::Lfsr;

    let mut lfsr = Lfsr::new();

    for _ in 0..20000 {
        let a_bits = lfsr.get() as u64;
        let b_bits = lfsr.get() as u64;

        let f0 = f32::from_bits(a_bits as u32);
        let f1 = f32::from_bits(b_bits as u32);

        let sum = add(a_bits, b_bits, &FP32, &FP32);
        let native = f0 + f1;
        // The results are bit identical, or are both NaN.
        if native.is_nan() {
            assert!(specials::is_nan(sum, &FP32));
        } else {
            assert_eq!(sum, native.to_bits() as u64);
        }

        let diff = sub(a_bits, b_bits, &FP32, &FP32);
        let native = f0 - f1;
        if native.is_nan() {
            assert!(specials::is_nan(diff, &FP32));
        } else {
            assert_eq!(diff, native.to_bits() as u64);
        }
    }
}

#[test]
fn test_mul_random_vals() {
    use super::utils::Lfsr;

    let mut lfsr = Lfsr::new();

    for _ in 0..20000 {
        let a_bits = lfsr.get() as u64;
        let b_bits = lfsr.get() as u64;

        let prod = mul(a_bits, b_bits, &FP32, &FP32);
        let native = f32::from_bits(a_bits as u32) * f32::from_bits(b_bits as u32);
        if native.is_nan() {
            assert!(specials::is_nan(prod, &FP32));
        } else {
            assert_eq!(prod, native.to_bits() as u64);
        }
    }
}

#[test]
fn test_fma_random_vals() {
    use super::utils::Lfsr;

    let mut lfsr = Lfsr::new();

    for _ in 0..20000 {
        let a_bits = lfsr.get() as u64;
        let b_bits = lfsr.get() as u64;
        let c_bits = lfsr.get() as u64;

        let r = fma(a_bits, b_bits, c_bits, &FP32, &FP32);
        let native = f32::from_bits(a_bits as u32)
            .mul_add(f32::from_bits(b_bits as u32), f32::from_bits(c_bits as u32));
        if native.is_nan() {
            assert!(specials::is_nan(r, &FP32));
        } else {
            assert_eq!(r, native.to_bits() as u64);
        }
    }
}

#[test]
fn test_special_values() {
    use super::utils;

    // Compare against the native operations on a grid of irregular values.
    for v0 in utils::get_special_test_values() {
        for v1 in utils::get_special_test_values() {
            let a = v0.to_bits() as u64;
            let b = v1.to_bits() as u64;
            for (ours, native) in [
                (add(a, b, &FP32, &FP32), v0 + v1),
                (sub(a, b, &FP32, &FP32), v0 - v1),
                (mul(a, b, &FP32, &FP32), v0 * v1),
            ] {
                if native.is_nan() {
                    assert!(specials::is_nan(ours, &FP32));
                } else {
                    assert_eq!(ours, native.to_bits() as u64);
                }
            }
        }
    }
}

#[test]
fn test_nan_propagation() {
    // Any NaN operand makes the result NaN, in every format.
    for sem in [&FP16, &BF16, &OFP8E5M2, &OFP8E4M3] {
        let nan = specials::canonical_nan(sem);
        let one = encode(&Float::from_f64(1.0), sem);
        for (x, y) in [(nan, one), (one, nan), (nan, nan)] {
            assert!(specials::is_nan(add(x, y, sem, sem), sem));
            assert!(specials::is_nan(sub(x, y, sem, sem), sem));
            assert!(specials::is_nan(mul(x, y, sem, sem), sem));
        }
        assert!(specials::is_nan(fma(nan, one, one, sem, sem), sem));
        assert!(specials::is_nan(fma(one, nan, one, sem, sem), sem));
        assert!(specials::is_nan(fma(one, one, nan, sem, sem), sem));
        assert!(specials::is_nan(convert(nan, sem, &FP32), &FP32));
    }
}

#[test]
fn test_edge_case_table() {
    let inf = specials::canonical_inf(false, &FP16);
    let ninf = specials::canonical_inf(true, &FP16);
    let two = encode(&Float::from_f64(2.0), &FP16);
    let zero = 0x0000;
    let nzero = 0x8000;

    // Infinity +- finite keeps the Infinity.
    assert_eq!(add(inf, two, &FP16, &FP16), inf);
    assert_eq!(sub(ninf, two, &FP16, &FP16), ninf);

    // Infinity - Infinity has no value.
    assert!(specials::is_nan(sub(inf, inf, &FP16, &FP16), &FP16));
    assert!(specials::is_nan(add(inf, ninf, &FP16, &FP16), &FP16));
    assert_eq!(add(inf, inf, &FP16, &FP16), inf);

    // Infinity times zero has no value; against finite it keeps the
    // product sign.
    assert!(specials::is_nan(mul(inf, zero, &FP16, &FP16), &FP16));
    assert!(specials::is_nan(mul(nzero, inf, &FP16, &FP16), &FP16));
    assert_eq!(mul(inf, two, &FP16, &FP16), inf);
    assert_eq!(mul(ninf, two, &FP16, &FP16), ninf);
    assert_eq!(mul(ninf, ninf, &FP16, &FP16), inf);

    // Signed zeros.
    assert_eq!(add(zero, zero, &FP16, &FP16), zero);
    assert_eq!(add(nzero, nzero, &FP16, &FP16), nzero);
    assert_eq!(add(nzero, zero, &FP16, &FP16), zero);
    assert_eq!(sub(nzero, zero, &FP16, &FP16), nzero);
    assert_eq!(mul(nzero, zero, &FP16, &FP16), nzero);
    assert_eq!(mul(nzero, nzero, &FP16, &FP16), zero);

    // Exact cancellation is the positive zero.
    assert_eq!(sub(two, two, &FP16, &FP16), zero);
}

#[test]
fn test_multiply_inf_by_zero_is_nan() {
    // bf16: +Inf times +0 must produce a quiet NaN pattern.
    let r = mul(0x7f80, 0x0000, &BF16, &BF16);
    assert!(specials::is_nan(r, &BF16));
    assert_eq!(r, 0x7fc0);
}

#[test]
fn test_fma_is_fused() {
    // 1.5 * 2.0 + 0.5 is exact: no intermediate rounding artifact.
    let a = encode(&Float::from_f64(1.5), &FP16);
    let b = encode(&Float::from_f64(2.0), &FP16);
    let c = encode(&Float::from_f64(0.5), &FP16);
    let r = fma(a, b, c, &FP16, &FP16);
    assert_eq!(r, encode(&Float::from_f64(3.5), &FP16));
    assert_eq!(r, 0x4300);

    // (1 + 2^-10)^2 - (1 + 2^-9) = 2^-20 exactly. A separate multiply
    // would round the square to 1 + 2^-9 and return zero.
    let a = 0x3c01;
    let c = 0xbc02;
    let fused = fma(a, a, c, &FP16, &FP16);
    assert_eq!(fused, 0x0010); // 2^-20, an fp16 subnormal
    let separate = add(mul(a, a, &FP16, &FP16), c, &FP16, &FP16);
    assert_eq!(separate, 0x0000);
}

#[test]
fn test_widening_fma() {
    // Products of e4m3 values can exceed the fp16 range only via large
    // operands; ordinary ones widen exactly.
    let a = encode(&Float::from_f64(24.0), &OFP8E4M3);
    let b = encode(&Float::from_f64(-20.0), &OFP8E4M3);
    let c = encode(&Float::from_f64(3.0), &OFP8E4M3);
    let r = fma(a, b, c, &OFP8E4M3, &FP16);
    assert_eq!(r, encode(&Float::from_f64(-477.0), &FP16));

    // The widened result format keeps values the narrow one would
    // saturate: 480 * 2 overflows e4m3 but sits comfortably in fp16.
    let max = specials::max_finite(false, &OFP8E4M3);
    let two = encode(&Float::from_f64(2.0), &OFP8E4M3);
    let zero = encode(&Float::from_f64(0.0), &OFP8E4M3);
    assert_eq!(
        fma(max, two, zero, &OFP8E4M3, &FP16),
        encode(&Float::from_f64(960.0), &FP16)
    );
    assert_eq!(mul(max, two, &OFP8E4M3, &OFP8E4M3), max);
}

#[test]
fn test_finite_only_saturating_arithmetic() {
    let max = specials::max_finite(false, &OFP8E4M3);
    let nmax = specials::max_finite(true, &OFP8E4M3);

    // 480 + 480 exceeds every finite value: saturate, never Infinity,
    // never NaN.
    let r = add(max, max, &OFP8E4M3, &OFP8E4M3);
    assert_eq!(r, max);
    assert!(!specials::is_nan(r, &OFP8E4M3));

    let r = add(nmax, nmax, &OFP8E4M3, &OFP8E4M3);
    assert_eq!(r, nmax);

    let r = mul(max, nmax, &OFP8E4M3, &OFP8E4M3);
    assert_eq!(r, nmax);

    // Saturated operands are finite, so even their "Inf - Inf" shape is
    // ordinary subtraction.
    assert_eq!(sub(max, max, &OFP8E4M3, &OFP8E4M3), 0x00);
}

#[test]
fn test_convert_widening_identity() {
    // Widening and narrowing back is the identity for every non-NaN
    // pattern of the narrow format.
    for (narrow, wide) in [
        (&OFP8E5M2, &FP16),
        (&OFP8E4M3, &FP16),
        (&OFP8E5M2, &FP32),
        (&OFP8E4M3, &FP32),
        (&FP16, &FP32),
    ] {
        for bits in 0..(1u64 << narrow.get_total_len()) {
            if specials::is_nan(bits, narrow) {
                continue;
            }
            let up = convert(bits, narrow, wide);
            assert_eq!(convert(up, wide, narrow), bits, "pattern {:#x}", bits);
        }
    }
}

#[test]
fn test_convert_narrowing() {
    // Values straddling the fp16 overflow boundary.
    assert_eq!(
        convert(65504.0f32.to_bits() as u64, &FP32, &FP16),
        0x7bff
    );
    assert_eq!(
        convert(65519.0f32.to_bits() as u64, &FP32, &FP16),
        0x7bff
    );
    assert_eq!(
        convert(65520.0f32.to_bits() as u64, &FP32, &FP16),
        0x7c00
    );

    // Narrowing keeps specials and signs.
    assert_eq!(
        convert(f32::NEG_INFINITY.to_bits() as u64, &FP32, &FP16),
        0xfc00
    );
    assert_eq!(convert((-0.0f32).to_bits() as u64, &FP32, &BF16), 0x8000);

    // bf16 to e4m3 saturates instead of producing Infinity.
    let big = encode(&Float::from_f64(1.0e4), &BF16);
    assert_eq!(convert(big, &BF16, &OFP8E4M3), 0x7f);
}
