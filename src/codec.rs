//! Decoding bit patterns into exact values and encoding values back into
//! the nearest representable pattern. Encode owns all the representability
//! policy: rounding, subnormal placement, underflow to signed zero, and the
//! per-family overflow behavior (Infinity for Standard formats, saturation
//! for FiniteOnly ones).

use super::bigint::BigInt;
use super::float::{Category, Float};
use super::format::{Family, RoundingMode, Semantics};
use super::round::round_significand;
use super::specials;
use super::utils::mask;

/// Interpret `bits` as a value of the format `sem`. Every input pattern is
/// legal; bits above the format width are ignored.
pub fn decode(bits: u64, sem: &Semantics) -> Float {
    let bits = bits & mask(sem.get_total_len());
    let m_len = sem.get_mantissa_len();
    let sign_bit = (bits >> (sem.get_exponent_len() + m_len)) & 1 == 1;
    let sign = sem.is_signed() && sign_bit;

    // NaN first, then Infinity: for FiniteOnly formats the reserved NaN
    // pattern lives inside what would otherwise parse as a finite value.
    if specials::is_nan(bits, sem) {
        let payload = bits & mask(m_len);
        let quiet = match sem.get_family() {
            Family::Standard => (payload >> (m_len - 1)) & 1 == 1,
            Family::FiniteOnly => true,
        };
        return Float::nan_with_payload(sign, BigInt::from_u64(payload), quiet);
    }
    if specials::is_inf(bits, sem) {
        return Float::inf(sign);
    }

    let biased = ((bits >> m_len) & mask(sem.get_exponent_len())) as i64;
    let field = bits & mask(m_len);
    let (e_min, _) = sem.get_exp_bounds();

    if biased == 0 {
        if field == 0 {
            return Float::zero(sign);
        }
        // Subnormal: no implicit bit, pinned to the minimum exponent.
        return Float::new(sign, e_min - m_len as i64, BigInt::from_u64(field));
    }

    let significand = field | (1u64 << m_len);
    let scale = biased - sem.get_bias() - m_len as i64;
    Float::new(sign, scale, BigInt::from_u64(significand))
}

/// Encode `val` into the nearest representable pattern of `sem`, rounding
/// with the format's own mode. Always produces a pattern; representability
/// boundaries map to Infinity/saturation, signed zero, or NaN.
pub fn encode(val: &Float, sem: &Semantics) -> u64 {
    match val.get_category() {
        Category::NaN => specials::canonical_nan(sem),
        // FiniteOnly formats have no Infinity: saturate, keeping the sign.
        Category::Infinity => match sem.get_family() {
            Family::Standard => specials::canonical_inf(val.get_sign(), sem),
            Family::FiniteOnly => saturate(val.get_sign(), sem),
        },
        Category::Zero => zero_bits(val.get_sign(), sem),
        Category::Normal => encode_normal(val, sem),
    }
}

fn zero_bits(sign: bool, sem: &Semantics) -> u64 {
    if sign && sem.is_signed() {
        1u64 << (sem.get_exponent_len() + sem.get_mantissa_len())
    } else {
        0
    }
}

fn saturate(sign: bool, sem: &Semantics) -> u64 {
    if sign && !sem.is_signed() {
        return 0;
    }
    specials::max_finite(sign, sem)
}

fn encode_normal(val: &Float, sem: &Semantics) -> u64 {
    let sign = val.get_sign();
    // Unsigned layouts clamp negative values to zero.
    if sign && !sem.is_signed() {
        return 0;
    }

    let m_len = sem.get_mantissa_len();
    let precision = sem.get_precision();
    let (e_min, e_max) = sem.get_exp_bounds();

    let mut m = val.get_significand().clone();
    let scale = val.get_scale();

    // The unbiased exponent of the leading significand bit.
    let e = scale + m.msb_index() as i64 - 1;

    // The weight of the lowest retained bit: M bits below the leading one
    // for normal values, or the fixed subnormal position.
    let mut lsb_e = (e - m_len as i64).max(e_min - m_len as i64);

    let discard = lsb_e - scale;
    if discard > 0 {
        m = round_significand(
            &m,
            discard as usize,
            sem.get_rounding_mode(),
            sign,
            sem.get_stochastic_stream(),
        );
    } else if discard < 0 {
        m.shift_left((-discard) as usize);
    }

    if m.is_zero() {
        // The whole value rounded away: underflow to signed zero.
        return zero_bits(sign, sem);
    }

    // Rounding can carry the significand to the next power of two.
    let mut msb = m.msb_index();
    if msb > precision {
        debug_assert_eq!(msb, precision + 1);
        m.shift_right(1);
        lsb_e += 1;
        msb = precision;
    }

    let e = lsb_e + msb as i64 - 1;
    if e > e_max {
        return overflow_bits(sign, sem);
    }

    // A negative FiniteOnly value landing on the reserved all-ones pattern
    // has no encoding of its own; it saturates one ulp down.
    if sem.get_family() == Family::FiniteOnly
        && sign
        && e == e_max
        && m == BigInt::all1s(precision)
    {
        return saturate(sign, sem);
    }

    let field = m.as_u64() & mask(m_len);
    let biased = if msb == precision {
        let biased = (e + sem.get_bias()) as u64;
        debug_assert!(biased > 0);
        biased
    } else {
        // Subnormal: no implicit bit, zero exponent field.
        debug_assert_eq!(lsb_e, e_min - m_len as i64);
        0
    };

    let mut bits: u64 = sign as u64;
    bits <<= sem.get_exponent_len();
    bits |= biased;
    bits <<= m_len;
    bits |= field;
    bits
}

/// Resolve an exponent overflow per the rounding mode: the nearest and
/// stochastic modes route to the family's Infinity answer (which is
/// saturation for FiniteOnly formats), the directed modes clamp toward
/// zero.
fn overflow_bits(sign: bool, sem: &Semantics) -> u64 {
    let inf = match sem.get_family() {
        Family::Standard => specials::canonical_inf(sign, sem),
        Family::FiniteOnly => saturate(sign, sem),
    };
    match sem.get_rounding_mode() {
        RoundingMode::NearestTiesToEven
        | RoundingMode::NearestTiesToAway
        | RoundingMode::Stochastic => inf,
        RoundingMode::Zero => specials::max_finite(sign, sem),
        RoundingMode::Positive => {
            if sign {
                specials::max_finite(sign, sem)
            } else {
                inf
            }
        }
        RoundingMode::Negative => {
            if sign {
                inf
            } else {
                specials::max_finite(sign, sem)
            }
        }
    }
}

#[cfg(test)]
use super::format::{BF16, FP16, FP32, OFP8E4M3, OFP8E5M2};

#[test]
fn test_decode_simple_values() {
    // fp16 1.0 and 3.5.
    assert_eq!(decode(0x3c00, &FP16).as_f64(), 1.0);
    assert_eq!(decode(0x4300, &FP16).as_f64(), 3.5);
    assert_eq!(decode(0xc000, &FP16).as_f64(), -2.0);

    // The largest finite fp16 value.
    assert_eq!(decode(0x7bff, &FP16).as_f64(), 65504.0);

    // The smallest fp16 subnormal: 2^-24.
    let tiny = decode(0x0001, &FP16);
    assert!(tiny.is_normal());
    assert_eq!(tiny.as_f64(), (-24.0f64).exp2());

    // Specials.
    assert!(decode(0x7c00, &FP16).is_inf());
    assert!(decode(0xfc00, &FP16).is_negative());
    assert!(decode(0x7e00, &FP16).is_nan());
    assert!(decode(0x0000, &FP16).is_zero());
    assert!(decode(0x8000, &FP16).is_negative());

    // FiniteOnly: the top exponent row is finite.
    assert_eq!(decode(0x7f, &OFP8E4M3).as_f64(), 480.0);
    assert_eq!(decode(0xfe, &OFP8E4M3).as_f64(), -448.0);
    assert!(decode(0xff, &OFP8E4M3).is_nan());
}

#[test]
fn test_encode_simple_values() {
    assert_eq!(encode(&Float::from_f64(1.0), &FP16), 0x3c00);
    assert_eq!(encode(&Float::from_f64(3.5), &FP16), 0x4300);
    assert_eq!(encode(&Float::from_f64(-2.0), &FP16), 0xc000);
    assert_eq!(encode(&Float::from_f64(65504.0), &FP16), 0x7bff);
    assert_eq!(encode(&Float::from_f64(0.0), &FP16), 0x0000);
    assert_eq!(encode(&Float::from_f64(-0.0), &FP16), 0x8000);
    assert_eq!(encode(&Float::inf(false), &FP16), 0x7c00);
    assert_eq!(encode(&Float::inf(true), &FP16), 0xfc00);
    assert_eq!(encode(&Float::nan(false), &FP16), 0x7e00);
}

#[test]
fn test_round_to_nearest_even_ties() {
    // 2049 sits exactly between 2048 (even mantissa) and 2050 (odd).
    assert_eq!(encode(&Float::from_f64(2049.0), &FP16), 0x6800);
    assert_eq!(encode(&Float::from_f64(2048.0), &FP16), 0x6800);
    // 2051 sits exactly between 2050 (odd) and 2052 (even).
    assert_eq!(encode(&Float::from_f64(2051.0), &FP16), 0x6802);
    assert_eq!(encode(&Float::from_f64(2050.0), &FP16), 0x6801);
}

#[test]
fn test_overflow_to_infinity() {
    // Beyond the fp16 halfway point 65520 the nearest value is Infinity.
    assert_eq!(encode(&Float::from_f64(65520.0), &FP16), 0x7c00);
    assert_eq!(encode(&Float::from_f64(-65520.0), &FP16), 0xfc00);
    assert_eq!(encode(&Float::from_f64(1e30), &FP16), 0x7c00);
    // Just below it, the maximum finite value wins.
    assert_eq!(encode(&Float::from_f64(65519.0), &FP16), 0x7bff);

    // Directed modes clamp instead.
    let fp16_zero = FP16.with_rounding_mode(RoundingMode::Zero);
    assert_eq!(encode(&Float::from_f64(1e30), &fp16_zero), 0x7bff);
    let fp16_pos = FP16.with_rounding_mode(RoundingMode::Positive);
    assert_eq!(encode(&Float::from_f64(1e30), &fp16_pos), 0x7c00);
    assert_eq!(encode(&Float::from_f64(-1e30), &fp16_pos), 0xfbff);
}

#[test]
fn test_finite_only_saturation() {
    // +480 is the largest positive e4m3 value and encodes exactly.
    assert_eq!(encode(&Float::from_f64(480.0), &OFP8E4M3), 0x7f);
    // Anything larger saturates to it, never to an Infinity pattern.
    assert_eq!(encode(&Float::from_f64(500.0), &OFP8E4M3), 0x7f);
    assert_eq!(encode(&Float::from_f64(1e30), &OFP8E4M3), 0x7f);
    assert_eq!(encode(&Float::inf(false), &OFP8E4M3), 0x7f);

    // The negative side gives up one ulp to the reserved NaN pattern.
    assert_eq!(encode(&Float::from_f64(-448.0), &OFP8E4M3), 0xfe);
    assert_eq!(encode(&Float::from_f64(-480.0), &OFP8E4M3), 0xfe);
    assert_eq!(encode(&Float::from_f64(-1e30), &OFP8E4M3), 0xfe);
    assert_eq!(encode(&Float::inf(true), &OFP8E4M3), 0xfe);

    assert_eq!(encode(&Float::nan(false), &OFP8E4M3), 0xff);
}

#[test]
fn test_underflow_to_zero() {
    // Exactly half the smallest subnormal ties to even: zero.
    assert_eq!(encode(&Float::from_f64((-25.0f64).exp2()), &FP16), 0x0000);
    // Three quarters of the smallest subnormal rounds up to it.
    let v = 1.5 * (-25.0f64).exp2();
    assert_eq!(encode(&Float::from_f64(v), &FP16), 0x0001);
    // Far below, the sign survives.
    assert_eq!(encode(&Float::from_f64(-1e-30), &FP16), 0x8000);
}

#[test]
fn test_subnormal_round_trip() {
    // Every non-NaN pattern of the small formats round-trips exactly,
    // subnormals included.
    for sem in [&FP16, &BF16, &OFP8E5M2, &OFP8E4M3] {
        for bits in 0..(1u64 << sem.get_total_len()) {
            if specials::is_nan(bits, sem) {
                continue;
            }
            let decoded = decode(bits, sem);
            assert_eq!(encode(&decoded, sem), bits, "pattern {:#x}", bits);
        }
    }

    // NaN patterns re-encode to the canonical NaN.
    assert_eq!(encode(&decode(0x7e01, &FP16), &FP16), 0x7e00);
    assert_eq!(encode(&decode(0xff, &OFP8E4M3), &OFP8E4M3), 0xff);
}

#[test]
fn test_fp32_differential_round_trip() {
    use super::utils::Lfsr;

    // Decoding and re-encoding random fp32 patterns must reproduce the
    // native bits (except NaN payloads, which canonicalize).
    let mut lfsr = Lfsr::new();
    for _ in 0..10000 {
        let bits = lfsr.get() as u64;
        let v = decode(bits, &FP32);
        let native = f32::from_bits(bits as u32);
        assert_eq!(v.is_nan(), native.is_nan());
        if !v.is_nan() {
            assert_eq!(encode(&v, &FP32), bits);
        }
    }
}

#[test]
fn test_unsigned_layout() {
    let usem = Semantics::try_new(
        5,
        10,
        RoundingMode::NearestTiesToEven,
        Family::Standard,
        false,
        1,
    )
    .unwrap();

    // Negative values clamp to zero; the reserved top bit reads as zero.
    assert_eq!(encode(&Float::from_f64(-2.5), &usem), 0x0000);
    assert_eq!(encode(&Float::from_f64(1.0), &usem), 0x3c00);
    assert!(!decode(0xbc00, &usem).is_negative());
    assert_eq!(decode(0xbc00, &usem).as_f64(), 1.0);
}

#[test]
fn test_stochastic_encode_is_deterministic() {
    let sem = FP16.with_rounding_mode(RoundingMode::Stochastic)
        .with_stochastic_stream(8);
    for i in 1..500u64 {
        let v = Float::from_f64(0.1 * i as f64);
        let first = encode(&v, &sem);
        assert_eq!(first, encode(&v, &sem));
        // Stochastic results stay within one ulp of the nearest rounding.
        let nearest = encode(&v, &FP16);
        assert!(first.abs_diff(nearest) <= 1);
    }
}
