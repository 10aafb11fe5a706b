//! Per-family special-value classification: which bit patterns denote
//! Infinity and NaN, and the canonical patterns produced on encode. These
//! are pure functions of a bit pattern and a format; every input pattern is
//! legal.

use super::format::{Family, Semantics};
use super::utils::mask;

fn exp_field_mask(sem: &Semantics) -> u64 {
    mask(sem.get_exponent_len()) << sem.get_mantissa_len()
}

fn sign_bit(sem: &Semantics) -> u64 {
    1u64 << (sem.get_exponent_len() + sem.get_mantissa_len())
}

/// The reserved NaN pattern of a FiniteOnly format: every significant bit
/// set. Unsigned layouts keep the reserved sign position clear.
fn finite_only_nan(sem: &Semantics) -> u64 {
    let field_bits = sem.get_exponent_len() + sem.get_mantissa_len();
    if sem.is_signed() {
        mask(field_bits + 1)
    } else {
        mask(field_bits)
    }
}

/// Returns true if `bits` encodes Infinity. FiniteOnly formats have no
/// Infinity representation.
pub fn is_inf(bits: u64, sem: &Semantics) -> bool {
    match sem.get_family() {
        Family::Standard => {
            let exp = exp_field_mask(sem);
            (bits & exp) == exp && (bits & mask(sem.get_mantissa_len())) == 0
        }
        Family::FiniteOnly => false,
    }
}

/// Returns true if `bits` encodes NaN.
pub fn is_nan(bits: u64, sem: &Semantics) -> bool {
    match sem.get_family() {
        Family::Standard => {
            let exp = exp_field_mask(sem);
            (bits & exp) == exp && (bits & mask(sem.get_mantissa_len())) != 0
        }
        Family::FiniteOnly => {
            let nan = finite_only_nan(sem);
            (bits & mask(sem.get_total_len())) == nan
        }
    }
}

/// The canonical Infinity pattern with the given sign. A FiniteOnly format
/// cannot express Infinity, so the answer is its saturation value: the
/// largest finite pattern of that sign.
pub fn canonical_inf(sign: bool, sem: &Semantics) -> u64 {
    match sem.get_family() {
        Family::Standard => {
            let body = exp_field_mask(sem);
            if sign && sem.is_signed() {
                body | sign_bit(sem)
            } else {
                body
            }
        }
        Family::FiniteOnly => max_finite(sign, sem),
    }
}

/// The canonical quiet NaN pattern: exponent all-ones with the top mantissa
/// bit set (Standard), or the single reserved pattern (FiniteOnly).
pub fn canonical_nan(sem: &Semantics) -> u64 {
    match sem.get_family() {
        Family::Standard => {
            exp_field_mask(sem) | 1u64 << (sem.get_mantissa_len() - 1)
        }
        Family::FiniteOnly => finite_only_nan(sem),
    }
}

/// The largest-magnitude finite pattern with the given sign.
///
/// For FiniteOnly formats the two signs differ: the positive maximum fills
/// every exponent and mantissa bit, while the same body with the sign bit
/// set would collide with the reserved NaN pattern, so the negative maximum
/// gives up one mantissa ulp.
pub fn max_finite(sign: bool, sem: &Semantics) -> u64 {
    let m = sem.get_mantissa_len();
    let sign = sign && sem.is_signed();
    let body = match sem.get_family() {
        Family::Standard => {
            let top_exp = (mask(sem.get_exponent_len()) - 1) << m;
            top_exp | mask(m)
        }
        Family::FiniteOnly => {
            let full = exp_field_mask(sem) | mask(m);
            if sign {
                full - 1
            } else {
                full
            }
        }
    };
    if sign {
        body | sign_bit(sem)
    } else {
        body
    }
}

#[cfg(test)]
use super::format::{BF16, FP16, FP32, OFP8E4M3, OFP8E5M2};

#[test]
fn test_standard_classification() {
    // fp32 single: 0x7f800000 is +Inf, 0xff800000 is -Inf.
    assert!(is_inf(0x7f80_0000, &FP32));
    assert!(is_inf(0xff80_0000, &FP32));
    assert!(!is_nan(0x7f80_0000, &FP32));
    assert!(is_nan(0x7fc0_0000, &FP32));
    assert!(is_nan(0x7f80_0001, &FP32));
    assert!(!is_inf(0x7f7f_ffff, &FP32));

    assert!(is_inf(0x7f80, &BF16));
    assert!(is_nan(0x7fc0, &BF16));
    assert!(is_inf(0x7c00, &FP16));
    assert!(is_nan(0x7e00, &FP16));

    assert_eq!(canonical_inf(false, &FP16), 0x7c00);
    assert_eq!(canonical_inf(true, &FP16), 0xfc00);
    assert_eq!(canonical_nan(&FP16), 0x7e00);
    assert_eq!(canonical_nan(&BF16), 0x7fc0);
    assert_eq!(canonical_nan(&FP32), 0x7fc0_0000);
    assert_eq!(canonical_inf(false, &OFP8E5M2), 0x7c);
    assert_eq!(canonical_nan(&OFP8E5M2), 0x7e);

    assert_eq!(max_finite(false, &FP16), 0x7bff);
    assert_eq!(max_finite(true, &FP16), 0xfbff);
    assert_eq!(max_finite(false, &OFP8E5M2), 0x7b);
}

#[test]
fn test_finite_only_classification() {
    // Only the single all-ones pattern is NaN; the rest of the top
    // exponent row is finite.
    assert!(is_nan(0xff, &OFP8E4M3));
    assert!(!is_nan(0x7f, &OFP8E4M3));
    assert!(!is_nan(0xfe, &OFP8E4M3));

    // There is no Infinity anywhere in the space.
    for bits in 0..=0xffu64 {
        assert!(!is_inf(bits, &OFP8E4M3));
    }

    assert_eq!(canonical_nan(&OFP8E4M3), 0xff);
    assert_eq!(max_finite(false, &OFP8E4M3), 0x7f);
    assert_eq!(max_finite(true, &OFP8E4M3), 0xfe);
    // Saturation stands in for Infinity.
    assert_eq!(canonical_inf(false, &OFP8E4M3), 0x7f);
    assert_eq!(canonical_inf(true, &OFP8E4M3), 0xfe);
}
