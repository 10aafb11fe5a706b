//! The decoded value type: sign, category, and an exact significand. A
//! `Float` is format-independent between decode and encode; arithmetic on
//! it is exact, and all rounding happens once, on encode.

use super::bigint::BigInt;

/// Declare the different categories of the floating point value. These
/// categories are internal to the float, and can be accessed with:
/// is_inf, is_zero, is_nan, is_normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Infinity,
    NaN,
    Normal,
    Zero,
}

/// An exact floating point value. Normal values represent
/// `(-1)^sign * significand * 2^scale` with an unbounded integer
/// significand, so sums, products and fused products of decoded values
/// never lose bits. NaN values keep the decoded payload and quietness for
/// inspection; encode always emits the canonical pattern.
#[derive(Debug, Clone)]
pub struct Float {
    // The sign bit. True means negative.
    sign: bool,
    // The power-of-two scale of the significand.
    scale: i64,
    // The significand (or the NaN payload), aligned to the right.
    significand: BigInt,
    // The kind of value this float represents.
    category: Category,
    // NaN quietness; meaningful only for the NaN category.
    quiet: bool,
}

impl Float {
    /// Create a new normal value `(-1)^sign * significand * 2^scale`.
    /// A zero significand canonicalizes to a zero of the same sign.
    pub fn new(sign: bool, scale: i64, significand: BigInt) -> Self {
        if significand.is_zero() {
            return Float::zero(sign);
        }
        Float {
            sign,
            scale,
            significand,
            category: Category::Normal,
            quiet: false,
        }
    }

    /// Returns a new zero value.
    pub fn zero(sign: bool) -> Self {
        Float {
            sign,
            scale: 0,
            significand: BigInt::zero(),
            category: Category::Zero,
            quiet: false,
        }
    }

    /// Returns a new infinity value.
    pub fn inf(sign: bool) -> Self {
        Float {
            sign,
            scale: 0,
            significand: BigInt::zero(),
            category: Category::Infinity,
            quiet: false,
        }
    }

    /// Returns a new quiet NaN with an empty payload.
    pub fn nan(sign: bool) -> Self {
        Float {
            sign,
            scale: 0,
            significand: BigInt::zero(),
            category: Category::NaN,
            quiet: true,
        }
    }

    /// Returns a new NaN carrying the decoded mantissa-field payload.
    pub fn nan_with_payload(sign: bool, payload: BigInt, quiet: bool) -> Self {
        Float {
            sign,
            scale: 0,
            significand: payload,
            category: Category::NaN,
            quiet,
        }
    }

    /// Returns true if the value is negative.
    pub fn is_negative(&self) -> bool {
        self.sign
    }

    /// Returns true if the value is +-Inf.
    pub fn is_inf(&self) -> bool {
        matches!(self.category, Category::Infinity)
    }

    /// Returns true if the value is a NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self.category, Category::NaN)
    }

    /// Returns true if the value is a +-0.
    pub fn is_zero(&self) -> bool {
        matches!(self.category, Category::Zero)
    }

    /// Returns true if this value is normal (not Zero, NaN, Inf).
    pub fn is_normal(&self) -> bool {
        matches!(self.category, Category::Normal)
    }

    /// Returns true for a quiet NaN, false for a signaling one.
    pub fn is_quiet_nan(&self) -> bool {
        debug_assert!(self.is_nan());
        self.quiet
    }

    /// Returns the sign of the value. True means negative.
    pub fn get_sign(&self) -> bool {
        self.sign
    }

    /// Returns the power-of-two scale of the significand.
    pub fn get_scale(&self) -> i64 {
        self.scale
    }

    /// Returns the significand (the NaN payload for NaN values).
    pub fn get_significand(&self) -> &BigInt {
        &self.significand
    }

    pub fn get_category(&self) -> Category {
        self.category
    }

    /// Returns a new value which has a flipped sign (negated value).
    pub fn neg(&self) -> Self {
        let mut x = self.clone();
        x.sign = !x.sign;
        x
    }

    /// Load a native double exactly. Doubles decompose without loss: the
    /// significand is at most 53 bits wide.
    pub fn from_f64(val: f64) -> Self {
        let bits = val.to_bits();
        let sign = (bits >> 63) == 1;
        let biased = ((bits >> 52) & 0x7ff) as i64;
        let field = bits & ((1u64 << 52) - 1);

        if biased == 0x7ff {
            if field == 0 {
                return Float::inf(sign);
            }
            let quiet = (field >> 51) == 1;
            return Float::nan_with_payload(sign, BigInt::from_u64(field), quiet);
        }
        if biased == 0 {
            // Subnormal double: no implicit bit, fixed minimum exponent.
            return Float::new(sign, -1074, BigInt::from_u64(field));
        }
        Float::new(sign, biased - 1075, BigInt::from_u64(field | (1u64 << 52)))
    }

    /// Approximate the value as a native double. Used by tests and debug
    /// printing; the significand must fit in a u64.
    pub fn as_f64(&self) -> f64 {
        match self.category {
            Category::NaN => f64::NAN,
            Category::Infinity => {
                if self.sign {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            }
            Category::Zero => {
                if self.sign {
                    -0.0
                } else {
                    0.0
                }
            }
            Category::Normal => {
                let m = self.significand.as_u64() as f64;
                let v = m * (self.scale as f64).exp2();
                if self.sign {
                    -v
                } else {
                    v
                }
            }
        }
    }
}

#[test]
fn test_from_f64_exact() {
    let x = Float::from_f64(1.0);
    assert!(x.is_normal());
    assert_eq!(x.as_f64(), 1.0);

    let x = Float::from_f64(-3.5);
    assert!(x.is_negative());
    assert_eq!(x.as_f64(), -3.5);

    // 0.1 is not exactly representable but must round-trip through the
    // exact carrier unchanged.
    assert_eq!(Float::from_f64(0.1).as_f64(), 0.1);

    assert!(Float::from_f64(f64::NAN).is_nan());
    assert!(Float::from_f64(f64::NAN).is_quiet_nan());
    assert!(Float::from_f64(f64::INFINITY).is_inf());
    assert!(Float::from_f64(f64::NEG_INFINITY).is_negative());
    assert!(Float::from_f64(0.0).is_zero());
    assert!(Float::from_f64(-0.0).is_negative());

    // The smallest positive subnormal double.
    let tiny = Float::from_f64(f64::from_bits(1));
    assert!(tiny.is_normal());
    assert_eq!(tiny.get_scale(), -1074);
    assert_eq!(tiny.get_significand().as_u64(), 1);
}

#[test]
fn test_zero_canonicalization() {
    let x = Float::new(true, 17, BigInt::zero());
    assert!(x.is_zero());
    assert!(x.is_negative());
}
