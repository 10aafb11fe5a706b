//! Format descriptors: the bit layout, rounding discipline and
//! special-value policy of an emulated floating point format.

use thiserror::Error;

/// Defines the supported rounding modes.
/// See IEEE754-2019 Section 4.3 Rounding-direction attributes.
/// `Stochastic` rounds up with probability proportional to the discarded
/// fraction, using a threshold derived deterministically from the discarded
/// bits (see the round module).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    NearestTiesToEven,
    NearestTiesToAway,
    Zero,
    Positive,
    Negative,
    Stochastic,
}

/// How a format encodes Infinity and NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// The all-ones exponent field is reserved: zero mantissa encodes
    /// Infinity, any nonzero mantissa encodes NaN.
    Standard,
    /// No bit pattern encodes Infinity. The single pattern with every bit
    /// set (sign included) is NaN; the rest of the top exponent row encodes
    /// finite values, so the positive and negative ranges are asymmetric.
    /// Overflow saturates to the largest finite magnitude.
    FiniteOnly,
}

/// Rejected format configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("the exponent field needs at least one bit")]
    NoExponentBits,
    #[error("total width of {0} bits exceeds the 32-bit pattern limit")]
    WidthTooLarge(usize),
    #[error("a Standard-family format needs a mantissa bit to encode NaN")]
    NoNanMantissa,
    #[error("stochastic rounding needs a threshold stream of 1..=63 bits")]
    BadStochasticStream,
}

/// The semantics of a floating point format: field widths, derived bias,
/// rounding mode, special-value family, signedness, and the width of the
/// stochastic-rounding threshold stream. Instances are immutable and are
/// constructed once per named format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Semantics {
    /// The number of bits that define the range of the exponent.
    exponent: usize,
    /// The number of explicit mantissa bits (the significand has one more).
    mantissa: usize,
    /// The rounding mode used when encoding into this format.
    rm: RoundingMode,
    /// The Infinity/NaN encoding policy.
    family: Family,
    /// Whether the layout carries a sign bit that can be set. Unsigned
    /// formats keep the bit position reserved-zero.
    signed: bool,
    /// Number of threshold bits drawn per stochastic rounding decision.
    stochastic_stream: usize,
}

impl Semantics {
    /// Create a new format from the exponent and mantissa widths. The
    /// layout is signed and the stochastic threshold stream has the default
    /// single bit. Invalid configurations panic; in `const` context this is
    /// a compile error. Use [`Semantics::try_new`] to validate at runtime.
    pub const fn new(
        exponent: usize,
        mantissa: usize,
        rm: RoundingMode,
        family: Family,
    ) -> Self {
        assert!(exponent >= 1, "the exponent field needs at least one bit");
        assert!(
            exponent + mantissa + 1 <= 32,
            "total width exceeds the 32-bit pattern limit"
        );
        assert!(
            !(matches!(family, Family::Standard) && mantissa == 0),
            "a Standard-family format needs a mantissa bit to encode NaN"
        );
        Semantics {
            exponent,
            mantissa,
            rm,
            family,
            signed: true,
            stochastic_stream: 1,
        }
    }

    /// Validating constructor over the full configuration surface.
    pub fn try_new(
        exponent: usize,
        mantissa: usize,
        rm: RoundingMode,
        family: Family,
        signed: bool,
        stochastic_stream: usize,
    ) -> Result<Self, FormatError> {
        if exponent < 1 {
            return Err(FormatError::NoExponentBits);
        }
        if exponent + mantissa + 1 > 32 {
            return Err(FormatError::WidthTooLarge(exponent + mantissa + 1));
        }
        if family == Family::Standard && mantissa == 0 {
            return Err(FormatError::NoNanMantissa);
        }
        if rm == RoundingMode::Stochastic
            && !(1..=63).contains(&stochastic_stream)
        {
            return Err(FormatError::BadStochasticStream);
        }
        Ok(Semantics {
            exponent,
            mantissa,
            rm,
            family,
            signed,
            stochastic_stream,
        })
    }

    /// Returns a copy of this format with `bits` threshold bits per
    /// stochastic rounding decision.
    pub const fn with_stochastic_stream(mut self, bits: usize) -> Self {
        assert!(bits >= 1 && bits <= 63);
        self.stochastic_stream = bits;
        self
    }

    /// Returns a copy of this format with the rounding mode replaced.
    pub const fn with_rounding_mode(mut self, rm: RoundingMode) -> Self {
        self.rm = rm;
        self
    }

    /// Returns the length of the exponent field in bits.
    pub fn get_exponent_len(&self) -> usize {
        self.exponent
    }

    /// Returns the length of the mantissa field in bits.
    pub fn get_mantissa_len(&self) -> usize {
        self.mantissa
    }

    /// Returns the precision: mantissa plus the implicit leading bit.
    pub fn get_precision(&self) -> usize {
        self.mantissa + 1
    }

    /// Returns the total storage width: sign + exponent + mantissa.
    pub fn get_total_len(&self) -> usize {
        self.exponent + self.mantissa + 1
    }

    pub fn get_rounding_mode(&self) -> RoundingMode {
        self.rm
    }

    pub fn get_family(&self) -> Family {
        self.family
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn get_stochastic_stream(&self) -> usize {
        self.stochastic_stream
    }

    /// Returns the exponent bias for the format, as a positive number.
    /// https://en.wikipedia.org/wiki/IEEE_754#Basic_and_interchange_formats
    pub fn get_bias(&self) -> i64 {
        ((1u64 << (self.exponent - 1)) - 1) as i64
    }

    /// Returns the upper and lower bounds of the unbiased exponent. The
    /// Standard family reserves the top exponent row for Infinity/NaN; the
    /// FiniteOnly family uses it for finite values.
    pub fn get_exp_bounds(&self) -> (i64, i64) {
        let exp_min = 1 - self.get_bias();
        let top = (1i64 << self.exponent) - 1 - self.get_bias();
        let exp_max = match self.family {
            Family::Standard => top - 1,
            Family::FiniteOnly => top,
        };
        (exp_min, exp_max)
    }
}

// Formats of the generated reference corpora. The 32- and 16-bit layouts
// follow IEEE 754-2019 Table 3.5; the 8-bit layouts follow the OFP8 e5m2
// and e4m3 conventions, with e4m3 giving up Infinity for an extra binade.

/// Predefined FP32 format with 8 exponent bits and 23 mantissa bits.
pub const FP32: Semantics =
    Semantics::new(8, 23, RoundingMode::NearestTiesToEven, Family::Standard);
/// Predefined FP16 format with 5 exponent bits and 10 mantissa bits.
pub const FP16: Semantics =
    Semantics::new(5, 10, RoundingMode::NearestTiesToEven, Family::Standard);
/// Predefined BF16 format with 8 exponent bits and 7 mantissa bits.
pub const BF16: Semantics =
    Semantics::new(8, 7, RoundingMode::NearestTiesToEven, Family::Standard);
/// Predefined 8-bit format with 5 exponent bits and 2 mantissa bits.
pub const OFP8E5M2: Semantics =
    Semantics::new(5, 2, RoundingMode::NearestTiesToEven, Family::Standard);
/// Predefined 8-bit format with 4 exponent bits and 3 mantissa bits and no
/// Infinity encoding.
pub const OFP8E4M3: Semantics =
    Semantics::new(4, 3, RoundingMode::NearestTiesToEven, Family::FiniteOnly);

#[test]
fn test_bias_and_bounds() {
    assert_eq!(FP32.get_bias(), 127);
    assert_eq!(FP16.get_bias(), 15);
    assert_eq!(BF16.get_bias(), 127);
    assert_eq!(OFP8E4M3.get_bias(), 7);

    assert_eq!(FP32.get_exp_bounds(), (-126, 127));
    assert_eq!(FP16.get_exp_bounds(), (-14, 15));
    // The FiniteOnly family keeps the top exponent row.
    assert_eq!(OFP8E4M3.get_exp_bounds(), (-6, 8));
    assert_eq!(OFP8E5M2.get_exp_bounds(), (-14, 15));
}

#[test]
fn test_widths() {
    assert_eq!(FP32.get_total_len(), 32);
    assert_eq!(FP16.get_total_len(), 16);
    assert_eq!(BF16.get_total_len(), 16);
    assert_eq!(OFP8E5M2.get_total_len(), 8);
    assert_eq!(OFP8E4M3.get_total_len(), 8);
    assert_eq!(FP16.get_precision(), 11);
}

#[test]
fn test_rejected_configurations() {
    use RoundingMode::NearestTiesToEven as rne;

    let e = Semantics::try_new(0, 7, rne, Family::Standard, true, 1);
    assert_eq!(e, Err(FormatError::NoExponentBits));

    let e = Semantics::try_new(11, 52, rne, Family::Standard, true, 1);
    assert_eq!(e, Err(FormatError::WidthTooLarge(64)));

    let e = Semantics::try_new(4, 0, rne, Family::Standard, true, 1);
    assert_eq!(e, Err(FormatError::NoNanMantissa));

    // FiniteOnly can spend every mantissa bit; the reserved pattern still
    // exists.
    assert!(Semantics::try_new(4, 0, rne, Family::FiniteOnly, true, 1).is_ok());

    let e = Semantics::try_new(
        4,
        3,
        RoundingMode::Stochastic,
        Family::FiniteOnly,
        true,
        0,
    );
    assert_eq!(e, Err(FormatError::BadStochasticStream));

    let ok = Semantics::try_new(5, 10, RoundingMode::Stochastic, Family::Standard, true, 8);
    assert_eq!(ok.unwrap().get_stochastic_stream(), 8);
}
