//! Rounds an exact significand down to a target width. The caller chooses
//! how many low bits to discard; this module decides whether the retained
//! value is incremented, based on the discarded fraction and the rounding
//! mode. Carries out of the retained width are the caller's to fold into
//! the exponent.

use super::bigint::BigInt;
use super::format::RoundingMode;

/// Fixed seed of the stochastic threshold derivation. Baked in so that
/// regenerating a corpus is bit-for-bit reproducible.
const STOCHASTIC_SEED: u64 = 0x9f0e_6aa5_52c6_f31b;

/// Discard the low `discard` bits of `m` and round the retained value
/// according to `rm`. The sign selects the direction of the Positive and
/// Negative modes; `stream` is the threshold width for Stochastic.
pub(crate) fn round_significand(
    m: &BigInt,
    discard: usize,
    rm: RoundingMode,
    sign: bool,
    stream: usize,
) -> BigInt {
    let loss = m.get_loss_kind_for_bit(discard);
    let mut kept = m.clone();
    kept.shift_right(discard);

    let round_up = match rm {
        RoundingMode::Zero => false,
        RoundingMode::Positive => !sign && !loss.is_exactly_zero(),
        RoundingMode::Negative => sign && !loss.is_exactly_zero(),
        RoundingMode::NearestTiesToAway => loss.is_gte_half(),
        RoundingMode::NearestTiesToEven => {
            loss.is_mt_half() || (loss.is_exactly_half() && kept.is_odd())
        }
        RoundingMode::Stochastic => {
            stochastic_round_up(&m.low_bits(discard), discard, stream)
        }
    };

    if round_up {
        kept.inplace_add(&BigInt::one());
    }
    kept
}

/// Decide a stochastic round-up. The discarded fraction is compared against
/// a threshold derived from the discarded bits themselves through a
/// SplitMix64 step under a fixed seed, so the decision is deterministic for
/// a given input while behaving like a uniform threshold across a batch of
/// draws. An exactly-zero discarded fraction never rounds up.
fn stochastic_round_up(discarded: &BigInt, width: usize, stream: usize) -> bool {
    if discarded.is_zero() {
        return false;
    }
    debug_assert!((1..=63).contains(&stream));

    // The top `stream` bits of the discarded fraction.
    let frac = if width > stream {
        let mut top = discarded.clone();
        top.shift_right(width - stream);
        top.as_u64()
    } else {
        discarded.as_u64() << (stream - width)
    };

    let threshold = splitmix64(STOCHASTIC_SEED ^ frac ^ ((width as u64) << 48))
        >> (64 - stream);
    frac > threshold
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
use RoundingMode::*;

#[test]
fn test_round_to_nearest_even() {
    let round = |m: u64, discard: usize| {
        round_significand(&BigInt::from_u64(m), discard, NearestTiesToEven, false, 1)
            .as_u64()
    };

    // Below half: truncate. Above half: increment.
    assert_eq!(round(0b1000_011, 3), 0b1000);
    assert_eq!(round(0b1000_101, 3), 0b1001);

    // Exactly half: go to the even retained value.
    assert_eq!(round(0b1000_100, 3), 0b1000);
    assert_eq!(round(0b1001_100, 3), 0b1010);

    // A carry out of the retained width is the caller's to resolve.
    assert_eq!(round(0b1111_111, 3), 0b10000);

    // Nothing discarded, nothing changed.
    assert_eq!(round(0b1011, 0), 0b1011);
}

#[test]
fn test_directed_modes() {
    let round = |m: u64, rm: RoundingMode, sign: bool| {
        round_significand(&BigInt::from_u64(m), 2, rm, sign, 1).as_u64()
    };

    assert_eq!(round(0b101_01, Zero, false), 0b101);
    assert_eq!(round(0b101_01, Zero, true), 0b101);
    assert_eq!(round(0b101_01, Positive, false), 0b110);
    assert_eq!(round(0b101_01, Positive, true), 0b101);
    assert_eq!(round(0b101_01, Negative, false), 0b101);
    assert_eq!(round(0b101_01, Negative, true), 0b110);
    // Exact values never move, in any mode.
    assert_eq!(round(0b101_00, Positive, false), 0b101);
    assert_eq!(round(0b101_00, Negative, true), 0b101);

    assert_eq!(round(0b101_10, NearestTiesToAway, false), 0b110);
    assert_eq!(round(0b100_10, NearestTiesToAway, false), 0b101);
}

#[test]
fn test_stochastic_rounding() {
    // Deterministic: the same input always rounds the same way.
    let a = round_significand(&BigInt::from_u64(0b1101_011), 3, Stochastic, false, 4);
    let b = round_significand(&BigInt::from_u64(0b1101_011), 3, Stochastic, false, 4);
    assert_eq!(a.as_u64(), b.as_u64());

    // Exact values never round up.
    let x = round_significand(&BigInt::from_u64(0b1101_000), 3, Stochastic, false, 4);
    assert_eq!(x.as_u64(), 0b1101);

    // The result is always one of the two neighbors.
    for m in 0..(1u64 << 10) {
        let r = round_significand(&BigInt::from_u64(m), 4, Stochastic, false, 6)
            .as_u64();
        assert!(r == m >> 4 || r == (m >> 4) + 1);
    }

    // Larger discarded fractions should round up more often than small
    // ones across a sweep of inputs.
    let count_ups = |low: u64| {
        (0..256u64)
            .filter(|i| {
                let m = (i << 8) | low;
                let r = round_significand(
                    &BigInt::from_u64(m),
                    8,
                    Stochastic,
                    false,
                    8,
                )
                .as_u64();
                r == (m >> 8) + 1
            })
            .count()
    };
    let small = count_ups(0x11);
    let large = count_ups(0xee);
    assert!(large > small);
}
