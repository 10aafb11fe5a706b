mod arithmetic;
mod bigint;
mod codec;
mod emit;
mod float;
mod format;
mod gen;
mod round;
mod specials;
mod utils;

pub use self::arithmetic::{add, convert, fma, mul, sub};
pub use self::bigint::BigInt;
pub use self::codec::{decode, encode};
pub use self::emit::write_listing;
pub use self::float::{Category, Float};
pub use self::format::{
    Family, FormatError, RoundingMode, Semantics, BF16, FP16, FP32, OFP8E4M3,
    OFP8E5M2,
};
pub use self::gen::{generate, Block, Corpus, COUNT, SPECIAL_COUNT};
pub use self::specials::{canonical_inf, canonical_nan, is_inf, is_nan, max_finite};
