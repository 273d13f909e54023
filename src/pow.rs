//! Proof-of-work targets: compact encoding and the retarget formula.
//!
//! A difficulty target is an unsigned 256-bit integer; headers carry it in
//! the legacy compact form (8-bit exponent, 23-bit mantissa, a sign bit that
//! must stay clear for valid targets). `decode_compact`/`encode_compact` are
//! explicit free functions; arithmetic saturates rather than wrapping, which
//! the final `max_target` clamp makes equivalent for every value that passes
//! the bits-range checks.

use std::fmt;

use ethnum::U256;

use crate::chain::ChainParams;
use crate::error::{ValidationError, ValidationResult};
use crate::header::BlockHeader;
use crate::types::PowHash;

/// An unsigned 256-bit proof-of-work target.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target(U256);

impl Target {
    /// The zero target, met by no hash but the all-zero one.
    pub const ZERO: Target = Target(U256::ZERO);

    /// Construct from high and low 128-bit words.
    pub const fn from_words(hi: u128, lo: u128) -> Self {
        Target(U256::from_words(hi, lo))
    }

    /// Whether `hash`, interpreted as an integer per the chain convention
    /// (digest bytes reversed, then big-endian), does not exceed this target.
    pub fn is_met_by(&self, hash: PowHash) -> bool {
        let mut bytes = hash.to_byte_array();
        bytes.reverse();
        U256::from_be_bytes(bytes) <= self.0
    }

    /// Big-endian byte representation.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({:#x})", self.0)
    }
}

/// Expand a compact `bits` value into its target.
///
/// Mantissa is the low 23 bits, exponent the top byte; exponents at or below
/// 3 shift the mantissa down, larger ones shift it up by whole bytes. A
/// mantissa that would not fit in 256 bits saturates to the maximum value;
/// the bits-range checks in [`next_work_required`] reject such encodings on
/// chains that enforce them.
pub fn decode_compact(bits: u32) -> Target {
    let size = bits >> 24;
    let word = bits & 0x007f_ffff;

    if word == 0 {
        return Target::ZERO;
    }
    if size <= 3 {
        return Target(U256::new(u128::from(word >> (8 * (3 - size)))));
    }
    let overflow = size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32);
    if overflow {
        return Target(U256::MAX);
    }
    Target(U256::new(u128::from(word)) << (8 * (size - 3)))
}

/// Compress a target into its compact `bits` form.
///
/// Inverse of [`decode_compact`] for every normalized encoding. When the top
/// bit of the leading mantissa byte would be set it is pushed into the next
/// exponent to keep the sign bit clear.
pub fn encode_compact(target: Target) -> u32 {
    let value = target.0;
    let mut size = (256 - value.leading_zeros() + 7) / 8;
    let mut compact = if size <= 3 {
        (*value.low() as u32) << (8 * (3 - size))
    } else {
        let shifted = value >> (8 * (size - 3));
        *shifted.low() as u32
    };

    // The 0x00800000 bit denotes the sign: push a set bit into the exponent.
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    compact | (size << 24)
}

/// Compute the expected `(bits, target)` for the header at `height`.
///
/// `last` is the immediate predecessor (height - 1), `first` the start of the
/// retarget window (height - 2). Height 0 takes the configured genesis values
/// without consulting either. At height 1 there is no spacing information
/// yet, so the actual timespan defaults to the target timespan and the
/// genesis bits carry over.
pub fn next_work_required(
    params: &ChainParams,
    height: u32,
    first: Option<&BlockHeader>,
    last: Option<&BlockHeader>,
) -> ValidationResult<(u32, Target)> {
    if height == 0 {
        return Ok((params.genesis_bits, params.max_target));
    }
    let last = last.ok_or(ValidationError::MissingPredecessor {
        height,
    })?;

    if params.enforce_bits_range {
        check_bits_range(last.bits)?;
    }

    let target_timespan = i64::from(params.target_timespan);
    let actual_timespan = match first {
        Some(first) => i64::from(last.timestamp) - i64::from(first.timestamp),
        None => target_timespan,
    };

    let min_timespan = target_timespan - target_timespan / 8;
    let max_timespan = target_timespan + target_timespan / 2;
    let modulated_timespan =
        (target_timespan + (actual_timespan - target_timespan) / 8).clamp(min_timespan, max_timespan);

    let old_target = decode_compact(last.bits);
    let scaled = old_target.0.saturating_mul(U256::new(modulated_timespan as u128))
        / U256::new(target_timespan as u128);
    let new_target = Target(scaled).min(params.max_target);

    Ok((encode_compact(new_target), new_target))
}

/// Reject `bits` whose exponent or mantissa falls outside the range any
/// honestly-produced header can carry.
fn check_bits_range(bits: u32) -> ValidationResult<()> {
    let exponent = (bits >> 24) & 0xff;
    if !(0x03..=0x1f).contains(&exponent) {
        return Err(ValidationError::InvalidCompactBits {
            bits,
            reason: format!("exponent {:#04x} outside [0x03, 0x1f]", exponent),
        });
    }
    let mantissa = bits & 0x00ff_ffff;
    if !(0x8000..=0x007f_ffff).contains(&mantissa) {
        return Err(ValidationError::InvalidCompactBits {
            bits,
            reason: format!("mantissa {:#08x} outside [0x8000, 0x7fffff]", mantissa),
        });
    }
    Ok(())
}
