//! Exact beat arithmetic
//!
//! Every position and duration in the score model is a [`RationalBeat`]: an
//! exact fraction of a quarter note measured from the start of the piece.
//! Floating point only appears once a value leaves this layer (tempo and
//! real-time computations).

use num_rational::Ratio;

/// Exact fraction of a quarter note.
pub type RationalBeat = Ratio<i64>;

/// Build a beat value from a numerator and denominator.
///
/// # Panics
/// Panics when `denom` is zero, like [`Ratio::new`].
pub fn beats(numer: i64, denom: i64) -> RationalBeat {
    Ratio::new(numer, denom)
}

/// Whole number of quarter notes.
pub fn whole(quarters: i64) -> RationalBeat {
    Ratio::from_integer(quarters)
}

/// Lossy conversion for tempo and real-time arithmetic.
pub fn as_f64(value: RationalBeat) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

/// Re-reduce a value that may have been built without normalization
/// (e.g. deserialized as `[4, 2]`).
pub(crate) fn reduced(value: RationalBeat) -> RationalBeat {
    Ratio::new(*value.numer(), *value.denom())
}

/// Compute GCD of two numbers
pub(crate) fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Compute LCM of two numbers; `None` when it does not fit in a `u64`
pub(crate) fn lcm(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        Some(0)
    } else {
        (a / gcd(a, b)).checked_mul(b)
    }
}
