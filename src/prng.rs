//! Pseudo-random priority source for newly created nodes.

/// A 48-bit linear congruential generator.
///
/// `state = (0x5DEECE66D * state + 0xB) mod 2^48`, the classic `java.util.Random`
/// recurrence. Deterministic: a given seed always yields the same sequence.
/// The map draws from it exactly once per created node and never for lookups
/// or removals, so insertion order alone decides which priorities land where.
#[derive(Clone)]
pub(crate) struct Prng48 {
    state: u64,
}

impl Prng48 {
    const MULT: u64 = 0x5_DEEC_E66D;
    const ADD: u64 = 0xB;
    const MOD_MASK: u64 = (1 << 48) - 1;

    pub(crate) const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Advances the state and returns the next 48-bit value.
    pub(crate) const fn next(&mut self) -> u64 {
        self.state = Self::MULT.wrapping_mul(self.state).wrapping_add(Self::ADD) & Self::MOD_MASK;
        self.state
    }
}
