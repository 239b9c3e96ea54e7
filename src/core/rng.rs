//! Deterministic dice RNG.
//!
//! Rolling is never part of resolution; it is offered to callers that
//! turn a resolved dice expression into a chat roll. Seeding makes those
//! rolls reproducible in tests and replays.
//!
//! ```
//! use sheet_effects::core::DiceRng;
//!
//! let mut a = DiceRng::new(42);
//! let mut b = DiceRng::new(42);
//! assert_eq!(a.roll_die(20), b.roll_die(20));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seeded RNG for rolling dice.
#[derive(Clone, Debug)]
pub struct DiceRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl DiceRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Roll one die with `sides` faces. A zero-sided die rolls 0.
    pub fn roll_die(&mut self, sides: u32) -> i64 {
        if sides == 0 {
            return 0;
        }
        i64::from(self.inner.gen_range(1..=sides))
    }

    /// Roll `count` dice of `sides` faces and return each result.
    pub fn roll_dice(&mut self, count: u32, sides: u32) -> Vec<i64> {
        (0..count).map(|_| self.roll_die(sides)).collect()
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> DiceRngState {
        DiceRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &DiceRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Serializable RNG state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position
    pub word_pos: u128,
}
