//! Deterministic RNG for random values, shuffles and allocation faults.
//!
//! xorshift64*: fast, and the sequence for a given seed is the same on every
//! platform, so a run started with `--seed` replays exactly. Not for secrets.

/// Single-word generator state.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// A zero seed would lock xorshift at zero, so it is remapped.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state }
    }

    /// Seed from the wall clock, for runs that did not ask for a fixed seed.
    pub fn seed_from_clock() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    }

    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform index in `[0, bound)`. `bound` must be non-zero.
    #[inline]
    pub fn below(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        (self.next_u64() % bound as u64) as usize
    }

    /// Value in `[lo, hi_exclusive)`.
    #[inline]
    pub fn gen_range(&mut self, lo: usize, hi_exclusive: usize) -> usize {
        debug_assert!(lo < hi_exclusive);
        lo + self.below(hi_exclusive - lo)
    }

    /// `true` with probability `numerator / denominator`.
    #[inline]
    pub fn gen_bool(&mut self, numerator: u32, denominator: u32) -> bool {
        debug_assert!(denominator > 0);
        (self.next_u64() % u64::from(denominator)) < u64::from(numerator)
    }

    /// Lowercase ASCII string with length in `[min_len, max_len_exclusive)`.
    pub fn lowercase(&mut self, min_len: usize, max_len_exclusive: usize) -> String {
        let len = self.gen_range(min_len, max_len_exclusive);
        (0..len)
            .map(|_| char::from(b'a' + self.below(26) as u8))
            .collect()
    }
}
