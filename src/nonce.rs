//! Per-epoch nonce sequencing.
//!
//! A single derived key seals an unbounded stream, so nonce uniqueness is the
//! load-bearing invariant: one repeated (key, nonce) pair breaks the whole
//! container. Rather than paying for fresh randomness on every chunk, chunks
//! are grouped into epochs. Each epoch draws [`NONCE_RANDOMS`] random bytes
//! for the head of the nonce; the tail is filled from the low-order bytes of
//! the total plaintext count at the moment the epoch starts. The count is
//! monotonic, so the tail alone already distinguishes epochs; the random
//! head is defense against counter reuse across runs.

use crate::config::{NONCE_LEN, NONCE_RANDOMS};

/// Mutable nonce state owned by one encryption or decryption run.
pub struct NonceSequencer {
    nonce: [u8; NONCE_LEN],
    /// Plaintext bytes remaining before the next epoch. Signed: a chunk may
    /// overshoot the boundary, and the new epoch then starts on the chunk
    /// after it.
    budget: i64,
    /// Total plaintext bytes processed so far.
    total: u64,
    epoch_budget: i64,
}

impl NonceSequencer {
    pub fn new(epoch_budget: i64) -> Self {
        Self { nonce: [0u8; NONCE_LEN], budget: 0, total: 0, epoch_budget }
    }

    /// True when the next chunk must begin a new epoch. Holds before the
    /// first chunk and whenever the budget has been used up.
    pub fn needs_new_epoch(&self) -> bool {
        self.budget <= 0
    }

    /// Starts an epoch: installs the random head, fills the deterministic
    /// tail from the current total, and resets the budget.
    ///
    /// On encrypt the randoms come from the OS RNG; on decrypt they are
    /// lifted from the structural prefix of the epoch's first chunk.
    pub fn start_epoch(&mut self, randoms: &[u8; NONCE_RANDOMS]) {
        self.nonce[..NONCE_RANDOMS].copy_from_slice(randoms);

        // Low-order bytes first; once the counter is exhausted the shifts
        // leave the remaining tail bytes zero.
        let mut n = self.total;
        for byte in &mut self.nonce[NONCE_RANDOMS..] {
            *byte = n as u8;
            n >>= 8;
        }

        self.budget = self.epoch_budget;
    }

    /// Accounts for one processed chunk of `n` plaintext bytes.
    pub fn consume(&mut self, n: usize) {
        self.total += n as u64;
        self.budget -= n as i64;
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Total plaintext bytes processed, used for absolute offsets in
    /// tamper reports.
    pub fn total(&self) -> u64 {
        self.total
    }

    #[cfg(test)]
    fn budget(&self) -> i64 {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_chunk_needs_an_epoch() {
        let seq = NonceSequencer::new(100);
        assert!(seq.needs_new_epoch());
    }

    #[test]
    fn tail_is_total_in_little_endian_order() {
        let mut seq = NonceSequencer::new(1 << 40);
        seq.consume(0x0102_0304);
        seq.start_epoch(&[0xaa; NONCE_RANDOMS]);

        let nonce = seq.nonce();
        assert_eq!(&nonce[..NONCE_RANDOMS], &[0xaa; NONCE_RANDOMS]);
        assert_eq!(&nonce[NONCE_RANDOMS..], &[0x04, 0x03, 0x02, 0x01, 0, 0, 0, 0]);
    }

    #[test]
    fn budget_tracks_plaintext_bytes() {
        let mut seq = NonceSequencer::new(100);
        seq.start_epoch(&[0; NONCE_RANDOMS]);
        assert_eq!(seq.budget(), 100);
        assert!(!seq.needs_new_epoch());

        seq.consume(60);
        assert!(!seq.needs_new_epoch());
        seq.consume(60);
        assert!(seq.needs_new_epoch(), "overshoot must trigger a new epoch");
        assert_eq!(seq.total(), 120);
    }

    #[test]
    fn epochs_never_repeat_a_nonce() {
        // Same randoms every epoch: uniqueness must come from the tail.
        let mut seq = NonceSequencer::new(10);
        let mut seen = Vec::new();

        for _ in 0..50 {
            assert!(seq.needs_new_epoch());
            seq.start_epoch(&[0x42; NONCE_RANDOMS]);
            assert!(!seen.contains(seq.nonce()));
            seen.push(*seq.nonce());
            seq.consume(10);
        }
    }
}
