//! One-chunk seal and open over XChaCha20-Poly1305.
//!
//! Every chunk on the wire is `prefix(16) ‖ tag(16) ‖ ciphertext`. The prefix
//! is structural: zero on continuation chunks, the epoch's random nonce bytes
//! on the first chunk of an epoch. It is not covered by the tag and carries
//! no plaintext information, so substituting nonce material into it before
//! transmission repurposes otherwise-wasted bytes. All offset arithmetic for
//! the framing lives here; callers hand over whole chunks.
//!
//! # Authentication failures
//!
//! `open` deliberately does not fail when the tag does not verify: the
//! payload positions are emitted as zeroes and the stream continues. This is
//! the tool's documented wrong-password contract (the decryptor's output is
//! all zeroes if the wrong password is given) and applies uniformly to
//! in-stream payload tampering. Structural damage (a nonzero continuation
//! prefix or a truncated chunk) is a hard format error.

use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{Tag, XChaCha20Poly1305, XNonce};
use rand::{rngs::SysRng, TryRng};

use crate::config::{CHUNK_OVERHEAD, NONCE_RANDOMS, PREFIX_LEN};
use crate::error::{Error, Result};
use crate::kdf::Key;
use crate::nonce::NonceSequencer;

/// Seals or opens one bounded chunk at a time, coordinating with the nonce
/// sequencer. Exclusively owned by one stream loop for the run's lifetime.
pub struct ChunkCipher {
    aead: XChaCha20Poly1305,
    seq: NonceSequencer,
}

impl ChunkCipher {
    pub fn new(key: &Key, epoch_budget: i64) -> Self {
        let aead = XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key.as_bytes()));
        Self { aead, seq: NonceSequencer::new(epoch_budget) }
    }

    /// Seals `chunk` in place. The caller places the plaintext at
    /// `chunk[CHUNK_OVERHEAD..]`; the framing bytes are filled in here.
    pub fn seal(&mut self, chunk: &mut [u8]) -> Result<()> {
        debug_assert!(chunk.len() > CHUNK_OVERHEAD);
        let plaintext_len = chunk.len() - CHUNK_OVERHEAD;

        let new_epoch = self.seq.needs_new_epoch();
        if new_epoch {
            let mut randoms = [0u8; NONCE_RANDOMS];
            SysRng
                .try_fill_bytes(&mut randoms)
                .map_err(|e| Error::Environment(format!("entropy source failed to provide: {e}")))?;
            self.seq.start_epoch(&randoms);
        }

        let (frame, payload) = chunk.split_at_mut(CHUNK_OVERHEAD);
        let nonce = XNonce::from_slice(self.seq.nonce());
        let tag = self
            .aead
            .encrypt_in_place_detached(nonce, b"", payload)
            .map_err(|_| Error::Io(std::io::Error::other("aead seal failed")))?;

        frame[..PREFIX_LEN].fill(0);
        if new_epoch {
            // The tag authenticates only the payload, so planting the nonce
            // randoms here does not invalidate the sealed blob.
            frame[..NONCE_RANDOMS].copy_from_slice(&self.seq.nonce()[..NONCE_RANDOMS]);
        }
        frame[PREFIX_LEN..].copy_from_slice(tag.as_slice());

        self.seq.consume(plaintext_len);
        Ok(())
    }

    /// Opens `chunk` in place. On return the plaintext occupies
    /// `chunk[CHUNK_OVERHEAD..]`; the framing bytes carry no information once
    /// the nonce has been extracted and must be stripped by the caller.
    pub fn open(&mut self, chunk: &mut [u8]) -> Result<()> {
        if chunk.len() <= CHUNK_OVERHEAD {
            return Err(Error::Format(format!(
                "expected more than {CHUNK_OVERHEAD} octets after {:#x}, got only {}",
                self.seq.total(),
                chunk.len()
            )));
        }
        let plaintext_len = chunk.len() - CHUNK_OVERHEAD;

        if self.seq.needs_new_epoch() {
            let mut randoms = [0u8; NONCE_RANDOMS];
            randoms.copy_from_slice(&chunk[..NONCE_RANDOMS]);
            self.seq.start_epoch(&randoms);
        } else if let Some(i) = chunk[..PREFIX_LEN].iter().position(|&b| b != 0) {
            return Err(Error::Format(format!(
                "octet {:#x} should have been zero, not {:#x}",
                self.seq.total() + i as u64,
                chunk[i]
            )));
        }

        let (frame, payload) = chunk.split_at_mut(CHUNK_OVERHEAD);
        let tag = Tag::clone_from_slice(&frame[PREFIX_LEN..]);
        let nonce = XNonce::from_slice(self.seq.nonce());

        if self.aead.decrypt_in_place_detached(nonce, b"", payload, &tag).is_err() {
            // Wrong key or tampered payload: zeroes out, per the contract
            // documented above.
            payload.fill(0);
        }

        self.seq.consume(plaintext_len);
        Ok(())
    }
}
