//! Format and limit constants.
//!
//! Everything here is part of the container format or a hard resource limit;
//! changing a value breaks compatibility with previously written containers.

/// Size of encryption keys in bytes.
///
/// 32 bytes (256 bits) is the XChaCha20-Poly1305 key size and also the length
/// of the salt stored in the container header, so a decryptor can read the
/// salt with the same fixed width the encryptor wrote it.
pub const KEY_LEN: usize = 32;

/// Size of the KDF salt in bytes. Equal to the derived key length.
pub const SALT_LEN: usize = KEY_LEN;

/// Size of the XChaCha20 extended nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Length of the structural prefix at the head of every chunk on the wire.
///
/// These bytes are zero on continuation chunks. On the first chunk of an
/// epoch they carry the epoch's random nonce bytes instead: the positions
/// hold no plaintext information and the tag does not cover them, so the
/// randomness travels for free.
pub const PREFIX_LEN: usize = 16;

/// Per-chunk framing overhead on the wire: structural prefix plus tag.
pub const CHUNK_OVERHEAD: usize = PREFIX_LEN + TAG_LEN;

/// Number of random bytes drawn per epoch.
///
/// The prefix can smuggle at most [`PREFIX_LEN`] bytes and the nonce can hold
/// at most [`NONCE_LEN`], so the random portion is the smaller of the two.
/// The remaining nonce bytes are always the deterministic byte counter; there
/// is no room for more true randomness without costing extra ciphertext.
pub const NONCE_RANDOMS: usize = if PREFIX_LEN < NONCE_LEN { PREFIX_LEN } else { NONCE_LEN };

/// Default on-wire chunk capacity (8 MiB), framing included.
///
/// The capacity is a format parameter: the decryptor reads the stream in
/// slices of exactly this size, so both sides must agree on it.
pub const CHUNK_CAPACITY: usize = 8 * 1024 * 1024;

/// Plaintext bytes sealed under one nonce before a new epoch begins.
///
/// Arbitrary, but must be strictly greater than the chunk capacity so that
/// the epoch decision never changes mid-chunk.
pub const EPOCH_BUDGET: i64 = i32::MAX as i64;

/// Upper bound on password length read from standard input.
///
/// Input beyond the cap is truncated with a warning rather than rejected.
pub const PASSWORD_CAP: usize = 16 * 1024;

/// ASCII identifier of the AEAD primitive, obfuscated into the magic tag.
pub const PRIMITIVE_ID: &[u8; 17] = b"xchacha20poly1305";

/// Length of the container's magic tag in bytes.
pub const MAGIC_LEN: usize = PRIMITIVE_ID.len();

/// Minimum acceptable scrypt memory usage in bytes, below which the
/// encryptor warns (but does not refuse) about weak parameters.
pub const SCRYPT_MEM_FLOOR: u64 = 16 * 1024 * 1024;
