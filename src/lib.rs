//! Chunked authenticated encryption for byte streams.
//!
//! A container is a small cleartext header (obfuscated magic tag, KDF cost
//! parameters, salt) followed by independently sealed XChaCha20-Poly1305
//! chunks. Keys come from a password stretched with Argon2id or scrypt, or
//! directly from a raw 256-bit key with no header at all. Everything runs
//! single-threaded over blocking readers and writers in bounded memory.

pub mod chunk;
pub mod cli;
pub mod config;
pub mod error;
pub mod header;
pub mod kdf;
pub mod memlock;
pub mod nonce;
pub mod secret;
pub mod stream;

pub use error::{Error, Result};
pub use kdf::{KdfFamily, KdfParams, Key};
pub use stream::{
    StreamCipher, decrypt_container, decrypt_raw, encrypt_container, encrypt_raw,
};
