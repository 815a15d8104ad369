//! Key derivation: parameter codec, range validation, and the KDF call.
//!
//! Two password-stretching families are supported, selected once at startup
//! and carried as a data value rather than a compile-time branch:
//!
//! - **Argon2id** (v1.3): memory-cost exponent, time cost, lanes.
//! - **scrypt**: logN work-factor exponent, block size `r`, parallelism `p`.
//!
//! Each family serializes its cost knobs as ordered fixed-width big-endian
//! integers so the exact parameters used travel in cleartext ahead of the
//! salt, letting a decryptor parameterize its KDF call identically before it
//! can attempt to open any chunk.

use std::fmt;
use std::io::{Read, Write};

use argon2::Algorithm::Argon2id;
use argon2::Version::V0x13;
use argon2::{Argon2, Params};
use clap::ValueEnum;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::{KEY_LEN, SCRYPT_MEM_FLOOR};
use crate::error::{Error, Result};

/// A 256-bit secret key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a raw key given as hex on the command line.
    pub fn from_hex(s: &str) -> Result<Self> {
        let decoded = Zeroizing::new(
            hex::decode(s).map_err(|_| Error::Usage("invalid key: not valid hex".into()))?,
        );
        let mut bytes = [0u8; KEY_LEN];
        if decoded.len() != KEY_LEN {
            return Err(Error::Usage(format!(
                "invalid key: expected {} hex digits, got {}",
                KEY_LEN * 2,
                s.len()
            )));
        }
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}

/// The password-stretching family selected at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KdfFamily {
    Argon2,
    Scrypt,
}

/// Validated-or-validatable cost parameters for one KDF family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KdfParams {
    Argon2 {
        /// Memory cost is `2^mem_exp` KiB.
        mem_exp: u8,
        time: u32,
        lanes: u32,
    },
    Scrypt {
        /// Work factor is `2^log_n`.
        log_n: u8,
        r: u32,
        p: u32,
    },
}

/// A single out-of-range cost knob: its name and acceptable range.
struct BadParam(&'static str, &'static str);

impl BadParam {
    fn message(&self) -> String {
        format!("invalid {}: should be a decimal integer in the range {}", self.0, self.1)
    }
}

impl KdfParams {
    /// Builds parameters from the three positional cost values given on the
    /// command line, in ParamBlock order for the selected family.
    ///
    /// Range violations (including values too large for the wire width) are
    /// usage errors.
    pub fn from_cli(family: KdfFamily, cost: [u64; 3]) -> Result<Self> {
        let params = match family {
            KdfFamily::Argon2 => Self::Argon2 {
                mem_exp: cost[0].min(u8::MAX as u64) as u8,
                time: cost[1].min(u32::MAX as u64) as u32,
                lanes: cost[2].min(u32::MAX as u64) as u32,
            },
            KdfFamily::Scrypt => Self::Scrypt {
                log_n: cost[0].min(u8::MAX as u64) as u8,
                r: cost[1].min(u32::MAX as u64) as u32,
                p: cost[2].min(u32::MAX as u64) as u32,
            },
        };
        // Saturating narrowing above maps oversized values onto the type
        // maximum, which is outside every acceptable range below.
        params.validate_encrypt()?;
        Ok(params)
    }

    pub fn family(&self) -> KdfFamily {
        match self {
            Self::Argon2 { .. } => KdfFamily::Argon2,
            Self::Scrypt { .. } => KdfFamily::Scrypt,
        }
    }

    /// Per-knob range check shared by both directions.
    fn check_ranges(&self) -> Result<(), BadParam> {
        match *self {
            Self::Argon2 { mem_exp, time, lanes } => {
                if !(13..=30).contains(&mem_exp) {
                    return Err(BadParam("memory exponent", "[13, 30]"));
                }
                if time == 0 || time >= 1 << 24 {
                    return Err(BadParam("time cost", "[1, 2^24)"));
                }
                if lanes == 0 || lanes > 255 {
                    return Err(BadParam("lanes", "[1, 255]"));
                }
            }
            Self::Scrypt { log_n, r, p } => {
                if !(2..=63).contains(&log_n) {
                    return Err(BadParam("logN", "[2, 64)"));
                }
                if r == 0 || r >= 1 << 30 {
                    return Err(BadParam("r", "[1, 2^30)"));
                }
                if p == 0 || p >= 1 << 30 {
                    return Err(BadParam("p", "[1, 2^30)"));
                }
            }
        }
        Ok(())
    }

    /// Encrypt-time validation: range violations are usage errors, and the
    /// scrypt family also enforces its joint constraint and warns below the
    /// aggregate-cost floor.
    pub fn validate_encrypt(&self) -> Result<()> {
        self.check_ranges().map_err(|bad| Error::Usage(bad.message()))?;

        if let Self::Scrypt { log_n, r, p } = *self {
            let product = u64::from(r) * u64::from(p);
            if product >= 1 << 30 {
                return Err(Error::Usage(format!(
                    "invalid p and r: their product should be below 2^30, not {product}"
                )));
            }

            // http://blog.ircmaxell.com/2014/03/why-i-dont-recommend-scrypt.html
            let mem_usage = 128u128 * u128::from(r) * ((1u128 << log_n) + u128::from(p));
            if mem_usage < u128::from(SCRYPT_MEM_FLOOR) {
                tracing::warn!(
                    "weak scrypt parameters: memory usage should be at least {SCRYPT_MEM_FLOOR}, not {mem_usage}"
                );
            }
        }

        Ok(())
    }

    /// Decrypt-time validation: the same ranges, reported as format errors.
    /// Corruption of the parameter block is indistinguishable from a bad
    /// file, so it is classified as one.
    pub fn validate_decrypt(&self) -> Result<()> {
        self.check_ranges().map_err(|bad| Error::Format(bad.message()))
    }

    /// Serialized width of the parameter block in bytes.
    pub const fn encoded_len() -> usize {
        1 + 4 + 4
    }

    /// Writes the cost knobs as fixed-width big-endian integers.
    pub fn encode<W: Write>(&self, out: &mut W) -> Result<()> {
        let (first, second, third) = match *self {
            Self::Argon2 { mem_exp, time, lanes } => (mem_exp, time, lanes),
            Self::Scrypt { log_n, r, p } => (log_n, r, p),
        };
        out.write_all(&[first])?;
        out.write_all(&second.to_be_bytes())?;
        out.write_all(&third.to_be_bytes())?;
        Ok(())
    }

    /// Reads and validates a parameter block for the selected family.
    pub fn decode<R: Read>(family: KdfFamily, input: &mut R) -> Result<Self> {
        let names: [&str; 3] = match family {
            KdfFamily::Argon2 => ["memory exponent", "time cost", "lanes"],
            KdfFamily::Scrypt => ["logN", "r", "p"],
        };

        let first = read_u8(input, names[0])?;
        let second = read_u32_be(input, names[1])?;
        let third = read_u32_be(input, names[2])?;

        let params = match family {
            KdfFamily::Argon2 => Self::Argon2 { mem_exp: first, time: second, lanes: third },
            KdfFamily::Scrypt => Self::Scrypt { log_n: first, r: second, p: third },
        };
        params.validate_decrypt()?;
        Ok(params)
    }

    /// Runs the selected KDF once. Deterministic and intentionally expensive;
    /// the cost is the security property.
    pub fn derive_key(&self, secret: &[u8], salt: &[u8]) -> Result<Key> {
        let mut key = [0u8; KEY_LEN];

        match *self {
            Self::Argon2 { mem_exp, time, lanes } => {
                let params = Params::new(1u32 << mem_exp, time, lanes, Some(KEY_LEN))
                    .map_err(|e| Error::Derivation(format!("invalid argon2 parameter: {e}")))?;
                Argon2::new(Argon2id, V0x13, params)
                    .hash_password_into(secret, salt, &mut key)
                    .map_err(|e| Error::Derivation(e.to_string()))?;
            }
            Self::Scrypt { log_n, r, p } => {
                let params = scrypt::Params::new(log_n, r, p, KEY_LEN)
                    .map_err(|e| Error::Derivation(format!("invalid scrypt parameter: {e}")))?;
                scrypt::scrypt(secret, salt, &params, &mut key)
                    .map_err(|e| Error::Derivation(e.to_string()))?;
            }
        }

        Ok(Key::from_bytes(key))
    }
}

fn read_u8<R: Read>(input: &mut R, name: &str) -> Result<u8> {
    let mut buf = [0u8; 1];
    input
        .read_exact(&mut buf)
        .map_err(|_| Error::Format(format!("couldn't read {name}")))?;
    Ok(buf[0])
}

fn read_u32_be<R: Read>(input: &mut R, name: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    input
        .read_exact(&mut buf)
        .map_err(|_| Error::Format(format!("couldn't read {name}")))?;
    Ok(u32::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn argon2_boundaries() {
        for (mem_exp, time, lanes, ok) in [
            (13u64, 1u64, 1u64, true),
            (30, (1 << 24) - 1, 255, true),
            (12, 1, 1, false),
            (31, 1, 1, false),
            (13, 0, 1, false),
            (13, 1 << 24, 1, false),
            (13, 1, 0, false),
            (13, 1, 256, false),
        ] {
            let result = KdfParams::from_cli(KdfFamily::Argon2, [mem_exp, time, lanes]);
            assert_eq!(result.is_ok(), ok, "argon2 {mem_exp}/{time}/{lanes}");
        }
    }

    #[test]
    fn scrypt_boundaries() {
        for (log_n, r, p, ok) in [
            (2u64, 1u64, 1u64, true),
            (63, 1, 1, true),
            (1, 1, 1, false),
            (64, 1, 1, false),
            (16, 0, 1, false),
            (16, 1 << 30, 1, false),
            (16, 1, 0, false),
            (16, 1, 1 << 30, false),
        ] {
            let result = KdfParams::from_cli(KdfFamily::Scrypt, [log_n, r, p]);
            assert_eq!(result.is_ok(), ok, "scrypt {log_n}/{r}/{p}");
        }
    }

    #[test]
    fn scrypt_joint_constraint_is_encrypt_time_usage_error() {
        // Individually valid, jointly too large.
        let err = KdfParams::from_cli(KdfFamily::Scrypt, [16, 1 << 20, 1 << 20]).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));

        // The same combination decodes fine: the joint check is encrypt-only.
        let params = KdfParams::Scrypt { log_n: 16, r: 1 << 20, p: 1 << 20 };
        let mut encoded = Vec::new();
        params.encode(&mut encoded).unwrap();
        let decoded = KdfParams::decode(KdfFamily::Scrypt, &mut Cursor::new(encoded)).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn out_of_range_decode_is_a_format_error() {
        let params = KdfParams::Scrypt { log_n: 1, r: 8, p: 1 };
        let mut encoded = Vec::new();
        params.encode(&mut encoded).unwrap();

        let err = KdfParams::decode(KdfFamily::Scrypt, &mut Cursor::new(encoded)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("logN"));
    }

    #[test]
    fn encode_decode_round_trip() {
        let params = KdfParams::Argon2 { mem_exp: 16, time: 2, lanes: 1 };
        let mut encoded = Vec::new();
        params.encode(&mut encoded).unwrap();
        assert_eq!(encoded.len(), KdfParams::encoded_len());
        assert_eq!(encoded[0], 16);
        assert_eq!(&encoded[1..5], &2u32.to_be_bytes());
        assert_eq!(&encoded[5..9], &1u32.to_be_bytes());

        let decoded = KdfParams::decode(KdfFamily::Argon2, &mut Cursor::new(encoded)).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn truncated_param_block_is_a_format_error() {
        let err =
            KdfParams::decode(KdfFamily::Argon2, &mut Cursor::new([16u8, 0, 0])).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("time cost"));
    }

    #[test]
    fn derive_is_deterministic_and_salt_sensitive() {
        let params = KdfParams::Scrypt { log_n: 4, r: 8, p: 1 };
        let a = params.derive_key(b"password", &[1u8; 32]).unwrap();
        let b = params.derive_key(b"password", &[1u8; 32]).unwrap();
        let c = params.derive_key(b"password", &[2u8; 32]).unwrap();

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn key_from_hex() {
        let key = Key::from_hex(&"ab".repeat(KEY_LEN)).unwrap();
        assert_eq!(key.as_bytes(), &[0xab; KEY_LEN]);

        assert!(matches!(Key::from_hex("abcd").unwrap_err(), Error::Usage(_)));
        assert!(matches!(Key::from_hex("zz").unwrap_err(), Error::Usage(_)));
    }
}
