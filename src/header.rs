//! Container header: magic tag, parameter block, salt.
//!
//! The header is `MagicTag(17) ‖ ParamBlock(9) ‖ Salt(32)`. The magic tag is
//! the primitive identifier XOR-obfuscated with a per-family byte mask, so a
//! container opened with the wrong `--kdf` flag (or by an incompatible build)
//! fails loudly at the very first read instead of deriving a key from the
//! wrong parameters.

use std::io::{Read, Write};

use rand::{rngs::SysRng, TryRng};

use crate::config::{MAGIC_LEN, PRIMITIVE_ID, SALT_LEN};
use crate::error::{Error, Result};
use crate::kdf::{KdfFamily, KdfParams};

/// Per-family seed for the magic-tag mask. Distinct seeds keep the two
/// families' containers mutually unreadable even though the primitive
/// identifier is the same.
fn mask_seed(family: KdfFamily) -> u8 {
    match family {
        KdfFamily::Argon2 => 0xff,
        KdfFamily::Scrypt => 0xb7,
    }
}

/// The obfuscated magic tag for one KDF family.
pub fn magic_tag(family: KdfFamily) -> [u8; MAGIC_LEN] {
    let seed = mask_seed(family);
    let mut tag = [0u8; MAGIC_LEN];
    for (i, byte) in tag.iter_mut().enumerate() {
        // Mask byte i is seed - (i << 5), wrapping in u8.
        *byte = PRIMITIVE_ID[i] ^ seed.wrapping_sub((i as u8) << 5);
    }
    tag
}

/// Writes the full header and returns the freshly drawn salt.
pub fn write_header<W: Write>(out: &mut W, params: &KdfParams) -> Result<[u8; SALT_LEN]> {
    out.write_all(&magic_tag(params.family()))?;
    params.encode(out)?;

    let mut salt = [0u8; SALT_LEN];
    SysRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| Error::Environment(format!("entropy source failed to provide: {e}")))?;
    out.write_all(&salt)?;

    Ok(salt)
}

/// Reads and validates the full header for the selected family.
pub fn read_header<R: Read>(
    input: &mut R,
    family: KdfFamily,
) -> Result<(KdfParams, [u8; SALT_LEN])> {
    let mut magic = [0u8; MAGIC_LEN];
    input
        .read_exact(&mut magic)
        .map_err(|_| Error::Format("couldn't read magic tag".into()))?;
    if magic != magic_tag(family) {
        return Err(Error::Format(
            "bad magic tag (wrong KDF family, or not a container at all)".into(),
        ));
    }

    let params = KdfParams::decode(family, input)?;

    let mut salt = [0u8; SALT_LEN];
    input
        .read_exact(&mut salt)
        .map_err(|_| Error::Format("couldn't read salt".into()))?;

    Ok((params, salt))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn header_round_trip() {
        let params = KdfParams::Argon2 { mem_exp: 16, time: 2, lanes: 1 };
        let mut buf = Vec::new();
        let salt = write_header(&mut buf, &params).unwrap();
        assert_eq!(buf.len(), MAGIC_LEN + KdfParams::encoded_len() + SALT_LEN);

        let (decoded, read_salt) = read_header(&mut Cursor::new(buf), KdfFamily::Argon2).unwrap();
        assert_eq!(decoded, params);
        assert_eq!(read_salt, salt);
    }

    #[test]
    fn magic_tags_differ_per_family_and_hide_the_identifier() {
        let argon2 = magic_tag(KdfFamily::Argon2);
        let scrypt = magic_tag(KdfFamily::Scrypt);
        assert_ne!(argon2, scrypt);
        assert_ne!(&argon2, PRIMITIVE_ID);
        assert_ne!(&scrypt, PRIMITIVE_ID);
    }

    #[test]
    fn wrong_family_is_a_format_error() {
        let params = KdfParams::Scrypt { log_n: 14, r: 8, p: 1 };
        let mut buf = Vec::new();
        write_header(&mut buf, &params).unwrap();

        let err = read_header(&mut Cursor::new(buf), KdfFamily::Argon2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn corrupted_magic_is_a_format_error() {
        let params = KdfParams::Argon2 { mem_exp: 16, time: 2, lanes: 1 };
        let mut buf = Vec::new();
        write_header(&mut buf, &params).unwrap();
        buf[0] ^= 0x01;

        let err = read_header(&mut Cursor::new(buf), KdfFamily::Argon2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn truncated_salt_is_a_format_error() {
        let params = KdfParams::Argon2 { mem_exp: 16, time: 2, lanes: 1 };
        let mut buf = Vec::new();
        write_header(&mut buf, &params).unwrap();
        buf.truncate(buf.len() - 1);

        let err = read_header(&mut Cursor::new(buf), KdfFamily::Argon2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("salt"));
    }
}
