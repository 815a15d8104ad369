//! Password handling.

use std::fmt;
use std::io::Read;

use zeroize::Zeroizing;

use crate::config::PASSWORD_CAP;
use crate::error::Result;
use crate::stream::read_full;

/// A password read from an input stream, zeroized on drop.
///
/// The password is raw bytes, newlines included: whatever the source delivers
/// up to [`PASSWORD_CAP`] is the password. Interactive use is expected to go
/// through a pipe or redirection, not a terminal prompt.
pub struct Passphrase {
    bytes: Zeroizing<Vec<u8>>,
}

impl Passphrase {
    /// Reads the password from `source` until EOF or the cap.
    ///
    /// Hitting the cap truncates with a warning rather than failing: the
    /// derived key is still well-defined, just from fewer octets than the
    /// caller supplied.
    pub fn read_from<R: Read>(source: &mut R) -> Result<Self> {
        let mut bytes = Zeroizing::new(vec![0u8; PASSWORD_CAP]);
        let n = read_full(source, &mut bytes)?;
        if n == PASSWORD_CAP {
            tracing::warn!("password truncated at {PASSWORD_CAP} octets");
        }
        bytes.truncate(n);
        Ok(Self { bytes })
    }

    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase([REDACTED])")
    }
}
