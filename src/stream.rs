//! Chunked streaming encryption and the container entry points.
//!
//! Both directions run single-threaded over blocking readers and writers: one
//! staging buffer, fill, transform in place, drain, repeat. The chunk
//! capacity is a format parameter. The encryptor emits full chunks until the
//! input runs dry, so the decryptor can read the stream in slices of exactly
//! the capacity; only the final chunk may come up short.

use std::io::{ErrorKind, Read, Write};

use crate::chunk::ChunkCipher;
use crate::config::{CHUNK_CAPACITY, CHUNK_OVERHEAD, EPOCH_BUDGET};
use crate::error::{Error, Result};
use crate::header::{read_header, write_header};
use crate::kdf::{KdfFamily, KdfParams, Key};
use crate::secret::Passphrase;

/// Reads until `buf` is full or the source hits EOF, retrying interrupted
/// reads. Returns the number of bytes placed in `buf`.
pub(crate) fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(filled)
}

/// Allocates one staging buffer, reporting exhaustion instead of aborting.
fn chunk_buffer(capacity: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity)?;
    buf.resize(capacity, 0);
    Ok(buf)
}

/// A whole-stream cipher: one key, one direction, one pass.
pub struct StreamCipher {
    chunk: ChunkCipher,
    capacity: usize,
}

impl std::fmt::Debug for StreamCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCipher")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl StreamCipher {
    pub fn new(key: &Key) -> Self {
        Self { chunk: ChunkCipher::new(key, EPOCH_BUDGET), capacity: CHUNK_CAPACITY }
    }

    /// Like [`new`](Self::new) with explicit chunk capacity and epoch budget.
    ///
    /// Both limits are format parameters; a stream can only be opened with
    /// the limits it was sealed with. The budget must exceed the capacity so
    /// the epoch decision never falls mid-chunk.
    pub fn with_limits(key: &Key, capacity: usize, epoch_budget: i64) -> Result<Self> {
        if capacity <= CHUNK_OVERHEAD {
            return Err(Error::Usage(format!(
                "chunk capacity should exceed the framing overhead of {CHUNK_OVERHEAD}"
            )));
        }
        if epoch_budget <= capacity as i64 {
            return Err(Error::Usage(format!(
                "epoch budget should exceed the chunk capacity of {capacity}"
            )));
        }
        Ok(Self { chunk: ChunkCipher::new(key, epoch_budget), capacity })
    }

    /// Seals `input` chunk by chunk into `output` until EOF.
    pub fn encrypt_stream<R: Read, W: Write>(mut self, input: &mut R, output: &mut W) -> Result<()> {
        let mut buf = chunk_buffer(self.capacity)?;
        loop {
            let n = read_full(input, &mut buf[CHUNK_OVERHEAD..])?;
            if n == 0 {
                return Ok(());
            }
            let chunk = &mut buf[..CHUNK_OVERHEAD + n];
            self.chunk.seal(chunk)?;
            output.write_all(chunk)?;
        }
    }

    /// Opens `input` chunk by chunk into `output` until EOF.
    ///
    /// Chunks that fail authentication come out as zeroes; see
    /// [`ChunkCipher::open`] for the contract. Structural damage aborts.
    pub fn decrypt_stream<R: Read, W: Write>(mut self, input: &mut R, output: &mut W) -> Result<()> {
        let mut buf = chunk_buffer(self.capacity)?;
        loop {
            let filled = read_full(input, &mut buf)?;
            if filled == 0 {
                return Ok(());
            }
            let chunk = &mut buf[..filled];
            self.chunk.open(chunk)?;
            output.write_all(&chunk[CHUNK_OVERHEAD..])?;
        }
    }
}

/// Password-based encryption: header, key derivation, then the chunk stream.
pub fn encrypt_container<R, W, P>(
    input: &mut R,
    output: &mut W,
    password_source: &mut P,
    params: &KdfParams,
) -> Result<()>
where
    R: Read,
    W: Write,
    P: Read,
{
    let salt = write_header(output, params)?;

    let pass = Passphrase::read_from(password_source)?;
    let derived = params.derive_key(pass.expose(), &salt);
    // The password is spent once the key exists, wipe it before streaming.
    drop(pass);
    let key = derived?;

    StreamCipher::new(&key).encrypt_stream(input, output)
}

/// Password-based decryption, parameterized by the header it reads.
pub fn decrypt_container<R, W, P>(
    input: &mut R,
    output: &mut W,
    password_source: &mut P,
    family: KdfFamily,
) -> Result<()>
where
    R: Read,
    W: Write,
    P: Read,
{
    let (params, salt) = read_header(input, family)?;

    let pass = Passphrase::read_from(password_source)?;
    let derived = params.derive_key(pass.expose(), &salt);
    drop(pass);
    let key = derived?;

    StreamCipher::new(&key).decrypt_stream(input, output)
}

/// Raw-key encryption: no header, no derivation, just the chunk stream.
pub fn encrypt_raw<R: Read, W: Write>(input: &mut R, output: &mut W, key: &Key) -> Result<()> {
    StreamCipher::new(key).encrypt_stream(input, output)
}

/// Raw-key decryption of a headerless stream.
pub fn decrypt_raw<R: Read, W: Write>(input: &mut R, output: &mut W, key: &Key) -> Result<()> {
    StreamCipher::new(key).decrypt_stream(input, output)
}
