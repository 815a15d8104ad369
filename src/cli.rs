//! Command-line surface.
//!
//! Plaintext or ciphertext comes from the input file, the result goes to
//! standard output, the password arrives on standard input, and diagnostics
//! go to standard error. The raw-key subcommands take the key on the command
//! line instead of a password, which frees standard input for the payload.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::{Error, Result};
use crate::kdf::{KdfFamily, KdfParams, Key};
use crate::memlock::lock_process_memory;
use crate::stream::{decrypt_container, decrypt_raw, encrypt_container, encrypt_raw};

#[derive(Parser)]
#[command(
    name = "streambox",
    version,
    about = "Chunked XChaCha20-Poly1305 containers for pipelines, keyed by a stretched password or a raw key."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a file into a container on standard output. The password is
    /// read from standard input.
    Encrypt {
        /// Input file to encrypt.
        input: PathBuf,

        /// First cost parameter: memory exponent (argon2) or logN (scrypt).
        #[arg(value_name = "COST1")]
        cost1: u64,

        /// Second cost parameter: time cost (argon2) or r (scrypt).
        #[arg(value_name = "COST2")]
        cost2: u64,

        /// Third cost parameter: lanes (argon2) or p (scrypt).
        #[arg(value_name = "COST3")]
        cost3: u64,

        /// Password-stretching family.
        #[arg(long, value_enum, default_value = "argon2")]
        kdf: KdfFamily,
    },

    /// Decrypt a container file to standard output. The password is read
    /// from standard input; cost parameters come from the container header.
    Decrypt {
        /// Container file to decrypt.
        input: PathBuf,

        /// Password-stretching family the container was written with.
        #[arg(long, value_enum, default_value = "argon2")]
        kdf: KdfFamily,
    },

    /// Encrypt standard input to standard output under a raw key, with no
    /// container header. The key is visible to other local users while the
    /// process runs.
    RawEncrypt {
        /// 256-bit key as 64 hex digits.
        #[arg(value_name = "KEY_HEX")]
        key: String,
    },

    /// Decrypt a headerless raw-key stream from standard input.
    RawDecrypt {
        /// 256-bit key as 64 hex digits.
        #[arg(value_name = "KEY_HEX")]
        key: String,
    },
}

impl Cli {
    #[inline]
    pub fn init() -> Self {
        Self::parse()
    }

    pub fn execute(self) -> Result<()> {
        let subscriber = tracing_subscriber::fmt().with_writer(io::stderr).finish();
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| Error::Environment(format!("couldn't install diagnostics: {e}")))?;

        // Before any secret enters the address space.
        lock_process_memory()?;

        let mut stdout = io::stdout().lock();
        match self.command {
            Commands::Encrypt { input, cost1, cost2, cost3, kdf } => {
                let params = KdfParams::from_cli(kdf, [cost1, cost2, cost3])?;
                let mut input = open_input(&input)?;
                encrypt_container(&mut input, &mut stdout, &mut io::stdin().lock(), &params)?;
            }
            Commands::Decrypt { input, kdf } => {
                let mut input = open_input(&input)?;
                decrypt_container(&mut input, &mut stdout, &mut io::stdin().lock(), kdf)?;
            }
            Commands::RawEncrypt { key } => {
                let key = Key::from_hex(&key)?;
                encrypt_raw(&mut io::stdin().lock(), &mut stdout, &key)?;
            }
            Commands::RawDecrypt { key } => {
                let key = Key::from_hex(&key)?;
                decrypt_raw(&mut io::stdin().lock(), &mut stdout, &key)?;
            }
        }
        stdout.flush()?;
        Ok(())
    }
}

fn open_input(path: &Path) -> Result<impl Read> {
    let file = fs::File::open(path)?;
    if !file.metadata()?.is_file() {
        return Err(Error::Environment(format!(
            "{} doesn't look like a regular file",
            path.display()
        )));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn encrypt_takes_three_positional_costs() {
        let cli = Cli::try_parse_from(["streambox", "encrypt", "data.bin", "16", "2", "1"]).unwrap();
        match cli.command {
            Commands::Encrypt { cost1, cost2, cost3, kdf, .. } => {
                assert_eq!((cost1, cost2, cost3), (16, 2, 1));
                assert_eq!(kdf, KdfFamily::Argon2);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn kdf_flag_selects_scrypt() {
        let cli = Cli::try_parse_from(["streambox", "decrypt", "data.bin", "--kdf", "scrypt"])
            .unwrap();
        match cli.command {
            Commands::Decrypt { kdf, .. } => assert_eq!(kdf, KdfFamily::Scrypt),
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn missing_costs_are_rejected() {
        assert!(Cli::try_parse_from(["streambox", "encrypt", "data.bin", "16"]).is_err());
    }
}
