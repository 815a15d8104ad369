//! Process-wide memory locking.

use crate::error::{Error, Result};

/// Pins all current and future pages of the process into RAM so that key
/// material never reaches swap. Must run before any secret is read.
#[cfg(unix)]
pub fn lock_process_memory() -> Result<()> {
    // SAFETY: mlockall takes no pointers and only touches process state.
    let rc = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
    if rc != 0 {
        return Err(Error::MemoryLock(std::io::Error::last_os_error()));
    }
    Ok(())
}

/// No page-locking facility on this platform; proceed without it.
#[cfg(not(unix))]
pub fn lock_process_memory() -> Result<()> {
    Ok(())
}
