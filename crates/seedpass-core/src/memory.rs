//! Process hardening for seed material
//!
//! The seed phrase, derived keys and decrypted secrets only ever live in
//! process memory. [`disable_core_dumps`] sets `RLIMIT_CORE` to zero so a
//! crash cannot write them to disk.
//!
//! Best-effort: containers and unprivileged users may refuse the call, and
//! callers are expected to log the failure and carry on.
//!
//! # Platform Support
//!
//! - Unix/macOS/Linux: `setrlimit(RLIMIT_CORE, 0)` via libc
//! - Other: returns [`std::io::ErrorKind::Unsupported`]

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set once core dumps have been disabled successfully
static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Call it first thing in `main`, before any seed is read. Repeated calls
/// after a success are no-ops.
///
/// # Example
/// ```
/// if let Err(e) = seedpass_core::memory::disable_core_dumps() {
///     eprintln!("core dumps still enabled: {}", e);
/// }
/// ```
pub fn disable_core_dumps() -> io::Result<()> {
    if CORE_DUMPS_DISABLED.load(Ordering::SeqCst) {
        return Ok(());
    }

    platform::disable_core_dumps_impl()?;
    CORE_DUMPS_DISABLED.store(true, Ordering::SeqCst);
    log::debug!("Core dumps disabled");
    Ok(())
}

/// Whether [`disable_core_dumps`] has succeeded in this process
pub fn core_dumps_disabled() -> bool {
    CORE_DUMPS_DISABLED.load(Ordering::SeqCst)
}

#[cfg(unix)]
mod platform {
    use std::io;

    pub fn disable_core_dumps_impl() -> io::Result<()> {
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit only reads the struct we pass by reference
        let result = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(unix))]
mod platform {
    use std::io;

    pub fn disable_core_dumps_impl() -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "core dump prevention not supported on this platform",
        ))
    }
}
