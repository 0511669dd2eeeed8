use std::io;

use sandbox::ResourceLimits;

/// Largest file the child may create. The guest has no preopened
/// directories, so this only guards runtime-level spooling on the host side.
const FILE_SIZE_LIMIT_BYTES: u64 = 16 * 1024 * 1024;
/// Open file descriptor ceiling.
const OPEN_FILES_LIMIT: u64 = 64;
/// Process/thread ceiling.
const PROCESS_LIMIT: u64 = 64;

/// Apply best-effort resource limits; runs in the child between `fork` and
/// `exec`, so only async-signal-safe calls are allowed.
///
/// Each limit is applied independently and a rejected `setrlimit` is
/// skipped, not fatal: a platform without a given primitive runs the child
/// without that limit. Always returns `Ok` so a spawn never fails here.
pub(crate) fn apply(limits: &ResourceLimits) -> io::Result<()> {
    let pairs = [
        (libc::RLIMIT_CPU, limits.cpu_time_secs),
        (libc::RLIMIT_AS, limits.memory_mb.saturating_mul(1024 * 1024)),
        (libc::RLIMIT_FSIZE, FILE_SIZE_LIMIT_BYTES),
        (libc::RLIMIT_NOFILE, OPEN_FILES_LIMIT),
        (libc::RLIMIT_NPROC, PROCESS_LIMIT),
    ];

    for (resource, value) in pairs {
        let rlim = libc::rlimit {
            rlim_cur: value as libc::rlim_t,
            rlim_max: value as libc::rlim_t,
        };
        // SAFETY: setrlimit is async-signal-safe and rlim outlives the call.
        unsafe {
            let _ = libc::setrlimit(resource, &rlim);
        }
    }

    Ok(())
}
