//! Best-effort OS thread priority application.
//!
//! The ladder in [`Priority`] is the authoritative bookkeeping value; this
//! module only pushes it down to the OS when the platform allows. On Linux
//! the tier maps to a nice value applied to the calling thread. Raising
//! priority above the default is usually denied for unprivileged processes;
//! the denial is logged at debug level and otherwise ignored. Other
//! platforms are a no-op.

use crate::priority::Priority;

/// Apply `priority` to the calling thread. Returns true if the OS accepted
/// the change.
#[cfg(target_os = "linux")]
pub(crate) fn set_current_thread_priority(priority: Priority) -> bool {
    let nice = priority.nice_value();
    // SAFETY: gettid has no preconditions and always succeeds for the
    // calling thread.
    let tid = unsafe { libc::syscall(libc::SYS_gettid) } as libc::id_t;
    // SAFETY: PRIO_PROCESS with a tid adjusts only the calling thread; the
    // arguments are plain integers with no pointer aliasing.
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, tid, nice) };
    if rc == 0 {
        tracing::trace!(%priority, nice, "applied thread priority");
        true
    } else {
        let errno = std::io::Error::last_os_error();
        tracing::debug!(%priority, nice, %errno, "thread priority change denied");
        false
    }
}

/// No-op on platforms without a nice-value mapping.
#[cfg(not(target_os = "linux"))]
pub(crate) fn set_current_thread_priority(priority: Priority) -> bool {
    tracing::trace!(%priority, "thread priority not applied on this platform");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demotion_is_accepted_on_linux() {
        // Lowering priority never requires privileges.
        #[cfg(target_os = "linux")]
        assert!(set_current_thread_priority(Priority::Lowest));
        #[cfg(not(target_os = "linux"))]
        assert!(!set_current_thread_priority(Priority::Lowest));
    }
}
