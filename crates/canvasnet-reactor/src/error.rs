use crate::event::Descriptor;

/// Errors surfaced by a readiness backend.
///
/// Signal interruption is not an error: `wait` resolves it to zero ready
/// descriptors. Caller bugs (bad descriptor, double registration) panic
/// instead of producing one of these.
#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    /// The backend's kernel object could not be created.
    #[error("failed to open readiness backend: {0}")]
    Open(std::io::Error),

    /// The blocking wait call failed permanently.
    #[error("readiness wait failed: {0}")]
    Wait(std::io::Error),

    /// The network subsystem is down. Distinguished so callers can report it.
    #[error("network subsystem unavailable: {0}")]
    SubsystemUnavailable(std::io::Error),

    /// The kernel refused a registration change (epoll only).
    #[error("failed to update interest for descriptor {fd}: {source}")]
    Register {
        fd: Descriptor,
        source: std::io::Error,
    },

    /// The self-pipe waker could not be created or drained.
    #[error("waker I/O error: {0}")]
    Waker(std::io::Error),

    /// The requested backend is not compiled for this platform.
    #[error("readiness backend `{0}` is not available on this platform")]
    Unsupported(&'static str),
}

impl ReactorError {
    /// Classify an errno from a failed wait call.
    pub(crate) fn from_wait(err: std::io::Error) -> Self {
        #[cfg(unix)]
        if err.raw_os_error() == Some(libc::ENETDOWN) {
            return Self::SubsystemUnavailable(err);
        }
        Self::Wait(err)
    }
}

/// Resolve a failed wait call.
///
/// `EINTR` is retryable and becomes zero ready descriptors. Errors that can
/// only come from a corrupted interest set are caller bugs and panic.
#[cfg(unix)]
pub(crate) fn wait_failure(facility: &str, err: std::io::Error) -> Result<usize> {
    match err.raw_os_error() {
        Some(libc::EINTR) => {
            tracing::trace!(facility, "wait interrupted by signal");
            Ok(0)
        }
        Some(code)
            if code == libc::EBADF
                || code == libc::EINVAL
                || code == libc::EFAULT
                || code == libc::ENOTSOCK =>
        {
            panic!("{facility} rejected the registered interest set: {err}")
        }
        _ => {
            tracing::error!(facility, error = %err, "readiness wait failed");
            Err(ReactorError::from_wait(err))
        }
    }
}

pub type Result<T> = std::result::Result<T, ReactorError>;

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn netdown_is_distinguished() {
        let err = ReactorError::from_wait(std::io::Error::from_raw_os_error(libc::ENETDOWN));
        assert!(matches!(err, ReactorError::SubsystemUnavailable(_)));
    }

    #[test]
    fn interrupted_wait_is_zero_ready() {
        let ready = wait_failure("select", std::io::Error::from_raw_os_error(libc::EINTR));
        assert_eq!(ready.unwrap(), 0);
    }

    #[test]
    #[should_panic(expected = "rejected the registered interest set")]
    fn bad_descriptor_wait_panics() {
        let _ = wait_failure("poll", std::io::Error::from_raw_os_error(libc::EBADF));
    }

    #[test]
    fn other_errno_is_wait_failure() {
        let err = ReactorError::from_wait(std::io::Error::from_raw_os_error(libc::ENOMEM));
        assert!(matches!(err, ReactorError::Wait(_)));
    }
}
