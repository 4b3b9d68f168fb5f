// POSIX named semaphore provider
// reason: libc for sem_open/sem_close/sem_unlink, nix for errno decoding
use nix::errno::Errno;
use std::collections::HashMap;
use std::ffi::CString;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use mpgate_core::port::semaphore_provider::{
    SemaphoreError, SemaphoreHandle, SemaphoreProvider, SemaphoreSpec,
};

/// Permission bits for probe semaphores (owner read/write)
const SEMAPHORE_MODE: libc::c_uint = 0o600;

/// Open semaphore owned by the provider
struct RawSemaphore {
    sem: *mut libc::sem_t,
    name: CString,
    unlinked: bool,
}

// SAFETY: the pointer is only used through sem_close/sem_unlink, which are
// thread-safe, and every access happens under the provider's mutex.
unsafe impl Send for RawSemaphore {}

impl RawSemaphore {
    fn close(self) -> Result<(), SemaphoreError> {
        // SAFETY: `sem` came from a successful sem_open and is closed once
        let closed = unsafe { libc::sem_close(self.sem) };
        let close_result = if closed == -1 {
            Err(os_error(Errno::last()))
        } else {
            Ok(())
        };

        let unlink_result = if self.unlinked {
            Ok(())
        } else {
            unlink(&self.name)
        };
        first_error(close_result, unlink_result)
    }
}

/// Report the close failure ahead of the unlink failure
fn first_error(
    close_result: Result<(), SemaphoreError>,
    unlink_result: Result<(), SemaphoreError>,
) -> Result<(), SemaphoreError> {
    match (close_result, unlink_result) {
        (Err(close_err), Err(unlink_err)) => {
            warn!(error = %unlink_err, "Failed to unlink semaphore after close error");
            Err(close_err)
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}

/// Named semaphore provider backed by `sem_open`
///
/// Keeps every semaphore it created until `release`; anything still open
/// when the provider is dropped gets closed.
pub struct PosixSemaphoreProvider {
    open: Mutex<HashMap<u64, RawSemaphore>>,
    next_token: AtomicU64,
}

impl PosixSemaphoreProvider {
    /// Create a new provider
    ///
    /// # Example
    /// ```ignore
    /// let provider = PosixSemaphoreProvider::new();
    /// ```
    pub fn new() -> Self {
        Self {
            open: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Number of semaphores created but not yet released
    pub fn open_handles(&self) -> usize {
        self.lock_open().len()
    }

    fn lock_open(&self) -> MutexGuard<'_, HashMap<u64, RawSemaphore>> {
        self.open.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for PosixSemaphoreProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SemaphoreProvider for PosixSemaphoreProvider {
    fn create(
        &self,
        name: &str,
        spec: &SemaphoreSpec,
    ) -> Result<SemaphoreHandle, SemaphoreError> {
        let c_name = CString::new(name).map_err(|_| SemaphoreError::Os {
            code: libc::EINVAL,
            message: format!("semaphore name contains a NUL byte: {:?}", name),
        })?;

        // SAFETY: c_name is a valid NUL-terminated string; the variadic
        // arguments are the mode and initial value sem_open expects with O_CREAT
        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                SEMAPHORE_MODE,
                spec.initial_value as libc::c_uint,
            )
        };

        if sem == libc::SEM_FAILED {
            return Err(classify(Errno::last(), name));
        }

        let mut raw = RawSemaphore {
            sem,
            name: c_name,
            unlinked: false,
        };

        // Drop the name right away so nothing leaks if the process dies
        if spec.unlink_on_release {
            if let Err(e) = unlink(&raw.name) {
                raw.unlinked = true;
                if let Err(close_err) = raw.close() {
                    warn!(name = %name, error = %close_err, "Failed to close semaphore after unlink error");
                }
                return Err(e);
            }
            raw.unlinked = true;
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.lock_open().insert(token, raw);

        debug!(name = %name, token = token, "Named semaphore created");
        Ok(SemaphoreHandle::new(name, token))
    }

    fn release(&self, handle: SemaphoreHandle) -> Result<(), SemaphoreError> {
        let raw = self
            .lock_open()
            .remove(&handle.token())
            .ok_or_else(|| SemaphoreError::Os {
                code: libc::EBADF,
                message: format!("unknown semaphore handle: {}", handle.name()),
            })?;

        raw.close()?;
        debug!(name = %handle.name(), "Named semaphore released");
        Ok(())
    }
}

impl Drop for PosixSemaphoreProvider {
    fn drop(&mut self) {
        let open = std::mem::take(&mut *self.lock_open());
        for (token, raw) in open {
            if let Err(e) = raw.close() {
                warn!(token = token, error = %e, "Failed to close leaked semaphore");
            }
        }
    }
}

fn unlink(name: &CString) -> Result<(), SemaphoreError> {
    // SAFETY: name is a valid NUL-terminated string
    if unsafe { libc::sem_unlink(name.as_ptr()) } == -1 {
        return Err(os_error(Errno::last()));
    }
    Ok(())
}

/// Map a sem_open failure onto the probe's error kinds
fn classify(errno: Errno, name: &str) -> SemaphoreError {
    match errno {
        Errno::EEXIST => SemaphoreError::NameCollision(name.to_string()),
        Errno::EACCES | Errno::EPERM => {
            SemaphoreError::PermissionDenied(format!("{}: {}", name, errno.desc()))
        }
        Errno::ENOSYS | Errno::ENOTSUP => SemaphoreError::Unavailable(errno.desc().to_string()),
        other => os_error(other),
    }
}

fn os_error(errno: Errno) -> SemaphoreError {
    SemaphoreError::Os {
        code: errno as i32,
        message: errno.desc().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("/mpgate-test-{}-{}", std::process::id(), tag)
    }

    #[test]
    fn test_classify_errno() {
        assert!(matches!(
            classify(Errno::EEXIST, "/x"),
            SemaphoreError::NameCollision(_)
        ));
        assert!(matches!(
            classify(Errno::EACCES, "/x"),
            SemaphoreError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify(Errno::EPERM, "/x"),
            SemaphoreError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify(Errno::ENOSYS, "/x"),
            SemaphoreError::Unavailable(_)
        ));
        assert!(matches!(
            classify(Errno::ENOTSUP, "/x"),
            SemaphoreError::Unavailable(_)
        ));
        assert!(matches!(
            classify(Errno::ENOSPC, "/x"),
            SemaphoreError::Os { code, .. } if code == libc::ENOSPC
        ));
    }

    #[test]
    fn test_close_error_wins_over_unlink_error() {
        let close_err = os_error(Errno::EINVAL);
        let unlink_err = os_error(Errno::ENOENT);

        assert_eq!(
            first_error(Err(close_err.clone()), Err(unlink_err.clone())),
            Err(close_err.clone())
        );
        assert_eq!(first_error(Err(close_err.clone()), Ok(())), Err(close_err));
        assert_eq!(first_error(Ok(()), Err(unlink_err.clone())), Err(unlink_err));
        assert_eq!(first_error(Ok(()), Ok(())), Ok(()));
    }

    #[test]
    fn test_create_and_release() {
        let provider = PosixSemaphoreProvider::new();
        let handle = provider
            .create(&unique_name("basic"), &SemaphoreSpec::default())
            .unwrap();
        assert_eq!(provider.open_handles(), 1);

        provider.release(handle).unwrap();
        assert_eq!(provider.open_handles(), 0);
    }

    #[test]
    fn test_duplicate_name_collides_without_unlink() {
        let provider = PosixSemaphoreProvider::new();
        let name = unique_name("dup");
        let spec = SemaphoreSpec {
            unlink_on_release: false,
            ..Default::default()
        };

        let handle = provider.create(&name, &spec).unwrap();
        let second = provider.create(&name, &spec);
        assert!(matches!(second, Err(SemaphoreError::NameCollision(_))));

        // release unlinks, so the name is free again
        provider.release(handle).unwrap();
        let again = provider.create(&name, &spec).unwrap();
        provider.release(again).unwrap();
    }

    #[test]
    fn test_unlinked_name_is_immediately_reusable() {
        let provider = PosixSemaphoreProvider::new();
        let name = unique_name("unlink");
        let spec = SemaphoreSpec::default();

        let first = provider.create(&name, &spec).unwrap();
        let second = provider.create(&name, &spec).unwrap();
        assert_eq!(provider.open_handles(), 2);

        provider.release(first).unwrap();
        provider.release(second).unwrap();
        assert_eq!(provider.open_handles(), 0);
    }

    #[test]
    fn test_nul_in_name_is_os_error() {
        let provider = PosixSemaphoreProvider::new();
        let result = provider.create("/bad\0name", &SemaphoreSpec::default());
        assert!(matches!(result, Err(SemaphoreError::Os { .. })));
    }

    #[test]
    fn test_unknown_handle_release_fails() {
        let provider = PosixSemaphoreProvider::new();
        let result = provider.release(SemaphoreHandle::new("/nope", 999));
        assert!(matches!(result, Err(SemaphoreError::Os { code, .. }) if code == libc::EBADF));
    }
}
