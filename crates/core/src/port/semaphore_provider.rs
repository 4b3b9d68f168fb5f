// Named semaphore port
// Abstraction over the OS facility the probe exercises

use thiserror::Error;

/// Parameters for a named semaphore creation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaphoreSpec {
    pub initial_value: u32,
    pub max_value: u32,
    /// Remove the OS-level name no later than release
    pub unlink_on_release: bool,
}

impl Default for SemaphoreSpec {
    fn default() -> Self {
        Self {
            initial_value: 0,
            max_value: 1,
            unlink_on_release: true,
        }
    }
}

/// Opaque handle to a semaphore created by a provider
///
/// Must be passed back to the same provider's `release`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SemaphoreHandle {
    name: String,
    token: u64,
}

impl SemaphoreHandle {
    pub fn new(name: impl Into<String>, token: u64) -> Self {
        Self {
            name: name.into(),
            token,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Semaphore creation/release failures, classified for the retry loop
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemaphoreError {
    /// The name is already taken; retry with another name
    #[error("semaphore name already exists: {0}")]
    NameCollision(String),

    /// The platform has no named-semaphore support
    #[error("named semaphores unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("OS error {code}: {message}")]
    Os { code: i32, message: String },
}

impl SemaphoreError {
    /// Only name collisions are worth another attempt
    pub fn is_retriable(&self) -> bool {
        matches!(self, SemaphoreError::NameCollision(_))
    }
}

/// Named semaphore provider
///
/// Implementations:
/// - PosixSemaphoreProvider: `sem_open` / `sem_close` / `sem_unlink`
/// - UnavailableProvider: platforms without the facility
pub trait SemaphoreProvider: Send + Sync {
    /// Create a new named semaphore; fails if the name already exists
    ///
    /// # Errors
    /// - SemaphoreError::NameCollision if `name` is taken
    /// - SemaphoreError::Unavailable if the facility is missing
    /// - SemaphoreError::PermissionDenied / Os for any other refusal
    fn create(&self, name: &str, spec: &SemaphoreSpec)
        -> Result<SemaphoreHandle, SemaphoreError>;

    /// Destroy a semaphore previously returned by `create`
    fn release(&self, handle: SemaphoreHandle) -> Result<(), SemaphoreError>;

    /// Cheap capability check performed before any creation attempt
    fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    /// Scripted result of a single `create` call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MockOutcome {
        Succeed,
        Collide,
        Deny,
        Unavailable,
        OsError(i32),
    }

    #[derive(Default)]
    struct MockState {
        script: VecDeque<MockOutcome>,
        create_calls: usize,
        release_calls: usize,
        next_token: u64,
        live: HashSet<u64>,
        names: Vec<String>,
    }

    /// Mock SemaphoreProvider driven by a script of outcomes
    ///
    /// Once the script runs out, `fallback` is used for every further call.
    pub struct MockSemaphoreProvider {
        state: Mutex<MockState>,
        fallback: MockOutcome,
        available: bool,
        fail_release: bool,
    }

    impl MockSemaphoreProvider {
        pub fn new(script: Vec<MockOutcome>, fallback: MockOutcome) -> Self {
            Self {
                state: Mutex::new(MockState {
                    script: script.into(),
                    ..Default::default()
                }),
                fallback,
                available: true,
                fail_release: false,
            }
        }

        pub fn new_success() -> Self {
            Self::new(Vec::new(), MockOutcome::Succeed)
        }

        /// Collide `n` times, then succeed
        pub fn new_colliding(n: usize) -> Self {
            Self::new(vec![MockOutcome::Collide; n], MockOutcome::Succeed)
        }

        pub fn new_always(outcome: MockOutcome) -> Self {
            Self::new(Vec::new(), outcome)
        }

        /// Provider that reports itself unavailable up front
        pub fn new_unavailable() -> Self {
            Self {
                available: false,
                ..Self::new_always(MockOutcome::Unavailable)
            }
        }

        /// Make every `release` call fail (the handle is still dropped)
        pub fn with_failing_release(mut self) -> Self {
            self.fail_release = true;
            self
        }

        pub fn create_calls(&self) -> usize {
            self.state.lock().unwrap().create_calls
        }

        pub fn release_calls(&self) -> usize {
            self.state.lock().unwrap().release_calls
        }

        /// Handles created but not yet released
        pub fn live_handles(&self) -> usize {
            self.state.lock().unwrap().live.len()
        }

        /// Every name passed to `create`, in call order
        pub fn attempted_names(&self) -> Vec<String> {
            self.state.lock().unwrap().names.clone()
        }
    }

    impl SemaphoreProvider for MockSemaphoreProvider {
        fn create(
            &self,
            name: &str,
            _spec: &SemaphoreSpec,
        ) -> Result<SemaphoreHandle, SemaphoreError> {
            let mut state = self.state.lock().unwrap();
            state.create_calls += 1;
            state.names.push(name.to_string());

            let outcome = state
                .script
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());

            match outcome {
                MockOutcome::Succeed => {
                    state.next_token += 1;
                    let token = state.next_token;
                    state.live.insert(token);
                    Ok(SemaphoreHandle::new(name, token))
                }
                MockOutcome::Collide => Err(SemaphoreError::NameCollision(name.to_string())),
                MockOutcome::Deny => Err(SemaphoreError::PermissionDenied(name.to_string())),
                MockOutcome::Unavailable => {
                    Err(SemaphoreError::Unavailable("mock provider".to_string()))
                }
                MockOutcome::OsError(code) => Err(SemaphoreError::Os {
                    code,
                    message: "mock failure".to_string(),
                }),
            }
        }

        fn release(&self, handle: SemaphoreHandle) -> Result<(), SemaphoreError> {
            let mut state = self.state.lock().unwrap();
            state.release_calls += 1;
            state.live.remove(&handle.token());

            if self.fail_release {
                return Err(SemaphoreError::Os {
                    code: 9,
                    message: "mock release failure".to_string(),
                });
            }
            Ok(())
        }

        fn is_available(&self) -> bool {
            self.available
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::*;
    use super::*;

    #[test]
    fn test_default_spec() {
        let spec = SemaphoreSpec::default();
        assert_eq!(spec.initial_value, 0);
        assert_eq!(spec.max_value, 1);
        assert!(spec.unlink_on_release);
    }

    #[test]
    fn test_only_collision_is_retriable() {
        assert!(SemaphoreError::NameCollision("/x".to_string()).is_retriable());
        assert!(!SemaphoreError::PermissionDenied("/x".to_string()).is_retriable());
        assert!(!SemaphoreError::Unavailable("none".to_string()).is_retriable());
        assert!(!SemaphoreError::Os {
            code: 5,
            message: "io".to_string()
        }
        .is_retriable());
    }

    #[test]
    fn test_mock_follows_script_then_fallback() {
        let provider = MockSemaphoreProvider::new(
            vec![MockOutcome::Collide, MockOutcome::Deny],
            MockOutcome::Succeed,
        );
        let spec = SemaphoreSpec::default();

        assert!(matches!(
            provider.create("/a", &spec),
            Err(SemaphoreError::NameCollision(_))
        ));
        assert!(matches!(
            provider.create("/b", &spec),
            Err(SemaphoreError::PermissionDenied(_))
        ));
        let handle = provider.create("/c", &spec).unwrap();
        assert_eq!(handle.name(), "/c");
        assert_eq!(provider.live_handles(), 1);

        provider.release(handle).unwrap();
        assert_eq!(provider.live_handles(), 0);
        assert_eq!(provider.create_calls(), 3);
        assert_eq!(provider.release_calls(), 1);
        assert_eq!(provider.attempted_names(), vec!["/a", "/b", "/c"]);
    }
}
