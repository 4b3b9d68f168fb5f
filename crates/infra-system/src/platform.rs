// Platform provider selection
use mpgate_core::port::SemaphoreProvider;
use std::sync::Arc;
use tracing::debug;

/// Pick the named-semaphore provider for the current platform
#[cfg(unix)]
pub fn default_provider() -> Arc<dyn SemaphoreProvider> {
    debug!(os = std::env::consts::OS, "Using POSIX semaphore provider");
    Arc::new(crate::PosixSemaphoreProvider::new())
}

/// Pick the named-semaphore provider for the current platform
#[cfg(not(unix))]
pub fn default_provider() -> Arc<dyn SemaphoreProvider> {
    debug!(os = std::env::consts::OS, "No native semaphore provider");
    Arc::new(crate::UnavailableProvider::default())
}
