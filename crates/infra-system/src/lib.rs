// mpgate Infrastructure - System Adapters
// Implements: SemaphoreProvider

pub mod platform;
#[cfg(unix)]
pub mod posix_semaphore;
pub mod unavailable;

pub use platform::default_provider;
#[cfg(unix)]
pub use posix_semaphore::PosixSemaphoreProvider;
pub use unavailable::UnavailableProvider;
