// Port Layer - Interfaces for external dependencies

pub mod name_generator; // For deterministic testing
pub mod semaphore_provider;

// Re-exports
pub use name_generator::{candidate_name, NameGenerator, RandomNameGenerator};
pub use semaphore_provider::{
    SemaphoreError, SemaphoreHandle, SemaphoreProvider, SemaphoreSpec,
};
