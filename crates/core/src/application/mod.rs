// Application Layer - Probe and backend selection

pub mod backend;
pub mod constants;
pub mod prober;

// Re-exports
pub use backend::{BackendSelector, ExecutionBackend, ExhaustionPolicy};
pub use prober::CapabilityProber;
