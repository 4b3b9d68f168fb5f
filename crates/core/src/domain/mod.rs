// Domain Layer - Verdicts and probe failures

pub mod error;
pub mod verdict;

// Re-exports
pub use error::ProbeError;
pub use verdict::{FallbackReason, ProbeReport, Verdict};
