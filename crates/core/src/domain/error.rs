// Probe Error Types

use thiserror::Error;

/// Failures that escape the boolean verdict
///
/// Every recoverable condition (override, missing capability, OS refusal)
/// degrades to `Verdict::Serial`. Only a fully collided name budget escalates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("cannot find name for semaphore after {attempts} attempts (last tried: {last_name})")]
    Exhausted { attempts: u32, last_name: String },
}

pub type Result<T> = std::result::Result<T, ProbeError>;
