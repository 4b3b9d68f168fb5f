// Probe verdict and report types
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a capability probe
///
/// `Serial` means named semaphores are unusable and the caller must run work
/// in a single process. `Parallel` means a semaphore was created and released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Serial,
    Parallel,
}

impl Verdict {
    /// Boolean form of the verdict: true = fall back to serial execution
    pub fn use_serial(self) -> bool {
        matches!(self, Verdict::Serial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Serial => "serial",
            Verdict::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a probe settled on `Verdict::Serial`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Operator disabled multiprocessing through the override toggle
    OverrideDisabled,
    /// Platform has no named-semaphore facility
    CapabilityUnavailable,
    /// Semaphore creation was refused by the OS
    PermissionDenied,
    /// Any other OS failure during creation
    OsError,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::OverrideDisabled => "override_disabled",
            FallbackReason::CapabilityUnavailable => "capability_unavailable",
            FallbackReason::PermissionDenied => "permission_denied",
            FallbackReason::OsError => "os_error",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus the diagnostics gathered while reaching it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub verdict: Verdict,
    /// Set only when `verdict` is `Serial`
    pub reason: Option<FallbackReason>,
    /// Number of creation attempts made (0 when no semaphore was tried)
    pub attempts: u32,
}

impl ProbeReport {
    pub fn parallel(attempts: u32) -> Self {
        Self {
            verdict: Verdict::Parallel,
            reason: None,
            attempts,
        }
    }

    pub fn serial(reason: FallbackReason, attempts: u32) -> Self {
        Self {
            verdict: Verdict::Serial,
            reason: Some(reason),
            attempts,
        }
    }

    /// Single-line JSON form, as printed by `mpgate probe --json`
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
