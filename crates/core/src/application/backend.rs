// Execution backend selection driven by the capability probe
use crate::application::prober::CapabilityProber;
use crate::domain::error::Result;
use crate::domain::{ProbeError, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Where parallel work should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionBackend {
    /// Everything in the calling process
    Serial,
    /// Worker processes synchronized through named semaphores
    MultiProcess,
}

impl ExecutionBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionBackend::Serial => "serial",
            ExecutionBackend::MultiProcess => "multiprocess",
        }
    }
}

impl fmt::Display for ExecutionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Verdict> for ExecutionBackend {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Serial => ExecutionBackend::Serial,
            Verdict::Parallel => ExecutionBackend::MultiProcess,
        }
    }
}

/// What to do when the probe runs out of semaphore names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Surface `ProbeError::Exhausted` to the caller
    #[default]
    Abort,
    /// Log the failure and run serially
    AssumeSerial,
}

impl FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "abort" => Ok(ExhaustionPolicy::Abort),
            "serial" => Ok(ExhaustionPolicy::AssumeSerial),
            other => Err(format!(
                "unknown exhaustion policy {:?} (expected \"abort\" or \"serial\")",
                other
            )),
        }
    }
}

/// Picks the execution backend once per process lifetime
///
/// The first `select` runs the probe; later calls return the cached outcome.
pub struct BackendSelector {
    prober: CapabilityProber,
    policy: ExhaustionPolicy,
    decision: OnceLock<Result<ExecutionBackend>>,
}

impl BackendSelector {
    pub fn new(prober: CapabilityProber, policy: ExhaustionPolicy) -> Self {
        Self {
            prober,
            policy,
            decision: OnceLock::new(),
        }
    }

    /// Choose the backend, probing on first use
    ///
    /// # Errors
    /// - ProbeError::Exhausted under `ExhaustionPolicy::Abort`
    pub fn select(&self) -> Result<ExecutionBackend> {
        self.decision.get_or_init(|| self.decide()).clone()
    }

    /// Whether `select` has already run the probe
    pub fn is_decided(&self) -> bool {
        self.decision.get().is_some()
    }

    fn decide(&self) -> Result<ExecutionBackend> {
        match self.prober.probe() {
            Ok(verdict) => {
                let backend = ExecutionBackend::from(verdict);
                info!(backend = %backend, "Execution backend selected");
                Ok(backend)
            }
            Err(e @ ProbeError::Exhausted { .. }) => match self.policy {
                ExhaustionPolicy::Abort => {
                    error!(error = %e, "Capability probe exhausted");
                    Err(e)
                }
                ExhaustionPolicy::AssumeSerial => {
                    warn!(error = %e, "Capability probe exhausted, assuming serial execution");
                    Ok(ExecutionBackend::Serial)
                }
            },
        }
    }
}
