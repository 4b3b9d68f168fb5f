// Capability prober: can this host create a named semaphore?
use crate::config::ProbeConfig;
use crate::domain::error::Result;
use crate::domain::{FallbackReason, ProbeError, ProbeReport, Verdict};
use crate::port::{
    candidate_name, NameGenerator, RandomNameGenerator, SemaphoreError, SemaphoreProvider,
    SemaphoreSpec,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the named-semaphore liveness test
///
/// Creates one semaphore under a unique name and destroys it right away.
/// Name collisions are retried up to `max_attempts` times; every other
/// failure degrades to `Verdict::Serial`.
pub struct CapabilityProber {
    config: ProbeConfig,
    provider: Arc<dyn SemaphoreProvider>,
    name_generator: Arc<dyn NameGenerator>,
    pid: u32,
}

impl CapabilityProber {
    /// Create a prober for the current process with random name suffixes
    ///
    /// # Example
    /// ```text
    /// let prober = CapabilityProber::new(ProbeConfig::from_env()?, default_provider());
    /// if prober.probe()?.use_serial() {
    ///     println!("falling back to serial execution");
    /// }
    /// ```
    pub fn new(config: ProbeConfig, provider: Arc<dyn SemaphoreProvider>) -> Self {
        Self {
            config,
            provider,
            name_generator: Arc::new(RandomNameGenerator),
            pid: std::process::id(),
        }
    }

    pub fn with_name_generator(mut self, name_generator: Arc<dyn NameGenerator>) -> Self {
        self.name_generator = name_generator;
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// Run the probe and return only the verdict
    ///
    /// # Errors
    /// - ProbeError::Exhausted if every candidate name collided
    pub fn probe(&self) -> Result<Verdict> {
        self.probe_report().map(|report| report.verdict)
    }

    /// Run the probe and return the verdict with diagnostics
    pub fn probe_report(&self) -> Result<ProbeReport> {
        if !self.config.override_enabled {
            info!(reason = %FallbackReason::OverrideDisabled, "Multiprocessing disabled by override");
            return Ok(ProbeReport::serial(FallbackReason::OverrideDisabled, 0));
        }

        if !self.provider.is_available() {
            warn!(
                reason = %FallbackReason::CapabilityUnavailable,
                "Named semaphores not supported on this platform"
            );
            return Ok(ProbeReport::serial(FallbackReason::CapabilityUnavailable, 0));
        }

        let spec = SemaphoreSpec::default();
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_name = String::new();

        for attempt in 1..=max_attempts {
            let name = candidate_name(
                &self.config.name_prefix,
                self.pid,
                &self.name_generator.next_suffix(),
            );

            match self.provider.create(&name, &spec) {
                Ok(handle) => {
                    if let Err(e) = self.provider.release(handle) {
                        // Creation already proved the capability
                        warn!(name = %name, error = %e, "Failed to release probe semaphore");
                    }
                    info!(attempt = attempt, "Named semaphore probe succeeded");
                    return Ok(ProbeReport::parallel(attempt));
                }
                Err(e) if e.is_retriable() => {
                    debug!(name = %name, attempt = attempt, "Semaphore name taken, retrying");
                    last_name = name;
                }
                Err(e) => {
                    let reason = fallback_reason(&e);
                    warn!(
                        name = %name,
                        error = %e,
                        reason = %reason,
                        "Named semaphore probe failed, falling back to serial"
                    );
                    return Ok(ProbeReport::serial(reason, attempt));
                }
            }
        }

        warn!(
            attempts = max_attempts,
            last_name = %last_name,
            "Exhausted semaphore names"
        );
        Err(ProbeError::Exhausted {
            attempts: max_attempts,
            last_name,
        })
    }
}

fn fallback_reason(err: &SemaphoreError) -> FallbackReason {
    match err {
        SemaphoreError::Unavailable(_) => FallbackReason::CapabilityUnavailable,
        SemaphoreError::PermissionDenied(_) => FallbackReason::PermissionDenied,
        SemaphoreError::NameCollision(_) | SemaphoreError::Os { .. } => FallbackReason::OsError,
    }
}
