// Provider for platforms without named semaphores
use mpgate_core::port::semaphore_provider::{
    SemaphoreError, SemaphoreHandle, SemaphoreProvider, SemaphoreSpec,
};

/// Stand-in provider that fails every operation
///
/// Selected where no native implementation exists, so the prober reaches
/// the same serial verdict a missing OS facility would produce.
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableProvider {
    fn default() -> Self {
        Self::new(format!(
            "named semaphores are not supported on {}",
            std::env::consts::OS
        ))
    }
}

impl SemaphoreProvider for UnavailableProvider {
    fn create(
        &self,
        _name: &str,
        _spec: &SemaphoreSpec,
    ) -> Result<SemaphoreHandle, SemaphoreError> {
        Err(SemaphoreError::Unavailable(self.reason.clone()))
    }

    fn release(&self, _handle: SemaphoreHandle) -> Result<(), SemaphoreError> {
        Err(SemaphoreError::Unavailable(self.reason.clone()))
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_unavailable() {
        let provider = UnavailableProvider::new("stripped runtime");
        assert!(!provider.is_available());

        let err = provider
            .create("/any", &SemaphoreSpec::default())
            .unwrap_err();
        assert_eq!(
            err,
            SemaphoreError::Unavailable("stripped runtime".to_string())
        );
        assert!(provider.release(SemaphoreHandle::new("/any", 1)).is_err());
    }
}
