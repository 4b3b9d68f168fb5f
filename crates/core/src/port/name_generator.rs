// Name Generator Port (for deterministic testing)
use rand::Rng;

/// Characters used for random name suffixes
pub const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789_";

/// Length of a random name suffix
pub const SUFFIX_LEN: usize = 8;

/// Source of candidate name suffixes (allows deterministic names in tests)
pub trait NameGenerator: Send + Sync {
    /// Produce the next suffix; successive calls should rarely repeat
    fn next_suffix(&self) -> String;
}

/// Random suffix generator (production)
pub struct RandomNameGenerator;

impl NameGenerator for RandomNameGenerator {
    fn next_suffix(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect()
    }
}

/// Build a semaphore name: `<prefix><pid>-<suffix>`
///
/// # Example
/// ```text
/// candidate_name("/joblib-", 4242, "k3_z9abq") == "/joblib-4242-k3_z9abq"
/// ```
pub fn candidate_name(prefix: &str, pid: u32, suffix: &str) -> String {
    format!("{}{}-{}", prefix, pid, suffix)
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Yields `s0`, `s1`, `s2`, ...
    #[derive(Default)]
    pub struct SequentialNameGenerator {
        counter: AtomicU64,
    }

    impl SequentialNameGenerator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn generated(&self) -> u64 {
            self.counter.load(Ordering::SeqCst)
        }
    }

    impl NameGenerator for SequentialNameGenerator {
        fn next_suffix(&self) -> String {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            format!("s{}", n)
        }
    }
}
