// Probe constants (No magic values)

/// Environment toggle for multiprocessing; "0" forces serial execution
pub const OVERRIDE_ENV_VAR: &str = "JOBLIB_MULTIPROCESSING";

/// Optional override of the name collision budget
pub const MAX_ATTEMPTS_ENV_VAR: &str = "MPGATE_MAX_ATTEMPTS";

/// Prefix of every probe semaphore name (leading slash required by POSIX)
pub const DEFAULT_NAME_PREFIX: &str = "/joblib-";

/// Candidate names tried before giving up on collisions
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
