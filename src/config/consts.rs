/// Default number of attempts for each sink call (first try included)
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
/// Upper bound on configured attempts
pub const MAX_RETRY_ATTEMPTS: u32 = 10;
/// Default pause between attempts, in milliseconds
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;
/// Upper bound on the configured pause (30 seconds)
pub const MAX_RETRY_BACKOFF_MS: u64 = 30_000;
