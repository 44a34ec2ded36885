//! One-shot / persistent flag pair for host bookkeeping, so a host can
//! poll load progress without the core needing an async runtime.

/// Kept across `poll()` calls.
#[derive(Default, Clone, Copy, Debug)]
pub struct PersistentFlags {
    /// True when column information is available.
    pub column_info_present: bool,
    /// True when at least one row is available.
    pub is_loaded: bool,
    /// True when the last load attempt produced an error.
    pub had_errors: bool,
}

/// Reset to all-`false` after every `poll()` call.
#[derive(Default, Clone, Copy, Debug)]
pub struct OneShotFlags {
    /// Set once column names/types were (re)established.
    pub column_info_updated: bool,
    /// Set once `load`/`clear` replaced the whole row set.
    pub reloaded: bool,
    /// Set once `clear()` emptied the row set.
    pub cleared: bool,
}
