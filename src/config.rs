//! Runtime configuration
//!
//! The only knobs are the execution budget and the shape of the global object
//! a realm installs.

/// Which global bindings a new realm installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlobalObjectVariant {
    /// Every constructor, namespace object and global function.
    #[default]
    Standard,
    /// Only `globalThis`, `undefined`, `NaN` and `Infinity`. The intrinsics
    /// still exist and are reachable through literals and prototypes.
    Bare,
}

/// Options for creating a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RealmOptions {
    pub globals: GlobalObjectVariant,
    /// Make the global object an immutable-prototype exotic object.
    pub immutable_global_prototype: bool,
}

impl RealmOptions {
    pub fn with_globals(mut self, globals: GlobalObjectVariant) -> Self {
        self.globals = globals;
        self
    }

    pub fn with_immutable_global_prototype(mut self, immutable: bool) -> Self {
        self.immutable_global_prototype = immutable;
        self
    }
}

/// Default execution timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Default number of evaluation steps between clock reads.
pub const DEFAULT_CHECK_TIME_EVERY: u32 = 1024;

/// Configuration for a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Wall-clock budget per evaluation; `0` disables the timeout.
    pub timeout_ms: u64,
    /// Maximum number of evaluation steps per evaluation.
    pub step_limit: Option<u64>,
    /// Steps between two reads of the clock.
    pub check_time_every: u32,
    /// Options of the initial realm.
    pub realm: RealmOptions,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            step_limit: None,
            check_time_every: DEFAULT_CHECK_TIME_EVERY,
            realm: RealmOptions::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_step_limit(mut self, step_limit: Option<u64>) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_check_time_every(mut self, check_time_every: u32) -> Self {
        self.check_time_every = check_time_every.max(1);
        self
    }

    pub fn with_realm(mut self, realm: RealmOptions) -> Self {
        self.realm = realm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.timeout_ms, 3000);
        assert_eq!(config.step_limit, None);
        assert_eq!(config.realm.globals, GlobalObjectVariant::Standard);
        assert!(!config.realm.immutable_global_prototype);
    }

    #[test]
    fn check_interval_is_never_zero() {
        let config = RuntimeConfig::default().with_check_time_every(0);
        assert_eq!(config.check_time_every, 1);
    }
}
