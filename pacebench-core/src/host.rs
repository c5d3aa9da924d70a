//! Host information
//!
//! Details about the runtime every measurement was taken on. Detection is
//! lazy and cached; the cache is an explicit object so tests and embedders
//! can share, replace or invalidate it.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Description of the executing runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Runtime family
    pub runtime: String,
    /// Toolchain version the harness was built against
    pub runtime_version: String,
    /// Operating system
    pub os: String,
    /// CPU architecture
    pub arch: String,
}

impl HostInfo {
    /// Detect the current host
    pub fn detect() -> Self {
        let runtime_version = option_env!("CARGO_PKG_RUST_VERSION")
            .filter(|v| !v.is_empty())
            .map(|v| format!(">={v}"))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            runtime: "rust".to_string(),
            runtime_version,
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Lazily initialized, invalidatable [`HostInfo`]
#[derive(Debug)]
pub struct HostInfoCache {
    detect: fn() -> HostInfo,
    cached: Mutex<Option<Arc<HostInfo>>>,
}

impl HostInfoCache {
    /// Cache backed by a custom detector
    pub fn new(detect: fn() -> HostInfo) -> Self {
        Self {
            detect,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached info, detecting it on first use
    pub fn get(&self) -> Arc<HostInfo> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        cached
            .get_or_insert_with(|| {
                tracing::debug!("detecting host info");
                Arc::new((self.detect)())
            })
            .clone()
    }

    /// Whether detection has already happened
    pub fn is_initialized(&self) -> bool {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Forget the cached info; the next `get` detects again
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for HostInfoCache {
    fn default() -> Self {
        Self::new(HostInfo::detect)
    }
}
