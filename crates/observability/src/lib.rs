//! Tracing/logging setup shared by the dashboard binaries.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide logging with the format from `CONSTRUCARD_LOG_FORMAT`.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
