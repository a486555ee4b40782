//! Process-wide tracing setup for storefront hosts.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize tracing with the `info` default filter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    self::tracing::init_with_default("info");
}

pub use self::tracing::init_with_default;
