//! # Cobalt Engine Core
//!
//! Basic building blocks shared by every Cobalt crate: typed handles, string
//! interning, the structured data tree used for persistence, an ordered
//! callback signal and a background worker pool.

pub mod data;
pub mod handle;
pub mod intern;
pub mod math;
pub mod scene;
pub mod signal;
pub mod worker;

pub use handle::{Handle, HandleAllocator};
pub use intern::{Symbol, SymbolTable};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the crate version.
pub fn init() {
    log::info!("Cobalt Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
