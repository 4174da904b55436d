//! Common test utilities and helpers
//!
//! - Custom assertion macros
//! - The in-process session harness and a failing log backend

#[cfg(feature = "ssr")]
pub mod harness;

// Re-export commonly used utilities
pub use assertions::*;
#[cfg(feature = "ssr")]
pub use harness::*;
