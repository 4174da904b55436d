//! Integration tests
//!
//! End-to-end flows through room sessions, the HTTP routes and the log
//! backends.

pub mod log_test;
pub mod session_test;
