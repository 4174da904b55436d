//! Property-based tests

pub mod codec_proptest;
#[cfg(feature = "ssr")]
pub mod cursor_proptest;
