//! Signing keys and tamper-evident signatures for local state.

pub mod keys;
pub mod signing;
