//! License state model, signed envelope, and on-disk store.

pub mod envelope;
pub mod model;
pub mod store;
