//! Shared helpers: hashing and path/specifier utilities.

pub mod hash;
pub mod path;
