//! Shared helpers

pub mod time;
pub mod vector;

pub use vector::Vec3;
