//! Internal utilities.

pub mod timestamp;
