//! Vector containers.

pub mod compact_vec;
