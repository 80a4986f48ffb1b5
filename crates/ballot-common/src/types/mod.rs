//! Core ballot types

pub mod candidate;
pub mod identity;
pub mod phase;
