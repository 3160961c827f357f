//! Command implementations.

pub mod config;
pub mod extract;
pub mod inspect;
