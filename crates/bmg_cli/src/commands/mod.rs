//! CLI command implementations.

pub mod export;
pub mod inspect;
pub mod patch;
pub mod verify;
