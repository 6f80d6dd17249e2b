//! Wire types shared between the transport console crates.

pub mod domain;
pub mod error;
pub mod protocol;
