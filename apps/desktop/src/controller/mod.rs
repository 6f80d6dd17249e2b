//! Controller layer: interactive commands and their dispatch onto the console.

pub mod commands;
pub mod orchestration;
