//! Core business logic module

pub mod error;
#[cfg(test)]
pub(crate) mod log_capture;
pub mod machine;
pub mod queue;
pub mod types;
