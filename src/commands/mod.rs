//! CLI command implementations.

pub mod combine;
pub mod fetch;
pub mod init;
pub mod merge;
pub mod run;
