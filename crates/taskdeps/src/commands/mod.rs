//! Command implementations that do more than call a single service method.

pub mod benchmark;
pub mod init;
