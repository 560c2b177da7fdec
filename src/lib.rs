// Library module for verity
// Re-exports modules for use in integration tests and the CLI

pub mod config;
pub mod hash;
