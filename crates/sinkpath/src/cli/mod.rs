//! Subcommands of the `sinkpath` binary.

pub mod cluster;
pub mod context;
pub mod error;
pub mod resolve;
pub mod save;
