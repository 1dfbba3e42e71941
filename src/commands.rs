//! Subcommands of the `jpq` binary.
pub mod generate;
