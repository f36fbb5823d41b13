//! Tonegen CLI library.
//!
//! Argument definitions, logging setup and the command implementations used
//! by the `tonegen` binary.

pub mod cli_args;
pub mod commands;
pub mod logging;
