//! # IO Module
//!
//! Interface layer between the outside world and the domain services. The
//! only surface is the command line: records go in and come out as JSON.

pub mod cli;

pub use cli::{run_command, Cli};
