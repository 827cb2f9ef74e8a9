//! Input channels.

pub mod cli;

pub use cli::{CliChannel, Command};
