//! CLI module for `ferraco-wa`.
//!
//! This module provides command-line interface functionality:
//! - Argument parsing
//! - Version display
//!
//! # Usage
//!
//! ```ignore
//! use ferraco_whatsapp::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Version => println!("{}", version_line()),
//!     CliCommand::Help => println!("{}", USAGE),
//!     CliCommand::Run(options) => watch(options).await?,
//! }
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, RunOptions, USAGE};
pub use version::{version_line, VERSION};
