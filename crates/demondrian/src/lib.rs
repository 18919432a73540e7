//! Configuration for the demondrian command-line tools.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;

pub use config::{CONFIG_FILE_NAME, ConfigError, RulesSpec, SolverConfig};
