//! Layered configuration of the `pack` command: built-in defaults, then the config file,
//! then `-S key=value` overrides, then dedicated command-line flags.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
