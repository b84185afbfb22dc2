//! Command-line surface

mod cli;

pub use cli::*;
