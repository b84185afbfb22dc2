//! Persistent settings

mod settings;
#[cfg(test)]
mod tests;

pub use settings::*;
