//! Integration tests module
//!
//! This module organizes all integration tests for the spdif-bridge application.

// Import individual test modules
pub mod audio_test;
pub mod config_test;
pub mod supervisor_test;
