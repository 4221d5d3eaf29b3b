//! Utilities

// Modules
pub mod logger;
