//! # stowage-core
//!
//! Core types and utilities shared across all stowage crates.
//!
//! This crate provides:
//! - Credentials and FileRecord types for store operations
//! - StowageError enum for unified error handling
//! - SHA-1 content digest helpers for upload integrity headers
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Credentials, FileRecord)
//! - `error`: Error types and result aliases
//! - `hash`: Content digest computation

pub mod error;
pub mod hash;
pub mod types;

// Re-export commonly used types
pub use error::{StowageError, StowageResult};
pub use types::{Credentials, FileRecord};
