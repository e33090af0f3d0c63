//! Bundle container codec for the stowage client.
//!
//! Packs a list of named byte payloads into one opaque blob so a batch of
//! small files can travel as a single store object, and unpacks it
//! losslessly on the way back. The format is deliberately minimal: framed
//! JSON metadata records interleaved with raw payload bytes, no external
//! archive-library dependency.

pub mod codec;

pub use codec::{decode, encode, Entry};
