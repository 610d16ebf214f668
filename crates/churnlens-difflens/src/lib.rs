//! Unified-diff header decoding.
//!
//! Turns the `---`/`+++`/`@@` lines of a diff into per-file changed line
//! ranges, and reduces full diff text to those lines for backends that can
//! only produce a complete patch.
pub mod parser;
