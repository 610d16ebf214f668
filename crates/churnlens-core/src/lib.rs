//! Core types, configuration, and error handling for churnlens.
//!
//! This crate provides the shared foundation used by all other churnlens crates:
//! - [`ChurnError`]: unified error type using `thiserror`
//! - [`ChurnConfig`]: configuration loaded from `.churnlens.toml`
//! - Shared types: [`LineRange`], [`FileChangeRecord`], [`ChangeCount`],
//!   [`EntityRangeIndex`], [`StructuralIndex`], [`ChurnReport`], [`OutputFormat`]
//! - Collaborator traits: [`VcsBackend`], [`StructuralParser`]

mod config;
mod error;
mod ports;
mod types;

pub use config::{parse_start_date, ChurnConfig, ChurnSettings, OutputSettings, VcsKind};
pub use error::ChurnError;
pub use ports::{StructuralParser, VcsBackend};
pub use types::{
    ChangeCount, ChurnEntry, ChurnReport, EntityRangeIndex, FileChangeRecord, LineRange,
    OutputFormat, StructuralIndex,
};

/// A convenience `Result` type for churnlens operations.
pub type Result<T> = std::result::Result<T, ChurnError>;
