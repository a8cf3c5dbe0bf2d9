//! CLI module
//!
//! Command-line interface over the storage clients.
//!
//! # Commands
//!
//! - `create-container` / `delete-container` - Container lifecycle
//! - `list-blobs` - Enumerate a container
//! - `upload-blob` / `download-blob` / `delete-blob` - Single blobs
//! - `create-share` / `delete-share` - Share lifecycle
//! - `list-files` - Enumerate a share directory
//! - `upload-file` / `download-file` - Single files
//! - `list-store` - Enumerate an object store location

mod commands;
mod runner;

pub use commands::{Cli, Commands, ListingArgs, OutputFormat};
pub use runner::Runner;
