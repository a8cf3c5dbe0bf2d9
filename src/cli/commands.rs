//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Segmented listing and object operations for blob and file storage
#[derive(Parser, Debug)]
#[command(name = "segstore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Account configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage account name, overrides the config file
    #[arg(short, long, global = true)]
    pub account: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by the listing commands
#[derive(Args, Debug, Clone, Default)]
pub struct ListingArgs {
    /// Only list names starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Items per page (1-5000, service default if unset)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=5000))]
    pub page_size: Option<u32>,

    /// Print one line per page instead of one per item
    #[arg(long)]
    pub pages: bool,

    /// Resume from a marker reported by an earlier run
    #[arg(long)]
    pub marker: Option<String>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a blob container
    CreateContainer {
        /// Container name
        container: String,
    },

    /// Delete a blob container
    DeleteContainer {
        /// Container name
        container: String,
    },

    /// List the blobs of a container
    ListBlobs {
        /// Container name
        container: String,

        #[command(flatten)]
        listing: ListingArgs,
    },

    /// Upload a local file as a block blob
    UploadBlob {
        /// Container name
        container: String,

        /// Blob name
        name: String,

        /// Local file to upload
        file: PathBuf,

        /// Content type stored with the blob
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },

    /// Download a blob
    DownloadBlob {
        /// Container name
        container: String,

        /// Blob name
        name: String,

        /// Destination file (stdout if not set)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a blob
    DeleteBlob {
        /// Container name
        container: String,

        /// Blob name
        name: String,
    },

    /// Create a file share
    CreateShare {
        /// Share name
        share: String,
    },

    /// Delete a file share
    DeleteShare {
        /// Share name
        share: String,
    },

    /// List files and directories of a share directory
    ListFiles {
        /// Share name
        share: String,

        /// Directory path within the share (root if not set)
        #[arg(long)]
        directory: Option<String>,

        #[command(flatten)]
        listing: ListingArgs,
    },

    /// Upload a local file into a share's root directory
    UploadFile {
        /// Share name
        share: String,

        /// File name in the share
        name: String,

        /// Local file to upload
        file: PathBuf,

        /// Content type stored with the file
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },

    /// Download a file from a share's root directory
    DownloadFile {
        /// Share name
        share: String,

        /// File name in the share
        name: String,

        /// Destination file (stdout if not set)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List keys of an object store location
    /// Supports: /path, memory://path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
    ListStore {
        /// Location URL
        url: String,

        /// Keys per page
        #[arg(long, default_value = "1000")]
        page_size: usize,

        /// Print one line per page instead of one per item
        #[arg(long)]
        pages: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
