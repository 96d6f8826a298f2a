//! Error types
//!
//! Every fatal condition of a run. Per-line rejections are not errors and never
//! show up here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors surfaced to the caller
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read
    #[error("cannot read config file {path:?}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Domain list file referenced from the config could not be read
    #[error("cannot read domain list {path:?}")]
    ReadList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid regular expression (custom filter or wildcard)
    #[error("invalid regex pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Input file could not be opened or mapped
    #[error("cannot open input file {path:?}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Output file could not be opened for appending
    #[error("cannot open output file {path:?}")]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to the output file failed mid-run
    #[error("failed writing to output file {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Wildcard expansion produced nothing to process
    #[error("no input files matched {0:?}")]
    NoInputs(Vec<String>),
}
