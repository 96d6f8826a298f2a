//! # ULP Filter
//!
//! High-performance filtering of `url:login:pass` and `login:pass` combolists.
//!
//! ## Features
//!
//! - **Login validation**: keeps email logins, drops phone-number logins
//! - **Domain rules**: remove/contains lists for the email domain and the url host,
//!   matched on label boundaries (`example.com` also covers `mail.example.com`)
//! - **Regex filter**: case-insensitive custom pattern on the whole line
//! - **Conversion**: re-emit lines as `email:pass`, single fields, or numeric columns
//! - **Deduplication**: per file, keyed on the converted output
//! - **Parallel processing**: producer, worker pool and writer per input file
//! - **Encoding detection**: non-UTF-8 inputs are transcoded
//!
//! ## Usage
//!
//! ```bash
//! # config.ini next to the input
//! ulp-filter combo.txt
//!
//! # all text files in a directory
//! ulp-filter "dumps/*.txt" -o clean.txt
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use ulp_filter::classify::LineClassifier;
//! use ulp_filter::config::Config;
//! use ulp_filter::pipeline::{Pipeline, PipelineOptions};
//! use std::path::{Path, PathBuf};
//!
//! let config = Config::load(Path::new("config.ini")).unwrap();
//! let classifier = LineClassifier::new(config).unwrap();
//! let pipeline = Pipeline::new(classifier, PipelineOptions::default());
//! pipeline
//!     .run(&[PathBuf::from("combo.txt")], Path::new("filtered_ulp.txt"))
//!     .unwrap();
//! ```

pub mod classify;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod inputs;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod reader;

pub use cli::Args;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineOptions};
