//! Command-line interface definition for ulp-filter
//!
//! Provides argument parsing for the combolist filtering tool.

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::output::DEFAULT_OUTPUT_FILE;
use crate::pipeline::DEFAULT_BATCH_SIZE;

/// High-performance ULP combolist filter
///
/// Validate logins, filter by email/url domain and regex, convert columns,
/// and remove duplicates.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ulp-filter",
    author = "m0h1nd4",
    version,
    about = "High-performance ULP (url:login:pass) combolist filter",
    long_about = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                            ULP-FILTER v1.0.0                                 ║
║                   URL:LOGIN:PASS Combolist Processing                        ║
╚══════════════════════════════════════════════════════════════════════════════╝

Filter credential lines by login format, email and url domain rules and a
custom regex, optionally convert them to another column layout, and append the
unique survivors to one output file. Rules live in a key=value config file.

EXAMPLES:
    # Filter one file with ./config.ini into ./filtered_ulp.txt
    ulp-filter combo.txt

    # Every .txt file in a directory, 16 workers
    ulp-filter "dumps/*.txt" -t 16

    # Separate config and output
    ulp-filter -c rules.ini -o clean.txt part1.txt part2.txt

CONFIG KEYS:
    separator=:                    field separator
    format=url:email:pass          or email:pass
    convert_format=email:pass      email, pass, url, combinations, or columns like 2:1
    email_remove=gmail.com,mail.ru domains to drop (subdomains included)
    email_contains=corp.com        only keep these domains
    url_remove= / url_contains=    same for the url host
    email_remove_file=remove.txt   one domain per line (also *_contains_file, url_*_file)
    custom_filter=^https://        regex the whole line must match (case-insensitive)
"#,
    after_help = "For more information, visit: https://github.com/m0h1nd4/ulp-filter"
)]
pub struct Args {
    /// Input files or wildcard patterns (e.g. combo.txt, "*.txt")
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Config file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output file (appended to)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Number of worker threads (default: auto-detect)
    #[arg(short = 't', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Lines a worker takes from the queue at once
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Progress sampling interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub progress_interval: u64,

    /// Quiet mode - minimal output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false, conflicts_with = "quiet")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ulp-filter", "combo.txt"]).unwrap();

        assert_eq!(args.inputs, vec!["combo.txt"]);
        assert_eq!(args.config, PathBuf::from("config.ini"));
        assert_eq!(args.output, PathBuf::from("filtered_ulp.txt"));
        assert_eq!(args.threads, None);
        assert_eq!(args.batch_size, 100);
        assert_eq!(args.progress_interval, 1000);
        assert!(!args.quiet);
    }

    #[test]
    fn test_all_options() {
        let args = Args::try_parse_from([
            "ulp-filter", "-c", "rules.ini", "-o", "clean.txt", "-t", "4", "--batch-size", "50",
            "-q", "a.txt", "*.csv",
        ])
        .unwrap();

        assert_eq!(args.inputs, vec!["a.txt", "*.csv"]);
        assert_eq!(args.config, PathBuf::from("rules.ini"));
        assert_eq!(args.output, PathBuf::from("clean.txt"));
        assert_eq!(args.threads, Some(4));
        assert_eq!(args.batch_size, 50);
        assert!(args.quiet);
    }

    #[test]
    fn test_input_required() {
        assert!(Args::try_parse_from(["ulp-filter"]).is_err());
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        assert!(Args::try_parse_from(["ulp-filter", "-q", "-v", "a.txt"]).is_err());
    }
}
