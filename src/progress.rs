//! Progress display module
//!
//! Console helpers, run statistics and the per-file progress monitor.

use bytesize::ByteSize;
use colored::*;
use crossbeam_channel::{select, tick, Receiver};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                                                                              ║
║   ██╗   ██╗██╗     ██████╗       ███████╗██╗██╗  ████████╗███████╗██████╗    ║
║   ██║   ██║██║     ██╔══██╗      ██╔════╝██║██║  ╚══██╔══╝██╔════╝██╔══██╗   ║
║   ██║   ██║██║     ██████╔╝█████╗█████╗  ██║██║     ██║   █████╗  ██████╔╝   ║
║   ██║   ██║██║     ██╔═══╝ ╚════╝██╔══╝  ██║██║     ██║   ██╔══╝  ██╔══██╗   ║
║   ╚██████╔╝███████╗██║           ██║     ██║███████╗██║   ███████╗██║  ██║   ║
║    ╚═════╝ ╚══════╝╚═╝           ╚═╝     ╚═╝╚══════╝╚═╝   ╚══════╝╚═╝  ╚═╝   ║
║                                                                              ║
║                     URL:LOGIN:PASS Combolist Processing                      ║
║                                                              v1.0.0          ║
╚══════════════════════════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    println!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    println!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    println!("  {} {}", "✔".green(), text.green());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Print a bullet point
pub fn print_bullet(text: &str) {
    println!("  {} {}", "•".green(), text);
}

/// Create a styled spinner counting accepted lines
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();

    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Counters for the input file currently being processed
///
/// `accepted` is the progress counter: bumped once per line handed to the
/// writer. All of them are zeroed before each file.
#[derive(Debug, Default)]
pub struct FileCounters {
    pub lines: AtomicU64,
    pub accepted: AtomicU64,
    pub rejected: AtomicU64,
    pub duplicates: AtomicU64,
}

impl FileCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.lines.store(0, Ordering::Relaxed);
        self.accepted.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.duplicates.store(0, Ordering::Relaxed);
    }

    pub fn get_lines(&self) -> u64 {
        self.lines.load(Ordering::Relaxed)
    }

    pub fn get_accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn get_rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn get_duplicates(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }
}

/// Totals over the whole run
#[derive(Debug)]
pub struct ProcessingStats {
    pub processed_files: AtomicU64,
    pub processed_bytes: AtomicU64,
    pub total_lines: AtomicU64,
    pub accepted_lines: AtomicU64,
    pub rejected_lines: AtomicU64,
    pub duplicate_lines: AtomicU64,
    pub start_time: Instant,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self {
            processed_files: AtomicU64::new(0),
            processed_bytes: AtomicU64::new(0),
            total_lines: AtomicU64::new(0),
            accepted_lines: AtomicU64::new(0),
            rejected_lines: AtomicU64::new(0),
            duplicate_lines: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Fold a finished file's counters into the run totals
    pub fn complete_file(&self, size: u64, counters: &FileCounters) {
        self.processed_files.fetch_add(1, Ordering::Relaxed);
        self.processed_bytes.fetch_add(size, Ordering::Relaxed);
        self.total_lines.fetch_add(counters.get_lines(), Ordering::Relaxed);
        self.accepted_lines.fetch_add(counters.get_accepted(), Ordering::Relaxed);
        self.rejected_lines.fetch_add(counters.get_rejected(), Ordering::Relaxed);
        self.duplicate_lines.fetch_add(counters.get_duplicates(), Ordering::Relaxed);
    }

    pub fn get_processed_files(&self) -> u64 {
        self.processed_files.load(Ordering::Relaxed)
    }

    pub fn get_processed_bytes(&self) -> u64 {
        self.processed_bytes.load(Ordering::Relaxed)
    }

    pub fn get_total_lines(&self) -> u64 {
        self.total_lines.load(Ordering::Relaxed)
    }

    pub fn get_accepted_lines(&self) -> u64 {
        self.accepted_lines.load(Ordering::Relaxed)
    }

    pub fn get_rejected_lines(&self) -> u64 {
        self.rejected_lines.load(Ordering::Relaxed)
    }

    pub fn get_duplicate_lines(&self) -> u64 {
        self.duplicate_lines.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn lines_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.get_total_lines() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print final statistics
    pub fn print_summary(&self) {
        println!();
        println!("{}", "═".repeat(60).green());
        println!("{}", "                    PROCESSING COMPLETE".green().bold());
        println!("{}", "═".repeat(60).green());
        println!();

        println!("  {} {}", "Files processed:".green(), self.get_processed_files());
        println!("  {} {}", "Data processed: ".green(), ByteSize(self.get_processed_bytes()));
        println!();

        println!("  {} {}", "Total lines:    ".green(), format_number(self.get_total_lines()));
        println!("  {} {}", "Rejected:       ".yellow(), format_number(self.get_rejected_lines()));
        println!("  {} {}", "Duplicates:     ".yellow(), format_number(self.get_duplicate_lines()));
        println!(
            "  {} {}",
            "Unique output:  ".green().bold(),
            format_number(self.get_accepted_lines()).green().bold()
        );

        println!();
        println!("  {} {}", "Duration:       ".green(), format_duration(self.elapsed()));
        println!("  {} {:.2} lines/sec", "Throughput:     ".green(), self.lines_per_second());
        println!();
        println!("{}", "═".repeat(60).green());
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample `counter` every `interval` until `stop` fires, then sample once more
///
/// Purely observational: reports on `bar` and at debug level, returns the last sample.
pub fn monitor(counter: &AtomicU64, interval: Duration, stop: Receiver<()>, bar: &ProgressBar) -> u64 {
    let ticker = tick(interval);
    let report = || {
        let accepted = counter.load(Ordering::Relaxed);
        bar.set_message(format!("{} lines accepted", format_number(accepted)));
        log::debug!("progress: {} lines accepted", accepted);
        accepted
    };

    loop {
        select! {
            recv(ticker) -> _ => {
                report();
            }
            recv(stop) -> _ => break,
        }
    }

    report()
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}
