//! Core processing engine
//!
//! Runs input files one at a time through
//! producer -> work queue -> workers -> result queue -> writer,
//! with a progress monitor sampling the accepted-line counter on the side.
//! All per-file threads are scoped, so they borrow the pipeline's queues,
//! dedup set and counters directly.

use std::panic;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use colored::*;
use crossbeam_channel::bounded;

use crate::classify::LineClassifier;
use crate::cli::Args;
use crate::dedup::{DedupSet, LocalCache};
use crate::error::Result;
use crate::output::{OutputWriter, DEFAULT_BUFFER_SIZE};
use crate::progress::{self, create_spinner, print_header, print_info, print_success, FileCounters, ProcessingStats};
use crate::queue::WorkQueue;
use crate::reader::LineReader;

/// Lines a worker takes from the work queue at once
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Pipeline tuning
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Worker threads per file (at least 1)
    pub workers: usize,
    pub batch_size: usize,
    pub progress_interval: Duration,
    pub buffer_size: usize,
    pub quiet: bool,
    pub verbose: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: Duration::from_secs(1),
            buffer_size: DEFAULT_BUFFER_SIZE,
            quiet: false,
            verbose: false,
        }
    }
}

impl PipelineOptions {
    pub fn from_args(args: &Args) -> Self {
        Self {
            workers: args.threads.unwrap_or_else(num_cpus::get).max(1),
            batch_size: args.batch_size.max(1),
            progress_interval: Duration::from_millis(args.progress_interval.max(1)),
            buffer_size: DEFAULT_BUFFER_SIZE,
            quiet: args.quiet,
            verbose: args.verbose,
        }
    }
}

/// Outcome of one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub size: u64,
    pub lines: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub duplicates: u64,
}

/// Closes a queue when dropped, so consumers wake up even if the feeding thread panics
struct CloseOnDrop<'a, T>(&'a WorkQueue<T>);

impl<T> Drop for CloseOnDrop<'_, T> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Main processor
pub struct Pipeline {
    options: PipelineOptions,
    classifier: LineClassifier,
    work: WorkQueue<String>,
    results: WorkQueue<String>,
    dedup: DedupSet,
    counters: FileCounters,
    stats: Arc<ProcessingStats>,
}

impl Pipeline {
    pub fn new(classifier: LineClassifier, options: PipelineOptions) -> Self {
        Self {
            options,
            classifier,
            work: WorkQueue::new(),
            results: WorkQueue::new(),
            dedup: DedupSet::new(),
            counters: FileCounters::new(),
            stats: Arc::new(ProcessingStats::new()),
        }
    }

    /// Process every input in order, appending survivors to `output`
    ///
    /// The output is opened once, before the first input; any open or write
    /// failure aborts the run.
    pub fn run(&self, inputs: &[PathBuf], output: &Path) -> Result<Vec<FileReport>> {
        let mut writer = OutputWriter::append(output, self.options.buffer_size)?;

        if !self.options.quiet {
            print_header(&format!("Processing {} file(s)...", inputs.len()));
            print_info(&format!("Output:  {:?} (append)", output));
            print_info(&format!("Workers: {}", self.options.workers));
        }

        let mut reports = Vec::with_capacity(inputs.len());
        for path in inputs {
            let report = self.process_file(path, &mut writer)?;

            if !self.options.quiet {
                print_success(&format!(
                    "{:?}: {} lines, {} accepted, {} rejected, {} duplicates ({})",
                    path.file_name().unwrap_or(path.as_os_str()),
                    progress::format_number(report.lines),
                    progress::format_number(report.accepted),
                    progress::format_number(report.rejected),
                    progress::format_number(report.duplicates),
                    ByteSize(report.size),
                ));
            }
            reports.push(report);
        }

        writer.flush()?;

        if !self.options.quiet {
            print_info(&format!("Lines appended: {}", progress::format_number(writer.lines_written())));
        }

        Ok(reports)
    }

    /// Run one input file through the pipeline
    pub fn process_file(&self, path: &Path, output: &mut OutputWriter) -> Result<FileReport> {
        let reader = LineReader::open(path)?;
        let size = reader.size() as u64;

        self.reset();
        log::info!("Processing {:?} ({})", path, ByteSize(size));

        let bar = if self.options.quiet {
            indicatif::ProgressBar::hidden()
        } else {
            create_spinner(&format!("Processing {:?}...", path.file_name().unwrap_or_default()))
        };
        let started = Instant::now();

        let written = thread::scope(|s| {
            let (stop_tx, stop_rx) = bounded::<()>(1);
            let counter = &self.counters.accepted;
            let interval = self.options.progress_interval;
            let bar_ref = &bar;
            let monitor = s.spawn(move || progress::monitor(counter, interval, stop_rx, bar_ref));

            let out = &mut *output;
            let writer = s.spawn(move || self.drain_results(out));

            let workers: Vec<_> = (0..self.options.workers.max(1))
                .map(|id| s.spawn(move || self.run_worker(id)))
                .collect();

            let producer = s.spawn(move || self.produce(reader));

            // Join everything before re-raising a panic, so no thread is left
            // waiting on a queue that will never close
            let produced = producer.join();
            let worked: Vec<_> = workers.into_iter().map(|w| w.join()).collect();
            self.results.close();
            let written = writer.join();
            let _ = stop_tx.send(());
            let sampled = monitor.join();

            let produced = produced.unwrap_or_else(|e| panic::resume_unwind(e));
            for worker in worked {
                worker.unwrap_or_else(|e| panic::resume_unwind(e));
            }
            let sampled = sampled.unwrap_or_else(|e| panic::resume_unwind(e));
            log::debug!("{:?}: produced {} lines, last progress sample {}", path, produced, sampled);

            written.unwrap_or_else(|e| panic::resume_unwind(e))
        })?;

        bar.finish_and_clear();

        let report = FileReport {
            path: path.to_path_buf(),
            size,
            lines: self.counters.get_lines(),
            accepted: self.counters.get_accepted(),
            rejected: self.counters.get_rejected(),
            duplicates: self.counters.get_duplicates(),
        };
        debug_assert_eq!(report.accepted, written);

        self.stats.complete_file(size, &self.counters);
        log::info!(
            "Finished {:?} in {}: {} accepted, {} rejected, {} duplicates",
            path,
            progress::format_duration(started.elapsed()),
            report.accepted,
            report.rejected,
            report.duplicates,
        );
        if self.options.verbose {
            let dedup = self.dedup.stats();
            log::debug!(
                "dedup: {} claimed, {} local hits, {} global hits",
                dedup.get_claimed(),
                dedup.get_local_hits(),
                dedup.get_global_hits(),
            );
        }

        Ok(report)
    }

    /// Clear per-file state: dedup set, both queues, counters
    fn reset(&self) {
        self.dedup.clear();
        self.work.reset();
        self.results.reset();
        self.counters.reset();
    }

    /// Feed non-empty lines to the work queue, then close it
    fn produce(&self, reader: LineReader) -> u64 {
        let _close = CloseOnDrop(&self.work);
        let batch_size = self.options.batch_size.max(1);
        let mut pending = Vec::with_capacity(batch_size);
        let mut produced = 0;

        for line in reader {
            if line.is_empty() {
                continue;
            }
            pending.push(line);
            if pending.len() == batch_size {
                produced += pending.len() as u64;
                self.counters.lines.fetch_add(pending.len() as u64, Ordering::Relaxed);
                self.work.push_all(pending.drain(..));
            }
        }

        produced += pending.len() as u64;
        self.counters.lines.fetch_add(pending.len() as u64, Ordering::Relaxed);
        self.work.push_all(pending);

        produced
    }

    /// Classify, dedup and forward lines until the work queue is closed and drained
    fn run_worker(&self, id: usize) -> u64 {
        let mut local = LocalCache::new();
        let mut accepted = 0;

        loop {
            let batch = self.work.pop_batch(self.options.batch_size);
            if batch.is_empty() && self.work.is_closed() {
                break;
            }

            for line in batch {
                match self.classifier.classify(&line) {
                    Some(rendered) => {
                        if self.dedup.try_claim(&mut local, &rendered) {
                            self.results.push(rendered);
                            self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                            accepted += 1;
                        } else {
                            self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    None => {
                        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }

        log::trace!("worker {} done: {} accepted, {} cached", id, accepted, local.len());
        accepted
    }

    /// Append accepted lines to the output until the result queue is closed and drained
    fn drain_results(&self, output: &mut OutputWriter) -> Result<u64> {
        let mut written = 0;
        while let Some(line) = self.results.pop_one() {
            output.write_line(&line)?;
            written += 1;
        }
        output.flush()?;
        Ok(written)
    }

    /// Get processing statistics
    pub fn stats(&self) -> Arc<ProcessingStats> {
        Arc::clone(&self.stats)
    }

    pub fn print_summary(&self) {
        if !self.options.quiet {
            self.stats.print_summary();
            println!("  {} {}", "Config format:  ".green(), self.format_label());
        }
    }

    fn format_label(&self) -> &'static str {
        self.classifier.config().format.map_or("none", |f| f.as_str())
    }
}
