//! ULP Filter - High-performance combolist filtering
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::process;

use ulp_filter::classify::LineClassifier;
use ulp_filter::cli::Args;
use ulp_filter::config::Config;
use ulp_filter::inputs::expand_inputs;
use ulp_filter::pipeline::{Pipeline, PipelineOptions};
use ulp_filter::progress::{print_banner, print_bullet, print_error, print_header, print_info};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    } else if !args.quiet {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        let mut source = e.source();
        while let Some(err) = source {
            print_error(&format!("  Caused by: {}", err));
            source = err.source();
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if !args.quiet {
        print_banner();
    }

    let config = Config::load(&args.config)?;
    let files = expand_inputs(&args.inputs, &args.output)?;
    let options = PipelineOptions::from_args(&args);

    if args.verbose {
        print_config(&args, &config, &options, &files);
    }

    // Compiles the custom filter; a bad pattern stops here, before any file is touched
    let classifier = LineClassifier::new(config)?;

    let pipeline = Pipeline::new(classifier, options);
    pipeline.run(&files, &args.output)?;
    pipeline.print_summary();

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, config: &Config, options: &PipelineOptions, files: &[std::path::PathBuf]) {
    print_header("Configuration");

    print_info(&format!("Config file:  {:?}", args.config));
    print_info(&format!("Output:       {:?}", args.output));
    print_info(&format!("Separator:    {:?}", config.separator));
    print_info(&format!(
        "Format:       {}",
        config.format.map_or("none (all lines rejected)", |f| f.as_str())
    ));
    print_info(&format!("Convert:      {:?}", config.convert_format));

    if let Some(ref filter) = config.custom_filter {
        print_info(&format!("Filter:       {}", filter));
    }

    print_info(&format!(
        "Email rules:  {} remove, {} contains",
        config.email_remove.len(),
        config.email_contains.len()
    ));
    print_info(&format!(
        "Url rules:    {} remove, {} contains",
        config.url_remove.len(),
        config.url_contains.len()
    ));
    print_info(&format!("Threads:      {}", options.workers));
    print_info(&format!("Batch size:   {}", options.batch_size));

    print_header("Inputs");
    for file in files {
        print_bullet(&format!("{:?}", file));
    }
}
