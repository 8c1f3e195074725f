//! c4clean CLI
//!
//! Filters web-text corpora down to clean, English, sentence-level prose

mod config;
mod progress;

use anyhow::{Context, Result};
use c4clean_core::{Document, DocumentFilter, FilterOutcome, PipelineBuilder, ProcessedRecord};
use c4clean_formats::{open_dataset, JsonlWriter, Record};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::FilterFileConfig;
use progress::ProgressReporter;

#[derive(Parser)]
#[command(name = "c4clean")]
#[command(version, about = "Sentence-level quality filtering for web-text corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output reports in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a JSONL corpus, keeping cleaned documents
    Filter(FilterArgs),

    /// Filter a single text and print the verdict
    Check {
        /// Text to check (read from stdin when omitted)
        text: Option<String>,

        /// Config file with filter settings (YAML or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Input file (.jsonl, .json or .gz)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (.jsonl, or .gz for compressed output)
    #[arg(short, long)]
    output: PathBuf,

    /// Config file with filter settings (YAML or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record field holding the document text
    #[arg(short = 'F', long)]
    field: Option<String>,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Stop on the first language-detection or segmentation failure
    #[arg(long)]
    fail_fast: bool,

    /// Also write rejected records with their reason to <stem>.removed.jsonl
    #[arg(long)]
    write_removed: bool,

    /// Show statistics without writing output
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.json) // Disable colors if JSON output
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Filter(args) => filter_corpus(args, cli.json),
        Commands::Check { text, config } => check_text(text, config, cli.json),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<FilterFileConfig> {
    match path {
        Some(path) => {
            info!("  Config: {:?}", path);
            FilterFileConfig::load(path)
        }
        None => Ok(FilterFileConfig::default()),
    }
}

fn build_filter(config: &FilterFileConfig) -> Result<DocumentFilter> {
    DocumentFilter::with_default_capabilities(config.filter.clone())
        .context("Invalid filter configuration")
}

/// Derive the companion "removed records" path from the clean output path.
///
/// Examples:
///   output.jsonl    → output.removed.jsonl
///   output.jsonl.gz → output.removed.jsonl
fn removed_path(output: &Path) -> PathBuf {
    let name = output.file_name().unwrap_or_default().to_string_lossy();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}.removed.jsonl", stem))
}

/// One line of the removed log
fn removed_entry(line: usize, processed: &ProcessedRecord) -> Option<serde_json::Value> {
    let reason = processed.outcome.reject_reason()?;
    Some(serde_json::json!({
        "line": line,
        "reason": reason.code(),
        "detail": reason.to_string(),
        "record": processed.record,
    }))
}

fn filter_corpus(args: FilterArgs, json_output: bool) -> Result<()> {
    info!("Filtering corpus");
    info!("  Input: {:?}", args.input);
    if !args.dry_run {
        info!("  Output: {:?}", args.output);
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(field) = args.field {
        config.pipeline.text_field = field;
    }
    if let Some(threads) = args.threads {
        config.pipeline.num_threads = Some(threads);
    }
    config.pipeline.fail_fast |= args.fail_fast;
    info!("  Field: {}", config.pipeline.text_field);

    let filter = Arc::new(build_filter(&config)?);
    let chunk_size = config.pipeline.chunk_size;
    let pipeline = PipelineBuilder::new(filter)
        .config(config.pipeline)
        .build()
        .context("Invalid pipeline configuration")?;

    let mut reader = open_dataset(&args.input)
        .with_context(|| format!("Failed to open input: {}", args.input.display()))?;

    let write_output = !args.dry_run;
    let removed_output = removed_path(&args.output);

    let mut clean_writer = if write_output {
        Some(
            JsonlWriter::create(&args.output)
                .with_context(|| format!("Failed to create output: {}", args.output.display()))?,
        )
    } else {
        None
    };
    let mut removed_writer = if write_output && args.write_removed {
        info!("  Removed output: {:?}", removed_output);
        Some(
            JsonlWriter::create(&removed_output)
                .with_context(|| format!("Failed to create {}", removed_output.display()))?,
        )
    } else {
        None
    };

    let progress = if json_output {
        ProgressReporter::hidden()
    } else {
        ProgressReporter::new(reader.total_bytes())
    };

    loop {
        let mut batch: Vec<Record> = Vec::with_capacity(chunk_size);
        for result in reader.by_ref().take(chunk_size) {
            batch.push(result?);
        }
        let Some(first_line) = batch.first().map(|r| r.source_line) else {
            break;
        };

        let lines: Vec<usize> = batch.iter().map(|r| r.source_line).collect();
        let records = batch.into_iter().map(Record::into_data).collect();
        let processed = pipeline
            .process_batch_with_outcomes(records)
            .with_context(|| format!("Failed to filter records starting at line {}", first_line))?;

        for (line, processed) in lines.into_iter().zip(processed) {
            if processed.is_accepted() {
                if let Some(w) = clean_writer.as_mut() {
                    w.write_record(&processed.record)?;
                }
            } else if let Some(w) = removed_writer.as_mut() {
                if let Some(entry) = removed_entry(line, &processed) {
                    w.write_record(&entry)?;
                }
            }
        }

        progress.update(reader.bytes_processed(), &pipeline.stats());
    }

    // Close writers before printing the summary so all data is on disk.
    if let Some(w) = clean_writer {
        w.finish()?;
    }
    if let Some(w) = removed_writer {
        w.finish()?;
    }
    progress.finish();

    let stats = pipeline.stats();
    info!(
        "Kept {} of {} records ({:.1}%)",
        stats.accepted_records,
        stats.total_records,
        stats.acceptance_rate()
    );

    let removed_written = write_output && args.write_removed;
    if json_output {
        let report = serde_json::json!({
            "input": args.input.to_string_lossy(),
            "output": if write_output { Some(args.output.to_string_lossy()) } else { None },
            "removed_output": if removed_written { Some(removed_output.to_string_lossy()) } else { None },
            "malformed_lines": reader.malformed_lines(),
            "acceptance_rate": stats.acceptance_rate(),
            "stats": &stats,
            "dry_run": args.dry_run,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        progress::print_summary_report(
            &args.input,
            write_output.then_some(args.output.as_path()),
            removed_written.then_some(removed_output.as_path()),
            &stats,
            reader.malformed_lines(),
        );
    }

    Ok(())
}

fn check_text(text: Option<String>, config_path: Option<PathBuf>, json_output: bool) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        }
    };

    let config = load_config(config_path.as_deref())?;
    let filter = build_filter(&config)?;
    let outcome = filter.outcome(&Document::new(text));

    if json_output {
        let report = match &outcome {
            FilterOutcome::Accepted { text, kept, dropped } => serde_json::json!({
                "accepted": true,
                "sentences_kept": kept,
                "sentences_dropped": dropped,
                "text": text,
            }),
            FilterOutcome::Rejected(reason) => serde_json::json!({
                "accepted": false,
                "reason": reason.code(),
                "detail": reason.to_string(),
                "text": "",
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &outcome {
            FilterOutcome::Accepted { text, kept, dropped } => {
                println!("ACCEPTED ({} sentences kept, {} dropped)", kept, dropped);
                println!("{}", "─".repeat(60));
                println!("{}", text);
            }
            FilterOutcome::Rejected(reason) => {
                println!("REJECTED: {}", reason);
            }
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
