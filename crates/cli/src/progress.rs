//! Progress reporting and summaries for the CLI

use std::path::Path;

use c4clean_core::PipelineStats;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress reporter: one bar for input consumed, one line of counts
pub struct ProgressReporter {
    _multi: MultiProgress,
    main_bar: ProgressBar,
    stats_bar: ProgressBar,
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl ProgressReporter {
    /// Byte-based bar when the input size is known, a spinner otherwise
    /// (gzip input)
    pub fn new(total_bytes: Option<u64>) -> Self {
        let multi = MultiProgress::new();

        let main_bar = match total_bytes {
            Some(total) => {
                let bar = multi.add(ProgressBar::new(total));
                bar.set_style(
                    style("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
                        .progress_chars("█▓▒░-"),
                );
                bar
            }
            None => {
                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(style("[{elapsed_precise}] {spinner} {bytes} read {msg}"));
                bar
            }
        };

        let stats_bar = multi.add(ProgressBar::new(0));
        stats_bar.set_style(style("Stats: {msg}"));

        Self {
            _multi: multi,
            main_bar,
            stats_bar,
        }
    }

    /// Reporter that draws nothing
    pub fn hidden() -> Self {
        let multi = MultiProgress::new();
        let main_bar = multi.add(ProgressBar::hidden());
        let stats_bar = multi.add(ProgressBar::hidden());
        Self {
            _multi: multi,
            main_bar,
            stats_bar,
        }
    }

    pub fn update(&self, bytes: u64, stats: &PipelineStats) {
        self.main_bar.set_position(bytes);
        self.main_bar.set_message("Filtering...");
        self.stats_bar.set_message(stats_line(stats));
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Complete!");
        self.stats_bar.finish();
    }
}

fn stats_line(stats: &PipelineStats) -> String {
    if stats.total_records == 0 {
        return "0 total".to_string();
    }
    format!(
        "{} total | {} kept ({:.1}%) | {} rejected ({:.1}%)",
        format_number(stats.total_records),
        format_number(stats.accepted_records),
        stats.acceptance_rate(),
        format_number(stats.rejected_records),
        stats.rejection_rate()
    )
}

/// Compact number for the live stats line
fn format_number(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Print a formatted summary report
pub fn print_summary_report(
    input: &Path,
    output: Option<&Path>,
    removed: Option<&Path>,
    stats: &PipelineStats,
    malformed_lines: usize,
) {
    println!("\n{}", "═".repeat(60));
    println!("Document Filtering Complete");
    println!("{}", "═".repeat(60));
    println!("Input:              {}", input.display());

    match output {
        Some(path) => println!("Output:             {}", path.display()),
        None => println!("Output:             (dry run - no output written)"),
    }
    if let Some(path) = removed {
        println!("Removed log:        {}", path.display());
    }

    println!("Total records:      {}", format_with_commas(stats.total_records));
    if malformed_lines > 0 {
        println!("Malformed lines:    {}", format_with_commas(malformed_lines));
    }
    println!(
        "Accepted:           {} ({:.1}%)",
        format_with_commas(stats.accepted_records),
        stats.acceptance_rate()
    );
    println!(
        "Rejected:           {} ({:.1}%)",
        format_with_commas(stats.rejected_records),
        stats.rejection_rate()
    );
    for (reason, count) in &stats.rejections {
        println!("  {:<18}{}", format!("{}:", reason), format_with_commas(*count));
    }
    println!(
        "Sentences:          {} kept, {} dropped",
        format_with_commas(stats.sentences_kept),
        format_with_commas(stats.sentences_dropped)
    );

    println!("{}", "═".repeat(60));
}

/// Format number with thousand separators
fn format_with_commas(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
