mod batch;
mod cache;
mod card;
mod config;
mod docx;
mod output;
mod parser;
mod pipeline;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::parser::TrailingPolicy;

#[derive(Parser)]
#[command(name = "card_parser", about = "Convert debate-card .docx files into JSON lines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a directory of category folders into cards
    Parse {
        /// Root directory; each subdirectory is a source category
        directory: PathBuf,
        /// Output file
        #[arg(short, long, default_value = "output.jsonl")]
        output: PathBuf,
        /// Output of an earlier run: its files are skipped and its records kept
        #[arg(short, long)]
        previous: Option<PathBuf>,
        /// Checkpoint file (default: <output>.checkpoint)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Emit the last card of each document even without a closing tag
        #[arg(long)]
        flush_trailing: bool,
        /// Paragraph style that starts a card (overrides CARDS_TAG_STYLE)
        #[arg(long)]
        tag_style: Option<String>,
    },
    /// Normalize a checkpoint into final output
    Recover {
        checkpoint: PathBuf,
        #[arg(short, long, default_value = "output.jsonl")]
        output: PathBuf,
    },
    /// Summarize an output or checkpoint file
    Stats { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    match cli.command {
        Commands::Parse {
            directory,
            output,
            previous,
            checkpoint,
            flush_trailing,
            tag_style,
        } => {
            if let Some(style) = tag_style {
                settings.tag_style = style;
            }
            let trailing = if flush_trailing {
                TrailingPolicy::Flush
            } else {
                TrailingPolicy::Drop
            };
            let job = pipeline::ParseJob {
                directory,
                output,
                previous,
                checkpoint,
                trailing,
            };
            let summary = pipeline::run(&job, &settings)?;
            summary.print();
            println!("Output: {:?}", job.output);
        }
        Commands::Recover { checkpoint, output } => {
            let n = pipeline::recover(&checkpoint, &output)?;
            println!("Recovered {} cards into {:?}", n, output);
        }
        Commands::Stats { file } => {
            pipeline::stats(&file)?.print();
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", human_elapsed(elapsed));
    }
    Ok(())
}

/// Wall-clock time as "4.2s", "1m 15s" or "1h 2m 5s".
fn human_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (h, m, s) = (total / 3600, total / 60 % 60, total % 60);
    match (h, m) {
        (0, 0) => format!("{:.1}s", elapsed.as_secs_f64()),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m {s}s"),
    }
}
