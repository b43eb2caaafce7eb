//! ChainIngest CLI — the production command-line interface for the decode
//! pipeline.
//!
//! # Commands
//! ```
//! chainingest process   --path <object-path> | --block <n>
//! chainingest reprocess --blocks <n> [<n> ...]
//! chainingest batch     --sample <N> | --numbers <n>... | --status <s>
//!                       | --range <min> <max> | --file <list>
//! chainingest sync      [--prefix <p>] [--limit <n>]
//! chainingest status    --block <n>
//! chainingest reclaim   [--age-secs <n>]
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chainingest_observability::init_tracing;
use chainingest_pipeline::{BatchOptions, BlockSelection, PipelineConfig, PipelineContext};
use chainingest_storage::ProcessingStatus;

#[derive(Parser)]
#[command(
    name = "chainingest",
    about = "Avalanche block decode pipeline — validate, decode, and track raw block exports",
    version
)]
struct Cli {
    /// Path to the pipeline config file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single block through validate → decode → store
    Process {
        /// Raw object path
        #[arg(long, conflicts_with = "block")]
        path: Option<String>,
        /// Block number (the raw path is built from the configured template)
        #[arg(long)]
        block: Option<u64>,
    },

    /// Reprocess blocks by number via their recorded paths
    Reprocess {
        #[arg(long, num_args = 1.., required = true)]
        blocks: Vec<u64>,
    },

    /// Select, chunk, and process a batch of blocks
    Batch {
        /// Sample N random blocks from the available raw objects
        #[arg(long)]
        sample: Option<usize>,
        /// Process specific block numbers
        #[arg(long, num_args = 1..)]
        numbers: Vec<u64>,
        /// Process blocks currently in this status
        #[arg(long)]
        status: Option<String>,
        /// Process blocks in an inclusive range MIN MAX
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
        range: Vec<u64>,
        /// File with one block number or object path per line
        #[arg(long)]
        file: Option<PathBuf>,
        /// Filter --range by status
        #[arg(long)]
        filter_status: Option<String>,
        /// Maximum blocks for --status (default 100)
        #[arg(long, default_value_t = 100)]
        limit: usize,
        /// Process in chunks of this size
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Reprocess even when a decoded artifact already exists
        #[arg(long)]
        force: bool,
        /// Skip the inventory sync before selection
        #[arg(long)]
        no_sync: bool,
        /// Write the batch report to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Sync the object inventory from the backing store
    Sync {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the processing record for a block
    Status {
        #[arg(long)]
        block: u64,
    },

    /// Revert stale `processing` rows to `pending`
    Reclaim {
        /// Staleness threshold in seconds (default: from config)
        #[arg(long)]
        age_secs: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if cli.verbose {
        config.log.level = "debug".to_string();
    }
    init_tracing(&config.log);

    let ctx = PipelineContext::new(config).context("failed to build pipeline context")?;

    match cli.command {
        Commands::Process { path, block } => {
            let path = match (path, block) {
                (Some(p), _) => p,
                (None, Some(n)) => ctx.block_store.layout().raw_path(n),
                (None, None) => bail!("one of --path or --block is required"),
            };
            let outcome = ctx.processor().process(&path);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }

        Commands::Reprocess { blocks } => {
            let report = ctx.processor().reprocess_many(&blocks);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }

        Commands::Batch {
            sample,
            numbers,
            status,
            range,
            file,
            filter_status,
            limit,
            chunk_size,
            force,
            no_sync,
            output,
        } => {
            let runner = ctx.batch_runner();

            if !no_sync {
                let page_size = ctx.config.sync_page_size;
                runner
                    .sync_inventory(None, None, page_size)
                    .context("inventory sync failed")?;
            }

            let selection = build_selection(sample, numbers, status, range, file, filter_status, limit)?;
            let paths = runner.select(&selection).context("block selection failed")?;
            if paths.is_empty() {
                bail!("no blocks matched the selection");
            }

            let report = runner.run(
                &paths,
                &BatchOptions {
                    chunk_size,
                    force,
                },
            );

            match output {
                Some(path) => {
                    report
                        .save(&path)
                        .with_context(|| format!("failed to write report to {}", path.display()))?;
                    println!(
                        "{} succeeded, {} failed, {} skipped — report written to {}",
                        report.succeeded,
                        report.failed,
                        report.skipped,
                        path.display()
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
            Ok(())
        }

        Commands::Sync { prefix, limit } => {
            let count = ctx
                .batch_runner()
                .sync_inventory(prefix.as_deref(), limit, ctx.config.sync_page_size)
                .context("inventory sync failed")?;
            println!("synced {count} objects");
            Ok(())
        }

        Commands::Status { block } => {
            match ctx.status.get_block(block)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => bail!("block {block} not found in records"),
            }
            Ok(())
        }

        Commands::Reclaim { age_secs } => {
            let age = chrono::Duration::seconds(
                age_secs.unwrap_or(ctx.config.stale_age_secs) as i64
            );
            let reclaimed = ctx.status.reclaim_stale(age)?;
            println!("reclaimed {reclaimed} stale processing rows");
            Ok(())
        }
    }
}

/// Map the mutually exclusive batch flags to one selection strategy.
fn build_selection(
    sample: Option<usize>,
    numbers: Vec<u64>,
    status: Option<String>,
    range: Vec<u64>,
    file: Option<PathBuf>,
    filter_status: Option<String>,
    limit: usize,
) -> Result<BlockSelection> {
    let chosen = [
        sample.is_some(),
        !numbers.is_empty(),
        status.is_some(),
        !range.is_empty(),
        file.is_some(),
    ]
    .iter()
    .filter(|&&set| set)
    .count();
    if chosen != 1 {
        bail!("exactly one of --sample, --numbers, --status, --range, --file is required");
    }

    if let Some(n) = sample {
        return Ok(BlockSelection::Sample(n));
    }
    if !numbers.is_empty() {
        return Ok(BlockSelection::Numbers(numbers));
    }
    if let Some(s) = status {
        return Ok(BlockSelection::ByStatus {
            status: parse_status(&s)?,
            limit,
        });
    }
    if !range.is_empty() {
        let status = filter_status.as_deref().map(parse_status).transpose()?;
        return Ok(BlockSelection::Range {
            min: range[0],
            max: range[1],
            status,
        });
    }

    // --file: block numbers or full paths, one per line
    let path = file.unwrap_or_default();
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.iter().all(|l| l.bytes().all(|b| b.is_ascii_digit())) {
        let numbers = lines
            .iter()
            .map(|l| l.parse::<u64>().map_err(Into::into))
            .collect::<Result<Vec<u64>>>()?;
        Ok(BlockSelection::Numbers(numbers))
    } else {
        Ok(BlockSelection::Paths(
            lines.into_iter().map(String::from).collect(),
        ))
    }
}

fn parse_status(s: &str) -> Result<ProcessingStatus> {
    ProcessingStatus::parse(s).map_err(|e| anyhow::anyhow!("{e}"))
}
