//! CLI entry point for strdensity.
//!
//! Reads gene models (GTF) and STR loci (BED), measures STR overlap per gene
//! region and writes a CSV table.

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use indexmap::IndexMap;
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use strdensity::config::Config;
use strdensity::engine::{aggregate_record, BatchOutcome, BatchSummary, ChromStrs, StrIndex};
use strdensity::error::GeneError;
use strdensity::output::{write_failures, write_header, write_report};
use strdensity::parser::gtf::GtfData;
use strdensity::parser::{parse_bed, parse_gtf};
use strdensity::records::GeneRecord;
use strdensity::types::OutputFormat;

/// STR density per gene region.
///
/// Measures how many base pairs of each gene body, exon union and intron set
/// are covered by STR loci from a BED file.
#[derive(Parser, Debug)]
#[command(name = "strdensity")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// GTF annotation file (required)
    #[arg(short = 'g', long = "gtf")]
    gtf: PathBuf,

    /// STR BED file (required)
    #[arg(short = 'b', long = "bed")]
    bed: PathBuf,

    /// Output CSV file (required)
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Output layout: long (one row per gene and region) or wide (one row per gene)
    #[arg(short = 'f', long = "format", default_value = "long")]
    format: OutputFormat,

    /// Region types to report (comma-separated)
    #[arg(short = 'r', long = "regions", default_value = "body,exonic,intronic")]
    regions: String,

    /// Write genes that could not be processed to this file
    #[arg(long = "failures")]
    failures: Option<PathBuf>,

    /// GTF tag for gene ID
    #[arg(short = 'G', long = "gene", default_value = "gene_id")]
    gene_tag: String,

    /// GTF tag for gene name
    #[arg(short = 'N', long = "gene-name", default_value = "gene_name")]
    gene_name_tag: String,

    /// GTF tag for transcript ID
    #[arg(short = 'T', long = "transcript", default_value = "transcript_id")]
    transcript_tag: String,

    /// Number of worker threads (0 = auto-detect, 1 = sequential)
    #[arg(long = "threads", short = 'j', default_value = "0")]
    threads: usize,

    /// Genes per work item in parallel mode
    #[arg(long = "batch-size", default_value = "500")]
    batch_size: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    if !args.gtf.exists() {
        bail!("GTF file not found: {}", args.gtf.display());
    }
    if !args.bed.exists() {
        bail!("BED file not found: {}", args.bed.display());
    }
    if args.batch_size == 0 {
        bail!("Batch size must be greater than 0");
    }

    let mut config = Config::new();
    if !config.parse_regions(&args.regions) {
        bail!(
            "Regions not properly passed: {} (expected a comma-separated subset of body,exonic,intronic)",
            args.regions
        );
    }
    config.format = args.format;
    config.gene_id_tag = args.gene_tag.clone();
    config.gene_name_tag = args.gene_name_tag.clone();
    config.transcript_id_tag = args.transcript_tag.clone();
    config.threads = args.threads;
    config.batch_size = args.batch_size;

    info!("Parsing GTF file: {}", args.gtf.display());
    let gtf_data = parse_gtf(&args.gtf, &config)?;

    info!("Parsing BED file: {}", args.bed.display());
    let loci = parse_bed(&args.bed)?;
    let index = StrIndex::build(loci).context("Failed to index STR loci")?;
    if !index.rejected().is_empty() {
        warn!("{} STR records had invalid coordinates", index.rejected().len());
    }

    let num_threads = config.effective_threads();
    let (summary, failures) = if num_threads == 1 {
        run_sequential(&args, gtf_data, &index, &config)?
    } else {
        run_parallel(&args, gtf_data, index, &config, num_threads)?
    };

    if let Some(path) = &args.failures {
        write_failure_report(path, &failures)?;
    }
    summary.log();

    info!("Done!");
    Ok(())
}

/// Aggregate a run of genes that share a chromosome.
fn process_genes(genes: &[GeneRecord], strs: Option<&ChromStrs>, config: &Config) -> BatchOutcome {
    let mut batch = BatchOutcome::new();
    for record in genes {
        batch.push(
            &record.gene_id,
            aggregate_record(record, strs, &config.regions),
        );
    }
    batch
}

/// Run totals folded from each written batch.
#[derive(Default)]
struct RunTotals {
    lines_written: usize,
    summary: BatchSummary,
    failures: IndexMap<String, GeneError>,
}

impl RunTotals {
    /// Write a batch's reports and keep its failures for the report file.
    fn consume<W: Write>(
        &mut self,
        writer: &mut W,
        batch: BatchOutcome,
        config: &Config,
    ) -> Result<()> {
        for report in &batch.reports {
            self.lines_written += write_report(writer, report, config.format, &config.regions)?;
        }
        self.summary.merge(&batch.summary());
        self.failures.extend(batch.failures);
        Ok(())
    }
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Sequential implementation, one chromosome at a time.
fn run_sequential(
    args: &Args,
    gtf_data: GtfData,
    index: &StrIndex,
    config: &Config,
) -> Result<(BatchSummary, IndexMap<String, GeneError>)> {
    info!("Writing output to: {}", args.output.display());
    let mut writer = create_output(&args.output)?;
    write_header(&mut writer, config.format, &config.regions)?;

    let mut totals = RunTotals::default();
    for (chrom, genes) in &gtf_data.genes_by_chrom {
        let strs = index.chromosome(chrom);
        let batch = process_genes(genes, strs, config);
        totals.consume(&mut writer, batch, config)?;
        info!("Processed chromosome {}", chrom);
    }

    writer.flush()?;
    info!("Wrote {} lines", totals.lines_written);
    Ok((totals.summary, totals.failures))
}

/// Work item for the parallel pipeline.
struct WorkItem {
    /// Sequence number for ordering (GTF order).
    seq_id: u64,
    chrom: String,
    /// Genes to process, all from `chrom`, in file order.
    genes: Vec<GeneRecord>,
    /// Whether this is the final batch of `chrom`.
    last_of_chrom: bool,
}

/// Result from processing a work item.
struct WorkResult {
    /// Sequence number matching the input WorkItem.
    seq_id: u64,
    chrom: String,
    batch: BatchOutcome,
    last_of_chrom: bool,
}

/// Parallel implementation.
///
/// The producer cuts each chromosome into batches of genes, workers
/// aggregate batches independently and the writer restores GTF order, so the
/// output is identical to the sequential path.
fn run_parallel(
    args: &Args,
    gtf_data: GtfData,
    index: StrIndex,
    config: &Config,
    num_threads: usize,
) -> Result<(BatchSummary, IndexMap<String, GeneError>)> {
    info!("Using parallel mode with {} threads", num_threads);

    let (work_tx, work_rx): (Sender<WorkItem>, Receiver<WorkItem>) = bounded(100);
    let (result_tx, result_rx): (Sender<WorkResult>, Receiver<WorkResult>) = bounded(1000);

    let index_arc = Arc::new(index);
    let config_arc = Arc::new(config.clone());

    // The writer owns the output file; opening it here surfaces errors early
    info!("Writing output to: {}", args.output.display());
    let writer = create_output(&args.output)?;
    let writer_handle = thread::spawn({
        let config = Arc::clone(&config_arc);
        move || write_results_ordered(writer, result_rx, &config)
    });

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to create thread pool")?;

    let workers_handle = thread::spawn({
        let index = Arc::clone(&index_arc);
        let config = Arc::clone(&config_arc);
        move || {
            pool.scope(|s| {
                for _ in 0..num_threads {
                    let work_rx = work_rx.clone();
                    let result_tx = result_tx.clone();
                    let index = Arc::clone(&index);
                    let config = Arc::clone(&config);

                    s.spawn(move |_| {
                        worker_loop(work_rx, result_tx, &index, &config);
                    });
                }
            });
        }
    });

    // Producer: batches of genes, chromosome by chromosome
    let mut seq_id = 0;
    'produce: for (chrom, genes) in gtf_data.genes_by_chrom {
        let mut remaining = genes;
        loop {
            let rest = if remaining.len() > config.batch_size {
                remaining.split_off(config.batch_size)
            } else {
                Vec::new()
            };
            let work_item = WorkItem {
                seq_id,
                chrom: chrom.clone(),
                genes: remaining,
                last_of_chrom: rest.is_empty(),
            };
            if work_tx.send(work_item).is_err() {
                break 'produce;
            }
            seq_id += 1;

            if rest.is_empty() {
                break;
            }
            remaining = rest;
        }
    }

    // Close work channel to signal workers to exit
    drop(work_tx);

    workers_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Worker thread panicked"))?;

    let totals = writer_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Writer thread panicked"))??;

    info!("Wrote {} lines", totals.lines_written);
    Ok((totals.summary, totals.failures))
}

/// Worker loop: receives work items and sends results.
fn worker_loop(
    work_rx: Receiver<WorkItem>,
    result_tx: Sender<WorkResult>,
    index: &StrIndex,
    config: &Config,
) {
    while let Ok(item) = work_rx.recv() {
        let strs = index.chromosome(&item.chrom);
        let batch = process_genes(&item.genes, strs, config);

        let result = WorkResult {
            seq_id: item.seq_id,
            chrom: item.chrom,
            batch,
            last_of_chrom: item.last_of_chrom,
        };
        if result_tx.send(result).is_err() {
            break;
        }
    }
}

/// Write results in order, buffering out-of-order results.
fn write_results_ordered<W: Write>(
    mut writer: W,
    result_rx: Receiver<WorkResult>,
    config: &Config,
) -> Result<RunTotals> {
    write_header(&mut writer, config.format, &config.regions)?;

    let mut pending: BTreeMap<u64, WorkResult> = BTreeMap::new();
    let mut next_expected: u64 = 0;
    let mut totals = RunTotals::default();

    for result in result_rx {
        pending.insert(result.seq_id, result);

        while let Some(ready) = pending.remove(&next_expected) {
            totals.consume(&mut writer, ready.batch, config)?;
            if ready.last_of_chrom {
                info!("Processed chromosome {}", ready.chrom);
            }
            next_expected += 1;
        }
    }

    writer.flush()?;
    Ok(totals)
}

fn write_failure_report(path: &Path, failures: &IndexMap<String, GeneError>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create failure report {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_failures(&mut writer, failures)?;
    writer.flush()?;
    info!(
        "Wrote {} failed genes to {}",
        failures.len(),
        path.display()
    );
    Ok(())
}
