//! GTF file parser with gzip support.
//!
//! Parses GTF (Gene Transfer Format) annotation files into raw gene records
//! grouped by chromosome. Coordinates are kept one-based inclusive; the
//! engine converts them when a gene is validated.

use ahash::AHashMap;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::io::BufRead;
use std::path::Path;

use crate::config::{Config, UNKNOWN_GENE_NAME};
use crate::coords::{Convention, RawInterval};
use crate::parser::util::open_input;
use crate::records::{GeneRecord, TranscriptRecord};
use crate::types::Strand;

/// Result of parsing a GTF file.
#[derive(Debug, Clone, Default)]
pub struct GtfData {
    /// Gene records per chromosome, both in order of first appearance.
    pub genes_by_chrom: IndexMap<String, Vec<GeneRecord>>,
}

impl GtfData {
    pub fn gene_count(&self) -> usize {
        self.genes_by_chrom.values().map(|g| g.len()).sum()
    }
}

/// Parse a GTF file and return its gene records.
///
/// Supports both plain text and gzip-compressed GTF files.
pub fn parse_gtf(path: &Path, config: &Config) -> Result<GtfData> {
    let reader = open_input(path)?;
    let data = parse_gtf_reader(reader, config)?;
    info!(
        "Parsed {} genes on {} chromosomes from {}",
        data.gene_count(),
        data.genes_by_chrom.len(),
        path.display()
    );
    Ok(data)
}

/// Parse GTF data from a reader.
fn parse_gtf_reader<R: BufRead>(reader: R, config: &Config) -> Result<GtfData> {
    let mut all_genes: IndexMap<String, GeneRecord> = IndexMap::new();
    // (gene_id, transcript_id) -> index in the gene's transcripts
    let mut all_transcripts: AHashMap<(String, String), usize> = AHashMap::new();
    let mut skipped = 0usize;

    for (line_idx, line_result) in reader.lines().enumerate() {
        let line_number = line_idx + 1;
        let line = line_result.with_context(|| format!("Failed to read GTF line {}", line_number))?;

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 {
            continue;
        }

        let feature_type = fields[2];
        if !matches!(feature_type, "gene" | "transcript" | "exon") {
            continue;
        }

        let chrom = fields[0];
        let start: i64 = fields[3]
            .parse()
            .with_context(|| format!("Failed to parse start coordinate on line {}", line_number))?;
        let end: i64 = fields[4]
            .parse()
            .with_context(|| format!("Failed to parse end coordinate on line {}", line_number))?;

        let strand = match fields[6].parse::<Strand>() {
            Ok(s) => s,
            Err(_) => {
                debug!("Skipping GTF line {}: bad strand {:?}", line_number, fields[6]);
                skipped += 1;
                continue;
            }
        };

        let attributes = parse_attributes(fields[8]);
        let Some(gene_id) = attributes.get(config.gene_id_tag.as_str()) else {
            debug!("Skipping GTF line {}: no {}", line_number, config.gene_id_tag);
            skipped += 1;
            continue;
        };

        let interval = RawInterval::new(chrom, start, end, Convention::OneBasedInclusive)
            .with_strand(strand);

        let gene = all_genes
            .entry(gene_id.to_string())
            .or_insert_with(|| GeneRecord::new(*gene_id, UNKNOWN_GENE_NAME, chrom, strand));
        if let Some(name) = attributes.get(config.gene_name_tag.as_str()) {
            if gene.gene_name == UNKNOWN_GENE_NAME {
                gene.gene_name = name.to_string();
            }
        }

        if feature_type == "gene" {
            gene.span = Some(interval);
            continue;
        }

        let Some(transcript_id) = attributes.get(config.transcript_id_tag.as_str()) else {
            debug!("Skipping GTF line {}: no {}", line_number, config.transcript_id_tag);
            skipped += 1;
            continue;
        };

        let transcript_idx = *all_transcripts
            .entry((gene_id.to_string(), transcript_id.to_string()))
            .or_insert_with(|| {
                gene.transcripts
                    .push(TranscriptRecord::new(*transcript_id, Vec::new()));
                gene.transcripts.len() - 1
            });

        if feature_type == "exon" {
            gene.transcripts[transcript_idx].exons.push(interval);
        }
    }

    if skipped > 0 {
        warn!("Skipped {} GTF records without usable strand or ids", skipped);
    }

    let mut genes_by_chrom: IndexMap<String, Vec<GeneRecord>> = IndexMap::new();
    for (_, gene) in all_genes {
        genes_by_chrom
            .entry(gene.chrom.clone())
            .or_default()
            .push(gene);
    }

    Ok(GtfData { genes_by_chrom })
}

/// Split a GTF attribute column into key/value pairs.
///
/// Attributes look like `key "value"; key "value"; key 3;`. Quotes are
/// removed; the first occurrence of a key wins.
fn parse_attributes(attributes: &str) -> AHashMap<&str, &str> {
    let mut map = AHashMap::new();
    for entry in attributes.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((key, value)) = entry.split_once(char::is_whitespace) else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        map.entry(key).or_insert(value);
    }
    map
}
