//! Configuration and defaults for strdensity.
//!
//! This module contains the configuration structure and default values
//! that control which regions are measured and how input is read.

use crate::types::{OutputFormat, RegionType, ALL_REGION_TYPES};

/// Gene name used when a GTF record carries none.
pub const UNKNOWN_GENE_NAME: &str = "Unknown_Gene";

/// Configuration for a density run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Region types to report, in output order.
    pub regions: Vec<RegionType>,
    /// Results table layout.
    pub format: OutputFormat,
    /// GTF tag for gene ID.
    pub gene_id_tag: String,
    /// GTF tag for gene name.
    pub gene_name_tag: String,
    /// GTF tag for transcript ID.
    pub transcript_id_tag: String,
    /// Worker threads (0 = one per CPU).
    pub threads: usize,
    /// Genes per work item in the parallel pipeline.
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            regions: ALL_REGION_TYPES.to_vec(),
            format: OutputFormat::Long,
            gene_id_tag: "gene_id".to_string(),
            gene_name_tag: "gene_name".to_string(),
            transcript_id_tag: "transcript_id".to_string(),
            threads: 0,
            batch_size: 500,
        }
    }
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the region list from a comma-separated string.
    ///
    /// Returns false (and leaves the config unchanged) on an unknown or
    /// repeated name, or an empty list.
    pub fn parse_regions(&mut self, regions_str: &str) -> bool {
        let mut new_regions = Vec::new();

        for tag in regions_str.split(',') {
            match tag.parse::<RegionType>() {
                Ok(region) if !new_regions.contains(&region) => new_regions.push(region),
                _ => return false,
            }
        }

        if new_regions.is_empty() {
            return false;
        }
        self.regions = new_regions;
        true
    }

    /// Thread count to actually use.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}
