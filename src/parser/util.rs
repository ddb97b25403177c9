//! Utility functions for file parsing.

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Open an input file for buffered line reading, decompressing `.gz` files.
///
/// bgzip output (as used for tabix-indexed BED files) is a series of gzip
/// members, so the multi-member decoder is used.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz" || ext == "bgz")
}
