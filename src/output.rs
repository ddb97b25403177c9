//! Output formatting for strdensity results.
//!
//! This module writes result tables as CSV, in long form (one row per gene
//! and region type) or wide form (one row per gene), and the failure report.

use anyhow::Result;
use indexmap::IndexMap;

use std::borrow::Cow;
use std::io::Write;

use crate::engine::GeneReport;
use crate::error::GeneError;
use crate::types::{OutputFormat, OverlapResult, RegionType};

/// Written in place of an undefined density.
pub const UNDEFINED_DENSITY: &str = "NA";

const LONG_HEADER: &str =
    "gene_id,gene_name,region_type,overlap_bp,region_length_bp,str_loci_count,density";

/// Wide-layout column names for one region type.
fn wide_columns(region_type: RegionType) -> (&'static str, &'static str) {
    match region_type {
        RegionType::Body => ("total_gene_overlap", "gene_density"),
        RegionType::Exonic => ("total_exon_overlap", "exon_density"),
        RegionType::Intronic => ("total_intron_overlap", "intron_density"),
    }
}

/// Write the output header.
pub fn write_header<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    regions: &[RegionType],
) -> Result<()> {
    match format {
        OutputFormat::Long => writeln!(writer, "{}", LONG_HEADER)?,
        OutputFormat::Wide => {
            let mut header = String::from("gene_id,gene_name");
            for &region in regions {
                let (overlap, density) = wide_columns(region);
                header.push(',');
                header.push_str(overlap);
                header.push(',');
                header.push_str(density);
            }
            header.push_str(",str_types");
            writeln!(writer, "{}", header)?;
        }
    }
    Ok(())
}

/// Write every row of one gene report.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &GeneReport,
    format: OutputFormat,
    regions: &[RegionType],
) -> Result<usize> {
    match format {
        OutputFormat::Long => {
            for result in &report.results {
                writeln!(writer, "{}", format_long_line(result))?;
            }
            Ok(report.results.len())
        }
        OutputFormat::Wide => {
            writeln!(writer, "{}", format_wide_line(report, regions))?;
            Ok(1)
        }
    }
}

/// Format one long-layout row.
pub fn format_long_line(result: &OverlapResult) -> String {
    format!(
        "{},{},{},{},{},{},{}",
        csv_field(&result.gene_id),
        csv_field(&result.gene_name),
        result.region_type,
        result.overlap_bp,
        result.region_length_bp,
        result.str_loci_count,
        format_density(result.density)
    )
}

/// Format one wide-layout row; missing region types are left blank.
pub fn format_wide_line(report: &GeneReport, regions: &[RegionType]) -> String {
    let mut line = format!(
        "{},{}",
        csv_field(&report.gene_id),
        csv_field(&report.gene_name)
    );

    for &region in regions {
        match report.result(region) {
            Some(result) => {
                line.push_str(&format!(
                    ",{},{}",
                    result.overlap_bp,
                    format_density(result.density)
                ));
            }
            None => line.push_str(",,"),
        }
    }

    let str_types: Vec<String> = report
        .motif_classes
        .iter()
        .map(|(class, count)| format!("{}:{}", class, count))
        .collect();
    line.push(',');
    line.push_str(&str_types.join(";"));

    line
}

/// Six decimals, or [`UNDEFINED_DENSITY`].
pub fn format_density(density: Option<f64>) -> String {
    match density {
        Some(d) => format!("{:.6}", d),
        None => UNDEFINED_DENSITY.to_string(),
    }
}

/// Write the `gene_id,reason` failure report.
pub fn write_failures<W: Write>(
    writer: &mut W,
    failures: &IndexMap<String, GeneError>,
) -> Result<()> {
    writeln!(writer, "gene_id,kind,reason")?;
    for (gene_id, err) in failures {
        writeln!(
            writer,
            "{},{},{}",
            csv_field(gene_id),
            err.kind(),
            csv_field(&err.to_string())
        )?;
    }
    Ok(())
}

/// Quote a field if it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
