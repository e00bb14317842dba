// pasta: Per-position variant symbol streams and conversion to and from gVCF and GFF.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use std::io::Write;

use crate::Options;
use crate::VariantRecord;
use crate::error::PastaError;

/// Format the gVCF header
///
/// Writes the meta-information lines and the column header line to `conn`.
/// The `##fileDate` line is only written if [Options::date] is set.
///
pub fn format_vcf_header<W: Write>(
    options: &Options,
    conn: &mut W,
) -> Result<(), PastaError> {
    writeln!(conn, "##fileformat=VCFv4.1")?;
    if let Some(date) = &options.date {
        writeln!(conn, "##fileDate={}", date)?;
    }
    writeln!(conn, "##source=\"{}\"", options.source)?;
    writeln!(conn, "##reference=\"{}\"", options.reference_name)?;
    writeln!(conn, "##FILTER=<ID=NOCALL,Description=\"Some or all of this record had no sequence calls\">")?;
    writeln!(conn, "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">")?;
    writeln!(conn, "##INFO=<ID=END,Number=1,Type=Integer,Description=\"Stop position of the interval\">")?;
    writeln!(conn, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE")?;
    Ok(())
}

/// Format a single record in gVCF format
///
/// Writes bytes containing the formatted line containing the contents of
/// `record` to `conn`. Bases are written in uppercase.
///
pub fn format_vcf_line<W: Write>(
    record: &VariantRecord,
    conn: &mut W,
) -> Result<(), PastaError> {
    let alt = if record.alternates.is_empty() {
        ".".to_string()
    } else {
        record.alternates.iter().map(|x| String::from_utf8_lossy(x).to_uppercase()).collect::<Vec<String>>().join(",")
    };

    writeln!(conn, "{}\t{}\t.\t{}\t{}\t.\t{}\t{}\tGT\t{}",
             record.chrom, record.pos,
             String::from_utf8_lossy(&record.reference).to_uppercase(), alt,
             record.filter, record.info, record.genotype)?;
    Ok(())
}
