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

use crate::Category;
use crate::Options;
use crate::Run;
use crate::error::PastaError;

/// Format the GFF header
pub fn format_gff_header<W: Write>(
    options: &Options,
    conn: &mut W,
) -> Result<(), PastaError> {
    writeln!(conn, "## genome-build {}", options.reference_name)?;
    if let Some(date) = &options.date {
        writeln!(conn, "# File creation date: {}", date)?;
    }
    writeln!(conn, "#>chrom\tsource\tvartype\tbegin\tend\t.\t+\t.\tseq")?;
    Ok(())
}

fn variant_type(
    run: &Run,
) -> &'static str {
    let same_length = run.alleles.iter().all(|x| x.len() == run.refseq.len());
    match (same_length, run.refseq.len()) {
        (true, 1) => "SNP",
        (true, _) => "SUB",
        (false, _) => "INDEL",
    }
}

fn or_dash(
    seq: &[u8],
) -> String {
    if seq.is_empty() {
        "-".to_string()
    } else {
        String::from_utf8_lossy(seq).to_string()
    }
}

/// Format a single run in GFF format
///
/// Writes bytes containing the formatted line containing the contents of
/// `run` to `conn`. No-call lines are commented out. Coordinates are 1-based
/// and inclusive, so an insertion ends one base before it begins.
///
pub fn format_gff_line<W: Write>(
    run: &Run,
    options: &Options,
    conn: &mut W,
) -> Result<(), PastaError> {
    let (prefix, vartype, seq) = match run.category {
        Category::Reference => ("", "REF", ".".to_string()),
        Category::NoCall => ("#", "NOC", ".".to_string()),
        Category::Alt => {
            let alleles = run.alleles.iter().map(|x| or_dash(x)).collect::<Vec<String>>().join("/");
            ("", variant_type(run), format!("alleles {};ref_allele {}", alleles, or_dash(&run.refseq)))
        },
    };

    writeln!(conn, "{}{}\t{}\t{}\t{}\t{}\t.\t+\t.\t{}",
             prefix, run.chrom, options.source, vartype,
             run.start + 1, run.end(), seq)?;
    Ok(())
}
