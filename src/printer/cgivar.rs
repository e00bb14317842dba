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

/// Column names of a CGI var file
pub const COLUMNS: [&str; 16] = [
    "locus", "ploidy", "allele", "chromosome", "begin", "end", "varType", "reference",
    "alleleSeq", "varScoreVAF", "varScoreEAF", "varFilter", "hapLink", "xRef", "alleleFreq",
    "alternativeCalls",
];

struct CgiVarLine<'a> {
    allele: String,
    begin: u64,
    end: u64,
    vartype: &'a str,
    reference: &'a [u8],
    allele_seq: &'a [u8],
    filter: &'a str,
}

/// Format the CGI var header
pub fn format_cgivar_header<W: Write>(
    options: &Options,
    conn: &mut W,
) -> Result<(), PastaError> {
    writeln!(conn, "#GENERATED_BY\tpasta")?;
    if let Some(date) = &options.date {
        writeln!(conn, "#GENERATED_AT\t{}", date)?;
    }
    writeln!(conn, "#SOFTWARE_VERSION\t{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(conn, "#FORMAT_VERSION\t2.5")?;
    writeln!(conn, "#TYPE\tVAR-ANNOTATION")?;
    writeln!(conn)?;
    writeln!(conn, ">{}", COLUMNS.join("\t"))?;
    Ok(())
}

fn write_line<W: Write>(
    run: &Run,
    locus: usize,
    line: &CgiVarLine,
    conn: &mut W,
) -> Result<(), PastaError> {
    writeln!(conn, "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t\t\t{}\t\t\t\t",
             locus, run.alleles.len().max(1), line.allele, run.chrom,
             line.begin, line.end, line.vartype,
             String::from_utf8_lossy(line.reference).to_ascii_uppercase(),
             String::from_utf8_lossy(line.allele_seq).to_ascii_uppercase(),
             line.filter)?;
    Ok(())
}

/// First index in `from..shared` where `same` fails, or `shared`.
fn extend(
    from: usize,
    shared: usize,
    same: impl Fn(usize) -> bool,
) -> usize {
    (from..shared).find(|idx| !same(*idx)).unwrap_or(shared)
}

fn all_alleles(
    run: &Run,
    vartype: &'static str,
    allele_seq: &'static [u8],
    filter: &'static str,
) -> CgiVarLine<'static> {
    CgiVarLine {
        allele: "all".to_string(),
        begin: run.start,
        end: run.end(),
        vartype,
        reference: b"=",
        allele_seq,
        filter,
    }
}

fn format_allele<W: Write>(
    run: &Run,
    locus: usize,
    index: usize,
    conn: &mut W,
) -> Result<(), PastaError> {
    let refseq = &run.refseq;
    let allele = &run.alleles[index];
    let shared = refseq.len().min(allele.len());
    let name = (index + 1).to_string();

    let mut idx = 0;
    while idx < shared {
        let (vartype, next) = if allele[idx] == b'n' {
            ("no-call", extend(idx, shared, |x| allele[x] == b'n'))
        } else if allele[idx] == refseq[idx] {
            ("ref", extend(idx, shared, |x| allele[x] == refseq[x] && allele[x] != b'n'))
        } else {
            let next = extend(idx, shared, |x| allele[x] != refseq[x] && allele[x] != b'n');
            (if next - idx == 1 { "snp" } else { "sub" }, next)
        };

        let (reference, allele_seq): (&[u8], &[u8]) = match vartype {
            "no-call" => (&refseq[idx..next], &b"?"[..]),
            "ref" => (&b"="[..], &b"="[..]),
            _ => (&refseq[idx..next], &allele[idx..next]),
        };
        let line = CgiVarLine {
            allele: name.clone(),
            begin: run.start + idx as u64,
            end: run.start + next as u64,
            vartype, reference, allele_seq,
            filter: "",
        };
        write_line(run, locus, &line, conn)?;
        idx = next;
    }

    let tail = if allele.len() > shared {
        Some(("ins", run.start + shared as u64, &b""[..], &allele[shared..]))
    } else if refseq.len() > shared {
        Some(("del", run.end(), &refseq[shared..], &b""[..]))
    } else {
        None
    };
    if let Some((vartype, end, reference, allele_seq)) = tail {
        let line = CgiVarLine {
            allele: name,
            begin: run.start + shared as u64,
            end,
            vartype, reference, allele_seq,
            filter: "",
        };
        write_line(run, locus, &line, conn)?;
    }
    Ok(())
}

/// Format a single run in CGI var format
///
/// Writes the lines of locus number `locus` to `conn`. Coordinates are
/// 0-based and half-open. Reference runs and runs without sequence are
/// written as a single line for all alleles, other runs are split per allele
/// into no-call, ref, snp, sub and a trailing ins or del.
///
pub fn format_cgivar_run<W: Write>(
    run: &Run,
    locus: usize,
    conn: &mut W,
) -> Result<(), PastaError> {
    match run.category {
        Category::Reference => write_line(run, locus, &all_alleles(run, "ref", b"=", "PASS"), conn),
        _ if run.is_elided() => write_line(run, locus, &all_alleles(run, "no-call", b"?", ""), conn),
        _ => {
            (0..run.alleles.len()).try_for_each(|index| format_allele(run, locus, index, conn))
        },
    }
}
