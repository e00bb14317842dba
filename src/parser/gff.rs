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

use bstr::ByteSlice;

use crate::error::PastaError;
use crate::parser::StreamBuilder;

fn as_sequence(
    allele: &str,
) -> Vec<u8> {
    if allele == "-" {
        Vec::new()
    } else {
        allele.to_ascii_lowercase().into_bytes()
    }
}

fn attribute<'a, W: Write>(
    seq: &'a str,
    key: &str,
    builder: &StreamBuilder<W>,
) -> Result<&'a str, PastaError> {
    seq.split(';')
       .find_map(|x| x.trim().strip_prefix(key).and_then(|x| x.strip_prefix(' ')))
       .map(|x| x.trim())
       .ok_or_else(|| builder.error(format!("no '{}' in '{}'", key, seq)))
}

/// Read the `alleles` attribute
///
/// Alleles are separated by `/` or `|`, `-` is an empty allele. A single
/// allele is used for every track.
///
pub fn read_alleles<W: Write>(
    seq: &str,
    builder: &StreamBuilder<W>,
) -> Result<Vec<Vec<u8>>, PastaError> {
    let value = attribute(seq, "alleles", builder)?;
    if value.contains('/') && value.contains('|') {
        return Err(builder.error(format!("alleles '{}' mix '/' and '|'", value)));
    }

    let alleles = value.split(|c: char| c == '/' || c == '|').map(as_sequence).collect::<Vec<Vec<u8>>>();
    if alleles.len() == 1 {
        return Ok(vec![alleles[0].clone(); builder.ploidy()])
    }
    Ok(alleles)
}

/// Read the `ref_allele` attribute
pub fn read_ref_allele<W: Write>(
    seq: &str,
    builder: &StreamBuilder<W>,
) -> Result<Vec<u8>, PastaError> {
    attribute(seq, "ref_allele", builder).map(as_sequence)
}

/// Parse a line from GFF
///
/// Reads a variant line and writes its symbols to `builder`. Empty lines and
/// lines starting with `#` or `>` are skipped, so commented no-call lines
/// are filled in as gaps between records.
///
pub fn read_gff_line<W: Write>(
    line: &[u8],
    builder: &mut StreamBuilder<W>,
) -> Result<(), PastaError> {
    if line.trim().is_empty() || line.starts_with(b"#") || line.starts_with(b">") {
        return Ok(())
    }

    let line = line.to_str().map_err(|_| builder.error("line is not valid UTF-8"))?;
    let fields = line.split('\t').collect::<Vec<&str>>();
    if fields.len() < 9 {
        return Err(builder.error(format!("expected 9 columns, found {}", fields.len())));
    }

    let begin = fields[3].parse::<u64>().ok().filter(|x| *x > 0).ok_or_else(|| builder.error(format!("invalid begin '{}'", fields[3])))?;
    let end = fields[4].parse::<u64>().map_err(|_| builder.error(format!("invalid end '{}'", fields[4])))?;
    if end < begin - 1 {
        return Err(builder.error(format!("end {} is before begin {}", end, begin)));
    }
    let span = end - (begin - 1);

    builder.start_record(fields[0], begin - 1)?;
    match fields[2] {
        "REF" => builder.reference_span(span),
        "NOC" => builder.nocall_span(span),
        _ => {
            let refseq = read_ref_allele(fields[8], builder)?;
            let alleles = read_alleles(fields[8], builder)?;
            if refseq.len() as u64 != span {
                return Err(builder.error(format!("ref_allele has {} bases but the line spans {}", refseq.len(), span)));
            }
            builder.aligned(&refseq, &alleles)
        },
    }
}
