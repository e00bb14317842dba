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

/// Read the genotype of the first sample
///
/// Returns one allele index per track, None for `.`. If fewer indexes than
/// `ploidy` are given the last one fills the remaining tracks.
///
pub fn read_genotype<W: Write>(
    format: &str,
    sample: &str,
    builder: &StreamBuilder<W>,
) -> Result<Vec<Option<usize>>, PastaError> {
    let ploidy = builder.ploidy();
    let gt_idx = format.split(':').position(|x| x == "GT").ok_or_else(|| builder.error(format!("no GT in FORMAT '{}'", format)))?;
    let gt = sample.split(':').nth(gt_idx).ok_or_else(|| builder.error(format!("no GT in sample '{}'", sample)))?;

    let mut indexes = gt.split(|c: char| c == '/' || c == '|').map(|x| {
        if x == "." {
            Ok(None)
        } else {
            x.parse::<usize>().map(Some).map_err(|_| builder.error(format!("invalid GT '{}'", gt)))
        }
    }).collect::<Result<Vec<Option<usize>>, PastaError>>()?;

    if indexes.len() > ploidy {
        return Err(PastaError::PloidyMismatch { ploidy, alleles: indexes.len() });
    }
    let last = indexes.last().copied().flatten();
    indexes.resize(ploidy, last);

    Ok(indexes)
}

fn read_end<W: Write>(
    info: &str,
    builder: &StreamBuilder<W>,
) -> Result<Option<u64>, PastaError> {
    info.split(';').find_map(|x| x.strip_prefix("END=")).map(|x| {
        x.parse::<u64>().map_err(|_| builder.error(format!("invalid END '{}'", x)))
    }).transpose()
}

/// Parse a line from gVCF
///
/// Reads a record with a single sample and writes its symbols to `builder`.
/// Header lines and empty lines are skipped.
///
/// Records with a homozygous reference genotype cover `POS` to `END` with
/// reference symbols, records with a missing genotype with no-call symbols.
/// Other records must have a REF spanning `POS` to `END` and are written as
/// the alignment of REF with the genotyped alleles.
///
pub fn read_vcf_line<W: Write>(
    line: &[u8],
    builder: &mut StreamBuilder<W>,
) -> Result<(), PastaError> {
    if line.trim().is_empty() || line.starts_with(b"#") {
        return Ok(())
    }

    let line = line.to_str().map_err(|_| builder.error("line is not valid UTF-8"))?;
    let fields = line.split('\t').collect::<Vec<&str>>();
    if fields.len() < 10 {
        return Err(builder.error(format!("expected at least 10 columns, found {}", fields.len())));
    }

    let pos = fields[1].parse::<u64>().ok().filter(|x| *x > 0).ok_or_else(|| builder.error(format!("invalid POS '{}'", fields[1])))?;
    let refseq = fields[3].to_ascii_lowercase().into_bytes();
    if refseq.is_empty() || refseq == b"." {
        return Err(builder.error("REF is empty"));
    }
    let alternates: Vec<Vec<u8>> = match fields[4] {
        "." => Vec::new(),
        alt => alt.split(',').map(|x| x.to_ascii_lowercase().into_bytes()).collect(),
    };

    let end = match read_end(fields[7], builder)? {
        Some(end) => end,
        None => pos.checked_add(refseq.len() as u64 - 1).ok_or_else(|| builder.error(format!("REF at POS {} ends past the last position", pos)))?,
    };
    if end < pos {
        return Err(builder.error(format!("END {} is before POS {}", end, pos)));
    }
    let span = end - pos + 1;

    let genotype = read_genotype(fields[8], fields[9], builder)?;

    builder.start_record(fields[0], pos - 1)?;
    if genotype.iter().all(|x| *x == Some(0)) {
        builder.check_reference(&refseq[..1])?;
        builder.reference_span(span)
    } else if genotype.iter().any(|x| x.is_none()) {
        builder.check_reference(&refseq[..1])?;
        builder.nocall_span(span)
    } else {
        if refseq.len() as u64 != span {
            return Err(builder.error(format!("REF has {} bases but the record spans {}", refseq.len(), span)));
        }
        let alleles = genotype.iter().flatten().map(|idx| match idx {
            0 => Ok(refseq.clone()),
            _ => alternates.get(idx - 1).cloned().ok_or_else(|| builder.error(format!("GT index {} has no ALT", idx))),
        }).collect::<Result<Vec<Vec<u8>>, PastaError>>()?;
        builder.aligned(&refseq, &alleles)
    }
}

// Tests
#[cfg(test)]
mod tests {

    fn encode_vcf(data: &[u8], reference: &[u8], ploidy: usize) -> Result<Vec<u8>, crate::error::PastaError> {
        use crate::parser::{parse_into, StreamBuilder};
        use crate::printer::pasta::PastaWriter;
        use crate::reference::Reference;
        use crate::{Format, Options};
        use std::io::Cursor;

        let mut seqs = Reference::default();
        seqs.insert("chr1", reference);
        let options = Options { ploidy, line_width: 0, ..Default::default() };

        let mut input: Cursor<Vec<u8>> = Cursor::new(data.to_vec());
        let mut out: Vec<u8> = Vec::new();
        let mut builder = StreamBuilder::new(PastaWriter::new(&mut out, 0), &seqs, &options);
        parse_into(&Format::Vcf, &mut input, &mut builder)?;
        builder.finish()?;
        Ok(out)
    }

    #[test]
    fn read_reference_block_and_snp() {
        let mut data: Vec<u8> = b"##fileformat=VCFv4.1\n".to_vec();
        data.append(&mut b"#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n".to_vec());
        data.append(&mut b"chr1\t1\t.\tA\t.\t.\tPASS\tEND=3\tGT\t0/0\n".to_vec());
        data.append(&mut b"chr1\t4\t.\tT\tC\t.\tPASS\tEND=4\tGT\t1/0\n".to_vec());

        let got = encode_vcf(&data, b"ACGTA", 2).unwrap();

        assert_eq!(got, b">C{chr1}\naaccgg+t\n".to_vec());
    }

    #[test]
    fn read_insertion_and_nocall() {
        let mut data: Vec<u8> = b"chr1\t1\t.\tA\tAGG\t.\tPASS\tEND=1\tGT\t0/1\n".to_vec();
        data.append(&mut b"chr1\t2\t.\tC\t.\t.\tNOCALL\tEND=3\tGT\t./.\n".to_vec());

        let got = encode_vcf(&data, b"ACGTA", 2).unwrap();

        assert_eq!(got, b">C{chr1}\naa.W.WCCGG\n".to_vec());
    }

    #[test]
    fn read_end_defaults_to_ref_length() {
        let data: Vec<u8> = b"chr1\t2\t.\tCG\tC\t.\tPASS\t.\tGT:DP\t1/1:30\n".to_vec();

        let got = encode_vcf(&data, b"ACGTA", 2).unwrap();

        // no-call for 'A', then 'C' kept and 'G' deleted on both tracks
        assert_eq!(got, b">C{chr1}\nAAcc77\n".to_vec());
    }

    #[test]
    fn read_haploid_genotype_filled() {
        let data: Vec<u8> = b"chr1\t1\t.\tA\tG\t.\tPASS\tEND=1\tGT\t1\n".to_vec();

        let got = encode_vcf(&data, b"ACGTA", 3).unwrap();

        assert_eq!(got, b">C{chr1}\n???\n".to_vec());
    }

    #[test]
    fn read_reference_mismatch() {
        use crate::error::PastaError;

        let data: Vec<u8> = b"chr1\t1\t.\tC\t.\t.\tPASS\tEND=2\tGT\t0/0\n".to_vec();

        let got = encode_vcf(&data, b"ACGTA", 2);

        assert!(matches!(got, Err(PastaError::ReferenceMismatch { offset: 0, expected: b'a', found: b'c' })));
    }

    #[test]
    fn read_too_many_alleles() {
        use crate::error::PastaError;

        let data: Vec<u8> = b"chr1\t1\t.\tA\tG,T\t.\tPASS\tEND=1\tGT\t0/1/2\n".to_vec();

        let got = encode_vcf(&data, b"ACGTA", 2);

        assert!(matches!(got, Err(PastaError::PloidyMismatch { ploidy: 2, alleles: 3 })));
    }

    #[test]
    fn read_malformed_lines() {
        use crate::error::PastaError;

        let short: Vec<u8> = b"chr1\t1\t.\tA\n".to_vec();
        assert!(matches!(encode_vcf(&short, b"ACGTA", 2), Err(PastaError::Format { line: 1, .. })));

        let no_gt: Vec<u8> = b"\nchr1\t1\t.\tA\t.\t.\tPASS\tEND=1\tDP\t30\n".to_vec();
        assert!(matches!(encode_vcf(&no_gt, b"ACGTA", 2), Err(PastaError::Format { line: 2, .. })));

        let bad_index: Vec<u8> = b"chr1\t1\t.\tA\tG\t.\tPASS\tEND=1\tGT\t0/2\n".to_vec();
        assert!(matches!(encode_vcf(&bad_index, b"ACGTA", 2), Err(PastaError::Format { line: 1, .. })));
    }
}
