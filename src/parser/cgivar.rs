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
use crate::symbol::encode_bytes;

// Lines of one locus, one symbol track per allele
struct Locus {
    id: String,
    chrom: String,
    begin: u64,
    end: u64,
    tracks: Vec<Vec<u8>>,
    covered: Vec<u64>,
}

/// Reads CGI var lines
///
/// A locus spans several lines, so lines are buffered until the locus
/// number changes. Call [finish](CgiVarReader::finish) after the last line.
///
#[derive(Default)]
pub struct CgiVarReader {
    locus: Option<Locus>,
}

fn nocall_symbols<W: Write>(
    builder: &StreamBuilder<W>,
    chrom: &str,
    from: u64,
    to: u64,
) -> Result<Vec<u8>, PastaError> {
    builder.reference_bases(chrom, from, to - from)?.into_iter().map(|base| encode_bytes(base, b'n')).collect()
}

fn allele_sequence<W: Write>(
    vartype: &str,
    reference: &str,
    allele_seq: &str,
    refseq: &[u8],
    begin: u64,
    builder: &StreamBuilder<W>,
) -> Result<Vec<u8>, PastaError> {
    match vartype {
        "ref" => return Ok(refseq.to_vec()),
        "no-call" | "no-ref" => return Ok(vec![b'n'; refseq.len()]),
        _ => (),
    }

    if !reference.is_empty() && reference != "=" {
        if reference.len() != refseq.len() {
            return Err(builder.error(format!("reference '{}' does not span {} bases", reference, refseq.len())));
        }
        for (idx, (found, expected)) in reference.bytes().zip(refseq.iter()).enumerate() {
            let found = found.to_ascii_lowercase();
            if found != *expected && found != b'n' && *expected != b'n' {
                return Err(PastaError::ReferenceMismatch { offset: (begin + idx as u64) as usize, expected: *expected, found });
            }
        }
    }

    if allele_seq == "=" {
        return Ok(refseq.to_vec())
    }
    Ok(allele_seq.bytes().map(|x| if x == b'?' { b'n' } else { x.to_ascii_lowercase() }).collect())
}

impl CgiVarReader {
    pub fn new() -> Self {
        CgiVarReader::default()
    }

    fn flush<W: Write>(
        &mut self,
        builder: &mut StreamBuilder<W>,
    ) -> Result<(), PastaError> {
        let Some(mut locus) = self.locus.take() else {
            return Ok(())
        };
        for (track, covered) in locus.tracks.iter_mut().zip(locus.covered.iter()) {
            if *covered < locus.end {
                track.extend(nocall_symbols(builder, &locus.chrom, *covered, locus.end)?);
            }
        }
        builder.start_record(&locus.chrom, locus.begin)?;
        builder.write_tracks(&locus.tracks)
    }

    /// Parse a line from CGI var
    ///
    /// Empty lines and lines starting with `#` or `>` are skipped. The
    /// allele column is `all` or a 1-based track number. Coordinates are
    /// 0-based and half-open.
    ///
    pub fn read_line<W: Write>(
        &mut self,
        line: &[u8],
        builder: &mut StreamBuilder<W>,
    ) -> Result<(), PastaError> {
        if line.trim().is_empty() || line.starts_with(b"#") || line.starts_with(b">") {
            return Ok(())
        }

        let line = line.to_str().map_err(|_| builder.error("line is not valid UTF-8"))?;
        let fields = line.split('\t').collect::<Vec<&str>>();
        if fields.len() < 9 {
            return Err(builder.error(format!("expected at least 9 columns, found {}", fields.len())));
        }

        let (id, chrom) = (fields[0], fields[3]);
        let begin = fields[4].parse::<u64>().map_err(|_| builder.error(format!("invalid begin '{}'", fields[4])))?;
        let end = fields[5].parse::<u64>().map_err(|_| builder.error(format!("invalid end '{}'", fields[5])))?;
        if end < begin {
            return Err(builder.error(format!("end {} is before begin {}", end, begin)));
        }

        let ploidy = builder.ploidy();
        let targets = match fields[2] {
            "all" => (0..ploidy).collect::<Vec<usize>>(),
            allele => {
                let allele = allele.parse::<usize>().ok().filter(|x| *x > 0).ok_or_else(|| builder.error(format!("invalid allele '{}'", allele)))?;
                if allele > ploidy {
                    return Err(PastaError::PloidyMismatch { ploidy, alleles: allele });
                }
                vec![allele - 1]
            },
        };

        let refseq = builder.reference_bases(chrom, begin, end - begin)?;
        let alleles = allele_sequence(fields[6], fields[7], fields[8], &refseq, begin, builder)?;
        let symbols = (0..refseq.len().max(alleles.len())).map(|idx| {
            encode_bytes(*refseq.get(idx).unwrap_or(&b'-'), *alleles.get(idx).unwrap_or(&b'-'))
        }).collect::<Result<Vec<u8>, PastaError>>()?;

        if self.locus.as_ref().is_some_and(|x| x.id != id) {
            self.flush(builder)?;
        }
        let locus = self.locus.get_or_insert_with(|| Locus {
            id: id.to_string(),
            chrom: chrom.to_string(),
            begin,
            end: begin,
            tracks: vec![Vec::new(); ploidy],
            covered: vec![begin; ploidy],
        });
        if locus.chrom != chrom {
            return Err(builder.error(format!("locus {} is on both '{}' and '{}'", id, locus.chrom, chrom)));
        }

        for target in targets {
            let covered = locus.covered[target];
            if begin < covered {
                return Err(builder.error(format!("allele {} of locus {} overlaps itself at {}", target + 1, id, begin)));
            }
            if begin > covered {
                let fill = nocall_symbols(builder, chrom, covered, begin)?;
                locus.tracks[target].extend(fill);
            }
            locus.tracks[target].extend_from_slice(&symbols);
            locus.covered[target] = end;
        }
        locus.end = locus.end.max(end);
        Ok(())
    }

    /// Write the last buffered locus.
    pub fn finish<W: Write>(
        &mut self,
        builder: &mut StreamBuilder<W>,
    ) -> Result<(), PastaError> {
        self.flush(builder)
    }
}

// Tests
#[cfg(test)]
mod tests {

    fn encode_cgivar(data: &[u8], ploidy: usize) -> Result<Vec<u8>, crate::error::PastaError> {
        use crate::parser::{parse_into, StreamBuilder};
        use crate::printer::pasta::PastaWriter;
        use crate::reference::Reference;
        use crate::{Format, Options};
        use std::io::Cursor;

        let mut seqs = Reference::default();
        seqs.insert("chr1", b"ACGTACGT");
        let options = Options { ploidy, ..Default::default() };

        let mut input: Cursor<Vec<u8>> = Cursor::new(data.to_vec());
        let mut out: Vec<u8> = Vec::new();
        let mut builder = StreamBuilder::new(PastaWriter::new(&mut out, 0), &seqs, &options);
        parse_into(&Format::CgiVar, &mut input, &mut builder)?;
        builder.finish()?;
        Ok(out)
    }

    #[test]
    fn read_cgivar_records() {
        let mut data: Vec<u8> = b"#GENERATED_BY\tpasta\n#TYPE\tVAR-ANNOTATION\n\n".to_vec();
        data.append(&mut b">locus\tploidy\tallele\tchromosome\tbegin\tend\tvarType\treference\talleleSeq\n".to_vec());
        data.append(&mut b"1\t2\tall\tchr1\t0\t2\tref\t=\t=\n".to_vec());
        data.append(&mut b"2\t2\t1\tchr1\t2\t3\tsnp\tG\tT\n".to_vec());
        data.append(&mut b"2\t2\t2\tchr1\t2\t3\tref\t=\t=\n".to_vec());
        data.append(&mut b"3\t2\tall\tchr1\t3\t5\tno-call\t=\t?\n".to_vec());
        data.append(&mut b"4\t2\t1\tchr1\t5\t5\tins\t\tTT\n".to_vec());
        data.append(&mut b"4\t2\t2\tchr1\t5\t5\tref\t=\t=\n".to_vec());
        data.append(&mut b"5\t2\tall\tchr1\t5\t6\tdel\tC\t\n".to_vec());

        let got = encode_cgivar(&data, 2).unwrap();

        assert_eq!(got, b">C{chr1}\naacc%gTTAAd.d.$$\n".to_vec());
    }

    #[test]
    fn read_cgivar_uncovered_allele_is_nocall() {
        // Allele 2 has no lines and is not called
        let data: Vec<u8> = b"1\t2\t1\tchr1\t1\t3\tsub\tCG\tGC\n".to_vec();

        let got = encode_cgivar(&data, 2).unwrap();

        assert_eq!(got, b">C{chr1}\nAA:C&G\n".to_vec());
    }

    #[test]
    fn read_cgivar_bad_lines() {
        use crate::error::PastaError;

        let allele: Vec<u8> = b"1\t2\t3\tchr1\t0\t1\tsnp\tA\tC\n".to_vec();
        assert!(matches!(encode_cgivar(&allele, 2), Err(PastaError::PloidyMismatch { ploidy: 2, alleles: 3 })));

        let overlap: Vec<u8> = b"1\t2\t1\tchr1\t0\t2\tref\t=\t=\n1\t2\t1\tchr1\t1\t2\tsnp\tC\tG\n".to_vec();
        assert!(matches!(encode_cgivar(&overlap, 2), Err(PastaError::Format { line: 2, .. })));

        let columns: Vec<u8> = b"1\t2\tall\tchr1\t0\t1\n".to_vec();
        assert!(matches!(encode_cgivar(&columns, 2), Err(PastaError::Format { line: 1, .. })));
    }

    #[test]
    fn read_cgivar_reference_mismatch() {
        use crate::error::PastaError;

        let data: Vec<u8> = b"1\t2\t1\tchr1\t1\t2\tsnp\tG\tT\n".to_vec();

        assert!(matches!(encode_cgivar(&data, 2), Err(PastaError::ReferenceMismatch { offset: 1, expected: b'c', found: b'g' })));
    }
}
