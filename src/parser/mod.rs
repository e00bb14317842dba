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

//! Parse plain text variant calls into a symbol stream.
//!
//! The format specific readers turn each input line into calls on a
//! [StreamBuilder], which checks the calls against the reference and writes
//! the symbols. Positions between records are written as no-calls.
//!
//! ## Usage
//!
//! ```rust
//! use pasta::{Format, Options};
//! use pasta::parser::{parse_into, StreamBuilder};
//! use pasta::printer::pasta::PastaWriter;
//! use pasta::reference::Reference;
//! use std::io::Cursor;
//!
//! let mut reference = Reference::default();
//! reference.insert("chr1", b"GATTACA");
//!
//! // A deletion of the 'T' at position 3 on one track, anchored on the 'A'
//! let mut input: Cursor<Vec<u8>> = Cursor::new(b"chr1\t2\t.\tAT\tA\t.\tPASS\tEND=3\tGT\t0|1\n".to_vec());
//! let options = Options::default();
//!
//! let mut output: Vec<u8> = Vec::new();
//! let writer = PastaWriter::new(&mut output, options.line_width);
//! let mut builder = StreamBuilder::new(writer, &reference, &options);
//! parse_into(&Format::Vcf, &mut input, &mut builder).unwrap();
//! builder.finish().unwrap();
//!
//! // 'G' is not covered by the record and becomes a no-call
//! assert_eq!(output, b">C{chr1}\nGGaatE\n".to_vec());
//! ```
//!

// Format specific implementations
pub mod cgivar;
pub mod gff;
pub mod vcf;

use crate::Format;
use crate::Options;
use crate::control::ControlMessage;
use crate::error::PastaError;
use crate::printer::pasta::PastaWriter;
use crate::reference::Reference;
use crate::symbol::align_left;
use crate::symbol::decode;
use crate::symbol::encode_bytes;
use crate::symbol::NOP;

use cgivar::CgiVarReader;
use gff::read_gff_line;
use vcf::read_vcf_line;

use std::io::BufReader;
use std::io::Read;
use std::io::Write;

use bstr::io::BufReadExt;
use log::info;

/// Writes a symbol stream from sorted variant calls on one chromosome.
pub struct StreamBuilder<'a, W: Write> {
    writer: PastaWriter<W>,
    reference: &'a Reference,
    ploidy: usize,

    chrom: Option<String>,
    pos: u64,
    line: usize,
}

impl<'a, W: Write> StreamBuilder<'a, W> {
    pub fn new(
        writer: PastaWriter<W>,
        reference: &'a Reference,
        options: &Options,
    ) -> Self {
        StreamBuilder {
            writer,
            reference,
            ploidy: options.ploidy.max(1),
            chrom: None,
            pos: 0,
            line: 0,
        }
    }

    pub fn ploidy(
        &self,
    ) -> usize {
        self.ploidy
    }

    /// 0-based position of the next symbol.
    pub fn position(
        &self,
    ) -> u64 {
        self.pos
    }

    /// Set the input line number used in error messages.
    pub fn set_line(
        &mut self,
        line: usize,
    ) {
        self.line = line;
    }

    /// [PastaError::Format] on the current line.
    pub fn error(
        &self,
        message: impl Into<String>,
    ) -> PastaError {
        PastaError::Format { line: self.line, message: message.into() }
    }

    fn reference_base(
        &self,
        pos: u64,
    ) -> Result<u8, PastaError> {
        let chrom = self.chrom.as_deref().unwrap_or_default();
        self.reference.base(chrom, pos).ok_or_else(|| PastaError::MissingReference { chrom: chrom.to_string(), position: pos })
    }

    fn write_slot(
        &mut self,
        reference: u8,
        allele: u8,
    ) -> Result<(), PastaError> {
        let symbol = encode_bytes(reference, allele)?;
        for _ in 0..self.ploidy {
            self.writer.write_symbol(symbol)?;
        }
        Ok(())
    }

    /// Move to 0-based `start` on `chrom`, filling the gap with no-calls.
    ///
    /// ## Errors
    ///
    /// [PastaError::Format] if `chrom` is not the chromosome of the previous
    /// records or `start` is before the end of the previous record.
    ///
    pub fn start_record(
        &mut self,
        chrom: &str,
        start: u64,
    ) -> Result<(), PastaError> {
        match &self.chrom {
            None => {
                self.writer.write_message(&ControlMessage::Chromosome(chrom.to_string()))?;
                self.chrom = Some(chrom.to_string());
            },
            Some(current) if current != chrom => {
                return Err(self.error(format!("found chromosome '{}' after '{}', only one chromosome per stream is supported", chrom, current)));
            },
            _ => (),
        }

        if start < self.pos {
            return Err(self.error(format!("record at {} starts before the previous record ends at {}", start + 1, self.pos)));
        }
        self.nocall_span(start - self.pos)
    }

    /// Write `len` positions matching the reference.
    pub fn reference_span(
        &mut self,
        len: u64,
    ) -> Result<(), PastaError> {
        for _ in 0..len {
            let base = self.reference_base(self.pos)?;
            self.write_slot(base, base)?;
            self.pos += 1;
        }
        Ok(())
    }

    /// Write `len` no-call positions.
    pub fn nocall_span(
        &mut self,
        len: u64,
    ) -> Result<(), PastaError> {
        for _ in 0..len {
            let base = self.reference_base(self.pos)?;
            self.write_slot(base, b'n')?;
            self.pos += 1;
        }
        Ok(())
    }

    /// Check `seq` against the reference from the current position.
    ///
    /// Comparison ignores case and `n` matches any base.
    ///
    /// ## Errors
    ///
    /// [PastaError::ReferenceMismatch] with the 0-based reference position as
    /// the offset.
    ///
    pub fn check_reference(
        &self,
        seq: &[u8],
    ) -> Result<(), PastaError> {
        for (idx, base) in seq.iter().enumerate() {
            let pos = self.pos + idx as u64;
            let expected = self.reference_base(pos)?;
            let found = base.to_ascii_lowercase();
            if found != expected && found != b'n' && expected != b'n' {
                return Err(PastaError::ReferenceMismatch { offset: pos as usize, expected, found });
            }
        }
        Ok(())
    }

    /// Write one track per allele aligned against `refseq`.
    ///
    /// ## Errors
    ///
    /// [PastaError::PloidyMismatch] if there is not one allele per track,
    /// [PastaError::ReferenceMismatch] if `refseq` disagrees with the
    /// reference.
    ///
    pub fn aligned(
        &mut self,
        refseq: &[u8],
        alleles: &[Vec<u8>],
    ) -> Result<(), PastaError> {
        if alleles.len() != self.ploidy {
            return Err(PastaError::PloidyMismatch { ploidy: self.ploidy, alleles: alleles.len() });
        }
        self.check_reference(refseq)?;
        self.writer.write_symbols(&align_left(refseq, alleles)?)?;
        self.pos += refseq.len() as u64;
        Ok(())
    }

    /// `len` reference bases of `chrom` from 0-based `start`.
    pub fn reference_bases(
        &self,
        chrom: &str,
        start: u64,
        len: u64,
    ) -> Result<Vec<u8>, PastaError> {
        (start..start.saturating_add(len)).map(|pos| {
            self.reference.base(chrom, pos).ok_or_else(|| PastaError::MissingReference { chrom: chrom.to_string(), position: pos })
        }).collect()
    }

    /// Write symbols given separately for each track.
    ///
    /// Tracks are consumed in step: an insertion on any track is written
    /// with `.` on the tracks that have none at that point, other symbols are
    /// written one per track and take one reference position.
    ///
    /// ## Errors
    ///
    /// [PastaError::PloidyMismatch] if there is not one track per allele,
    /// [PastaError::Format] if the tracks span different numbers of reference
    /// positions.
    ///
    pub fn write_tracks(
        &mut self,
        tracks: &[Vec<u8>],
    ) -> Result<(), PastaError> {
        if tracks.len() != self.ploidy {
            return Err(PastaError::PloidyMismatch { ploidy: self.ploidy, alleles: tracks.len() });
        }

        let mut next = vec![0_usize; tracks.len()];
        let mut slot: Vec<u8> = Vec::with_capacity(tracks.len());
        loop {
            let heads = tracks.iter().zip(next.iter()).map(|(track, idx)| {
                track.get(*idx).map(|x| decode(*x).map(|symbol| (*x, symbol.consumes_reference))).transpose()
            }).collect::<Result<Vec<Option<(u8, bool)>>, PastaError>>()?;

            if heads.iter().all(|x| x.is_none()) {
                return Ok(())
            }

            slot.clear();
            if heads.iter().flatten().any(|(_, consumes)| !consumes) {
                heads.iter().zip(next.iter_mut()).for_each(|(head, idx)| match head {
                    Some((symbol, false)) => {
                        slot.push(*symbol);
                        *idx += 1;
                    },
                    _ => slot.push(NOP),
                });
            } else {
                if heads.iter().any(|x| x.is_none()) {
                    return Err(self.error(format!("alleles span different lengths of the reference at {}", self.pos + 1)));
                }
                heads.iter().flatten().zip(next.iter_mut()).for_each(|((symbol, _), idx)| {
                    slot.push(*symbol);
                    *idx += 1;
                });
                self.pos += 1;
            }
            self.writer.write_symbols(&slot)?;
        }
    }

    /// Terminate the stream.
    pub fn finish(
        mut self,
    ) -> Result<(), PastaError> {
        self.writer.finish()?;
        Ok(())
    }
}

/// Parse all lines of `conn` in `format` into `builder`.
///
/// ## Errors
///
/// The first error from a line, or [PastaError::Format] for
/// [Format::Pasta] input which needs no parsing.
///
pub fn parse_into<R: Read, W: Write>(
    format: &Format,
    conn: &mut R,
    builder: &mut StreamBuilder<W>,
) -> Result<(), PastaError> {
    let reader = BufReader::new(conn);
    let mut cgivar = CgiVarReader::new();
    let mut n_lines = 0_usize;
    for (idx, line) in reader.byte_lines().enumerate() {
        let line = line?;
        builder.set_line(idx + 1);
        match format {
            Format::Vcf => read_vcf_line(&line, builder)?,
            Format::Gff => read_gff_line(&line, builder)?,
            Format::CgiVar => cgivar.read_line(&line, builder)?,
            Format::Pasta => return Err(builder.error("symbol streams are decoded, not parsed")),
        }
        n_lines += 1;
    }
    cgivar.finish(builder)?;
    info!("Encoded {} lines up to position {}", n_lines, builder.position());
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {

    fn reference() -> crate::reference::Reference {
        let mut reference = crate::reference::Reference::default();
        reference.insert("chr1", b"ACGTNACGT");
        reference
    }

    #[test]
    fn start_record_fills_with_nocalls() {
        use super::StreamBuilder;
        use crate::Options;
        use crate::printer::pasta::PastaWriter;

        let reference = reference();
        let options = Options::default();
        let mut got: Vec<u8> = Vec::new();

        let mut builder = StreamBuilder::new(PastaWriter::new(&mut got, 0), &reference, &options);
        builder.start_record("chr1", 2).unwrap();
        builder.reference_span(3).unwrap();
        builder.finish().unwrap();

        assert_eq!(got, b">C{chr1}\nAACCggttnn\n".to_vec());
    }

    #[test]
    fn start_record_out_of_order() {
        use super::StreamBuilder;
        use crate::Options;
        use crate::error::PastaError;
        use crate::printer::pasta::PastaWriter;

        let reference = reference();
        let options = Options::default();
        let mut got: Vec<u8> = Vec::new();

        let mut builder = StreamBuilder::new(PastaWriter::new(&mut got, 0), &reference, &options);
        builder.set_line(2);
        builder.start_record("chr1", 2).unwrap();
        builder.reference_span(2).unwrap();

        assert!(matches!(builder.start_record("chr1", 3), Err(PastaError::Format { line: 2, .. })));
        assert!(matches!(builder.start_record("chr2", 4), Err(PastaError::Format { line: 2, .. })));
    }

    #[test]
    fn aligned_checks_reference() {
        use super::StreamBuilder;
        use crate::Options;
        use crate::error::PastaError;
        use crate::printer::pasta::PastaWriter;

        let reference = reference();
        let options = Options::default();
        let mut got: Vec<u8> = Vec::new();

        let mut builder = StreamBuilder::new(PastaWriter::new(&mut got, 0), &reference, &options);
        builder.start_record("chr1", 1).unwrap();

        match builder.aligned(b"cc", &[b"cc".to_vec(), b"c".to_vec()]) {
            Err(PastaError::ReferenceMismatch { offset, expected, found }) => {
                assert_eq!(offset, 2);
                assert_eq!(expected, b'g');
                assert_eq!(found, b'c');
            },
            _ => panic!("expected ReferenceMismatch"),
        }

        // 'n' matches anything
        builder.aligned(b"CGTA", &[b"cgta".to_vec(), b"cgtt".to_vec()]).unwrap();
        assert_eq!(builder.position(), 5);
    }

    #[test]
    fn aligned_ploidy_mismatch() {
        use super::StreamBuilder;
        use crate::Options;
        use crate::error::PastaError;
        use crate::printer::pasta::PastaWriter;

        let reference = reference();
        let options = Options::default();
        let mut got: Vec<u8> = Vec::new();

        let mut builder = StreamBuilder::new(PastaWriter::new(&mut got, 0), &reference, &options);
        builder.start_record("chr1", 0).unwrap();

        let got = builder.aligned(b"a", &[b"a".to_vec()]);
        assert!(matches!(got, Err(PastaError::PloidyMismatch { ploidy: 2, alleles: 1 })));
    }

    #[test]
    fn write_tracks_pairs_insertions() {
        use super::StreamBuilder;
        use crate::Options;
        use crate::error::PastaError;
        use crate::printer::pasta::PastaWriter;

        let reference = reference();
        let options = Options::default();
        let mut got: Vec<u8> = Vec::new();

        let mut builder = StreamBuilder::new(PastaWriter::new(&mut got, 0), &reference, &options);
        builder.start_record("chr1", 0).unwrap();
        builder.write_tracks(&[b"aQc".to_vec(), b"ac".to_vec()]).unwrap();
        assert_eq!(builder.position(), 2);

        assert!(matches!(builder.write_tracks(&[b"g".to_vec()]), Err(PastaError::PloidyMismatch { ploidy: 2, alleles: 1 })));
        assert!(matches!(builder.write_tracks(&[b"g".to_vec(), b"gt".to_vec()]), Err(PastaError::Format { .. })));
        builder.finish().unwrap();

        assert_eq!(got, b">C{chr1}\naaQ.ccgg\n".to_vec());
    }

    #[test]
    fn missing_reference() {
        use super::StreamBuilder;
        use crate::Options;
        use crate::error::PastaError;
        use crate::printer::pasta::PastaWriter;

        let reference = reference();
        let options = Options::default();
        let mut got: Vec<u8> = Vec::new();

        let mut builder = StreamBuilder::new(PastaWriter::new(&mut got, 0), &reference, &options);
        builder.start_record("chr1", 8).unwrap();

        assert!(matches!(builder.reference_span(2), Err(PastaError::MissingReference { position: 9, .. })));
    }

    #[test]
    fn pasta_input_is_rejected() {
        use super::{parse_into, StreamBuilder};
        use crate::{Format, Options};
        use crate::error::PastaError;
        use crate::printer::pasta::PastaWriter;
        use std::io::Cursor;

        let reference = reference();
        let options = Options::default();
        let mut got: Vec<u8> = Vec::new();
        let mut input: Cursor<Vec<u8>> = Cursor::new(b"aaccgg\n".to_vec());

        let mut builder = StreamBuilder::new(PastaWriter::new(&mut got, 0), &reference, &options);
        assert!(matches!(parse_into(&Format::Pasta, &mut input, &mut builder), Err(PastaError::Format { line: 1, .. })));
    }
}
