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

//! pasta is a library and a command-line client for:
//!
//!   - Decoding per-position variant symbol streams into variant records.
//!   - Encoding gVCF, GFF and CGI var variant calls into symbol streams.
//!   - Converting between the supported plain text formats.
//!   - Interleaving and windowing symbol streams.
//!
//! The following plain text formats are supported:
//!   - pasta symbol streams (`.pasta`)
//!   - [gVCF](https://samtools.github.io/hts-specs/VCFv4.1.pdf) (VCF 4.1 with reference blocks)
//!   - GFF variant lines in the style of the Personal Genome Project
//!   - Complete Genomics var files (CGI var, format version 2.5)
//!
//! ## Symbol streams
//!
//! A symbol stream stores one printable byte per allele track per reference
//! position. Each byte encodes a pair of a reference token and an allele
//! token, where a token is one of the bases `acgt`, the no-call marker `n`, or
//! a gap. The full table is in [symbol]. A diploid stream holds two symbols
//! for each aligned position (a *slot*):
//!
//! ```text
//! aa a~ aa .Q tt
//! ```
//!
//! reads as reference `a`, a heterozygous `a` to `c` substitution, reference
//! `a`, an insertion of `a` on the second track, and reference `t`.
//! Whitespace between symbols is ignored.
//!
//! Inline control messages start with `>`:
//!
//!   - `>C{name}` switches to chromosome `name` and resets the position to 0.
//!   - `>P{n}` sets the 0-based position of the next slot.
//!   - `>R{n}` is a block of `n` reference positions.
//!   - `>N{n}` is a block of `n` no-call positions.
//!   - `>#{text}` is a comment.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The pasta CLI supports the following subcommands:
//!   - `pasta decode` convert a symbol stream to gVCF, GFF, CGI var, or a refolded stream.
//!   - `pasta encode` convert gVCF, GFF or CGI var records to a symbol stream.
//!   - `pasta convert` convert between gVCF, GFF and CGI var.
//!   - `pasta interleave` merge two single-track streams into a diploid stream.
//!   - `pasta filter` extract a window of reference positions from a stream.
//!
//! Encoding needs the reference sequence in a fasta file. Decoding needs it
//! only if the stream contains run-length blocks whose sequence should be
//! spelled out.
//!
//! ### Rust API
//!
//! The API provides several functions for operating on structs that implement
//! [Read] and/or [Write]. These are meant for use cases where an entire stream
//! should be processed.
//!
//! For use cases requiring access to a single record at a time, the following
//! structs are provided:
//!
//!   - [Decoder](decoder::Decoder): takes a [Read] containing a symbol stream and segments it into [Run]s.
//!   - [Reconciler](reconcile::Reconciler): anchors [Run]s so that they can be written as [VariantRecord]s.
//!   - [Printer](printer::Printer): takes an iterator over [Run]s and formats them as plain text.
//!   - [StreamBuilder](parser::StreamBuilder): writes a symbol stream from variant calls.
//!
//! These structs can be chained together to eg. read a symbol stream and
//! print it as gVCF.
//!
//! See documentation for the appropriate functions or structs for usage examples.
//!

use crate::decoder::Decoder;
use crate::parser::StreamBuilder;
use crate::printer::Printer;
use crate::printer::pasta::PastaWriter;
use crate::reference::Reference;
use crate::symbol::is_whitespace;

use std::io::Cursor;
use std::io::Read;
use std::io::Write;

use bstr::ByteSlice;
use log::info;

pub mod control;
pub mod decoder;
pub mod error;
pub mod genotype;
pub mod parser;
pub mod printer;
pub mod reconcile;
pub mod reference;
pub mod stream;
pub mod symbol;

type E = Box<dyn std::error::Error>;

/// Supported plain text formats.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Pasta,
    Vcf,
    Gff,
    CgiVar,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pasta" => Ok(Format::Pasta),
            "vcf" | "gvcf" => Ok(Format::Vcf),
            "gff" => Ok(Format::Gff),
            "cgivar" | "cgi-var" | "cgi" => Ok(Format::CgiVar),
            _ => Err(format!("'{}' is not a valid Format", s)),
        }
    }
}

/// Category of an aligned position or a [Run].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Category {
    #[default]
    Reference,
    NoCall,
    Alt,
}

/// Side a [Run] took its anchor base from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSide {
    /// Last base of the preceding run, prepended.
    Left,
    /// First base of the following run, appended.
    Right,
}

/// A maximal span of positions sharing one [Category].
///
/// Sequences are lowercase with gaps removed. A run from a run-length block
/// with no reference attached is *elided*: it spans `ref_len` positions but
/// its sequences are empty.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Run {
    pub category: Category,
    pub chrom: String,
    /// 0-based position of the first reference base.
    pub start: u64,
    /// Number of reference positions spanned.
    pub ref_len: u64,
    pub refseq: Vec<u8>,
    /// One sequence per track.
    pub alleles: Vec<Vec<u8>>,
    /// First run of the stream or after a jump in coordinates.
    pub at_start: bool,
    pub anchor: Option<AnchorSide>,
}

impl Run {
    /// 0-based exclusive end, equal to the 1-based inclusive end.
    pub fn end(
        &self,
    ) -> u64 {
        self.start.saturating_add(self.ref_len)
    }

    pub fn is_elided(
        &self,
    ) -> bool {
        self.ref_len > 0 && self.refseq.is_empty()
    }

    /// True if the run can not be written as a variant record on its own.
    ///
    /// Variant records need a non-empty reference and non-empty alleles.
    /// Elided runs and reference runs are never starved.
    ///
    pub fn is_anchor_starved(
        &self,
    ) -> bool {
        !self.is_elided()
            && self.category != Category::Reference
            && (self.refseq.is_empty() || self.alleles.iter().any(|x| x.is_empty()))
    }

    /// True if `next` starts where this run ends on the same chromosome.
    pub fn is_followed_by(
        &self,
        next: &Run,
    ) -> bool {
        !next.at_start && self.chrom == next.chrom && self.end() == next.start
    }

    /// Derive the category from the sequences.
    ///
    /// Elided runs keep their category.
    ///
    pub fn classify(
        &self,
    ) -> Category {
        if self.is_elided() {
            return self.category;
        }
        let has_nocall = self.refseq.contains(&b'n') || self.alleles.iter().any(|x| x.contains(&b'n'));
        if has_nocall {
            Category::NoCall
        } else if self.alleles.iter().any(|x| *x != self.refseq) {
            Category::Alt
        } else {
            Category::Reference
        }
    }
}

/// A gVCF record built from an anchored [Run].
///
/// The reference and every alternate allele are non-empty.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariantRecord {
    pub chrom: String,
    /// 1-based position of the first reference base.
    pub pos: u64,
    /// 1-based inclusive end.
    pub end: u64,
    pub category: Category,
    pub reference: Vec<u8>,
    pub alternates: Vec<Vec<u8>>,
    pub genotype: String,
    pub filter: String,
    pub info: String,
}

/// Settings shared by the readers and writers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Number of allele tracks per position.
    pub ploidy: usize,
    /// Write the sequence of no-call records instead of a reference block.
    pub nocall_sequence: bool,
    /// Symbols per line in written streams, 0 writes a single line.
    pub line_width: usize,
    /// Chromosome name used until a stream names one.
    pub chrom: String,
    pub source: String,
    pub reference_name: String,
    /// Written to the headers if set, eg. `20251015`.
    pub date: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            ploidy: 2,
            nocall_sequence: true,
            line_width: 50,
            chrom: "unk".to_string(),
            source: "unknown".to_string(),
            reference_name: "unknown".to_string(),
            date: None,
        }
    }
}

/// Guess the [Format] of `bytes` from its first line.
///
/// ## Usage
///
/// ```rust
/// use pasta::{guess_format, Format};
///
/// assert_eq!(guess_format(b"##fileformat=VCFv4.1\n"), Some(Format::Vcf));
/// assert_eq!(guess_format(b"## genome-build hg19\n"), Some(Format::Gff));
/// assert_eq!(guess_format(b"#GENERATED_BY\tpasta\n"), Some(Format::CgiVar));
/// assert_eq!(guess_format(b">C{chr1}\naaccgg\n"), Some(Format::Pasta));
/// assert_eq!(guess_format(b"hello world"), None);
/// ```
///
pub fn guess_format(
    bytes: &[u8],
) -> Option<Format> {
    let first_line = bytes.lines().find(|line| !line.trim().is_empty())?;

    if first_line.starts_with(b"##fileformat=VCF") || first_line.starts_with(b"#CHROM") {
        return Some(Format::Vcf)
    }
    if first_line.starts_with(b"#GENERATED_BY") || first_line.starts_with(b"#FORMAT_VERSION") || first_line.starts_with(b">locus") {
        return Some(Format::CgiVar)
    }
    if first_line.starts_with(b"##gff-version") || first_line.starts_with(b"## genome-build") || first_line.starts_with(b"#>") {
        return Some(Format::Gff)
    }
    if first_line.starts_with(b">") {
        return Some(Format::Pasta)
    }

    let fields = first_line.split_str("\t").collect::<Vec<&[u8]>>();
    let numeric = |x: &[u8]| !x.is_empty() && x.iter().all(|c| c.is_ascii_digit());
    if fields.len() >= 9 && numeric(fields[0]) && (fields[2] == b"all" || numeric(fields[2]))
        && matches!(fields[6], b"ref" | b"snp" | b"sub" | b"ins" | b"del" | b"no-call" | b"no-ref") {
        return Some(Format::CgiVar)
    }

    let n_fields = fields.len();
    if n_fields == 9 {
        return Some(Format::Gff)
    }
    if n_fields == 8 || n_fields >= 10 {
        return Some(Format::Vcf)
    }

    let pasta = first_line.iter().all(|x| is_whitespace(*x) || *x == symbol::NOP || symbol::decode(*x).is_ok());
    if pasta {
        return Some(Format::Pasta)
    }

    None
}

/// Decode a symbol stream from [Read] and write it in `format` to [Write].
///
/// Run-length blocks are spelled out from `reference` when it is given.
///
/// ## Usage
///
/// ```rust
/// use pasta::{decode_from_read_to_write, Format, Options};
/// use std::io::Cursor;
///
/// let mut input: Cursor<Vec<u8>> = Cursor::new(b">C{chr1}aa a~ aa".to_vec());
/// let options = Options::default();
///
/// let mut output: Vec<u8> = Vec::new();
/// decode_from_read_to_write(Format::Vcf, &options, None, &mut input, &mut output).unwrap();
///
/// let text = String::from_utf8(output).unwrap();
/// let records = text.lines().filter(|x| !x.starts_with('#')).collect::<Vec<&str>>();
///
/// assert_eq!(records, vec![
///     "chr1\t1\t.\tA\t.\t.\tPASS\tEND=1\tGT\t0/0",
///     "chr1\t2\t.\tA\tC\t.\tPASS\tEND=2\tGT\t0/1",
///     "chr1\t3\t.\tA\t.\t.\tPASS\tEND=3\tGT\t0/0",
/// ]);
/// ```
///
pub fn decode_from_read_to_write<R: Read, W: Write>(
    format: Format,
    options: &Options,
    reference: Option<&Reference>,
    conn_in: &mut R,
    conn_out: &mut W,
) -> Result<(), E> {
    let mut decoder = Decoder::new(conn_in, options);
    if let Some(reference) = reference {
        decoder = decoder.with_reference(reference);
    }

    let mut printer = Printer::new(&mut decoder, options, format);
    for bytes in printer.by_ref() {
        conn_out.write_all(&bytes?)?;
    }
    conn_out.flush()?;

    info!("Decoded {} runs", printer.n_runs());
    Ok(())
}

/// Encode gVCF or GFF records from [Read] into a symbol stream in [Write].
///
/// The records must be sorted and on a single chromosome. Positions that no
/// record covers are written as no-calls.
///
/// ## Usage
///
/// ```rust
/// use pasta::{encode_from_read_to_write, Format, Options};
/// use pasta::reference::Reference;
/// use std::io::Cursor;
///
/// let mut reference = Reference::default();
/// reference.insert("chr1", b"ACGT");
///
/// let mut input: Cursor<Vec<u8>> = Cursor::new(b"chr1\t1\t.\tA\t.\t.\tPASS\tEND=2\tGT\t0/0\nchr1\t3\t.\tG\tT\t.\tPASS\tEND=3\tGT\t0/1\n".to_vec());
/// let options = Options::default();
///
/// let mut output: Vec<u8> = Vec::new();
/// encode_from_read_to_write(Format::Vcf, &options, &reference, &mut input, &mut output).unwrap();
///
/// assert_eq!(output, b">C{chr1}\naaccg%\n".to_vec());
/// ```
///
pub fn encode_from_read_to_write<R: Read, W: Write>(
    format: Format,
    options: &Options,
    reference: &Reference,
    conn_in: &mut R,
    conn_out: &mut W,
) -> Result<(), E> {
    if format == Format::Pasta {
        return decode_from_read_to_write(Format::Pasta, options, Some(reference), conn_in, conn_out)
    }

    let writer = PastaWriter::new(conn_out, options.line_width);
    let mut builder = StreamBuilder::new(writer, reference, options);
    parser::parse_into(&format, conn_in, &mut builder)?;
    builder.finish()?;
    Ok(())
}

/// Convert plain text data from [Read] to plain text data to [Write].
///
/// Records are encoded into a symbol stream in memory and decoded again, so
/// converting reconciles anchors and merges adjacent records.
///
/// ## Usage
///
/// ```rust
/// use pasta::{convert_from_read_to_write, Format, Options};
/// use pasta::reference::Reference;
/// use std::io::Cursor;
///
/// let mut reference = Reference::default();
/// reference.insert("chr1", b"ACGT");
///
/// let mut input: Cursor<Vec<u8>> = Cursor::new(b"chr1\tsrc\tREF\t1\t2\t.\t+\t.\t.\nchr1\tsrc\tSNP\t3\t3\t.\t+\t.\talleles g/t;ref_allele g\n".to_vec());
/// let options = Options { chrom: "chr1".to_string(), ..Default::default() };
///
/// let mut output: Vec<u8> = Vec::new();
/// convert_from_read_to_write(Format::Gff, Format::Vcf, &options, &reference, &mut input, &mut output).unwrap();
///
/// let text = String::from_utf8(output).unwrap();
/// let records = text.lines().filter(|x| !x.starts_with('#')).collect::<Vec<&str>>();
///
/// assert_eq!(records, vec![
///     "chr1\t1\t.\tA\t.\t.\tPASS\tEND=2\tGT\t0/0",
///     "chr1\t3\t.\tG\tT\t.\tPASS\tEND=3\tGT\t0/1",
/// ]);
/// ```
///
pub fn convert_from_read_to_write<R: Read, W: Write>(
    in_format: Format,
    out_format: Format,
    options: &Options,
    reference: &Reference,
    conn_in: &mut R,
    conn_out: &mut W,
) -> Result<(), E> {
    let mut encoded: Vec<u8> = Vec::new();
    encode_from_read_to_write(in_format, options, reference, conn_in, &mut encoded)?;

    let mut stream: Cursor<Vec<u8>> = Cursor::new(encoded);
    decode_from_read_to_write(out_format, options, Some(reference), &mut stream, conn_out)
}
