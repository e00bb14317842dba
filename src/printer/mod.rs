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

//! Printer for outputting [Run]s as plain text in any supported [Format].
//!
//! Can be used to convert any iterator over [Run]s to their plain text
//! representation. gVCF output goes through a
//! [Reconciler](crate::reconcile::Reconciler) so that every record has an
//! anchor base. GFF and CGI var output write the runs as they are.
//!
//! Returns the bytes for 1 run at a time using next(). The header is
//! prepended to the first run, or returned alone if there are no runs.
//!
//! ## Usage
//!
//! ### Print runs stored in memory
//!
//! ```rust
//! use pasta::{Category, Format, Options, Run};
//! use pasta::printer::Printer;
//!
//! let runs = vec![
//!     Run { category: Category::Reference, chrom: "chr1".to_string(), start: 0, ref_len: 2, refseq: b"cg".to_vec(), alleles: vec![b"cg".to_vec(), b"cg".to_vec()], at_start: true, anchor: None },
//!     Run { category: Category::Alt, chrom: "chr1".to_string(), start: 2, ref_len: 0, refseq: Vec::new(), alleles: vec![Vec::new(), b"a".to_vec()], at_start: false, anchor: None },
//! ];
//!
//! let mut iter = runs.into_iter().map(Ok);
//! let options = Options { ploidy: 2, ..Default::default() };
//! let mut printer = Printer::new(&mut iter, &options, Format::Vcf);
//!
//! let mut output: Vec<u8> = Vec::new();
//! for line in printer.by_ref() {
//!     output.append(&mut line.unwrap());
//! }
//!
//! // The insertion takes the 'g' as its anchor
//! let text = String::from_utf8(output).unwrap();
//! let records = text.lines().filter(|x| !x.starts_with('#')).collect::<Vec<&str>>();
//! assert_eq!(records, vec![
//!     "chr1\t1\t.\tC\t.\t.\tPASS\tEND=1\tGT\t0/0",
//!     "chr1\t2\t.\tG\tGA\t.\tPASS\tEND=2\tGT\t0/1",
//! ]);
//! ```
//!
//! ### Print a decoded symbol stream
//!
//! ```rust
//! use pasta::decoder::Decoder;
//! use pasta::printer::Printer;
//! use pasta::{Format, Options};
//! use std::io::Cursor;
//!
//! let mut input: Cursor<Vec<u8>> = Cursor::new(b">C{chr1}aa a~ >N{3}".to_vec());
//! let options = Options { source: "example".to_string(), ..Default::default() };
//!
//! let mut decoder = Decoder::new(&mut input, &options);
//! let mut printer = Printer::new(&mut decoder, &options, Format::Gff);
//!
//! let mut output: Vec<u8> = Vec::new();
//! for line in printer.by_ref() {
//!     output.append(&mut line.unwrap());
//! }
//!
//! let mut expected: Vec<u8> = b"## genome-build unknown\n".to_vec();
//! expected.append(&mut b"#>chrom\tsource\tvartype\tbegin\tend\t.\t+\t.\tseq\n".to_vec());
//! expected.append(&mut b"chr1\texample\tREF\t1\t1\t.\t+\t.\t.\n".to_vec());
//! expected.append(&mut b"chr1\texample\tSNP\t2\t2\t.\t+\t.\talleles a/c;ref_allele a\n".to_vec());
//! expected.append(&mut b"#chr1\texample\tNOC\t3\t5\t.\t+\t.\t.\n".to_vec());
//!
//! assert_eq!(output, expected);
//! ```
//!

use crate::Format;
use crate::Options;
use crate::Run;
use crate::VariantRecord;
use crate::error::PastaError;
use crate::reconcile::Reconciler;

use cgivar::format_cgivar_header;
use cgivar::format_cgivar_run;
use gff::format_gff_header;
use gff::format_gff_line;
use pasta::format_pasta_run;
use pasta::PastaWriter;
use vcf::format_vcf_header;
use vcf::format_vcf_line;

use std::collections::VecDeque;

// Format specific implementations
pub mod cgivar;
pub mod gff;
pub mod pasta;
pub mod vcf;

pub struct Printer<'a, I: Iterator> where I: Iterator<Item=Result<Run, PastaError>> {
    // Inputs
    runs: &'a mut I,
    options: Options,

    // gVCF anchoring
    reconciler: Reconciler,
    ready: VecDeque<Run>,
    exhausted: bool,

    // Symbol stream state
    writer: PastaWriter<Vec<u8>>,
    cursor: (String, u64),

    index: usize,
    done: bool,
    pub format: Format,
}

impl<'a, I: Iterator> Printer<'a, I> where I: Iterator<Item=Result<Run, PastaError>> {
    pub fn new(
        runs: &'a mut I,
        options: &Options,
        format: Format,
    ) -> Self {
        Printer {
            runs,
            options: options.clone(),
            reconciler: Reconciler::new(),
            ready: VecDeque::new(),
            exhausted: false,
            writer: PastaWriter::new(Vec::new(), options.line_width),
            cursor: (options.chrom.clone(), 0),
            index: 0,
            done: false,
            format,
        }
    }

    /// Number of runs printed so far.
    pub fn n_runs(
        &self,
    ) -> usize {
        self.index
    }

    pub fn print_header(
        &self,
    ) -> Result<Option<Vec<u8>>, PastaError> {
        let mut out: Vec<u8> = Vec::new();
        match self.format {
            Format::Pasta => return Ok(None),
            Format::Vcf => format_vcf_header(&self.options, &mut out)?,
            Format::Gff => format_gff_header(&self.options, &mut out)?,
            Format::CgiVar => format_cgivar_header(&self.options, &mut out)?,
        }
        Ok(Some(out))
    }

    fn next_run(
        &mut self,
    ) -> Result<Option<Run>, PastaError> {
        if self.format != Format::Vcf {
            return self.runs.next().transpose()
        }

        loop {
            if let Some(run) = self.ready.pop_front() {
                return Ok(Some(run))
            }
            if self.exhausted {
                return Ok(None)
            }
            match self.runs.next() {
                Some(run) => self.ready.extend(self.reconciler.push(run?)?),
                None => {
                    self.exhausted = true;
                    self.ready.extend(self.reconciler.finish()?);
                },
            }
        }
    }

    fn format_run(
        &mut self,
        run: &Run,
        out: &mut Vec<u8>,
    ) -> Result<(), PastaError> {
        match self.format {
            Format::Vcf => format_vcf_line(&VariantRecord::from_run(run, &self.options)?, out)?,
            Format::Gff => format_gff_line(run, &self.options, out)?,
            Format::CgiVar => format_cgivar_run(run, self.index + 1, out)?,
            Format::Pasta => {
                format_pasta_run(run, &mut self.cursor, &mut self.writer)?;
                out.append(self.writer.get_mut());
            },
        }
        Ok(())
    }

    fn step(
        &mut self,
    ) -> Result<Option<Vec<u8>>, PastaError> {
        let mut out: Vec<u8> = Vec::new();
        if self.index == 0 {
            if let Some(mut header) = self.print_header()? {
                out.append(&mut header);
            }
        }

        match self.next_run()? {
            Some(run) => {
                self.format_run(&run, &mut out)?;
                self.index += 1;
            },
            None => {
                self.done = true;
                self.writer.finish()?;
                out.append(self.writer.get_mut());
                if out.is_empty() {
                    return Ok(None)
                }
                self.index += usize::from(self.index == 0);
            },
        }
        Ok(Some(out))
    }
}

impl<I: Iterator> Iterator for Printer<'_, I> where I: Iterator<Item=Result<Run, PastaError>> {
    type Item = Result<Vec<u8>, PastaError>;

    fn next(
        &mut self,
    ) -> Option<Result<Vec<u8>, PastaError>> {
        if self.done {
            return None
        }
        match self.step() {
            Ok(out) => out.map(Ok),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            },
        }
    }
}
