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

//! Segment a symbol stream into [Run]s.
//!
//! [Decoder] reads one symbol per track at a time, classifies each aligned
//! position, and emits a [Run] whenever the [Category] changes. Run-length
//! control messages become runs of their own, position and chromosome
//! messages end the open run and update the coordinates.
//!
//! ## Usage
//!
//! ```rust
//! use pasta::{Category, Options};
//! use pasta::decoder::Decoder;
//! use std::io::Cursor;
//!
//! // Two tracks, a heterozygous a->c substitution in the middle
//! let mut input: Cursor<Vec<u8>> = Cursor::new(b"aa a~ aa".to_vec());
//! let options = Options::default();
//!
//! let runs = Decoder::new(&mut input, &options).collect::<Result<Vec<_>, _>>().unwrap();
//!
//! assert_eq!(runs.len(), 3);
//! assert_eq!(runs[1].category, Category::Alt);
//! assert_eq!(runs[1].start, 1);
//! assert_eq!(runs[1].refseq, b"a".to_vec());
//! assert_eq!(runs[1].alleles, vec![b"a".to_vec(), b"c".to_vec()]);
//! ```
//!

pub mod reader;
pub mod slot;

use crate::Category;
use crate::Options;
use crate::Run;
use crate::control::ControlMessage;
use crate::error::PastaError;
use crate::reference::Reference;
use crate::symbol::Token;

use reader::StreamItem;
use reader::StreamReader;
use slot::classify_slot;
use slot::Slot;

use std::collections::VecDeque;
use std::io::Read;

use log::debug;
use log::warn;

pub struct Decoder<'a, R: Read> {
    // Inputs
    reader: StreamReader<'a, R>,
    reference: Option<&'a Reference>,
    ploidy: usize,

    // Coordinates of the next position
    chrom: String,
    pos: u64,

    // Internals
    open: Option<Run>,
    out: VecDeque<Run>,
    at_start: bool,
    done: bool,
}

impl<'a, R: Read> Decoder<'a, R> {
    pub fn new(
        conn: &'a mut R,
        options: &Options,
    ) -> Self {
        Decoder {
            reader: StreamReader::new(conn),
            reference: None,
            ploidy: options.ploidy.max(1),
            chrom: options.chrom.clone(),
            pos: 0,
            open: None,
            out: VecDeque::new(),
            at_start: true,
            done: false,
        }
    }

    /// Fill in the sequence of run-length blocks from `reference`.
    pub fn with_reference(
        mut self,
        reference: &'a Reference,
    ) -> Self {
        self.reference = Some(reference);
        self
    }
}

impl<R: Read> Decoder<'_, R> {
    /// Current chromosome name.
    pub fn chrom(
        &self,
    ) -> &str {
        &self.chrom
    }

    /// 0-based reference position of the next slot.
    pub fn position(
        &self,
    ) -> u64 {
        self.pos
    }

    fn emit(
        &mut self,
        mut run: Run,
    ) {
        debug!("{:?} run at {}:{}, {} bases", run.category, run.chrom, run.start, run.ref_len);
        if self.at_start {
            run.at_start = true;
            self.at_start = false;
        }
        self.out.push_back(run);
    }

    fn flush(
        &mut self,
    ) {
        if let Some(run) = self.open.take() {
            self.emit(run);
        }
    }

    fn block_run(
        &self,
        category: Category,
        count: u64,
    ) -> Run {
        let mut run = Run {
            category,
            chrom: self.chrom.clone(),
            start: self.pos,
            ref_len: count,
            alleles: vec![Vec::new(); self.ploidy],
            ..Default::default()
        };

        if let Some(reference) = self.reference {
            match reference.range(&self.chrom, self.pos, count) {
                Some(bases) => {
                    run.refseq = bases.to_vec();
                    let allele = match category {
                        Category::NoCall => vec![b'n'; bases.len()],
                        _ => bases.to_vec(),
                    };
                    run.alleles = vec![allele; self.ploidy];
                },
                None => warn!("Reference has no sequence for {}:{}-{}, leaving the block elided", self.chrom, self.pos + 1, self.pos + count),
            }
        }
        run
    }

    fn push_block(
        &mut self,
        category: Category,
        count: u64,
        offset: usize,
    ) -> Result<(), PastaError> {
        self.flush();
        if count > 0 {
            let end = self.pos.checked_add(count).ok_or_else(|| PastaError::InvalidNumber { offset, payload: count.to_string() })?;
            let run = self.block_run(category, count);
            self.emit(run);
            self.pos = end;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        msg: ControlMessage,
        offset: usize,
    ) -> Result<(), PastaError> {
        match msg {
            ControlMessage::Chromosome(name) => {
                self.flush();
                if name != self.chrom {
                    self.chrom = name;
                    self.pos = 0;
                    self.at_start = true;
                }
            },
            ControlMessage::Position(pos) => {
                self.flush();
                if pos != self.pos {
                    self.pos = pos;
                    self.at_start = true;
                }
            },
            ControlMessage::Reference(count) => self.push_block(Category::Reference, count, offset)?,
            ControlMessage::NoCall(count) => self.push_block(Category::NoCall, count, offset)?,
            ControlMessage::Comment(text) => debug!("Comment: {}", text),
        }
        Ok(())
    }

    fn push_slot(
        &mut self,
        slot: Slot,
        offset: usize,
    ) -> Result<(), PastaError> {
        let next = if slot.consumes_reference {
            self.pos.checked_add(1).ok_or_else(|| PastaError::InvalidNumber { offset, payload: self.pos.to_string() })?
        } else {
            self.pos
        };

        if self.open.as_ref().is_some_and(|run| run.category != slot.category) {
            self.flush();
        }
        if self.open.is_none() {
            self.open = Some(Run {
                category: slot.category,
                chrom: self.chrom.clone(),
                start: self.pos,
                alleles: vec![Vec::new(); self.ploidy],
                ..Default::default()
            });
        }

        if let Some(run) = self.open.as_mut() {
            if slot.reference != Token::Gap {
                run.refseq.push(slot.reference.to_byte());
                run.ref_len += 1;
            }
            run.alleles.iter_mut().zip(slot.alleles.iter()).for_each(|(allele, token)| {
                if *token != Token::Gap {
                    allele.push(token.to_byte());
                }
            });
        }

        self.pos = next;
        Ok(())
    }

    /// Consume one slot or control message.
    ///
    /// Returns false at the end of the stream.
    ///
    fn step(
        &mut self,
    ) -> Result<bool, PastaError> {
        let mut symbols: Vec<(u8, usize)> = Vec::with_capacity(self.ploidy);
        while symbols.len() < self.ploidy {
            match self.reader.next_item()? {
                Some(StreamItem::Symbol { byte, offset }) => symbols.push((byte, offset)),
                Some(StreamItem::Message { msg, offset }) => {
                    if !symbols.is_empty() {
                        return Err(PastaError::MalformedMessage { offset, reason: format!("control message after {} of {} symbols in a position", symbols.len(), self.ploidy) });
                    }
                    self.apply(msg, offset)?;
                    return Ok(true);
                },
                None => {
                    if symbols.is_empty() {
                        return Ok(false);
                    }
                    return Err(PastaError::MalformedMessage { offset: self.reader.offset(), reason: format!("stream ended after {} of {} symbols in a position", symbols.len(), self.ploidy) });
                },
            }
        }

        if let Some(slot) = classify_slot(&symbols)? {
            self.push_slot(slot, symbols[0].1)?;
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for Decoder<'_, R> {
    type Item = Result<Run, PastaError>;

    fn next(
        &mut self,
    ) -> Option<Result<Run, PastaError>> {
        loop {
            if let Some(run) = self.out.pop_front() {
                return Some(Ok(run));
            }
            if self.done {
                return None;
            }
            match self.step() {
                Ok(true) => (),
                Ok(false) => {
                    self.done = true;
                    self.flush();
                },
                Err(err) => {
                    self.done = true;
                    self.open = None;
                    return Some(Err(err));
                },
            }
        }
    }
}

// Tests
#[cfg(test)]
mod tests {

    fn decode_all(data: &[u8]) -> Vec<crate::Run> {
        use super::Decoder;
        use crate::Options;
        use std::io::Cursor;

        let mut input: Cursor<Vec<u8>> = Cursor::new(data.to_vec());
        let options = Options::default();
        Decoder::new(&mut input, &options).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn single_reference_run() {
        use crate::Category;

        let got = decode_all(b"aaaaaa");

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].category, Category::Reference);
        assert_eq!(got[0].start, 0);
        assert_eq!(got[0].ref_len, 3);
        assert_eq!(got[0].refseq, b"aaa".to_vec());
        assert!(got[0].at_start);
    }

    #[test]
    fn substitution_between_reference() {
        use crate::{Category, Run};

        let got = decode_all(b"aa a~ aa");

        let expected = vec![
            Run { category: Category::Reference, chrom: "unk".to_string(), start: 0, ref_len: 1, refseq: b"a".to_vec(), alleles: vec![b"a".to_vec(), b"a".to_vec()], at_start: true, anchor: None },
            Run { category: Category::Alt, chrom: "unk".to_string(), start: 1, ref_len: 1, refseq: b"a".to_vec(), alleles: vec![b"a".to_vec(), b"c".to_vec()], at_start: false, anchor: None },
            Run { category: Category::Reference, chrom: "unk".to_string(), start: 2, ref_len: 1, refseq: b"a".to_vec(), alleles: vec![b"a".to_vec(), b"a".to_vec()], at_start: false, anchor: None },
        ];

        assert_eq!(got, expected);
    }

    #[test]
    fn insertion_has_no_reference_length() {
        use crate::Category;

        // g g | insertion of 'a' on track 1 | c c
        let got = decode_all(b"gg .Q cc");

        assert_eq!(got.len(), 3);
        assert_eq!(got[1].category, Category::Alt);
        assert_eq!(got[1].start, 1);
        assert_eq!(got[1].ref_len, 0);
        assert!(got[1].refseq.is_empty());
        assert_eq!(got[1].alleles, vec![b"".to_vec(), b"a".to_vec()]);
        assert_eq!(got[2].start, 1);
    }

    #[test]
    fn run_length_block_flushes() {
        use crate::Category;

        let got = decode_all(b"aacc>R{100}gg");

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].ref_len, 2);
        assert_eq!(got[1].category, Category::Reference);
        assert_eq!(got[1].start, 2);
        assert_eq!(got[1].ref_len, 100);
        assert!(got[1].is_elided());
        assert_eq!(got[2].start, 102);
        assert_eq!(got[2].refseq, b"g".to_vec());
    }

    #[test]
    fn zero_length_block_is_skipped() {
        let got = decode_all(b"aa>N{0}aa");

        assert_eq!(got.len(), 2);
        assert_eq!(got[1].start, 1);
    }

    #[test]
    fn chromosome_and_position_messages() {
        let got = decode_all(b">C{chr2}>P{10}aacc>P{50}tt>#{note}tt");

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].chrom, "chr2");
        assert_eq!(got[0].start, 10);
        assert_eq!(got[0].ref_len, 2);
        assert!(got[0].at_start);
        assert_eq!(got[1].start, 50);
        assert_eq!(got[1].ref_len, 2);
        assert!(got[1].at_start);
    }

    #[test]
    fn nocall_run() {
        use crate::Category;

        let got = decode_all(b"aa aA nn cc");

        assert_eq!(got.len(), 3);
        assert_eq!(got[1].category, Category::NoCall);
        assert_eq!(got[1].ref_len, 2);
        assert_eq!(got[1].refseq, b"an".to_vec());
        assert_eq!(got[1].alleles, vec![b"an".to_vec(), b"nn".to_vec()]);
    }

    #[test]
    fn block_materialized_from_reference() {
        use super::Decoder;
        use crate::{Category, Options};
        use crate::reference::Reference;
        use std::io::Cursor;

        let mut reference = Reference::default();
        reference.insert("chr1", b"ACGTACGT");

        let mut input: Cursor<Vec<u8>> = Cursor::new(b">C{chr1}aa>N{3}tt".to_vec());
        let options = Options::default();
        let got = Decoder::new(&mut input, &options).with_reference(&reference).collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(got[1].category, Category::NoCall);
        assert_eq!(got[1].refseq, b"cgt".to_vec());
        assert_eq!(got[1].alleles, vec![b"nnn".to_vec(), b"nnn".to_vec()]);
        assert!(!got[1].is_elided());
    }

    #[test]
    fn reference_length_is_conserved() {
        use super::Decoder;
        use crate::Options;
        use crate::symbol::decode;
        use std::io::Cursor;

        let data = b"aaccQ.!!g&tt.W..nnA~=cQQ".to_vec();
        let consuming = data.chunks(2).filter(|slot| {
            slot.iter().filter(|x| **x != b'.').any(|x| decode(*x).unwrap().consumes_reference)
        }).count() as u64;

        let mut input: Cursor<Vec<u8>> = Cursor::new(data);
        let options = Options::default();
        let total: u64 = Decoder::new(&mut input, &options).map(|run| run.unwrap().ref_len).sum();

        assert_eq!(total, consuming);
    }

    #[test]
    fn message_inside_slot() {
        use super::Decoder;
        use crate::Options;
        use crate::error::PastaError;
        use std::io::Cursor;

        let mut input: Cursor<Vec<u8>> = Cursor::new(b"aaa>R{3}".to_vec());
        let options = Options::default();
        let got: Vec<Result<crate::Run, PastaError>> = Decoder::new(&mut input, &options).collect();

        assert_eq!(got.len(), 1);
        assert!(matches!(got[0], Err(PastaError::MalformedMessage { offset: 3, .. })));
    }

    #[test]
    fn truncated_slot() {
        use super::Decoder;
        use crate::Options;
        use crate::error::PastaError;
        use std::io::Cursor;

        let mut input: Cursor<Vec<u8>> = Cursor::new(b"aa~".to_vec());
        let options = Options::default();
        let got: Vec<Result<crate::Run, PastaError>> = Decoder::new(&mut input, &options).collect();

        assert!(matches!(got.last(), Some(Err(PastaError::MalformedMessage { .. }))));
    }

    #[test]
    fn haploid_stream() {
        use super::Decoder;
        use crate::{Category, Options};
        use std::io::Cursor;

        let mut input: Cursor<Vec<u8>> = Cursor::new(b"acg+t".to_vec());
        let options = Options { ploidy: 1, ..Default::default() };
        let got = Decoder::new(&mut input, &options).collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[1].category, Category::Alt);
        assert_eq!(got[1].refseq, b"t".to_vec());
        assert_eq!(got[1].alleles, vec![b"c".to_vec()]);
    }

    #[test]
    fn position_overflow_is_an_error() {
        use super::Decoder;
        use crate::Options;
        use crate::error::PastaError;
        use std::io::Cursor;

        let options = Options::default();

        let mut input: Cursor<Vec<u8>> = Cursor::new(b"aa>R{18446744073709551615}".to_vec());
        let got = Decoder::new(&mut input, &options).collect::<Result<Vec<_>, _>>();
        match got {
            Err(PastaError::InvalidNumber { offset, payload }) => {
                assert_eq!(offset, 2);
                assert_eq!(payload, "18446744073709551615");
            },
            _ => panic!("expected InvalidNumber"),
        }

        let mut input: Cursor<Vec<u8>> = Cursor::new(b">P{18446744073709551615}aa".to_vec());
        let got = Decoder::new(&mut input, &options).collect::<Result<Vec<_>, _>>();
        assert!(matches!(got, Err(PastaError::InvalidNumber { offset: 24, .. })));
    }
}
