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
use crate::Run;
use crate::control::ControlMessage;
use crate::error::PastaError;
use crate::symbol::align_left;

/// Writes symbols folded into lines of a fixed width.
///
/// Control messages are written on a line of their own.
///
pub struct PastaWriter<W: Write> {
    conn: W,
    line_width: usize,
    column: usize,
}

impl<W: Write> PastaWriter<W> {
    /// Fold lines after `line_width` symbols, or never if it is 0.
    pub fn new(
        conn: W,
        line_width: usize,
    ) -> Self {
        PastaWriter { conn, line_width, column: 0 }
    }

    pub fn get_mut(
        &mut self,
    ) -> &mut W {
        &mut self.conn
    }

    pub fn write_symbol(
        &mut self,
        symbol: u8,
    ) -> std::io::Result<()> {
        if self.line_width > 0 && self.column == self.line_width {
            self.conn.write_all(b"\n")?;
            self.column = 0;
        }
        self.conn.write_all(&[symbol])?;
        self.column += 1;
        Ok(())
    }

    pub fn write_symbols(
        &mut self,
        symbols: &[u8],
    ) -> std::io::Result<()> {
        symbols.iter().try_for_each(|x| self.write_symbol(*x))
    }

    pub fn write_message(
        &mut self,
        msg: &ControlMessage,
    ) -> std::io::Result<()> {
        if self.column > 0 {
            self.conn.write_all(b"\n")?;
            self.column = 0;
        }
        writeln!(self.conn, "{}", msg)
    }

    /// Terminate the last line and flush.
    pub fn finish(
        &mut self,
    ) -> std::io::Result<()> {
        if self.column > 0 {
            self.conn.write_all(b"\n")?;
            self.column = 0;
        }
        self.conn.flush()
    }
}

/// Format a single run as symbols
///
/// `cursor` holds the chromosome and position the stream is at and is
/// updated. Chromosome and position messages are written when the run does
/// not continue from `cursor`. Elided runs are written as run-length blocks,
/// other runs as their left-aligned alignment.
///
pub fn format_pasta_run<W: Write>(
    run: &Run,
    cursor: &mut (String, u64),
    writer: &mut PastaWriter<W>,
) -> Result<(), PastaError> {
    if run.chrom != cursor.0 {
        writer.write_message(&ControlMessage::Chromosome(run.chrom.clone()))?;
        *cursor = (run.chrom.clone(), 0);
    }
    if run.start != cursor.1 {
        writer.write_message(&ControlMessage::Position(run.start))?;
    }

    if run.is_elided() {
        let msg = match run.category {
            Category::NoCall => ControlMessage::NoCall(run.ref_len),
            _ => ControlMessage::Reference(run.ref_len),
        };
        writer.write_message(&msg)?;
    } else {
        writer.write_symbols(&align_left(&run.refseq, &run.alleles)?)?;
    }

    cursor.1 = run.end();
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn write_symbols_folds_lines() {
        use super::PastaWriter;

        let mut got: Vec<u8> = Vec::new();
        let mut writer = PastaWriter::new(&mut got, 4);
        writer.write_symbols(b"aaccggtt").unwrap();
        writer.write_symbol(b'~').unwrap();
        writer.finish().unwrap();

        assert_eq!(got, b"aacc\nggtt\n~\n".to_vec());
    }

    #[test]
    fn write_message_on_own_line() {
        use super::PastaWriter;
        use crate::control::ControlMessage;

        let mut got: Vec<u8> = Vec::new();
        let mut writer = PastaWriter::new(&mut got, 50);
        writer.write_symbols(b"aa").unwrap();
        writer.write_message(&ControlMessage::Reference(10)).unwrap();
        writer.write_symbols(b"cc").unwrap();
        writer.finish().unwrap();

        assert_eq!(got, b"aa\n>R{10}\ncc\n".to_vec());
    }

    #[test]
    fn unfolded_writer() {
        use super::PastaWriter;

        let mut got: Vec<u8> = Vec::new();
        let mut writer = PastaWriter::new(&mut got, 0);
        writer.write_symbols(&[b'a'; 120]).unwrap();
        writer.finish().unwrap();

        assert_eq!(got.len(), 121);
        assert_eq!(got.iter().filter(|x| **x == b'\n').count(), 1);
    }

    #[test]
    fn format_runs_with_jumps() {
        use super::{format_pasta_run, PastaWriter};
        use crate::{Category, Run};

        let runs = vec![
            Run { category: Category::Reference, chrom: "chr2".to_string(), start: 0, ref_len: 2, refseq: b"ac".to_vec(), alleles: vec![b"ac".to_vec(), b"ac".to_vec()], at_start: true, anchor: None },
            Run { category: Category::NoCall, chrom: "chr2".to_string(), start: 2, ref_len: 30, alleles: vec![Vec::new(), Vec::new()], ..Default::default() },
            Run { category: Category::Alt, chrom: "chr2".to_string(), start: 100, ref_len: 1, refseq: b"g".to_vec(), alleles: vec![b"g".to_vec(), b"ga".to_vec()], at_start: true, anchor: None },
        ];

        let mut got: Vec<u8> = Vec::new();
        let mut writer = PastaWriter::new(&mut got, 50);
        let mut cursor = ("unk".to_string(), 0);
        runs.iter().for_each(|run| format_pasta_run(run, &mut cursor, &mut writer).unwrap());
        writer.finish().unwrap();

        assert_eq!(got, b">C{chr2}\naacc\n>N{30}\n>P{100}\ngg.Q\n".to_vec());
        assert_eq!(cursor, ("chr2".to_string(), 101));
    }
}
