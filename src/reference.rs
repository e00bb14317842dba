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

//! Reference sequences used to expand and check symbol streams.
//!
//! Bases are stored lowercase, anything other than `acgt` is stored as `n`.
//! A reference holding a single sequence answers for any chromosome name so
//! that a bare sequence file can be used with streams that name their
//! chromosome.
//!

use indexmap::IndexMap;

use std::io::Read;
use std::path::Path;

use log::info;

type E = Box<dyn std::error::Error>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reference {
    sequences: IndexMap<String, Vec<u8>>,
}

fn normalize_base(
    byte: u8,
) -> u8 {
    match byte.to_ascii_lowercase() {
        b'a' => b'a',
        b'c' => b'c',
        b'g' => b'g',
        b't' => b't',
        _ => b'n',
    }
}

impl Reference {
    /// Add or replace the sequence called `name`.
    pub fn insert(
        &mut self,
        name: &str,
        seq: &[u8],
    ) {
        let bases = seq.iter().map(|x| normalize_base(*x)).collect::<Vec<u8>>();
        self.sequences.insert(name.to_string(), bases);
    }

    /// Read all records from a fasta or fastq file.
    ///
    /// Record names are cut at the first whitespace. Gzipped files are
    /// supported.
    ///
    pub fn from_fasta_path(
        path: &Path,
    ) -> Result<Self, E> {
        let mut reader = needletail::parse_fastx_file(path)?;
        let mut reference = Reference::default();
        while let Some(record) = reader.next() {
            let record = record?;
            let id = String::from_utf8_lossy(record.id()).to_string();
            let name = id.split_whitespace().next().unwrap_or_default().to_string();
            reference.insert(&name, &record.seq());
        }
        info!("Read {} reference sequence(s) from {}", reference.len(), path.display());
        Ok(reference)
    }

    /// Read a single sequence of bare bases from `conn`.
    ///
    /// Whitespace and lines starting with `>` are skipped.
    ///
    pub fn from_sequence_reader<R: Read>(
        name: &str,
        conn: &mut R,
    ) -> Result<Self, E> {
        let mut contents: Vec<u8> = Vec::new();
        conn.read_to_end(&mut contents)?;

        let mut seq: Vec<u8> = Vec::with_capacity(contents.len());
        contents.split(|x| *x == b'\n').filter(|line| !line.starts_with(b">")).for_each(|line| {
            seq.extend(line.iter().filter(|x| !x.is_ascii_whitespace()));
        });

        let mut reference = Reference::default();
        reference.insert(name, &seq);
        Ok(reference)
    }

    fn sequence(
        &self,
        chrom: &str,
    ) -> Option<&Vec<u8>> {
        match self.sequences.get(chrom) {
            Some(seq) => Some(seq),
            None if self.sequences.len() == 1 => self.sequences.first().map(|(_, seq)| seq),
            None => None,
        }
    }

    /// Base at 0-based `pos` of `chrom`, or None past the end.
    pub fn base(
        &self,
        chrom: &str,
        pos: u64,
    ) -> Option<u8> {
        self.sequence(chrom).and_then(|seq| seq.get(pos as usize).copied())
    }

    /// `len` bases starting from 0-based `start`, or None if they are not all available.
    pub fn range(
        &self,
        chrom: &str,
        start: u64,
        len: u64,
    ) -> Option<&[u8]> {
        let seq = self.sequence(chrom)?;
        let end = start.checked_add(len)? as usize;
        seq.get((start as usize)..end)
    }

    pub fn names(
        &self,
    ) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(|x| x.as_str())
    }

    pub fn len(
        &self,
    ) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(
        &self,
    ) -> bool {
        self.sequences.is_empty()
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn insert_normalizes_bases() {
        use super::Reference;

        let mut reference = Reference::default();
        reference.insert("chr1", b"ACgtRYN");

        assert_eq!(reference.range("chr1", 0, 7), Some(b"acgtnnn".as_slice()));
    }

    #[test]
    fn single_sequence_answers_any_name() {
        use super::Reference;

        let mut reference = Reference::default();
        reference.insert("seq", b"acgt");

        assert_eq!(reference.base("chr7", 2), Some(b'g'));
        assert_eq!(reference.base("chr7", 4), None);

        reference.insert("other", b"tttt");
        assert_eq!(reference.base("chr7", 2), None);
        assert_eq!(reference.base("other", 2), Some(b't'));
    }

    #[test]
    fn range_past_end() {
        use super::Reference;

        let mut reference = Reference::default();
        reference.insert("chr1", b"acgt");

        assert_eq!(reference.range("chr1", 2, 2), Some(b"gt".as_slice()));
        assert_eq!(reference.range("chr1", 2, 3), None);
        assert_eq!(reference.range("chr1", u64::MAX, 2), None);
    }

    #[test]
    fn from_sequence_reader_skips_headers_and_whitespace() {
        use super::Reference;
        use std::io::Cursor;

        let mut data: Cursor<Vec<u8>> = Cursor::new(b">ref\nACGT\nac gt\r\n".to_vec());
        let reference = Reference::from_sequence_reader("chr1", &mut data).unwrap();

        assert_eq!(reference.len(), 1);
        assert_eq!(reference.names().collect::<Vec<&str>>(), vec!["chr1"]);
        assert_eq!(reference.range("chr1", 0, 8), Some(b"acgtacgt".as_slice()));
    }
}
