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

//! Errors raised while reading, reconciling, or writing symbol streams.
//!
//! Every variant is fatal for the conversion it occurs in. Offsets are byte
//! offsets into the symbol stream, lines are 1-based line numbers in a text
//! format.

/// Errors from the symbol codec and the engines built on it.
#[derive(Debug)]
#[non_exhaustive]
pub enum PastaError {
    /// A (reference, allele) byte pair has no symbol.
    InvalidPair { reference: u8, allele: u8 },
    /// A byte in the stream is not a symbol.
    InvalidSymbol { symbol: u8, offset: usize },
    /// A control message is not of the form `>X{payload}`.
    MalformedMessage { offset: usize, reason: String },
    /// A position or run length payload is not a number.
    InvalidNumber { offset: usize, payload: String },
    /// Two tracks, or a track and the reference, disagree on the reference base.
    ReferenceMismatch { offset: usize, expected: u8, found: u8 },
    /// The reference has no base at a position that needs one.
    MissingReference { chrom: String, position: u64 },
    /// More alleles than the ploidy allows.
    PloidyMismatch { ploidy: usize, alleles: usize },
    /// An insertion or deletion has no neighbour to borrow an anchor base from.
    NoAnchor { chrom: String, position: u64 },
    /// A line in a text format could not be interpreted.
    Format { line: usize, message: String },
    Io(std::io::Error),
}

impl PastaError {
    /// Shift a stream offset by `base`.
    ///
    /// Used when an error was raised on a slice that starts `base` bytes into
    /// the stream.
    ///
    pub fn with_offset(
        self,
        base: usize,
    ) -> Self {
        match self {
            PastaError::InvalidSymbol { symbol, offset } => PastaError::InvalidSymbol { symbol, offset: offset + base },
            PastaError::MalformedMessage { offset, reason } => PastaError::MalformedMessage { offset: offset + base, reason },
            PastaError::InvalidNumber { offset, payload } => PastaError::InvalidNumber { offset: offset + base, payload },
            PastaError::ReferenceMismatch { offset, expected, found } => PastaError::ReferenceMismatch { offset: offset + base, expected, found },
            other => other,
        }
    }
}

impl std::fmt::Display for PastaError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PastaError::InvalidPair { reference, allele } => write!(f, "No symbol for reference '{}' and allele '{}'", *reference as char, *allele as char),
            PastaError::InvalidSymbol { symbol, offset } => write!(f, "Invalid symbol '{}' at byte {}", symbol.escape_ascii(), offset),
            PastaError::MalformedMessage { offset, reason } => write!(f, "Malformed control message at byte {}: {}", offset, reason),
            PastaError::InvalidNumber { offset, payload } => write!(f, "Invalid number '{}' in control message at byte {}", payload, offset),
            PastaError::ReferenceMismatch { offset, expected, found } => write!(f, "Reference mismatch at {}: expected '{}', found '{}'", offset, *expected as char, *found as char),
            PastaError::MissingReference { chrom, position } => write!(f, "No reference base for {}:{}", chrom, position + 1),
            PastaError::PloidyMismatch { ploidy, alleles } => write!(f, "{} alleles given for ploidy {}", alleles, ploidy),
            PastaError::NoAnchor { chrom, position } => write!(f, "No anchor base available for the variant at {}:{}", chrom, position + 1),
            PastaError::Format { line, message } => write!(f, "Line {}: {}", line, message),
            PastaError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PastaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PastaError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PastaError {
    fn from(err: std::io::Error) -> Self {
        PastaError::Io(err)
    }
}
