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

//! The symbol alphabet.
//!
//! Each symbol is one printable byte standing for a (reference, allele)
//! token pair at one aligned position of one track:
//!
//! | ref \ alt | a  | c  | g  | t  | n  | gap |
//! |-----------|----|----|----|----|----|-----|
//! | a         | a  | ~  | ?  | @  | A  | !   |
//! | c         | =  | c  | :  | ;  | C  | $   |
//! | g         | #  | &  | g  | %  | G  | 7   |
//! | t         | *  | +  | -  | t  | T  | E   |
//! | n         | '  | "  | ,  | _  | n  | z   |
//! | gap       | Q  | S  | W  | d  | Z  | .   |
//!
//! `N` is read as an alias of `n`. Both tables are built at compile time and
//! never change.
//!
//! ## Usage
//!
//! ```rust
//! use pasta::symbol::{decode, encode, SymbolKind, Token};
//!
//! let symbol = encode(Token::A, Token::C);
//! assert_eq!(symbol, b'~');
//!
//! let decoded = decode(b'~').unwrap();
//! assert_eq!(decoded.reference, Token::A);
//! assert_eq!(decoded.allele, Token::C);
//! assert_eq!(decoded.kind, SymbolKind::Sub);
//! assert!(decoded.consumes_reference);
//! ```
//!

use crate::error::PastaError;

/// The no-op symbol, (gap, gap).
pub const NOP: u8 = b'.';

/// Content of one track at one aligned position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    A,
    C,
    G,
    T,
    /// No-call.
    N,
    /// No content, the other side has an insertion or deletion here.
    Gap,
}

impl Token {
    pub const ALL: [Token; 6] = [Token::A, Token::C, Token::G, Token::T, Token::N, Token::Gap];

    /// Parse a sequence byte, `acgtn` in any case or `-` for a gap.
    pub fn from_byte(
        byte: u8,
    ) -> Option<Token> {
        match byte {
            b'a' | b'A' => Some(Token::A),
            b'c' | b'C' => Some(Token::C),
            b'g' | b'G' => Some(Token::G),
            b't' | b'T' => Some(Token::T),
            b'n' | b'N' => Some(Token::N),
            b'-' => Some(Token::Gap),
            _ => None,
        }
    }

    /// Lowercase sequence byte, `-` for a gap.
    pub fn to_byte(
        self,
    ) -> u8 {
        b"acgtn-"[self as usize]
    }

    /// True for `a`, `c`, `g` and `t`.
    pub fn is_base(
        self,
    ) -> bool {
        !matches!(self, Token::N | Token::Gap)
    }
}

/// How a single symbol relates its allele to the reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    /// Allele matches the reference base.
    Ref,
    /// Allele is a different base.
    Sub,
    /// Exactly one of the tokens is a gap.
    Indel,
    /// Either token is a no-call and neither is a gap.
    NoCall,
    /// Both tokens are gaps.
    Nop,
}

/// A decoded symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub reference: Token,
    pub allele: Token,
    pub kind: SymbolKind,
    /// Whether the symbol advances the reference coordinate.
    pub consumes_reference: bool,
}

const ENCODE: [[u8; 6]; 6] = [
    *b"a~?@A!",
    *b"=c:;C$",
    *b"#&g%G7",
    *b"*+-tTE",
    *b"'\",_nz",
    *b"QSWdZ.",
];

const UNASSIGNED: u8 = u8::MAX;

const fn build_decode_table() -> [u8; 256] {
    let mut table = [UNASSIGNED; 256];
    let mut r = 0;
    while r < 6 {
        let mut a = 0;
        while a < 6 {
            table[ENCODE[r][a] as usize] = (r * 6 + a) as u8;
            a += 1;
        }
        r += 1;
    }
    // 'N' is an alias of 'n'
    table[b'N' as usize] = (4 * 6 + 4) as u8;
    table
}

static DECODE: [u8; 256] = build_decode_table();

fn kind_of(
    reference: Token,
    allele: Token,
) -> SymbolKind {
    match (reference, allele) {
        (Token::Gap, Token::Gap) => SymbolKind::Nop,
        (Token::Gap, _) | (_, Token::Gap) => SymbolKind::Indel,
        (Token::N, _) | (_, Token::N) => SymbolKind::NoCall,
        (r, a) if r == a => SymbolKind::Ref,
        _ => SymbolKind::Sub,
    }
}

/// Encode a token pair into its symbol.
pub fn encode(
    reference: Token,
    allele: Token,
) -> u8 {
    ENCODE[reference as usize][allele as usize]
}

/// Encode a pair of sequence bytes into a symbol.
///
/// Accepts `acgtn` in either case and `-` for a gap on either side.
///
/// ## Errors
///
/// Returns [PastaError::InvalidPair] if either byte is not a sequence byte.
///
pub fn encode_bytes(
    reference: u8,
    allele: u8,
) -> Result<u8, PastaError> {
    match (Token::from_byte(reference), Token::from_byte(allele)) {
        (Some(r), Some(a)) => Ok(encode(r, a)),
        _ => Err(PastaError::InvalidPair { reference, allele }),
    }
}

/// Decode a symbol into its token pair.
///
/// ## Errors
///
/// Returns [PastaError::InvalidSymbol] with offset 0 if `symbol` is not in the
/// alphabet. Callers reading from a stream shift the offset with
/// [PastaError::with_offset].
///
pub fn decode(
    symbol: u8,
) -> Result<Symbol, PastaError> {
    let idx = DECODE[symbol as usize];
    if idx == UNASSIGNED {
        return Err(PastaError::InvalidSymbol { symbol, offset: 0 });
    }
    let reference = Token::ALL[(idx / 6) as usize];
    let allele = Token::ALL[(idx % 6) as usize];
    Ok(Symbol {
        reference,
        allele,
        kind: kind_of(reference, allele),
        consumes_reference: reference != Token::Gap,
    })
}

/// Encode aligned alleles into slots, left-aligning every difference in length.
///
/// Position `i` pairs `reference[i]` with `allele[i]` of each track, a
/// sequence shorter than the longest one is padded with gaps. Returns the
/// symbols slot by slot, one symbol per track in each slot.
///
/// ## Errors
///
/// Returns [PastaError::InvalidPair] if a byte is not a sequence byte.
///
/// ## Usage
///
/// ```rust
/// use pasta::symbol::align_left;
///
/// let alleles = vec![b"g".to_vec(), b"ga".to_vec()];
/// let got = align_left(b"g", &alleles).unwrap();
///
/// assert_eq!(got, b"gg.Q".to_vec());
/// ```
///
pub fn align_left(
    reference: &[u8],
    alleles: &[Vec<u8>],
) -> Result<Vec<u8>, PastaError> {
    let width = alleles.iter().map(|x| x.len()).chain(std::iter::once(reference.len())).max().unwrap_or(0);

    let mut symbols: Vec<u8> = Vec::with_capacity(width * alleles.len());
    for i in 0..width {
        let ref_byte = reference.get(i).copied().unwrap_or(b'-');
        for allele in alleles {
            let alt_byte = allele.get(i).copied().unwrap_or(b'-');
            symbols.push(encode_bytes(ref_byte, alt_byte)?);
        }
    }
    Ok(symbols)
}

/// Bytes skipped between symbols.
pub fn is_whitespace(
    byte: u8,
) -> bool {
    matches!(byte, b'\n' | b' ' | b'\t' | b'\r')
}
