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
use crate::Category;
use crate::error::PastaError;
use crate::symbol::decode;
use crate::symbol::SymbolKind;
use crate::symbol::Token;
use crate::symbol::NOP;

/// One aligned position across all tracks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub category: Category,
    /// Reference token shared by every track, [Token::Gap] for insertions.
    pub reference: Token,
    /// Allele token per track, [Token::Gap] for `.` and deletions.
    pub alleles: Vec<Token>,
    pub consumes_reference: bool,
}

/// Classify one symbol per track into a [Slot].
///
/// `symbols` holds each track's symbol byte with its stream offset. Returns
/// `Ok(None)` if every track holds the no-op symbol `.`.
///
/// ## Errors
///
/// [PastaError::InvalidSymbol] if a byte is not a symbol.
/// [PastaError::ReferenceMismatch] if the tracks disagree on the reference
/// token, or if `.` is paired with a symbol that consumes a reference base.
///
pub fn classify_slot(
    symbols: &[(u8, usize)],
) -> Result<Option<Slot>, PastaError> {
    let mut reference: Option<Token> = None;
    let mut nop_offset: Option<usize> = None;
    let mut alleles: Vec<Token> = Vec::with_capacity(symbols.len());
    let mut has_nocall = false;
    let mut has_variant = false;

    for (byte, offset) in symbols {
        if *byte == NOP {
            nop_offset.get_or_insert(*offset);
            alleles.push(Token::Gap);
            continue;
        }
        let symbol = decode(*byte).map_err(|err| err.with_offset(*offset))?;
        match reference {
            None => reference = Some(symbol.reference),
            Some(expected) if expected != symbol.reference => {
                return Err(PastaError::ReferenceMismatch { offset: *offset, expected: expected.to_byte(), found: symbol.reference.to_byte() });
            },
            _ => (),
        }
        has_nocall |= symbol.reference == Token::N || symbol.allele == Token::N;
        has_variant |= matches!(symbol.kind, SymbolKind::Sub | SymbolKind::Indel);
        alleles.push(symbol.allele);
    }

    let Some(reference) = reference else {
        return Ok(None);
    };

    if let Some(offset) = nop_offset {
        if reference != Token::Gap {
            // '.' only pads the tracks opposite an insertion
            return Err(PastaError::ReferenceMismatch { offset, expected: reference.to_byte(), found: Token::Gap.to_byte() });
        }
    }

    let category = if has_nocall {
        Category::NoCall
    } else if has_variant {
        Category::Alt
    } else {
        Category::Reference
    };

    Ok(Some(Slot { category, reference, alleles, consumes_reference: reference != Token::Gap }))
}
