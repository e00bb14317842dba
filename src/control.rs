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

//! Inline control messages.
//!
//! A control message starts with `>`, followed by a one character tag and a
//! payload in braces:
//!
//!   - `>R{n}` a run of `n` reference positions.
//!   - `>N{n}` a run of `n` no-call positions.
//!   - `>C{name}` switch to chromosome `name`.
//!   - `>P{n}` continue at 0-based reference position `n`.
//!   - `>#{text}` a comment.
//!
//! ## Usage
//!
//! ```rust
//! use pasta::control::ControlMessage;
//!
//! // The parser is given the bytes after '>'
//! let (msg, consumed) = ControlMessage::parse(b"R{100}acgt").unwrap();
//! assert_eq!(msg, ControlMessage::Reference(100));
//! assert_eq!(consumed, 6);
//! assert_eq!(msg.to_string(), ">R{100}");
//! ```
//!

use crate::Category;
use crate::error::PastaError;

use bstr::ByteSlice;

/// A directive embedded in a symbol stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlMessage {
    /// Absolute 0-based reference position.
    Position(u64),
    /// Chromosome name.
    Chromosome(String),
    /// Run of reference positions with the sequence left out.
    Reference(u64),
    /// Run of no-call positions with the sequence left out.
    NoCall(u64),
    /// Free text, ignored when decoding.
    Comment(String),
}

impl ControlMessage {
    /// Parse a control message from `bytes`, which start right after `>`.
    ///
    /// Returns the message and the number of bytes consumed, including the
    /// closing brace.
    ///
    /// ## Errors
    ///
    /// [PastaError::MalformedMessage] if the tag is unknown, if `{` does not
    /// follow the tag, or if there is no closing `}`.
    /// [PastaError::InvalidNumber] if a position or run length is not a
    /// non-negative integer.
    ///
    pub fn parse(
        bytes: &[u8],
    ) -> Result<(ControlMessage, usize), PastaError> {
        let tag = *bytes.first().ok_or(PastaError::MalformedMessage { offset: 0, reason: "missing tag".to_string() })?;
        if !matches!(tag, b'P' | b'C' | b'R' | b'N' | b'#') {
            return Err(PastaError::MalformedMessage { offset: 0, reason: format!("unknown tag '{}'", tag.escape_ascii()) });
        }
        if bytes.get(1) != Some(&b'{') {
            return Err(PastaError::MalformedMessage { offset: 1, reason: "expected '{' after the tag".to_string() });
        }

        let close = bytes[2..].find_byte(b'}').ok_or(PastaError::MalformedMessage { offset: bytes.len(), reason: "unterminated message".to_string() })?;
        let payload = &bytes[2..(2 + close)];
        let consumed = 2 + close + 1;

        let msg = match tag {
            b'P' => ControlMessage::Position(parse_number(payload, 2)?),
            b'R' => ControlMessage::Reference(parse_number(payload, 2)?),
            b'N' => ControlMessage::NoCall(parse_number(payload, 2)?),
            b'C' => {
                if payload.is_empty() {
                    return Err(PastaError::MalformedMessage { offset: 2, reason: "empty chromosome name".to_string() });
                }
                ControlMessage::Chromosome(payload.to_str_lossy().into_owned())
            },
            _ => ControlMessage::Comment(payload.to_str_lossy().into_owned()),
        };

        Ok((msg, consumed))
    }

    /// Category and length if this is a run-length block.
    pub fn block(
        &self,
    ) -> Option<(Category, u64)> {
        match self {
            ControlMessage::Reference(count) => Some((Category::Reference, *count)),
            ControlMessage::NoCall(count) => Some((Category::NoCall, *count)),
            _ => None,
        }
    }
}

fn parse_number(
    payload: &[u8],
    offset: usize,
) -> Result<u64, PastaError> {
    payload.to_str().ok()
        .and_then(|x| x.parse::<u64>().ok())
        .ok_or(PastaError::InvalidNumber { offset, payload: payload.to_str_lossy().into_owned() })
}

impl std::fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ControlMessage::Position(pos) => write!(f, ">P{{{}}}", pos),
            ControlMessage::Chromosome(name) => write!(f, ">C{{{}}}", name),
            ControlMessage::Reference(count) => write!(f, ">R{{{}}}", count),
            ControlMessage::NoCall(count) => write!(f, ">N{{{}}}", count),
            ControlMessage::Comment(text) => write!(f, ">#{{{}}}", text),
        }
    }
}
