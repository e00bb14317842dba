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
use crate::control::ControlMessage;
use crate::error::PastaError;
use crate::symbol::is_whitespace;

use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;

/// One item of a symbol stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamItem {
    /// A symbol byte and its offset in the stream.
    Symbol { byte: u8, offset: usize },
    /// A control message and the offset of its `>`.
    Message { msg: ControlMessage, offset: usize },
}

/// Reads symbols and control messages from a [Read], skipping whitespace.
///
/// Symbol bytes are returned as is, validating them is left to the caller.
///
pub struct StreamReader<'a, R: Read> {
    reader: BufReader<&'a mut R>,
    offset: usize,
}

impl<'a, R: Read> StreamReader<'a, R> {
    pub fn new(
        conn: &'a mut R,
    ) -> Self {
        StreamReader { reader: BufReader::new(conn), offset: 0 }
    }
}

impl<R: Read> StreamReader<'_, R> {
    /// Number of bytes consumed so far.
    pub fn offset(
        &self,
    ) -> usize {
        self.offset
    }

    fn next_byte(
        &mut self,
    ) -> Result<Option<u8>, PastaError> {
        let buf = self.reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        let byte = buf[0];
        self.reader.consume(1);
        self.offset += 1;
        Ok(Some(byte))
    }

    fn read_message(
        &mut self,
    ) -> Result<ControlMessage, PastaError> {
        let start = self.offset;
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(byte) = self.next_byte()? {
            bytes.push(byte);
            if byte == b'}' {
                break;
            }
        }
        let (msg, _) = ControlMessage::parse(&bytes).map_err(|err| err.with_offset(start))?;
        Ok(msg)
    }

    /// Read the next symbol or control message.
    ///
    /// Returns `Ok(None)` at the end of the stream.
    ///
    pub fn next_item(
        &mut self,
    ) -> Result<Option<StreamItem>, PastaError> {
        loop {
            let Some(byte) = self.next_byte()? else {
                return Ok(None);
            };
            if is_whitespace(byte) {
                continue;
            }
            let offset = self.offset - 1;
            if byte == b'>' {
                let msg = self.read_message()?;
                return Ok(Some(StreamItem::Message { msg, offset }));
            }
            return Ok(Some(StreamItem::Symbol { byte, offset }));
        }
    }
}
