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

//! Operations on symbol streams that do not need the reference.
//!
//! [interleave] merges two single-track streams into one stream with two
//! tracks, and [filter] extracts a window of reference positions from a
//! stream.
//!

use crate::Options;
use crate::control::ControlMessage;
use crate::decoder::reader::StreamItem;
use crate::decoder::reader::StreamReader;
use crate::decoder::slot::classify_slot;
use crate::error::PastaError;
use crate::printer::pasta::PastaWriter;
use crate::symbol::decode;
use crate::symbol::NOP;

use std::io::Read;
use std::io::Write;

use log::debug;

fn next_track_item<R: Read>(
    reader: &mut StreamReader<R>,
) -> Result<Option<StreamItem>, PastaError> {
    loop {
        match reader.next_item()? {
            Some(StreamItem::Symbol { byte: NOP, .. }) => continue,
            item => return Ok(item),
        }
    }
}

fn is_insertion(
    byte: u8,
    offset: usize,
) -> Result<bool, PastaError> {
    let symbol = decode(byte).map_err(|err| err.with_offset(offset))?;
    Ok(!symbol.consumes_reference)
}

fn unpaired(
    offset: usize,
    reason: &str,
) -> PastaError {
    PastaError::MalformedMessage { offset, reason: reason.to_string() }
}

/// Merge two single-track streams into one stream with two tracks.
///
/// Insertions on one track are paired with `.` on the other. Control
/// messages must appear at the same point on both tracks and are written
/// once. If one track ends first, the other may only continue with
/// insertions.
///
/// ## Errors
///
/// [PastaError::MalformedMessage] with the offset in the track that has the
/// unpaired item. [PastaError::InvalidSymbol] for bytes outside the alphabet.
///
/// ## Usage
///
/// ```rust
/// use pasta::stream::interleave;
/// use std::io::Cursor;
///
/// let mut first: Cursor<Vec<u8>> = Cursor::new(b">C{chr1}\naQcg".to_vec());
/// let mut second: Cursor<Vec<u8>> = Cursor::new(b">C{chr1}\nac%".to_vec());
///
/// let mut output: Vec<u8> = Vec::new();
/// interleave(&mut first, &mut second, &mut output, 50).unwrap();
///
/// assert_eq!(output, b">C{chr1}\naaQ.ccg%\n".to_vec());
/// ```
///
pub fn interleave<R1: Read, R2: Read, W: Write>(
    first: &mut R1,
    second: &mut R2,
    conn_out: &mut W,
    line_width: usize,
) -> Result<(), PastaError> {
    let mut reader_a = StreamReader::new(first);
    let mut reader_b = StreamReader::new(second);
    let mut writer = PastaWriter::new(conn_out, line_width);

    let mut a = next_track_item(&mut reader_a)?;
    let mut b = next_track_item(&mut reader_b)?;

    loop {
        // (advance a, advance b)
        let advance = match (&a, &b) {
            (None, None) => break,
            (Some(StreamItem::Message { msg: msg_a, .. }), Some(StreamItem::Message { msg: msg_b, offset })) => {
                if msg_a != msg_b {
                    return Err(unpaired(*offset, &format!("control message {} does not match {} on the first track", msg_b, msg_a)));
                }
                writer.write_message(msg_a)?;
                (true, true)
            },
            (Some(StreamItem::Symbol { byte: sym_a, offset: off_a }), Some(StreamItem::Symbol { byte: sym_b, offset: off_b })) => {
                let ins_a = is_insertion(*sym_a, *off_a)?;
                let ins_b = is_insertion(*sym_b, *off_b)?;
                if ins_a && !ins_b {
                    writer.write_symbols(&[*sym_a, NOP])?;
                    (true, false)
                } else if ins_b && !ins_a {
                    writer.write_symbols(&[NOP, *sym_b])?;
                    (false, true)
                } else {
                    writer.write_symbols(&[*sym_a, *sym_b])?;
                    (true, true)
                }
            },
            (Some(StreamItem::Symbol { byte, offset }), other) => {
                if !is_insertion(*byte, *offset)? {
                    let reason = match other {
                        None => "second track ended before the first",
                        _ => "symbol on the first track is paired with a control message",
                    };
                    return Err(unpaired(*offset, reason));
                }
                writer.write_symbols(&[*byte, NOP])?;
                (true, false)
            },
            (other, Some(StreamItem::Symbol { byte, offset })) => {
                if !is_insertion(*byte, *offset)? {
                    let reason = match other {
                        None => "first track ended before the second",
                        _ => "symbol on the second track is paired with a control message",
                    };
                    return Err(unpaired(*offset, reason));
                }
                writer.write_symbols(&[NOP, *byte])?;
                (false, true)
            },
            (Some(StreamItem::Message { offset, .. }), None) => {
                return Err(unpaired(*offset, "control message on the first track only"));
            },
            (None, Some(StreamItem::Message { offset, .. })) => {
                return Err(unpaired(*offset, "control message on the second track only"));
            },
        };

        if advance.0 {
            a = next_track_item(&mut reader_a)?;
        }
        if advance.1 {
            b = next_track_item(&mut reader_b)?;
        }
    }

    writer.finish()?;
    Ok(())
}

struct Window<'a, W: Write> {
    writer: PastaWriter<&'a mut W>,
    start: u64,
    end: u64,
    started: bool,
}

impl<W: Write> Window<'_, W> {
    fn ensure_started(
        &mut self,
        pos: u64,
    ) -> Result<(), PastaError> {
        if !self.started {
            self.writer.write_message(&ControlMessage::Position(pos))?;
            self.started = true;
        }
        Ok(())
    }

    fn contains(
        &self,
        pos: u64,
    ) -> bool {
        pos >= self.start && pos < self.end
    }
}

/// Copy the slots of reference positions `start` to `start + len` (exclusive).
///
/// The output starts with a position message. Run-length blocks are clipped
/// to the window, chromosome messages are passed through and comments are
/// dropped. Slots are validated like in [Decoder](crate::decoder::Decoder).
///
/// ## Usage
///
/// ```rust
/// use pasta::Options;
/// use pasta::stream::filter;
/// use std::io::Cursor;
///
/// let mut input: Cursor<Vec<u8>> = Cursor::new(b"aa>R{10}cc gg".to_vec());
/// let options = Options::default();
///
/// let mut output: Vec<u8> = Vec::new();
/// filter(&mut input, &mut output, 5, 7, &options).unwrap();
///
/// assert_eq!(output, b">P{5}\n>R{6}\ncc\n".to_vec());
/// ```
///
pub fn filter<R: Read, W: Write>(
    conn_in: &mut R,
    conn_out: &mut W,
    start: u64,
    len: u64,
    options: &Options,
) -> Result<(), PastaError> {
    let ploidy = options.ploidy.max(1);
    let mut reader = StreamReader::new(conn_in);
    let mut window = Window {
        writer: PastaWriter::new(conn_out, options.line_width),
        start,
        end: start.saturating_add(len),
        started: false,
    };

    let mut pos = 0_u64;
    let mut symbols: Vec<(u8, usize)> = Vec::with_capacity(ploidy);
    loop {
        let item = reader.next_item()?;
        match item {
            Some(StreamItem::Symbol { byte, offset }) => {
                symbols.push((byte, offset));
                if symbols.len() < ploidy {
                    continue;
                }
                if let Some(slot) = classify_slot(&symbols)? {
                    if window.contains(pos) {
                        window.ensure_started(pos)?;
                        let bytes = symbols.iter().map(|(byte, _)| *byte).collect::<Vec<u8>>();
                        window.writer.write_symbols(&bytes)?;
                    }
                    if slot.consumes_reference {
                        pos = pos.saturating_add(1);
                    }
                }
                symbols.clear();
            },
            Some(StreamItem::Message { msg, offset }) => {
                if !symbols.is_empty() {
                    return Err(PastaError::MalformedMessage { offset, reason: format!("control message after {} of {} symbols in a position", symbols.len(), ploidy) });
                }
                if let Some((_, count)) = msg.block() {
                    let from = pos.max(window.start);
                    let to = pos.saturating_add(count).min(window.end);
                    if from < to {
                        window.ensure_started(from)?;
                        let clipped = match msg {
                            ControlMessage::NoCall(_) => ControlMessage::NoCall(to - from),
                            _ => ControlMessage::Reference(to - from),
                        };
                        window.writer.write_message(&clipped)?;
                    }
                    pos = pos.saturating_add(count);
                    continue;
                }
                match msg {
                    ControlMessage::Chromosome(_) => {
                        window.writer.write_message(&msg)?;
                        window.started = false;
                        pos = 0;
                    },
                    ControlMessage::Position(next) => {
                        window.started = false;
                        pos = next;
                    },
                    _ => debug!("Dropping {} at byte {}", msg, offset),
                }
            },
            None => {
                if !symbols.is_empty() {
                    return Err(PastaError::MalformedMessage { offset: reader.offset(), reason: format!("stream ended after {} of {} symbols in a position", symbols.len(), ploidy) });
                }
                break;
            },
        }
    }

    window.writer.finish()?;
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {

    fn interleave_bytes(a: &[u8], b: &[u8]) -> Result<Vec<u8>, crate::error::PastaError> {
        use super::interleave;
        use std::io::Cursor;

        let mut first: Cursor<Vec<u8>> = Cursor::new(a.to_vec());
        let mut second: Cursor<Vec<u8>> = Cursor::new(b.to_vec());
        let mut out: Vec<u8> = Vec::new();
        interleave(&mut first, &mut second, &mut out, 0)?;
        Ok(out)
    }

    fn filter_bytes(data: &[u8], start: u64, len: u64) -> Result<Vec<u8>, crate::error::PastaError> {
        use super::filter;
        use crate::Options;
        use std::io::Cursor;

        let mut input: Cursor<Vec<u8>> = Cursor::new(data.to_vec());
        let mut out: Vec<u8> = Vec::new();
        filter(&mut input, &mut out, start, len, &Options::default())?;
        Ok(out)
    }

    #[test]
    fn interleave_substitutions() {
        let got = interleave_bytes(b"acgt", b"a=g\nt").unwrap();
        assert_eq!(got, b"aac=ggtt\n".to_vec());
    }

    #[test]
    fn interleave_drops_nop() {
        let got = interleave_bytes(b"a.c", b"ac").unwrap();
        assert_eq!(got, b"aacc\n".to_vec());
    }

    #[test]
    fn interleave_insertion_at_end() {
        let got = interleave_bytes(b"acQ", b"ac").unwrap();
        assert_eq!(got, b"aaccQ.\n".to_vec());
    }

    #[test]
    fn interleave_insertions_on_both_tracks() {
        let got = interleave_bytes(b"aQc", b"aSWc").unwrap();
        assert_eq!(got, b"aaQS.Wcc\n".to_vec());
    }

    #[test]
    fn interleave_track_ends_early() {
        use crate::error::PastaError;

        let got = interleave_bytes(b"acg", b"ac");
        assert!(matches!(got, Err(PastaError::MalformedMessage { offset: 2, .. })));
    }

    #[test]
    fn interleave_mismatched_messages() {
        use crate::error::PastaError;

        let got = interleave_bytes(b"aa>R{3}", b"aa>R{4}");
        assert!(matches!(got, Err(PastaError::MalformedMessage { offset: 2, .. })));

        let got = interleave_bytes(b"a>R{3}", b"ac");
        assert!(matches!(got, Err(PastaError::MalformedMessage { offset: 1, .. })));
    }

    #[test]
    fn filter_window() {
        let got = filter_bytes(b"aa cc gg tt aa", 1, 3).unwrap();
        assert_eq!(got, b">P{1}\nccggtt\n".to_vec());
    }

    #[test]
    fn filter_keeps_insertions_in_window() {
        let got = filter_bytes(b"aa .Q cc gg", 1, 1).unwrap();
        assert_eq!(got, b">P{1}\n.Qcc\n".to_vec());
    }

    #[test]
    fn filter_passes_chromosome_and_drops_comments() {
        let got = filter_bytes(b">C{chr2}>#{note}aacc>N{5}", 1, 3).unwrap();
        assert_eq!(got, b">C{chr2}\n>P{1}\ncc\n>N{2}\n".to_vec());
    }

    #[test]
    fn filter_after_position_jump() {
        let got = filter_bytes(b"aa>P{100}ccgg", 100, 10).unwrap();
        assert_eq!(got, b">P{100}\nccgg\n".to_vec());

        let got = filter_bytes(b"aa>P{100}ccgg", 50, 10).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn filter_validates_slots() {
        use crate::error::PastaError;

        assert!(matches!(filter_bytes(b"aacg", 0, 10), Err(PastaError::ReferenceMismatch { offset: 3, .. })));
        assert!(matches!(filter_bytes(b"aac", 0, 10), Err(PastaError::MalformedMessage { .. })));
    }
}
