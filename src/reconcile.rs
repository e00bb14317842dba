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

//! Anchor runs so that they can be written as variant records.
//!
//! Variant call formats do not allow empty reference or alternate alleles.
//! Insertions (no reference bases) and deletions (an allele with no bases)
//! must carry one extra reference base shared by all alleles. [Reconciler]
//! looks at adjacent pairs of [Run]s and moves that base over from a
//! neighbour:
//!
//!   - An anchor-starved run following a reference run takes the last base of
//!     the reference run (a trailing peel, [AnchorSide::Left]).
//!   - An anchor-starved run with no usable run before it takes the first base
//!     of the reference run after it (a leading peel, [AnchorSide::Right]).
//!
//! Adjacent alt and no-call runs are merged into one run before anchoring.
//! The reconciler never holds more than two runs.
//!
//! ## Usage
//!
//! ```rust
//! use pasta::{AnchorSide, Category, Options};
//! use pasta::decoder::Decoder;
//! use pasta::reconcile::Reconciled;
//! use std::io::Cursor;
//!
//! // Reference 'cgt', track 2 has an 'a' inserted after the 'g'
//! let mut input: Cursor<Vec<u8>> = Cursor::new(b"cc gg .Q tt".to_vec());
//! let options = Options::default();
//!
//! let mut runs = Decoder::new(&mut input, &options);
//! let anchored = Reconciled::new(&mut runs).collect::<Result<Vec<_>, _>>().unwrap();
//!
//! assert_eq!(anchored.len(), 3);
//! assert_eq!(anchored[0].refseq, b"c".to_vec());
//! assert_eq!(anchored[1].category, Category::Alt);
//! assert_eq!(anchored[1].start, 1);
//! assert_eq!(anchored[1].refseq, b"g".to_vec());
//! assert_eq!(anchored[1].alleles, vec![b"g".to_vec(), b"ga".to_vec()]);
//! assert_eq!(anchored[1].anchor, Some(AnchorSide::Left));
//! ```
//!

use crate::AnchorSide;
use crate::Category;
use crate::Options;
use crate::Run;
use crate::VariantRecord;
use crate::error::PastaError;
use crate::genotype::assign;
use crate::genotype::genotype_string;

use std::collections::VecDeque;

use log::debug;
use log::warn;

/// Placeholder lent by a run whose sequence is not known.
const UNKNOWN_BASE: u8 = b'n';

fn check_anchored(
    run: Run,
) -> Result<Run, PastaError> {
    if run.refseq.is_empty() || run.alleles.iter().any(|x| x.is_empty()) {
        return Err(PastaError::NoAnchor { chrom: run.chrom, position: run.start });
    }
    Ok(run)
}

/// Move the last reference base of `donor` to the front of `starved`.
///
/// Returns what is left of `donor`, or None if it gave away its only base,
/// and the anchored run.
///
/// ## Errors
///
/// [PastaError::NoAnchor] if `donor` spans no reference bases.
///
pub fn peel_trailing(
    donor: Run,
    starved: Run,
) -> Result<(Option<Run>, Run), PastaError> {
    if donor.ref_len == 0 {
        return Err(PastaError::NoAnchor { chrom: starved.chrom, position: starved.start });
    }

    let mut donor = donor;
    let base = match donor.refseq.pop() {
        Some(base) => {
            donor.alleles.iter_mut().for_each(|x| { x.pop(); });
            base
        },
        None => {
            warn!("Using an unknown base as the anchor at {}:{}", donor.chrom, donor.end());
            UNKNOWN_BASE
        },
    };
    donor.ref_len -= 1;

    let mut anchored = starved;
    anchored.refseq.insert(0, base);
    anchored.alleles.iter_mut().for_each(|x| x.insert(0, base));
    anchored.start -= 1;
    anchored.ref_len += 1;
    anchored.anchor = Some(AnchorSide::Left);

    let donor = if donor.ref_len > 0 { Some(donor) } else { None };
    Ok((donor, check_anchored(anchored)?))
}

/// Move the first reference base of `donor` to the end of `starved`.
///
/// Returns the anchored run and what is left of `donor`, or None if it gave
/// away its only base.
///
/// ## Errors
///
/// [PastaError::NoAnchor] if `donor` spans no reference bases.
///
pub fn peel_leading(
    starved: Run,
    donor: Run,
) -> Result<(Run, Option<Run>), PastaError> {
    if donor.ref_len == 0 {
        return Err(PastaError::NoAnchor { chrom: starved.chrom, position: starved.start });
    }

    let mut donor = donor;
    let base = if donor.refseq.is_empty() {
        warn!("Using an unknown base as the anchor at {}:{}", donor.chrom, donor.start + 1);
        UNKNOWN_BASE
    } else {
        donor.alleles.iter_mut().filter(|x| !x.is_empty()).for_each(|x| { x.remove(0); });
        donor.refseq.remove(0)
    };
    donor.start += 1;
    donor.ref_len -= 1;

    let mut anchored = starved;
    anchored.refseq.push(base);
    anchored.alleles.iter_mut().for_each(|x| x.push(base));
    anchored.ref_len += 1;
    anchored.anchor = Some(AnchorSide::Right);

    let donor = if donor.ref_len > 0 { Some(donor) } else { None };
    Ok((check_anchored(anchored)?, donor))
}

/// Concatenate two contiguous runs into one run of `category`.
///
/// If either run is elided the result is elided too.
///
pub fn merge(
    prev: Run,
    cur: Run,
    category: Category,
) -> Run {
    debug!("Merging {:?} run at {}:{} into {:?}", cur.category, cur.chrom, cur.start, category);
    let elided = prev.is_elided() || cur.is_elided();

    let mut run = prev;
    run.category = category;
    run.ref_len += cur.ref_len;
    run.anchor = run.anchor.or(cur.anchor);
    if elided {
        warn!("Dropping the sequence of {}:{}-{} merged with an elided block", run.chrom, run.start + 1, run.end());
        run.refseq.clear();
        run.alleles.iter_mut().for_each(|x| x.clear());
    } else {
        run.refseq.extend(cur.refseq);
        run.alleles.iter_mut().zip(cur.alleles).for_each(|(x, y)| x.extend(y));
    }
    run
}

/// Turns a stream of [Run]s into runs that can be written as variant records.
#[derive(Debug, Default)]
pub struct Reconciler {
    pending: Option<Run>,
}

impl Reconciler {
    pub fn new() -> Self {
        Reconciler::default()
    }

    fn finish_alone(
        run: Run,
    ) -> Result<Run, PastaError> {
        if run.is_anchor_starved() {
            return Err(PastaError::NoAnchor { chrom: run.chrom, position: run.start });
        }
        Ok(run)
    }

    /// Add the next run.
    ///
    /// Returns the runs that are ready, in order. The last run given is held
    /// back until the next call or [finish](Reconciler::finish).
    ///
    pub fn push(
        &mut self,
        cur: Run,
    ) -> Result<Vec<Run>, PastaError> {
        let Some(prev) = self.pending.take() else {
            self.pending = Some(cur);
            return Ok(Vec::new());
        };

        let mut ready: Vec<Run> = Vec::with_capacity(2);

        if !prev.is_followed_by(&cur) {
            ready.push(Reconciler::finish_alone(prev)?);
            self.pending = Some(cur);
            return Ok(ready);
        }

        match (prev.category, cur.category) {
            (Category::Reference, Category::Reference) => {
                ready.push(prev);
                self.pending = Some(cur);
            },
            (Category::Reference, _) => {
                if cur.is_anchor_starved() {
                    let (donor, anchored) = peel_trailing(prev, cur)?;
                    ready.extend(donor);
                    self.pending = Some(anchored);
                } else {
                    ready.push(prev);
                    self.pending = Some(cur);
                }
            },
            (_, Category::Reference) => {
                if prev.is_anchor_starved() {
                    let (anchored, donor) = peel_leading(prev, cur)?;
                    match donor {
                        Some(donor) => {
                            ready.push(anchored);
                            self.pending = Some(donor);
                        },
                        // the anchored run is now the left neighbour of the next run
                        None => self.pending = Some(anchored),
                    }
                } else {
                    ready.push(prev);
                    self.pending = Some(cur);
                }
            },
            (Category::Alt, Category::Alt) => {
                self.pending = Some(merge(prev, cur, Category::Alt));
            },
            _ => {
                self.pending = Some(merge(prev, cur, Category::NoCall));
            },
        }

        Ok(ready)
    }

    /// Release the run held back at the end of input.
    ///
    /// ## Errors
    ///
    /// [PastaError::NoAnchor] if the last run still needs an anchor base.
    ///
    pub fn finish(
        &mut self,
    ) -> Result<Option<Run>, PastaError> {
        self.pending.take().map(Reconciler::finish_alone).transpose()
    }
}

/// Iterator adapter running a [Reconciler] over a stream of runs.
pub struct Reconciled<'a, I> where I: Iterator<Item = Result<Run, PastaError>> {
    runs: &'a mut I,
    reconciler: Reconciler,
    ready: VecDeque<Run>,
    done: bool,
}

impl<'a, I> Reconciled<'a, I> where I: Iterator<Item = Result<Run, PastaError>> {
    pub fn new(
        runs: &'a mut I,
    ) -> Self {
        Reconciled { runs, reconciler: Reconciler::new(), ready: VecDeque::new(), done: false }
    }
}

impl<I> Iterator for Reconciled<'_, I> where I: Iterator<Item = Result<Run, PastaError>> {
    type Item = Result<Run, PastaError>;

    fn next(
        &mut self,
    ) -> Option<Result<Run, PastaError>> {
        loop {
            if let Some(run) = self.ready.pop_front() {
                return Some(Ok(run));
            }
            if self.done {
                return None;
            }
            let res = match self.runs.next() {
                Some(Ok(run)) => self.reconciler.push(run).map(|x| self.ready.extend(x)),
                Some(Err(err)) => Err(err),
                None => {
                    self.done = true;
                    self.reconciler.finish().map(|x| self.ready.extend(x))
                },
            };
            if let Err(err) = res {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

impl VariantRecord {
    /// Build the variant record for an anchored run.
    ///
    /// Reference runs become reference blocks showing only their first base.
    /// No-call runs show their full sequence if `options.nocall_sequence` is
    /// set and the sequence is known, otherwise they are written like a
    /// reference block with missing genotypes.
    ///
    /// ## Errors
    ///
    /// [PastaError::NoAnchor] if the reference or an alternate allele would
    /// be empty. [PastaError::PloidyMismatch] if the run has more tracks than
    /// `options.ploidy`.
    ///
    pub fn from_run(
        run: &Run,
        options: &Options,
    ) -> Result<VariantRecord, PastaError> {
        let first_base = vec![run.refseq.first().copied().unwrap_or(UNKNOWN_BASE)];
        let ploidy = options.ploidy.max(run.alleles.len()).max(1);

        let (reference, alternates, genotype, filter) = match run.category {
            Category::Reference => {
                (first_base, Vec::new(), genotype_string(&vec![0; ploidy]), "PASS")
            },
            Category::NoCall if !options.nocall_sequence || run.is_elided() => {
                (first_base, Vec::new(), vec!["."; ploidy].join("/"), "NOCALL")
            },
            Category::NoCall => {
                let (alternates, indexes) = assign(&run.refseq, &run.alleles, options.ploidy)?;
                (run.refseq.clone(), alternates, genotype_string(&indexes), "NOCALL")
            },
            Category::Alt => {
                let (alternates, indexes) = assign(&run.refseq, &run.alleles, options.ploidy)?;
                (run.refseq.clone(), alternates, genotype_string(&indexes), "PASS")
            },
        };

        if reference.is_empty() || alternates.iter().any(|x| x.is_empty()) {
            return Err(PastaError::NoAnchor { chrom: run.chrom.clone(), position: run.start });
        }

        Ok(VariantRecord {
            chrom: run.chrom.clone(),
            pos: run.start + 1,
            end: run.end(),
            category: run.category,
            reference,
            alternates,
            genotype,
            filter: filter.to_string(),
            info: format!("END={}", run.end()),
        })
    }
}

// Tests
#[cfg(test)]
mod tests {
    use crate::{AnchorSide, Category, Run};

    fn run(category: Category, start: u64, refseq: &[u8], alleles: &[&[u8]]) -> Run {
        Run {
            category,
            chrom: "chr1".to_string(),
            start,
            ref_len: refseq.len() as u64,
            refseq: refseq.to_vec(),
            alleles: alleles.iter().map(|x| x.to_vec()).collect(),
            ..Default::default()
        }
    }

    fn reconcile_all(runs: Vec<Run>) -> Result<Vec<Run>, crate::error::PastaError> {
        use super::Reconciled;

        let mut input = runs.into_iter().map(Ok);
        Reconciled::new(&mut input).collect()
    }

    #[test]
    fn reference_runs_pass_through() {
        let runs = vec![
            run(Category::Reference, 0, b"acg", &[b"acg", b"acg"]),
            Run { start: 3, ref_len: 10, alleles: vec![Vec::new(), Vec::new()], chrom: "chr1".to_string(), ..Default::default() },
        ];

        let got = reconcile_all(runs.clone()).unwrap();
        assert_eq!(got, runs);
    }

    #[test]
    fn substitution_needs_no_peel() {
        let runs = vec![
            run(Category::Reference, 0, b"a", &[b"a", b"a"]),
            run(Category::Alt, 1, b"a", &[b"a", b"c"]),
            run(Category::Reference, 2, b"a", &[b"a", b"a"]),
        ];

        let got = reconcile_all(runs.clone()).unwrap();
        assert_eq!(got, runs);
    }

    #[test]
    fn insertion_borrows_trailing_base() {
        let runs = vec![
            run(Category::Reference, 0, b"ccg", &[b"ccg", b"ccg"]),
            run(Category::Alt, 3, b"", &[b"", b"a"]),
            run(Category::Reference, 3, b"tt", &[b"tt", b"tt"]),
        ];

        let got = reconcile_all(runs).unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].refseq, b"cc".to_vec());
        assert_eq!(got[0].alleles, vec![b"cc".to_vec(), b"cc".to_vec()]);
        assert_eq!(got[0].ref_len, 2);
        assert_eq!(got[1].start, 2);
        assert_eq!(got[1].ref_len, 1);
        assert_eq!(got[1].refseq, b"g".to_vec());
        assert_eq!(got[1].alleles, vec![b"g".to_vec(), b"ga".to_vec()]);
        assert_eq!(got[1].anchor, Some(AnchorSide::Left));
        assert_eq!(got[2].start, 3);
    }

    #[test]
    fn single_base_donor_is_dropped() {
        let runs = vec![
            run(Category::Reference, 0, b"g", &[b"g", b"g"]),
            run(Category::Alt, 1, b"c", &[b"", b"c"]),
            run(Category::Reference, 2, b"a", &[b"a", b"a"]),
        ];

        let got = reconcile_all(runs).unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].category, Category::Alt);
        assert_eq!(got[0].start, 0);
        assert_eq!(got[0].refseq, b"gc".to_vec());
        assert_eq!(got[0].alleles, vec![b"g".to_vec(), b"gc".to_vec()]);
        assert_eq!(got[1].category, Category::Reference);
    }

    #[test]
    fn starved_run_at_start_borrows_leading_base() {
        let mut first = run(Category::Alt, 0, b"", &[b"t", b"t"]);
        first.at_start = true;
        let runs = vec![
            first,
            run(Category::Reference, 0, b"ac", &[b"ac", b"ac"]),
        ];

        let got = reconcile_all(runs).unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].refseq, b"a".to_vec());
        assert_eq!(got[0].alleles, vec![b"ta".to_vec(), b"ta".to_vec()]);
        assert_eq!(got[0].anchor, Some(AnchorSide::Right));
        assert_eq!(got[0].ref_len, 1);
        assert_eq!(got[1].start, 1);
        assert_eq!(got[1].refseq, b"c".to_vec());
        assert_eq!(got[1].alleles, vec![b"c".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn leading_peel_can_consume_whole_donor() {
        let runs = vec![
            run(Category::Alt, 0, b"", &[b"g", b""]),
            run(Category::Reference, 0, b"a", &[b"a", b"a"]),
            run(Category::Alt, 1, b"c", &[b"t", b"c"]),
        ];

        let got = reconcile_all(runs).unwrap();

        // the anchored insertion and the substitution after it are one variant
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].start, 0);
        assert_eq!(got[0].refseq, b"ac".to_vec());
        assert_eq!(got[0].alleles, vec![b"gat".to_vec(), b"ac".to_vec()]);
        assert_eq!(got[0].anchor, Some(AnchorSide::Right));
    }

    #[test]
    fn starved_run_after_consumed_donor_merges_left() {
        let runs = vec![
            run(Category::Alt, 0, b"", &[b"", b"a"]),
            run(Category::Reference, 0, b"a", &[b"a", b"a"]),
            run(Category::Alt, 1, b"", &[b"", b"a"]),
        ];

        let got = reconcile_all(runs).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].category, Category::Alt);
        assert_eq!(got[0].start, 0);
        assert_eq!(got[0].ref_len, 1);
        assert_eq!(got[0].refseq, b"a".to_vec());
        assert_eq!(got[0].alleles, vec![b"a".to_vec(), b"aaa".to_vec()]);
    }

    #[test]
    fn insertions_around_single_base_write_one_record() {
        use crate::{decode_from_read_to_write, Format, Options};
        use std::io::Cursor;

        let mut input: Cursor<Vec<u8>> = Cursor::new(b".Q aa .Q".to_vec());
        let mut output: Vec<u8> = Vec::new();
        decode_from_read_to_write(Format::Vcf, &Options::default(), None, &mut input, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let records = text.lines().filter(|x| !x.starts_with('#')).collect::<Vec<&str>>();
        assert_eq!(records, vec!["unk\t1\t.\tA\tAAA\t.\tPASS\tEND=1\tGT\t0/1"]);
    }

    #[test]
    fn alt_and_nocall_merge_into_nocall() {
        let runs = vec![
            run(Category::Reference, 0, b"a", &[b"a", b"a"]),
            run(Category::Alt, 1, b"c", &[b"c", b"t"]),
            run(Category::NoCall, 2, b"g", &[b"n", b"g"]),
            run(Category::Alt, 3, b"t", &[b"a", b"t"]),
            run(Category::Reference, 4, b"a", &[b"a", b"a"]),
        ];

        let got = reconcile_all(runs).unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[1].category, Category::NoCall);
        assert_eq!(got[1].start, 1);
        assert_eq!(got[1].ref_len, 3);
        assert_eq!(got[1].refseq, b"cgt".to_vec());
        assert_eq!(got[1].alleles, vec![b"cna".to_vec(), b"tgt".to_vec()]);
    }

    #[test]
    fn chain_of_starved_runs() {
        // deletion, then a no-call insertion, then an insertion, all back to back
        let runs = vec![
            run(Category::Reference, 0, b"tg", &[b"tg", b"tg"]),
            run(Category::Alt, 2, b"a", &[b"", b""]),
            run(Category::NoCall, 3, b"", &[b"n", b""]),
            run(Category::Alt, 3, b"", &[b"c", b"c"]),
            run(Category::Reference, 3, b"t", &[b"t", b"t"]),
        ];

        let got = reconcile_all(runs).unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].refseq, b"t".to_vec());
        assert_eq!(got[1].category, Category::NoCall);
        assert_eq!(got[1].start, 1);
        assert_eq!(got[1].refseq, b"ga".to_vec());
        assert_eq!(got[1].alleles, vec![b"gnc".to_vec(), b"gc".to_vec()]);
        assert_eq!(got[1].anchor, Some(AnchorSide::Left));
        assert_eq!(got[2].refseq, b"t".to_vec());
    }

    #[test]
    fn non_contiguous_runs_are_independent() {
        let mut after_jump = run(Category::Alt, 100, b"", &[b"a", b""]);
        after_jump.at_start = true;
        let runs = vec![
            run(Category::Reference, 0, b"cc", &[b"cc", b"cc"]),
            after_jump,
            run(Category::Reference, 100, b"gg", &[b"gg", b"gg"]),
        ];

        let got = reconcile_all(runs).unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].refseq, b"cc".to_vec());
        assert_eq!(got[1].anchor, Some(AnchorSide::Right));
        assert_eq!(got[1].alleles, vec![b"ag".to_vec(), b"g".to_vec()]);
        assert_eq!(got[2].start, 101);
    }

    #[test]
    fn lone_insertion_has_no_anchor() {
        use crate::error::PastaError;

        let runs = vec![run(Category::Alt, 0, b"", &[b"a", b"a"])];

        match reconcile_all(runs) {
            Err(PastaError::NoAnchor { chrom, position }) => {
                assert_eq!(chrom, "chr1");
                assert_eq!(position, 0);
            },
            _ => panic!("expected NoAnchor"),
        }
    }

    #[test]
    fn elided_donor_lends_unknown_base() {
        let runs = vec![
            Run { category: Category::Reference, chrom: "chr1".to_string(), start: 0, ref_len: 5, alleles: vec![Vec::new(), Vec::new()], ..Default::default() },
            run(Category::Alt, 5, b"", &[b"", b"t"]),
            run(Category::Reference, 5, b"a", &[b"a", b"a"]),
        ];

        let got = reconcile_all(runs).unwrap();

        assert_eq!(got[0].ref_len, 4);
        assert!(got[0].is_elided());
        assert_eq!(got[1].refseq, b"n".to_vec());
        assert_eq!(got[1].alleles, vec![b"n".to_vec(), b"nt".to_vec()]);
    }

    #[test]
    fn reconciled_runs_keep_their_category() {
        use super::Reconciled;
        use crate::Options;
        use crate::decoder::Decoder;
        use std::io::Cursor;

        let mut input: Cursor<Vec<u8>> = Cursor::new(b"ac ca gg .Q .Q tt !! EE cc aA ~~ ?? gg".to_vec());
        let options = Options::default();
        let mut runs = Decoder::new(&mut input, &options);
        let got = Reconciled::new(&mut runs).collect::<Result<Vec<_>, _>>();

        // "ac" is not a valid slot
        assert!(got.is_err());

        let mut input: Cursor<Vec<u8>> = Cursor::new(b"aa cc gg .Q .Q tt !! EE cc aA ~~ ?? gg".to_vec());
        let mut runs = Decoder::new(&mut input, &options);
        let got = Reconciled::new(&mut runs).collect::<Result<Vec<_>, _>>().unwrap();

        assert!(!got.is_empty());
        got.iter().for_each(|run| assert_eq!(run.classify(), run.category));
    }

    #[test]
    fn record_for_insertion() {
        use crate::{Options, VariantRecord};

        let mut anchored = run(Category::Alt, 2, b"g", &[b"g", b"ga"]);
        anchored.anchor = Some(AnchorSide::Left);

        let got = VariantRecord::from_run(&anchored, &Options::default()).unwrap();

        assert_eq!(got.pos, 3);
        assert_eq!(got.end, 3);
        assert_eq!(got.reference, b"g".to_vec());
        assert_eq!(got.alternates, vec![b"ga".to_vec()]);
        assert_eq!(got.genotype, "0/1");
        assert_eq!(got.filter, "PASS");
        assert_eq!(got.info, "END=3");
    }

    #[test]
    fn record_for_reference_block() {
        use crate::{Options, VariantRecord};

        let block = run(Category::Reference, 10, b"acgt", &[b"acgt", b"acgt"]);
        let got = VariantRecord::from_run(&block, &Options::default()).unwrap();

        assert_eq!(got.pos, 11);
        assert_eq!(got.end, 14);
        assert_eq!(got.reference, b"a".to_vec());
        assert!(got.alternates.is_empty());
        assert_eq!(got.genotype, "0/0");
    }

    #[test]
    fn record_for_nocall() {
        use crate::{Options, VariantRecord};

        let nocall = run(Category::NoCall, 0, b"ac", &[b"nn", b"ac"]);

        let full = VariantRecord::from_run(&nocall, &Options::default()).unwrap();
        assert_eq!(full.reference, b"ac".to_vec());
        assert_eq!(full.alternates, vec![b"nn".to_vec()]);
        assert_eq!(full.genotype, "1/0");
        assert_eq!(full.filter, "NOCALL");

        let options = Options { nocall_sequence: false, ..Default::default() };
        let masked = VariantRecord::from_run(&nocall, &options).unwrap();
        assert_eq!(masked.reference, b"a".to_vec());
        assert!(masked.alternates.is_empty());
        assert_eq!(masked.genotype, "./.");
        assert_eq!(masked.end, 2);
    }
}
