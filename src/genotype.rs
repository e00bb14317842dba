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
use crate::error::PastaError;

use indexmap::IndexMap;

/// Assign genotype indexes to the alleles of one sample.
///
/// Index 0 is `reference`. Alleles get the next free index on their first
/// occurrence and reuse it afterwards. An empty allele or `-` counts as the
/// reference. If fewer alleles than `ploidy` are given, the first allele
/// (or the reference if there are none) fills the remaining tracks.
///
/// Returns the unique alternate alleles in order of first occurrence and the
/// index of each track.
///
/// ## Errors
///
/// [PastaError::PloidyMismatch] if more than `ploidy` alleles are given.
///
/// ## Usage
///
/// ```rust
/// use pasta::genotype::{assign, genotype_string};
///
/// let alleles = vec![b"ga".to_vec(), b"g".to_vec()];
/// let (alternates, indexes) = assign(b"g", &alleles, 2).unwrap();
///
/// assert_eq!(alternates, vec![b"ga".to_vec()]);
/// assert_eq!(genotype_string(&indexes), "1/0");
/// ```
///
pub fn assign(
    reference: &[u8],
    alleles: &[Vec<u8>],
    ploidy: usize,
) -> Result<(Vec<Vec<u8>>, Vec<usize>), PastaError> {
    if alleles.len() > ploidy {
        return Err(PastaError::PloidyMismatch { ploidy, alleles: alleles.len() });
    }

    let as_sequence = |allele: &[u8]| -> Vec<u8> {
        if allele.is_empty() || allele == b"-" {
            reference.to_vec()
        } else {
            allele.to_vec()
        }
    };
    let fill = alleles.first().map(|x| as_sequence(x.as_slice())).unwrap_or_else(|| reference.to_vec());

    let mut seen: IndexMap<Vec<u8>, usize> = IndexMap::new();
    seen.insert(reference.to_vec(), 0);

    let mut indexes: Vec<usize> = Vec::with_capacity(ploidy);
    for track in 0..ploidy {
        let seq = alleles.get(track).map(|x| as_sequence(x.as_slice())).unwrap_or_else(|| fill.clone());
        let next = seen.len();
        let idx = *seen.entry(seq).or_insert(next);
        indexes.push(idx);
    }

    let alternates = seen.into_keys().skip(1).collect::<Vec<Vec<u8>>>();
    Ok((alternates, indexes))
}

/// Join genotype indexes with `/`.
pub fn genotype_string(
    indexes: &[usize],
) -> String {
    indexes.iter().map(|x| x.to_string()).collect::<Vec<String>>().join("/")
}
