//! Deterministic committee selection.
//!
//! Every member computes the next committee from the same inputs, so the
//! selection must not depend on candidate order or local randomness.

use shared_crypto::blake3_keyed_hash;
use shared_types::{Digest, MemberId};
use std::collections::BTreeSet;

/// Select `size` members of `candidates` for the view `view_id`.
///
/// Candidates are sorted and deduplicated, then shuffled with a stream
/// keyed by the view id. Returns every candidate if there are no more
/// than `size`.
pub fn view_members_of(view_id: &Digest, candidates: &[MemberId], size: usize) -> BTreeSet<MemberId> {
    let ordered: BTreeSet<MemberId> = candidates.iter().copied().collect();
    if ordered.len() <= size {
        return ordered;
    }
    let mut members: Vec<MemberId> = ordered.into_iter().collect();
    shuffle_with_seed(&mut members, view_id);
    members.into_iter().take(size).collect()
}

fn shuffle_with_seed(items: &mut [MemberId], seed: &Digest) {
    for i in (1..items.len()).rev() {
        let draw = blake3_keyed_hash(seed.as_bytes(), &(i as u64).to_le_bytes());
        let mut word = [0u8; 8];
        word.copy_from_slice(&draw[..8]);
        let j = (u64::from_le_bytes(word) % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}
