//! BLAKE3 digests: block hashes, checkpoint state digests and the
//! per-view stream used to select the next committee.

/// 256-bit BLAKE3 output.
pub type Hash = [u8; 32];

/// Digest of `data`.
pub fn blake3_hash(data: &[u8]) -> Hash {
    blake3::hash(data).into()
}

/// Digest of the concatenation of `parts`, without allocating it.
pub fn blake3_hash_many(parts: &[&[u8]]) -> Hash {
    parts
        .iter()
        .fold(blake3::Hasher::new(), |mut hasher, part| {
            hasher.update(part);
            hasher
        })
        .finalize()
        .into()
}

/// Keyed digest; distinct keys give independent outputs.
pub fn blake3_keyed_hash(key: &[u8; 32], data: &[u8]) -> Hash {
    blake3::keyed_hash(key, data).into()
}
