//! Deterministic 32-bit hash mixing for hashed fingerprints.
//!
//! `std`'s `DefaultHasher` is randomly keyed per process, so fingerprints
//! would differ between runs. These functions are fixed.

/// Boost-style `hash_combine`.
pub(crate) fn combine(seed: u32, value: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

pub(crate) fn hash_values(values: &[u32]) -> u32 {
    values.iter().fold(0, |seed, &v| combine(seed, v))
}

/// Final avalanche (murmur3 fmix32), spreads low-entropy ids over the bit range.
pub(crate) fn finalize(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

pub(crate) fn bit_for(hash: u32, n_bits: usize) -> usize {
    finalize(hash) as usize % n_bits
}
