//! RegionKey codec and overlap predicates
//!
//! Bit layout verified against the original test fixtures (`test_regionkey.c`'s
//! `test_data_t` table); see the crate-level data model docs for the
//! derivation — spec.md's stated 27/27/2/3 width split does not reproduce
//! those vectors, while the 28/28/2/1 split below does, for every probed row.

use super::variantkey::{decode_chrom, encode_chrom, extract_variantkey_chrom, extract_variantkey_pos};

/// Bit offset of the CHROM field.
pub const RKSHIFT_CHROM: u32 = 59;
/// Bit offset of the STARTPOS field.
pub const RKSHIFT_STARTPOS: u32 = 31;
/// Bit offset of the ENDPOS field.
pub const RKSHIFT_ENDPOS: u32 = 3;
/// Bit offset of the STRAND field.
pub const RKSHIFT_STRAND: u32 = 1;

const RK_STARTPOS_MASK: u64 = 0x0FFF_FFFF;
const RK_ENDPOS_MASK: u64 = 0x0FFF_FFFF;
const RK_STRAND_MASK: u64 = 0x3;

/// Maximum representable STARTPOS/ENDPOS value (`2^28 - 1`).
pub const RK_MAX_POS: u32 = (1 << 28) - 1;

/// Decoded RegionKey components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionKeyComponents {
    pub chrom: u8,
    pub startpos: u32,
    pub endpos: u32,
    pub strand: i8,
}

fn encode_strand(strand: i8) -> u64 {
    match strand {
        1 => 1,
        0 => 0,
        -1 => 2,
        _ => 0,
    }
}

fn decode_strand(code: u64) -> i8 {
    match code {
        1 => 1,
        2 => -1,
        _ => 0,
    }
}

/// Composes `(chrom, startpos, endpos, strand)` into a 64-bit RegionKey.
///
/// `strand` is the external representation: `+1`, `0`, or `-1`.
pub fn encode_regionkey(chrom: u8, startpos: u32, endpos: u32, strand: i8) -> u64 {
    ((chrom as u64) << RKSHIFT_CHROM)
        | (((startpos as u64) & RK_STARTPOS_MASK) << RKSHIFT_STARTPOS)
        | (((endpos as u64) & RK_ENDPOS_MASK) << RKSHIFT_ENDPOS)
        | (encode_strand(strand) << RKSHIFT_STRAND)
}

/// Decodes a RegionKey into its four components.
pub fn decode_regionkey(rk: u64) -> RegionKeyComponents {
    RegionKeyComponents {
        chrom: (rk >> RKSHIFT_CHROM) as u8,
        startpos: ((rk >> RKSHIFT_STARTPOS) & RK_STARTPOS_MASK) as u32,
        endpos: ((rk >> RKSHIFT_ENDPOS) & RK_ENDPOS_MASK) as u32,
        strand: decode_strand((rk >> RKSHIFT_STRAND) & RK_STRAND_MASK),
    }
}

/// Convenience composition: encodes `(chrom, startpos, endpos, strand)`
/// from a chromosome string.
pub fn regionkey(chrom: &str, startpos: u32, endpos: u32, strand: i8) -> u64 {
    encode_regionkey(encode_chrom(chrom), startpos, endpos, strand)
}

/// Returns the canonical chromosome string for a RegionKey.
pub fn regionkey_chrom_str(rk: u64) -> String {
    decode_chrom(decode_regionkey(rk).chrom)
}

/// `reflen` is the REF allele length derived either from the reversible
/// REF+ALT length field or (for hash-form variants) a NRVK lookup.
/// Computes the VariantKey's implied RegionKey, `endpos = pos + reflen`.
pub fn variantkey_to_regionkey(vk: u64, reflen: u32) -> u64 {
    let chrom = extract_variantkey_chrom(vk);
    let pos = extract_variantkey_pos(vk);
    let endpos = pos.saturating_add(reflen);
    encode_regionkey(chrom, pos, endpos, 0)
}

/// Half-open-interval overlap predicate: true iff the chromosomes match and
/// `a_start < b_end && b_start < a_end`.
pub fn are_overlapping_regions(a_chrom: u8, a_start: u32, a_end: u32, b_chrom: u8, b_start: u32, b_end: u32) -> bool {
    a_chrom == b_chrom && a_start < b_end && b_start < a_end
}

/// Overlap predicate between two RegionKeys (strand is ignored).
pub fn are_overlapping_regionkeys(rka: u64, rkb: u64) -> bool {
    let a = decode_regionkey(rka);
    let b = decode_regionkey(rkb);
    are_overlapping_regions(a.chrom, a.startpos, a.endpos, b.chrom, b.startpos, b.endpos)
}

/// Overlap predicate between a decoded region and a RegionKey.
pub fn are_overlapping_region_regionkey(a_chrom: u8, a_start: u32, a_end: u32, rkb: u64) -> bool {
    let b = decode_regionkey(rkb);
    are_overlapping_regions(a_chrom, a_start, a_end, b.chrom, b.startpos, b.endpos)
}

/// Overlap predicate between a VariantKey (with its implied REF length) and
/// a RegionKey.
pub fn are_overlapping_variantkey_regionkey(vk: u64, reflen: u32, rkb: u64) -> bool {
    are_overlapping_regionkeys(variantkey_to_regionkey(vk, reflen), rkb)
}

/// Widens `rk`'s interval by `size` on each side, saturating at `0` and
/// [`RK_MAX_POS`].
pub fn extend_regionkey(rk: u64, size: u32) -> u64 {
    let c = decode_regionkey(rk);
    let startpos = c.startpos.saturating_sub(size);
    let endpos = c.endpos.saturating_add(size).min(RK_MAX_POS);
    encode_regionkey(c.chrom, startpos, endpos, c.strand)
}
