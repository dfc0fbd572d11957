//! Mapped reference genome and REF/ALT normalization.
//!
//! Wraps a flat per-chromosome reference sequence (a 104-byte header of 26
//! little-endian `u32` byte offsets — one boundary per chromosome 1..=25,
//! plus a trailing sentinel giving the total sequence length — followed by
//! the raw concatenated sequence) and layers on top of it the IUPAC-aware
//! comparison and VCF-style normalization VariantKey needs to turn an
//! arbitrary REF/ALT pair into its canonical left-aligned, minimal form.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::error::{GenorefError, GenorefResult};
use super::variantkey::{encode_chrom, variantkey};

const NUM_CHROMS: usize = 25;
const HEADER_LEN: usize = (NUM_CHROMS + 1) * 4;

fn aztoupper(c: u8) -> u8 {
    if (b'a'..=b'z').contains(&c) {
        c - 32
    } else {
        c
    }
}

/// 4-bit `{A,C,G,T}` membership mask for an IUPAC nucleotide code
/// (`0` for anything that isn't a recognized code). `U` is treated as `T`.
fn iupac_mask(c: u8) -> u8 {
    match aztoupper(c) {
        b'A' => 0b0001,
        b'C' => 0b0010,
        b'G' => 0b0100,
        b'T' | b'U' => 0b1000,
        b'R' => 0b0101, // A,G
        b'Y' => 0b1010, // C,T
        b'S' => 0b0110, // C,G
        b'W' => 0b1001, // A,T
        b'K' => 0b1100, // G,T
        b'M' => 0b0011, // A,C
        b'B' => 0b1110, // C,G,T
        b'D' => 0b1101, // A,G,T
        b'H' => 0b1011, // A,C,T
        b'V' => 0b0111, // A,C,G
        b'N' => 0b1111,
        _ => 0,
    }
}

/// Result of comparing a REF allele against the mapped reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMatch {
    /// Every position matched exactly.
    Exact,
    /// No exact mismatch, but IUPAC ambiguity codes made every position compatible.
    Ambiguous,
    /// Position (or position+length) falls outside the chromosome.
    OutOfRange,
    /// An unrecognized character, or a definite incompatibility, was found.
    Invalid,
}

impl ReferenceMatch {
    /// Numeric code matching the original C library's `check_reference` return values.
    pub fn code(self) -> i8 {
        match self {
            ReferenceMatch::Exact => 0,
            ReferenceMatch::Ambiguous => 1,
            ReferenceMatch::Invalid => -1,
            ReferenceMatch::OutOfRange => -2,
        }
    }

    fn is_ok(self) -> bool {
        matches!(self, ReferenceMatch::Exact | ReferenceMatch::Ambiguous)
    }
}

/// Bitmask set by [`GenorefTable::normalize_variant`] describing which
/// transformations were applied.
pub mod norm {
    pub const SWAP: i32 = 0x02;
    pub const FLIP: i32 = 0x04;
    pub const LEFT_EXTEND: i32 = 0x08;
    pub const RIGHT_TRIM: i32 = 0x10;
    pub const LEFT_TRIM: i32 = 0x20;
}

/// A memory-mapped per-chromosome reference genome.
pub struct GenorefTable {
    mmap: Mmap,
    offsets: [u32; NUM_CHROMS + 1],
}

impl GenorefTable {
    /// Opens the genoref binary at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> GenorefResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GenorefError::Open { path: path.to_path_buf(), source })?;
        let size = file
            .metadata()
            .map_err(|source| GenorefError::Open { path: path.to_path_buf(), source })?
            .len();
        if size < HEADER_LEN as u64 {
            return Err(GenorefError::Truncated { path: path.to_path_buf(), size });
        }
        // SAFETY: mapped read-only for the table's lifetime.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| GenorefError::Open { path: path.to_path_buf(), source })?;
        let mut offsets = [0u32; NUM_CHROMS + 1];
        for (i, slot) in offsets.iter_mut().enumerate() {
            let bytes = &mmap[i * 4..i * 4 + 4];
            *slot = u32::from_le_bytes(bytes.try_into().unwrap());
        }
        Ok(GenorefTable { mmap, offsets })
    }

    fn chrom_span(&self, chrom: u8) -> Option<(u32, u32)> {
        if !(1..=NUM_CHROMS as u8).contains(&chrom) {
            return None;
        }
        let idx = chrom as usize - 1;
        Some((self.offsets[idx], self.offsets[idx + 1]))
    }

    /// Length of `chrom`'s sequence, or `None` for an out-of-range chromosome code.
    pub fn chrom_length(&self, chrom: u8) -> Option<u32> {
        self.chrom_span(chrom).map(|(start, end)| end - start)
    }

    /// Returns the base at `pos` (0-based) in `chrom`, or `None` if the
    /// chromosome or position is invalid.
    pub fn get_genoref_seq(&self, chrom: u8, pos: u32) -> Option<u8> {
        let (start, end) = self.chrom_span(chrom)?;
        if pos >= end - start {
            return None;
        }
        let data_start = HEADER_LEN as u64 + start as u64 + pos as u64;
        self.mmap.get(data_start as usize).copied()
    }

    /// Compares `reference` against the mapped genome at `chrom:pos`,
    /// base-by-base, treating IUPAC ambiguity codes as sets of compatible bases.
    pub fn check_reference(&self, chrom: u8, pos: u32, reference: &str) -> ReferenceMatch {
        let Some((start, end)) = self.chrom_span(chrom) else {
            return ReferenceMatch::OutOfRange;
        };
        let len = reference.len() as u32;
        if pos >= end - start || pos + len > end - start {
            return ReferenceMatch::OutOfRange;
        }
        let mut exact = true;
        for (i, &r) in reference.as_bytes().iter().enumerate() {
            let g = self.get_genoref_seq(chrom, pos + i as u32).unwrap_or(0);
            if aztoupper(g) != aztoupper(r) {
                exact = false;
            }
            if iupac_mask(g) & iupac_mask(r) == 0 {
                return ReferenceMatch::Invalid;
            }
        }
        if exact {
            ReferenceMatch::Exact
        } else {
            ReferenceMatch::Ambiguous
        }
    }

    /// Complements every base in `allele` in place (no reversal), preserving
    /// case and leaving non-DNA characters untouched.
    pub fn flip_allele(allele: &str) -> String {
        allele.bytes().map(super::dna::complement_base).map(|b| b as char).collect()
    }

    /// Normalizes `reference`/`alt` at `chrom:pos` in place: swaps/flips
    /// REF and ALT against the mapped genome when needed, then left/right
    /// trims shared flanking bases and left-extends an allele that would
    /// otherwise become empty.
    ///
    /// Returns the OR of [`norm`] bits describing what changed, or a
    /// negative error code (`-2` invalid position, `-1` no candidate
    /// matched the reference).
    pub fn normalize_variant(&self, chrom: u8, pos: &mut u32, reference: &mut String, alt: &mut String) -> i32 {
        let first = self.check_reference(chrom, *pos, reference);
        if first == ReferenceMatch::OutOfRange {
            return -2;
        }

        let mut code = 0i32;
        if !first.is_ok() {
            let same_len = reference.len() == alt.len();
            if same_len && self.check_reference(chrom, *pos, alt).is_ok() {
                std::mem::swap(reference, alt);
                code |= norm::SWAP;
            } else {
                let flipped_ref = Self::flip_allele(reference);
                if self.check_reference(chrom, *pos, &flipped_ref).is_ok() {
                    let flipped_alt = Self::flip_allele(alt);
                    *reference = flipped_ref;
                    *alt = flipped_alt;
                    code |= norm::FLIP;
                } else if same_len {
                    let flipped_alt = Self::flip_allele(alt);
                    if self.check_reference(chrom, *pos, &flipped_alt).is_ok() {
                        let flipped_ref_of_old_ref = Self::flip_allele(reference);
                        *reference = flipped_alt;
                        *alt = flipped_ref_of_old_ref;
                        code |= norm::SWAP | norm::FLIP;
                    } else {
                        return -1;
                    }
                } else {
                    return -1;
                }
            }
        }

        // Right trim: drop a shared trailing base while both alleles would
        // still be left with at least one base.
        while reference.len() > 1 && alt.len() > 1 {
            let r_last = reference.as_bytes()[reference.len() - 1];
            let a_last = alt.as_bytes()[alt.len() - 1];
            if aztoupper(r_last) != aztoupper(a_last) {
                break;
            }
            reference.pop();
            alt.pop();
            code |= norm::RIGHT_TRIM;
        }

        // Left trim: drop a shared leading base, advancing pos to match.
        while reference.len() > 1 && alt.len() > 1 {
            let r_first = reference.as_bytes()[0];
            let a_first = alt.as_bytes()[0];
            if aztoupper(r_first) != aztoupper(a_first) {
                break;
            }
            reference.remove(0);
            alt.remove(0);
            *pos += 1;
            code |= norm::LEFT_TRIM;
        }

        // Left extend: an empty allele needs at least one base, borrowed
        // from the preceding reference position.
        while (reference.is_empty() || alt.is_empty()) && *pos > 0 {
            *pos -= 1;
            let base = self.get_genoref_seq(chrom, *pos).unwrap_or(b'N') as char;
            reference.insert(0, base);
            alt.insert(0, base);
            code |= norm::LEFT_EXTEND;
        }

        code
    }

    /// Full pipeline: converts `pos` from its external convention
    /// (`posindex` 0 or 1) to the 0-based form this table uses, normalizes
    /// REF/ALT in place, and composes the resulting VariantKey.
    ///
    /// `pos` is overwritten with the normalized 0-based position regardless
    /// of whether normalization succeeded. Returns `(variantkey, status)`.
    pub fn normalized_variantkey(
        &self,
        chrom: &str,
        pos: &mut u32,
        posindex: u32,
        reference: &mut String,
        alt: &mut String,
    ) -> (u64, i32) {
        *pos = pos.saturating_sub(posindex);
        let chrom_code = encode_chrom(chrom);
        let status = self.normalize_variant(chrom_code, pos, reference, alt);
        let vk = variantkey(chrom, *pos, reference, alt);
        (vk, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Builds a synthetic genoref matching the original test fixture: chrom
    /// `c` (1..=25) holds `27-c` letters starting at `A`.
    fn write_fixture(path: &Path) {
        let mut offsets = [0u32; NUM_CHROMS + 1];
        let mut seq = Vec::new();
        let mut cursor = 0u32;
        for c in 1..=NUM_CHROMS as u8 {
            offsets[c as usize - 1] = cursor;
            let len = 27 - c as u32;
            for i in 0..len {
                seq.push(b'A' + i as u8);
            }
            cursor += len;
        }
        offsets[NUM_CHROMS] = cursor;

        let mut buf = Vec::new();
        for o in offsets {
            buf.extend_from_slice(&o.to_le_bytes());
        }
        buf.extend_from_slice(&seq);
        std::fs::File::create(path).unwrap().write_all(&buf).unwrap();
    }

    fn open_fixture() -> (tempfile::TempDir, GenorefTable) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genoref.bin");
        write_fixture(&path);
        let table = GenorefTable::open(&path).unwrap();
        (dir, table)
    }

    #[test]
    fn get_genoref_seq_matches_first_last_and_invalid_positions() {
        let (_dir, table) = open_fixture();
        for chrom in 1..=25u8 {
            assert_eq!(table.get_genoref_seq(chrom, 0), Some(b'A'));
            let last = table.get_genoref_seq(chrom, 26 - chrom as u32);
            assert_eq!(last, Some(b'Z' + 1 - chrom));
            assert_eq!(table.get_genoref_seq(chrom, 27 - chrom as u32), None);
        }
    }

    #[test]
    fn check_reference_exact_and_out_of_range() {
        let (_dir, table) = open_fixture();
        assert_eq!(table.check_reference(1, 0, "A").code(), 0);
        assert_eq!(table.check_reference(1, 25, "Z").code(), 0);
        assert_eq!(table.check_reference(2, 0, "ABCDEFGHIJKLmnopqrstuvwxy").code(), 0);
        assert_eq!(table.check_reference(1, 26, "ZABC").code(), -2);
    }

    #[test]
    fn check_reference_invalid_character_or_incompatible() {
        let (_dir, table) = open_fixture();
        assert_eq!(table.check_reference(1, 0, "ABCDEFGHIJKLmnopqrstuvwxyJ").code(), -1);
        assert_eq!(table.check_reference(14, 2, "ZZZ").code(), -1);
    }

    #[test]
    fn check_reference_ambiguous_iupac_match() {
        let (_dir, table) = open_fixture();
        assert_eq!(table.check_reference(1, 0, "N").code(), 1);
        assert_eq!(table.check_reference(1, 3, "A").code(), 1); // genome D, query A
        assert_eq!(table.check_reference(1, 0, "R").code(), 1);
    }

    #[test]
    fn flip_allele_complements_without_reversing() {
        let allele = "ATCGMKRYBVDHWSNatcgmkrybvdhwsn";
        let expected = "TAGCKMYRVBHDWSNtagckmyrvbhdwsn";
        assert_eq!(GenorefTable::flip_allele(allele), expected);
    }

    #[test]
    fn normalize_variant_flips_when_only_complement_matches() {
        let (_dir, table) = open_fixture();
        let mut pos = 0;
        let mut r = "T".to_string();
        let mut a = "G".to_string();
        let code = table.normalize_variant(1, &mut pos, &mut r, &mut a);
        assert_eq!(code, norm::FLIP);
        assert_eq!(r, "A");
        assert_eq!(a, "C");
        assert_eq!(pos, 0);
    }

    #[test]
    fn normalize_variant_swaps_when_alt_matches_reference() {
        let (_dir, table) = open_fixture();
        let mut pos = 0;
        let mut r = "G".to_string();
        let mut a = "A".to_string();
        let code = table.normalize_variant(1, &mut pos, &mut r, &mut a);
        assert_eq!(code, norm::SWAP);
        assert_eq!(r, "A");
        assert_eq!(a, "G");
    }

    #[test]
    fn normalize_variant_swaps_and_flips() {
        let (_dir, table) = open_fixture();
        let mut pos = 0;
        let mut r = "G".to_string();
        let mut a = "T".to_string();
        let code = table.normalize_variant(1, &mut pos, &mut r, &mut a);
        assert_eq!(code, norm::SWAP | norm::FLIP);
        assert_eq!(r, "A");
        assert_eq!(a, "C");
    }

    #[test]
    fn normalize_variant_rejects_unmatchable_reference() {
        let (_dir, table) = open_fixture();
        let mut pos = 0;
        let mut r = "J".to_string();
        let mut a = "C".to_string();
        let code = table.normalize_variant(1, &mut pos, &mut r, &mut a);
        assert_eq!(code, -1);
        assert_eq!(r, "J");
        assert_eq!(a, "C");
    }

    #[test]
    fn normalize_variant_rejects_out_of_range_position() {
        let (_dir, table) = open_fixture();
        let mut pos = 26;
        let mut r = "A".to_string();
        let mut a = "C".to_string();
        assert_eq!(table.normalize_variant(1, &mut pos, &mut r, &mut a), -2);
    }

    #[test]
    fn normalize_variant_left_trims() {
        let (_dir, table) = open_fixture();
        let mut pos = 2;
        let mut r = "CDE".to_string();
        let mut a = "CD".to_string();
        let code = table.normalize_variant(13, &mut pos, &mut r, &mut a);
        assert_eq!(code, norm::LEFT_TRIM);
        assert_eq!(pos, 3);
        assert_eq!(r, "DE");
        assert_eq!(a, "D");
    }

    #[test]
    fn normalize_variant_left_and_right_trims() {
        let (_dir, table) = open_fixture();
        let mut pos = 2;
        let mut r = "CDE".to_string();
        let mut a = "CFE".to_string();
        let code = table.normalize_variant(13, &mut pos, &mut r, &mut a);
        assert_eq!(code, norm::LEFT_TRIM | norm::RIGHT_TRIM);
        assert_eq!(pos, 3);
        assert_eq!(r, "D");
        assert_eq!(a, "F");
    }

    #[test]
    fn normalize_variant_trims_case_insensitively_across_many_positions() {
        let (_dir, table) = open_fixture();
        let mut pos = 0;
        let mut r = "aBCDEF".to_string();
        let mut a = "aBKDEF".to_string();
        let code = table.normalize_variant(1, &mut pos, &mut r, &mut a);
        assert_eq!(code, norm::LEFT_TRIM | norm::RIGHT_TRIM);
        assert_eq!(pos, 2);
        assert_eq!(r, "C");
        assert_eq!(a, "K");
    }

    #[test]
    fn normalize_variant_leaves_unambiguous_match_untouched() {
        let (_dir, table) = open_fixture();
        let mut pos = 0;
        let mut r = "A".to_string();
        let mut a = "C".to_string();
        let code = table.normalize_variant(1, &mut pos, &mut r, &mut a);
        assert_eq!(code, 0);
        assert_eq!(r, "A");
        assert_eq!(a, "C");
    }

    #[test]
    fn normalize_variant_left_extends_empty_alt() {
        let (_dir, table) = open_fixture();
        let mut pos = 3;
        let mut r = "D".to_string();
        let mut a = String::new();
        let code = table.normalize_variant(1, &mut pos, &mut r, &mut a);
        assert_eq!(code, norm::LEFT_EXTEND);
        assert_eq!(pos, 2);
        assert_eq!(r, "CD");
        assert_eq!(a, "C");
    }

    #[test]
    fn normalized_variantkey_converts_posindex_and_reports_status() {
        let (_dir, table) = open_fixture();
        let mut pos = 1u32;
        let mut r = "J".to_string();
        let mut a = "C".to_string();
        let (_, status) = table.normalized_variantkey("1", &mut pos, 1, &mut r, &mut a);
        assert_eq!(status, -1);
        assert_eq!(pos, 0);
        assert_eq!(r, "J");
        assert_eq!(a, "C");
    }

    #[test]
    fn normalized_variantkey_flip_roundtrip_matches_plain_normalize() {
        let (_dir, table) = open_fixture();
        let mut pos = 0u32;
        let mut r = "T".to_string();
        let mut a = "G".to_string();
        let (vk, status) = table.normalized_variantkey("1", &mut pos, 0, &mut r, &mut a);
        assert_eq!(status, norm::FLIP);
        assert_eq!(r, "A");
        assert_eq!(a, "C");
        assert_eq!(vk, variantkey("1", 0, "A", "C"));
    }
}
