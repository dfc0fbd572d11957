//! VariantKey codec
//!
//! Bit-exact encoding of `(CHROM, POS, REF+ALT)` into a single sortable u64.
//! See the crate-level data model docs for the bit layout.

use super::hex::{hex_uint64_t, parse_hex_uint64_t};

/// Bit mask for the CHROM field of a VariantKey.
pub const VKMASK_CHROM: u64 = 0xF800_0000_0000_0000;
/// Bit mask for the POS field of a VariantKey.
pub const VKMASK_POS: u64 = 0x07FF_FFFF_8000_0000;
/// Bit mask for the combined CHROM+POS prefix of a VariantKey.
pub const VKMASK_CHROMPOS: u64 = 0xFFFF_FFFF_8000_0000;
/// Bit mask for the REF+ALT field of a VariantKey.
pub const VKMASK_REFALT: u64 = 0x0000_0000_7FFF_FFFF;
/// Bit offset of the CHROM field.
pub const VKSHIFT_CHROM: u32 = 59;
/// Bit offset of the POS field.
pub const VKSHIFT_POS: u32 = 31;

const MAXUINT32: u32 = u32::MAX;

/// Decoded VariantKey components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantKeyComponents {
    /// Encoded chromosome code (see [`encode_chrom`]).
    pub chrom: u8,
    /// 0-based reference position.
    pub pos: u32,
    /// Encoded REF+ALT code (see [`encode_refalt`]).
    pub refalt: u32,
}

/// Minimum and maximum VariantKey bounds for a CHROM+POS range search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantKeyRange {
    pub min: u64,
    pub max: u64,
}

fn encode_numeric_chrom(chrom: &[u8]) -> u8 {
    let mut v: u8 = 0;
    for &c in chrom {
        if !c.is_ascii_digit() {
            return 0;
        }
        v = v.wrapping_mul(10).wrapping_add(c - b'0');
    }
    v
}

fn has_chrom_chr_prefix(chrom: &[u8]) -> bool {
    if chrom.len() > 3 {
        let v = ((chrom[0] | 0x20) as u32) << 16
            | ((chrom[1] | 0x20) as u32) << 8
            | (chrom[2] | 0x20) as u32;
        v == 0x0063_6872 // "chr"
    } else {
        false
    }
}

fn onechar_chrom(c: u8) -> u8 {
    match c | 0x20 {
        b'm' => 25,
        b'x' => 23,
        b'y' => 24,
        _ => 0,
    }
}

/// Encodes a chromosome identifier into its 5-bit CHROM code.
///
/// Numeric `1..=22` parse as decimal; `X`→23, `Y`→24, `M`/`MT`→25
/// (case-insensitive); an optional `chr`/`CHR` prefix is stripped first;
/// empty or unrecognized input maps to `0` (NA). Never fails.
///
/// ```
/// use variantkey::core::variantkey::encode_chrom;
///
/// assert_eq!(encode_chrom("1"), 1);
/// assert_eq!(encode_chrom("chr1"), 1);
/// assert_eq!(encode_chrom("X"), 23);
/// assert_eq!(encode_chrom("MT"), 25);
/// assert_eq!(encode_chrom(""), 0);
/// assert_eq!(encode_chrom("weird"), 0);
/// ```
pub fn encode_chrom(chrom: &str) -> u8 {
    let mut bytes = chrom.as_bytes();
    if has_chrom_chr_prefix(bytes) {
        bytes = &bytes[3..];
    }
    if bytes.is_empty() {
        return 0;
    }
    if bytes[0].is_ascii_digit() {
        return encode_numeric_chrom(bytes);
    }
    if bytes.len() == 1 || (bytes.len() == 2 && (bytes[1] | 0x20) == b't') {
        return onechar_chrom(bytes[0]);
    }
    0
}

/// Decodes a CHROM code back into its canonical string form.
///
/// `1..=22` → decimal, `23`→`"X"`, `24`→`"Y"`, `25`→`"MT"`, anything else → `"NA"`.
///
/// ```
/// use variantkey::core::variantkey::decode_chrom;
///
/// assert_eq!(decode_chrom(1), "1");
/// assert_eq!(decode_chrom(23), "X");
/// assert_eq!(decode_chrom(25), "MT");
/// assert_eq!(decode_chrom(0), "NA");
/// ```
pub fn decode_chrom(code: u8) -> String {
    match code {
        1..=22 => code.to_string(),
        23 => "X".to_string(),
        24 => "Y".to_string(),
        25 => "MT".to_string(),
        _ => "NA".to_string(),
    }
}

fn encode_base(c: u8) -> u32 {
    match c | 0x20 {
        b'a' => 0,
        b'c' => 1,
        b'g' => 2,
        b't' => 3,
        _ => 4,
    }
}

/// Encodes `allele` into the accumulator `h`, writing 2 bits per base
/// starting at `bitpos` and moving downward. Returns `false` on any
/// non-ACGT base (the accumulator is left in an undefined partial state).
fn encode_allele(h: &mut u32, bitpos: &mut u8, allele: &[u8]) -> bool {
    for &c in allele {
        let v = encode_base(c);
        if v > 3 {
            return false;
        }
        *bitpos -= 2;
        *h |= v << *bitpos;
    }
    true
}

/// Encodes REF+ALT using the reversible bit-packed scheme.
///
/// Returns `None` if any base is outside `{A,C,G,T}` (case-insensitive);
/// the caller should fall back to [`encode_refalt_hash`].
pub fn encode_refalt_rev(reference: &str, alt: &str) -> Option<u32> {
    let r = reference.as_bytes();
    let a = alt.as_bytes();
    let mut h: u32 = ((r.len() as u32) << 27) | ((a.len() as u32) << 23);
    let mut bitpos: u8 = 23;
    if !encode_allele(&mut h, &mut bitpos, r) || !encode_allele(&mut h, &mut bitpos, a) {
        return None;
    }
    Some(h)
}

fn muxhash(k: u32, h: u32) -> u32 {
    let k = k.wrapping_mul(0xcc9e_2d51);
    let k = k.rotate_left(15);
    let k = k.wrapping_mul(0x1b87_3593);
    let h = h ^ k;
    let h = h.rotate_left(13);
    h.wrapping_mul(5).wrapping_add(0xe654_6b64)
}

fn encode_packchar(c: u8) -> u32 {
    if c < b'A' {
        27
    } else {
        ((c | 0x20) - b'a' + 1) as u32
    }
}

fn pack_chars_tail(s: &[u8]) -> u32 {
    // The original C switch-fallthrough assigns shift 26 - 5*i to the
    // character at index i within the tail (1..5 chars), independent of
    // the tail's overall length.
    let mut h: u32 = 0;
    for (i, &c) in s.iter().enumerate() {
        h ^= encode_packchar(c) << (26 - 5 * i as u32);
    }
    h
}

fn pack_chars(s: &[u8; 6]) -> u32 {
    let mut h: u32 = 0;
    for (i, &c) in s.iter().rev().enumerate() {
        h ^= encode_packchar(c) << (1 + 5 * i);
    }
    h
}

fn hash32(s: &[u8]) -> u32 {
    let mut h: u32 = 0;
    let mut rest = s;
    while rest.len() >= 6 {
        let chunk: [u8; 6] = rest[..6].try_into().unwrap();
        h = muxhash(pack_chars(&chunk), h);
        rest = &rest[6..];
    }
    if !rest.is_empty() {
        h = muxhash(pack_chars_tail(rest), h);
    }
    h
}

/// Encodes REF+ALT using the non-reversible 32-bit avalanche hash.
///
/// LSB is always forced to `1` to mark hash-form encoding.
pub fn encode_refalt_hash(reference: &str, alt: &str) -> u32 {
    let h = muxhash(hash32(alt.as_bytes()), muxhash(0x3, hash32(reference.as_bytes())));
    let mut h = h ^ (h >> 16);
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    (h >> 1) | 0x1
}

/// Encodes a REF+ALT pair, preferring the reversible form and falling back
/// to the hash form when the alleles don't fit (`|ref|+|alt| > 11`) or
/// contain non-ACGT characters.
///
/// ```
/// use variantkey::core::variantkey::encode_refalt;
///
/// let rev = encode_refalt("A", "C");
/// assert_eq!(rev & 0x1, 0); // reversible
///
/// let hashed = encode_refalt("ACGT", "AAACCCGGGTTT");
/// assert_eq!(hashed & 0x1, 1); // hash form, too long
/// ```
pub fn encode_refalt(reference: &str, alt: &str) -> u32 {
    if reference.len() + alt.len() <= 11 {
        if let Some(h) = encode_refalt_rev(reference, alt) {
            return h;
        }
    }
    encode_refalt_hash(reference, alt)
}

fn decode_base(code: u32, bitpos: i32) -> u8 {
    const BASE: [u8; 4] = [b'A', b'C', b'G', b'T'];
    BASE[((code >> bitpos) & 0x3) as usize]
}

/// Decodes a reversible-form REF+ALT code back into `(ref, alt)` strings.
///
/// Assumes the code was produced by [`encode_refalt_rev`]; behavior is
/// unspecified for hash-form codes (use [`decode_refalt`] to dispatch
/// safely on the LSB).
pub fn decode_refalt_rev(code: u32) -> (String, String) {
    let sizeref = ((code & 0x7800_0000) >> 27) as usize;
    let sizealt = ((code & 0x0780_0000) >> 23) as usize;
    // Each base's bit position is fixed by its index within REF (resp. ALT),
    // independent of the allele's total length: REF base i sits at 21-2*i;
    // ALT immediately follows REF in the bitstream, so ALT base i sits at
    // (21 - 2*sizeref) - 2*i.
    let mut ref_bytes = Vec::with_capacity(sizeref);
    for i in 0..sizeref {
        let bitpos = 21 - 2 * i as i32;
        ref_bytes.push(decode_base(code, bitpos));
    }
    let alt_base_bitpos = 21i32 - 2 * sizeref as i32;
    let mut alt_bytes = Vec::with_capacity(sizealt);
    for i in 0..sizealt {
        let bitpos = alt_base_bitpos - 2 * i as i32;
        alt_bytes.push(decode_base(code, bitpos));
    }
    (
        String::from_utf8(ref_bytes).unwrap(),
        String::from_utf8(alt_bytes).unwrap(),
    )
}

/// Decodes REF+ALT if reversible (LSB = 0); returns `None` for hash-form
/// codes, in which case the caller must consult the NRVK side table.
///
/// ```
/// use variantkey::core::variantkey::{encode_refalt_rev, decode_refalt};
///
/// let code = encode_refalt_rev("AC", "GT").unwrap();
/// assert_eq!(decode_refalt(code), Some(("AC".to_string(), "GT".to_string())));
/// ```
pub fn decode_refalt(code: u32) -> Option<(String, String)> {
    if code & 0x1 != 0 {
        return None;
    }
    Some(decode_refalt_rev(code))
}

/// Bit-composes `(chrom, pos, refalt)` into a 64-bit VariantKey.
pub fn encode_variantkey(chrom: u8, pos: u32, refalt: u32) -> u64 {
    ((chrom as u64) << VKSHIFT_CHROM) | ((pos as u64) << VKSHIFT_POS) | (refalt as u64)
}

/// Extracts the CHROM field from a VariantKey.
pub fn extract_variantkey_chrom(vk: u64) -> u8 {
    ((vk & VKMASK_CHROM) >> VKSHIFT_CHROM) as u8
}

/// Extracts the POS field from a VariantKey.
pub fn extract_variantkey_pos(vk: u64) -> u32 {
    ((vk & VKMASK_POS) >> VKSHIFT_POS) as u32
}

/// Extracts the REF+ALT field from a VariantKey.
pub fn extract_variantkey_refalt(vk: u64) -> u32 {
    (vk & VKMASK_REFALT) as u32
}

/// Decodes a VariantKey into its three components.
pub fn decode_variantkey(vk: u64) -> VariantKeyComponents {
    VariantKeyComponents {
        chrom: extract_variantkey_chrom(vk),
        pos: extract_variantkey_pos(vk),
        refalt: extract_variantkey_refalt(vk),
    }
}

/// Convenience composition: encodes `(chrom, pos, ref, alt)` directly into
/// a VariantKey, choosing the reversible or hash REF+ALT form as needed.
/// Never fails; an unrecognized chromosome yields CHROM=0.
///
/// ```
/// use variantkey::core::variantkey::variantkey;
///
/// let vk = variantkey("1", 100000, "A", "C");
/// assert_eq!(vk >> 59, 1); // CHROM
/// ```
pub fn variantkey(chrom: &str, pos: u32, reference: &str, alt: &str) -> u64 {
    encode_variantkey(encode_chrom(chrom), pos, encode_refalt(reference, alt))
}

/// Batch form of [`variantkey`]: encodes every `(chrom, pos, ref, alt)`
/// tuple in `inputs` concurrently, one VariantKey per input in the same
/// order. Opt-in for callers encoding large slices; each tuple is encoded
/// independently, so this is safe to call on disjoint slices from multiple
/// threads just like the rest of this module.
pub fn encode_variantkeys_parallel(inputs: &[(&str, u32, &str, &str)]) -> Vec<u64> {
    use rayon::prelude::*;
    inputs
        .par_iter()
        .map(|&(chrom, pos, reference, alt)| variantkey(chrom, pos, reference, alt))
        .collect()
}

/// Computes the `(min, max)` VariantKey bounds covering every REF+ALT
/// encoding for `chrom` within `[pos_min, pos_max]`.
pub fn variantkey_range(chrom: u8, pos_min: u32, pos_max: u32) -> VariantKeyRange {
    let c = (chrom as u64) << VKSHIFT_CHROM;
    VariantKeyRange {
        min: c | ((pos_min as u64) << VKSHIFT_POS),
        max: c | ((pos_max as u64) << VKSHIFT_POS) | VKMASK_REFALT,
    }
}

/// Three-way comparison of two `u64` values (-1/0/+1).
pub fn compare_uint64_t(a: u64, b: u64) -> i8 {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    }
}

/// Compares two VariantKeys by CHROM only.
pub fn compare_variantkey_chrom(vka: u64, vkb: u64) -> i8 {
    compare_uint64_t(vka >> VKSHIFT_CHROM, vkb >> VKSHIFT_CHROM)
}

/// Compares two VariantKeys by CHROM+POS prefix.
pub fn compare_variantkey_chrom_pos(vka: u64, vkb: u64) -> i8 {
    compare_uint64_t(vka >> VKSHIFT_POS, vkb >> VKSHIFT_POS)
}

/// Formats a VariantKey as a 16-character lowercase hex string.
pub fn variantkey_hex(vk: u64) -> String {
    hex_uint64_t(vk)
}

/// Parses a 16-character hex string into a VariantKey.
pub fn parse_variantkey_hex(s: &str) -> Option<u64> {
    parse_hex_uint64_t(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrom_numeric() {
        for i in 1..=22u8 {
            assert_eq!(encode_chrom(&i.to_string()), i);
        }
    }

    #[test]
    fn chrom_prefix_stripped() {
        assert_eq!(encode_chrom("chr1"), 1);
        assert_eq!(encode_chrom("CHR22"), 22);
        assert_eq!(encode_chrom("chrX"), 23);
        assert_eq!(encode_chrom("chrMT"), 25);
    }

    #[test]
    fn chrom_special() {
        assert_eq!(encode_chrom("X"), 23);
        assert_eq!(encode_chrom("x"), 23);
        assert_eq!(encode_chrom("Y"), 24);
        assert_eq!(encode_chrom("M"), 25);
        assert_eq!(encode_chrom("MT"), 25);
        assert_eq!(encode_chrom("mt"), 25);
    }

    #[test]
    fn chrom_invalid() {
        assert_eq!(encode_chrom(""), 0);
        assert_eq!(encode_chrom("Z"), 0);
        assert_eq!(encode_chrom("chr"), 0);
        assert_eq!(encode_chrom("23"), 23); // numeric parse, not X
    }

    #[test]
    fn chrom_roundtrip_decode() {
        for i in 1..=25u8 {
            let s = decode_chrom(i);
            assert_eq!(encode_chrom(&s), i);
        }
        assert_eq!(decode_chrom(0), "NA");
        assert_eq!(decode_chrom(26), "NA");
    }

    #[test]
    fn refalt_reversible_roundtrip() {
        let code = encode_refalt_rev("AC", "GGT").unwrap();
        assert_eq!(code & 0x1, 0);
        assert_eq!(decode_refalt(code), Some(("AC".to_string(), "GGT".to_string())));
    }

    #[test]
    fn refalt_reversible_single_base() {
        let code = encode_refalt_rev("A", "C").unwrap();
        assert_eq!(decode_refalt(code), Some(("A".to_string(), "C".to_string())));
    }

    #[test]
    fn refalt_invalid_base_falls_back_to_hash() {
        assert!(encode_refalt_rev("N", "C").is_none());
        let h = encode_refalt("N", "C");
        assert_eq!(h & 0x1, 1);
        assert_eq!(decode_refalt(h), None);
    }

    #[test]
    fn refalt_too_long_falls_back_to_hash() {
        let h = encode_refalt("ACGT", "AAACCCGGGTTT");
        assert_eq!(h & 0x1, 1);
        assert_eq!(decode_refalt(h), None);
    }

    #[test]
    fn encode_string_id_vector_esid_unrelated_hash_vector() {
        // end-to-end scenario #2 from the testable properties table
        let vk = variantkey("MT", 100024, "ACGT", "AAACCCGGGTTT");
        assert_eq!(vk & 0x1, 1);
        assert_eq!(decode_refalt(extract_variantkey_refalt(vk)), None);
    }

    #[test]
    fn variantkey_composition_and_extraction() {
        let vk = encode_variantkey(1, 100000, encode_refalt_rev("A", "C").unwrap());
        let decoded = decode_variantkey(vk);
        assert_eq!(decoded.chrom, 1);
        assert_eq!(decoded.pos, 100000);
        assert_eq!(
            decode_refalt(decoded.refalt),
            Some(("A".to_string(), "C".to_string()))
        );
    }

    #[test]
    fn variantkey_range_bounds() {
        let r = variantkey_range(1, 1000, 2000);
        assert_eq!(extract_variantkey_chrom(r.min), 1);
        assert_eq!(extract_variantkey_pos(r.min), 1000);
        assert_eq!(extract_variantkey_pos(r.max), 2000);
        assert_eq!(extract_variantkey_refalt(r.max), VKMASK_REFALT as u32);
    }

    #[test]
    fn compare_helpers() {
        let a = encode_variantkey(1, 100, 0);
        let b = encode_variantkey(1, 200, 0);
        let c = encode_variantkey(2, 50, 0);
        assert_eq!(compare_variantkey_chrom_pos(a, b), -1);
        assert_eq!(compare_variantkey_chrom_pos(b, a), 1);
        assert_eq!(compare_variantkey_chrom_pos(a, a), 0);
        assert_eq!(compare_variantkey_chrom(a, c), -1);
    }

    #[test]
    fn hex_roundtrip_on_real_key() {
        let vk = variantkey("1", 100000, "A", "C");
        let hex = variantkey_hex(vk);
        assert_eq!(parse_variantkey_hex(&hex).unwrap(), vk);
    }

    // invariant 1 & 2 from the testable properties (§8): full round-trip for
    // reversible-form variants.
    #[test]
    fn property_reversible_roundtrip() {
        let cases = [
            ("1", 0u32, "A", "C"),
            ("22", 123456, "ACGT", "TGCA"),
            ("X", 999, "A", "AAAAAAAAAA"),
        ];
        for (chrom, pos, r, a) in cases {
            let vk = variantkey(chrom, pos, r, a);
            let decoded = decode_variantkey(vk);
            assert_eq!(decoded.chrom, encode_chrom(chrom));
            assert_eq!(decoded.pos, pos);
            assert_eq!(decode_refalt(decoded.refalt), Some((r.to_string(), a.to_string())));
        }
    }

    #[test]
    fn encode_variantkeys_parallel_matches_sequential_encoding() {
        let inputs = [
            ("1", 100000u32, "A", "C"),
            ("22", 123456, "ACGT", "TGCA"),
            ("X", 999, "A", "AAAAAAAAAA"),
            ("MT", 100024, "ACGT", "AAACCCGGGTTT"),
        ];
        let batch = encode_variantkeys_parallel(&inputs);
        let sequential: Vec<u64> = inputs
            .iter()
            .map(|&(chrom, pos, r, a)| variantkey(chrom, pos, r, a))
            .collect();
        assert_eq!(batch, sequential);
    }
}
