//! ESID codec: compact encoding of short alphanumeric identifiers into a u64.
//!
//! Two encodings share the same 64-bit space: a plain packed form (up to 10
//! characters from a 6-bit alphabet) and a numeric-tail form that trades
//! alphabet width for a much longer decimal suffix (rsID-style identifiers
//! such as `"rs123456789"` or `"ABC:000012345678"`). The length nibble in
//! bits 63..60 disambiguates them on decode: `0..=10` is a plain string of
//! that length, `11..=15` is the numeric form with a `length-10` char prefix.

use super::error::{EsidError, EsidResult};

const MAX_PLAIN_CHARS: usize = 10;
const MAX_PREFIX_CHARS: usize = 5;
const NUMERIC_DELIM: u8 = b':';
const MAX_LEADING_ZEROS: u32 = 7;
const MAX_TAIL_DIGITS: usize = 8;
const MAX_TAIL_VALUE: u64 = 99_999_999;

fn encode_char(c: u8) -> u8 {
    let folded = if (0x60..=0x7f).contains(&c) { c & !0x20 } else { c };
    if (0x21..=0x5f).contains(&folded) {
        folded - 0x20
    } else {
        63
    }
}

fn decode_char(code: u8) -> u8 {
    if code == 0 {
        b' '
    } else {
        code + 0x20
    }
}

/// Encodes `s[start..]` (clipped to 10 characters) into a packed ESID.
///
/// Characters outside the supported range (anything that does not fold
/// into `0x21..=0x5F`; space included, since it folds to exactly `0x20`
/// and has no code of its own) are stored as the reserved code `63`,
/// which [`decode_string_id`] renders back as `_`. `start >= s.len()`
/// yields `0`.
///
/// ```
/// use variantkey::core::esid::encode_string_id;
///
/// let id = encode_string_id("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ", 0);
/// assert_eq!(id, 0xa411493515597619);
/// ```
pub fn encode_string_id(s: &str, start: usize) -> u64 {
    let bytes = s.as_bytes();
    if start >= bytes.len() {
        return 0;
    }
    let slice = &bytes[start..];
    let len = slice.len().min(MAX_PLAIN_CHARS);
    let mut h: u64 = (len as u64) << 60;
    for (i, &c) in slice.iter().take(MAX_PLAIN_CHARS).enumerate() {
        h |= (encode_char(c) as u64) << (54 - 6 * i as u32);
    }
    h
}

fn split_leading_zeros(digits: &[u8]) -> (u32, &[u8]) {
    let mut zeros = 0u32;
    let mut rest = digits;
    while rest.len() > 1 && rest[0] == b'0' && zeros < MAX_LEADING_ZEROS {
        zeros += 1;
        rest = &rest[1..];
    }
    (zeros, rest)
}

/// Encodes `s` using the numeric-tail form when it pays off: a `:`-delimited
/// prefix (the first up to 5 characters before the delimiter) followed by a
/// run of decimal digits too long to fit the plain 10-character form.
///
/// Falls back to [`encode_string_id`] when there is no delimiter, the tail
/// isn't purely decimal, or the whole string already fits in 10 characters
/// (the plain form is exact there, so there's nothing to gain).
pub fn encode_string_num_id(s: &str, delim: u8) -> EsidResult<u64> {
    let bytes = s.as_bytes();
    if bytes.len() <= MAX_PLAIN_CHARS {
        return Ok(encode_string_id(s, 0));
    }
    let Some(delim_pos) = bytes.iter().position(|&c| c == delim) else {
        return Ok(encode_string_id(s, 0));
    };
    if delim_pos == 0 {
        return Ok(encode_string_id(s, 0));
    }
    let tail = &bytes[delim_pos + 1..];
    if tail.is_empty() || !tail.iter().all(u8::is_ascii_digit) {
        return Ok(encode_string_id(s, 0));
    }
    let (zeros, sig) = split_leading_zeros(tail);
    if sig.len() > MAX_TAIL_DIGITS {
        return Ok(encode_string_id(s, 0));
    }
    let value: u64 = std::str::from_utf8(sig).unwrap().parse().unwrap_or(0);
    if value > MAX_TAIL_VALUE {
        return Err(EsidError::TailOverflow { value, max: MAX_TAIL_VALUE });
    }
    let prefix = &bytes[..delim_pos.min(MAX_PREFIX_CHARS)];
    let prefix_len = prefix.len() as u64;
    let mut h: u64 = (prefix_len + 10) << 60;
    for (i, &c) in prefix.iter().enumerate() {
        h |= (encode_char(c) as u64) << (54 - 6 * i as u32);
    }
    h |= (zeros as u64) << 27;
    h |= value;
    Ok(h)
}

/// Decodes an ESID produced by either [`encode_string_id`] or
/// [`encode_string_num_id`] back into its original string form.
///
/// The numeric form always reconstructs with `:` as the delimiter, matching
/// the only delimiter [`encode_string_num_id`] is exercised with in this
/// crate.
pub fn decode_string_id(code: u64) -> String {
    let len_field = (code >> 60) as usize;
    if len_field <= MAX_PLAIN_CHARS {
        let mut out = Vec::with_capacity(len_field);
        for i in 0..len_field {
            let shift = 54 - 6 * i as u32;
            let c = ((code >> shift) & 0x3f) as u8;
            out.push(decode_char(c));
        }
        return String::from_utf8(out).unwrap();
    }
    let prefix_len = len_field - 10;
    let mut out = Vec::with_capacity(prefix_len + 1 + MAX_TAIL_DIGITS);
    for i in 0..prefix_len {
        let shift = 54 - 6 * i as u32;
        let c = ((code >> shift) & 0x3f) as u8;
        out.push(decode_char(c));
    }
    out.push(NUMERIC_DELIM);
    let zeros = (code >> 27) & 0x7;
    for _ in 0..zeros {
        out.push(b'0');
    }
    let value = code & 0x07ff_ffff;
    out.extend_from_slice(value.to_string().as_bytes());
    String::from_utf8(out).unwrap()
}

fn muxhash64(k: u64, h: u64) -> u64 {
    let k = k.wrapping_mul(0x87c3_7b91_1142_53d5);
    let k = k.rotate_left(31);
    let k = k.wrapping_mul(0x4cf5_ad43_2745_937f);
    let h = h ^ k;
    let h = h.rotate_left(27);
    h.wrapping_mul(5).wrapping_add(0x52dc_e729)
}

fn pack8(chunk: &[u8]) -> u64 {
    let mut v: u64 = 0;
    for (i, &c) in chunk.iter().enumerate() {
        v |= (c as u64) << (8 * i as u32);
    }
    v
}

/// Deterministic 64-bit avalanche hash of `s`, for identifiers that fit
/// neither packed form. The MSB is always forced to `1` so hashed and
/// packed ESIDs never collide.
pub fn hash_string_id(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut h: u64 = bytes.len() as u64;
    let mut rest = bytes;
    while rest.len() >= 8 {
        h = muxhash64(pack8(&rest[..8]), h);
        rest = &rest[8..];
    }
    if !rest.is_empty() {
        h = muxhash64(pack8(rest), h);
    }
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    (h >> 1) | (1u64 << 63)
}
