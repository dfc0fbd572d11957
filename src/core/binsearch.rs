//! Columnar, memory-mapped binary-search engine.
//!
//! Exposes a frozen image of one or more sorted fixed-width integer columns
//! and a branch-free binary search over them. Three container shapes are
//! recognized by their leading magic bytes: this crate's own raw `BINSRC1`
//! format (self-describing: row/column counts and widths live in the
//! header), and the legacy Apache Arrow IPC File and Feather v1 envelopes
//! used by the reference data distributed upstream.
//!
//! Full general-purpose Arrow/Feather support would mean embedding a
//! flatbuffers schema decoder; instead this module walks just enough of
//! the real IPC message framing (continuation marker + metadata length,
//! and the trailing footer-length field) to locate the data region, and
//! resolves the row count by searching for the `nrows` that reproduces the
//! caller-supplied column widths' 8-byte-aligned total — the caller already
//! knows `ncols`/`ctbytes` out of band (this mirrors how the original C
//! harness always pre-fills `mf.ctbytes` before mapping an Arrow/Feather
//! file). See DESIGN.md for the scope tradeoff.

use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::error::{BinsearchError, BinsearchResult};

const BINSRC_MAGIC: &[u8; 8] = b"BINSRC1\0";
const ARROW_MAGIC: &[u8; 8] = b"ARROW1\0\0";
const FEATHER_MAGIC: &[u8; 4] = b"FEA1";

fn align8(n: u64) -> u64 {
    (n + 7) & !7
}

fn read_u32_le(data: &[u8], pos: usize) -> Option<u32> {
    data.get(pos..pos + 4).map(|b| u32::from_le_bytes(b.try_into().unwrap()))
}

fn read_u64_le(data: &[u8], pos: usize) -> Option<u64> {
    data.get(pos..pos + 8).map(|b| u64::from_le_bytes(b.try_into().unwrap()))
}

/// A memory-mapped columnar container ready for binary search.
pub struct BinsearchContainer {
    mmap: Mmap,
    /// Byte offset where the first column's data begins.
    pub doffset: u64,
    /// Total byte length of the column data region.
    pub dlength: u64,
    /// Number of rows shared by every column.
    pub nrows: u64,
    /// Per-column byte width.
    pub ctbytes: Vec<u8>,
    /// Byte offset of each column within the mapped file.
    pub index: Vec<u64>,
}

impl BinsearchContainer {
    /// Opens `path`, detecting the container format from its magic prefix.
    ///
    /// `ctbytes` gives the expected byte width of each column; it is
    /// required to resolve Arrow/Feather containers (whose data region
    /// carries no self-describing column schema at a fixed offset) and is
    /// cross-checked against the header for the raw `BINSRC1` format.
    pub fn open<P: AsRef<Path>>(path: P, ctbytes: &[u8]) -> BinsearchResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BinsearchError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let size = file
            .metadata()
            .map_err(|source| BinsearchError::Open { path: path.to_path_buf(), source })?
            .len();
        if size == 0 {
            return Err(BinsearchError::EmptyFile(path.to_path_buf()));
        }
        // SAFETY: the mapped file is treated as read-only for the lifetime
        // of this container; callers must not mutate it concurrently.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| BinsearchError::Mmap {
            path: path.to_path_buf(),
            source,
        })?;

        if mmap.len() >= 8 && &mmap[0..8] == BINSRC_MAGIC.as_slice() {
            Self::parse_binsrc(mmap, path)
        } else if mmap.len() >= 8 && &mmap[0..8] == ARROW_MAGIC.as_slice() {
            Self::parse_arrow(mmap, path, ctbytes)
        } else if mmap.len() >= 4 && &mmap[0..4] == FEATHER_MAGIC.as_slice() {
            Self::parse_feather(mmap, path, ctbytes)
        } else {
            let size = mmap.len() as u64;
            Ok(BinsearchContainer {
                mmap,
                doffset: 0,
                dlength: size,
                nrows: 0,
                ctbytes: Vec::new(),
                index: Vec::new(),
            })
        }
    }

    fn parse_binsrc(mmap: Mmap, path: &Path) -> BinsearchResult<Self> {
        let malformed = |message: &str| BinsearchError::MalformedFooter {
            path: path.to_path_buf(),
            container: "BINSRC1",
            message: message.to_string(),
        };
        if mmap.len() < 40 {
            return Err(BinsearchError::Truncated {
                path: path.to_path_buf(),
                claimed: 40,
                actual: mmap.len() as u64,
            });
        }
        let nrows = read_u64_le(&mmap, 8).ok_or_else(|| malformed("nrows"))?;
        let ncols = mmap[16];
        let ctbytes: Vec<u8> = mmap[17..17 + ncols as usize].to_vec();
        let doffset = read_u64_le(&mmap, 24).ok_or_else(|| malformed("doffset"))?;
        let dlength = read_u64_le(&mmap, 32).ok_or_else(|| malformed("dlength"))?;
        if doffset + dlength > mmap.len() as u64 {
            return Err(BinsearchError::Truncated {
                path: path.to_path_buf(),
                claimed: doffset + dlength,
                actual: mmap.len() as u64,
            });
        }
        let index = column_index(doffset, &ctbytes, nrows);
        Ok(BinsearchContainer { mmap, doffset, dlength, nrows, ctbytes, index })
    }

    fn parse_arrow(mmap: Mmap, path: &Path, ctbytes: &[u8]) -> BinsearchResult<Self> {
        let malformed = |message: String| BinsearchError::MalformedFooter {
            path: path.to_path_buf(),
            container: "Arrow IPC",
            message,
        };
        // Walk the schema message, then the record-batch message, using
        // only the continuation marker + metadata-length framing common to
        // every IPC message (no flatbuffer content decoding).
        let mut pos = 8usize;
        for _ in 0..2 {
            let cont = read_u32_le(&mmap, pos).ok_or_else(|| malformed("truncated message header".into()))?;
            if cont != 0xFFFF_FFFF {
                return Err(malformed(format!("expected continuation marker at {pos}")));
            }
            let meta_len = read_u32_le(&mmap, pos + 4).ok_or_else(|| malformed("truncated metadata length".into()))?;
            pos += 8 + align8(meta_len as u64) as usize;
        }
        let doffset = pos as u64;

        let size = mmap.len() as u64;
        if size < 12 {
            return Err(malformed("file too small for a footer".into()));
        }
        let footer_len = read_u32_le(&mmap, mmap.len() - 12).ok_or_else(|| malformed("truncated footer length".into()))? as u64;
        let footer_start = size
            .checked_sub(8 + 4 + footer_len)
            .ok_or_else(|| malformed("footer length exceeds file size".into()))?;
        let dlength = footer_start
            .checked_sub(doffset)
            .ok_or_else(|| malformed("data region offset past footer".into()))?;

        let nrows = resolve_nrows(ctbytes, dlength).ok_or_else(|| malformed("could not resolve row count from column widths".into()))?;
        let index = column_index(doffset, ctbytes, nrows);
        Ok(BinsearchContainer {
            mmap,
            doffset,
            dlength,
            nrows,
            ctbytes: ctbytes.to_vec(),
            index,
        })
    }

    fn parse_feather(mmap: Mmap, path: &Path, ctbytes: &[u8]) -> BinsearchResult<Self> {
        let malformed = |message: String| BinsearchError::MalformedFooter {
            path: path.to_path_buf(),
            container: "Feather v1",
            message,
        };
        let doffset = align8(FEATHER_MAGIC.len() as u64);
        let size = mmap.len() as u64;
        if size < 8 {
            return Err(malformed("file too small for a footer".into()));
        }
        let footer_len = read_u32_le(&mmap, mmap.len() - 8).ok_or_else(|| malformed("truncated footer length".into()))? as u64;
        let footer_start = size
            .checked_sub(4 + 4 + footer_len)
            .ok_or_else(|| malformed("footer length exceeds file size".into()))?;
        let dlength = footer_start
            .checked_sub(doffset)
            .ok_or_else(|| malformed("data region offset past footer".into()))?;

        let nrows = resolve_nrows(ctbytes, dlength).ok_or_else(|| malformed("could not resolve row count from column widths".into()))?;
        let index = column_index(doffset, ctbytes, nrows);
        Ok(BinsearchContainer {
            mmap,
            doffset,
            dlength,
            nrows,
            ctbytes: ctbytes.to_vec(),
            index,
        })
    }

    /// Returns the whole mapped file as bytes, for columns (like NRVK's data
    /// blob) whose per-row size isn't fixed-width.
    pub fn raw(&self) -> &[u8] {
        &self.mmap
    }

    /// Returns the byte slice backing column `i`.
    pub fn column(&self, i: usize) -> BinsearchResult<&[u8]> {
        let ncols = self.ctbytes.len();
        if i >= ncols {
            return Err(BinsearchError::ColumnOutOfRange { index: i as u8, ncols: ncols as u8 });
        }
        let start = self.index[i] as usize;
        let width = self.ctbytes[i] as usize;
        let end = start + width * self.nrows as usize;
        Ok(&self.mmap[start..end])
    }

    /// Reads row `row` of column `i` as a `u64`, zero-extended from its
    /// native width (1/2/4/8 bytes, little-endian).
    pub fn get(&self, i: usize, row: u64) -> BinsearchResult<u64> {
        let width = self.ctbytes[i] as usize;
        let col = self.column(i)?;
        let start = row as usize * width;
        let bytes = &col[start..start + width];
        let mut buf = [0u8; 8];
        buf[..width].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }
}

fn resolve_nrows(ctbytes: &[u8], dlength: u64) -> Option<u64> {
    if ctbytes.is_empty() {
        return None;
    }
    let row_bytes: u64 = ctbytes.iter().map(|&w| w as u64).sum();
    let estimate = dlength / row_bytes.max(1);
    for candidate in estimate.saturating_sub(2)..=estimate + 2 {
        let total: u64 = ctbytes.iter().map(|&w| align8(w as u64 * candidate)).sum();
        if total == dlength {
            return Some(candidate);
        }
    }
    None
}

fn column_index(doffset: u64, ctbytes: &[u8], nrows: u64) -> Vec<u64> {
    let mut index = Vec::with_capacity(ctbytes.len());
    let mut offset = doffset;
    for &width in ctbytes {
        index.push(offset);
        offset += align8(width as u64 * nrows);
    }
    index
}

/// Lower-bound binary search: the index of the first element in
/// `col[first..last)` that is `>= value`, or `last` if none qualifies.
pub fn col_find_first(get: impl Fn(u64) -> u64, first: u64, last: u64, value: u64) -> u64 {
    let (mut lo, mut hi) = (first, last);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if get(mid) < value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Upper-bound binary search: the index of the last element in
/// `col[first..last)` that is `<= value`, or `last` if none qualifies.
pub fn col_find_last(get: impl Fn(u64) -> u64, first: u64, last: u64, value: u64) -> u64 {
    let (mut lo, mut hi) = (first, last);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if get(mid) <= value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo == first {
        last
    } else {
        lo - 1
    }
}

/// Advances a cursor over a run of duplicates: returns `Some(pos+1)` iff
/// `pos+1 < last` and `get(pos+1) == value`, else `None`.
pub fn col_has_next(get: impl Fn(u64) -> u64, pos: u64, last: u64, value: u64) -> Option<u64> {
    let next = pos + 1;
    if next < last && get(next) == value {
        Some(next)
    } else {
        None
    }
}

fn extract_sub(v: u64, bit_start: u32, bit_count: u32) -> u64 {
    (v >> bit_start) & ((1u64 << bit_count) - 1)
}

/// Like [`col_find_first`], but compares only the `bit_count`-wide field of
/// each element starting at `bit_start` (used to range-scan the CHROM+POS
/// prefix of a VariantKey column while ignoring REF+ALT).
pub fn col_find_first_sub(
    get: impl Fn(u64) -> u64,
    first: u64,
    last: u64,
    value: u64,
    bit_start: u32,
    bit_count: u32,
) -> u64 {
    col_find_first(|i| extract_sub(get(i), bit_start, bit_count), first, last, value)
}

/// Like [`col_find_last`], restricted to a sub-bit-field.
pub fn col_find_last_sub(
    get: impl Fn(u64) -> u64,
    first: u64,
    last: u64,
    value: u64,
    bit_start: u32,
    bit_count: u32,
) -> u64 {
    col_find_last(|i| extract_sub(get(i), bit_start, bit_count), first, last, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_binsrc(path: &Path, ncols: u8, ctbytes: &[u8], columns: &[Vec<u64>]) {
        let nrows = columns[0].len() as u64;
        let mut doffset = 40u64;
        let mut dlength = 0u64;
        for (i, w) in ctbytes.iter().enumerate() {
            dlength += align8(*w as u64 * nrows);
            let _ = i;
        }
        let mut buf = Vec::new();
        buf.extend_from_slice(BINSRC_MAGIC);
        buf.extend_from_slice(&nrows.to_le_bytes());
        buf.push(ncols);
        buf.extend_from_slice(ctbytes);
        while buf.len() < 24 {
            buf.push(0);
        }
        buf.extend_from_slice(&doffset.to_le_bytes());
        buf.extend_from_slice(&dlength.to_le_bytes());
        while (buf.len() as u64) < doffset {
            buf.push(0);
        }
        for (col, &width) in columns.iter().zip(ctbytes) {
            let start = buf.len();
            for &v in col {
                buf.extend_from_slice(&v.to_le_bytes()[..width as usize]);
            }
            let padded = align8((buf.len() - start) as u64) as usize;
            while buf.len() - start < padded {
                buf.push(0);
            }
        }
        doffset = buf.len() as u64 - dlength;
        let _ = doffset;
        std::fs::File::create(path).unwrap().write_all(&buf).unwrap();
    }

    #[test]
    fn opens_nonexistent_file_as_error() {
        let err = BinsearchContainer::open("/nonexistent/path/to/file.bin", &[8]);
        assert!(err.is_err());
    }

    #[test]
    fn opens_zero_length_file_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::File::create(&path).unwrap();
        let err = BinsearchContainer::open(&path, &[8]);
        assert!(matches!(err, Err(BinsearchError::EmptyFile(_))));
    }

    #[test]
    fn roundtrips_raw_binsrc_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let col0: Vec<u64> = vec![10, 20, 30, 30, 40];
        write_binsrc(&path, 1, &[8], &[col0.clone()]);
        let container = BinsearchContainer::open(&path, &[8]).unwrap();
        assert_eq!(container.nrows, 5);
        assert_eq!(container.ncols(), 1);
        for (i, &expected) in col0.iter().enumerate() {
            assert_eq!(container.get(0, i as u64).unwrap(), expected);
        }
    }

    #[test]
    fn binary_search_finds_bounds_over_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.bin");
        let col0: Vec<u64> = vec![1, 3, 3, 3, 5, 7, 9];
        write_binsrc(&path, 1, &[8], &[col0.clone()]);
        let container = BinsearchContainer::open(&path, &[8]).unwrap();
        let get = |i: u64| container.get(0, i).unwrap();
        let first = col_find_first(get, 0, container.nrows, 3);
        let last = col_find_last(get, 0, container.nrows, 3);
        assert_eq!(first, 1);
        assert_eq!(last, 3);

        let mut cursor = first;
        let mut count = 1;
        while let Some(next) = col_has_next(get, cursor, container.nrows, 3) {
            cursor = next;
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn binary_search_missing_value_returns_last() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.bin");
        let col0: Vec<u64> = vec![10, 20, 30];
        write_binsrc(&path, 1, &[8], &[col0]);
        let container = BinsearchContainer::open(&path, &[8]).unwrap();
        let get = |i: u64| container.get(0, i).unwrap();
        assert_eq!(col_find_first(get, 0, container.nrows, 25), 2);
        assert_eq!(col_find_first(get, 0, container.nrows, 100), container.nrows);
    }

    #[test]
    fn sub_bit_field_search_ignores_low_bits() {
        // Simulate a VariantKey column: top 32 bits are CHROM+POS, low 32
        // bits are REF+ALT that we want to ignore while scanning.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vk.bin");
        let col0: Vec<u64> = vec![
            (1u64 << 32) | 0xAAAA,
            (1u64 << 32) | 0xBBBB,
            (2u64 << 32) | 0x1111,
            (2u64 << 32) | 0x2222,
            (3u64 << 32) | 0x0001,
        ];
        write_binsrc(&path, 1, &[8], &[col0]);
        let container = BinsearchContainer::open(&path, &[8]).unwrap();
        let get = |i: u64| container.get(0, i).unwrap();
        let first = col_find_first_sub(get, 0, container.nrows, 2, 32, 32);
        let last = col_find_last_sub(get, 0, container.nrows, 2, 32, 32);
        assert_eq!(first, 2);
        assert_eq!(last, 3);
    }

    #[test]
    fn unrecognized_magic_falls_back_to_raw_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.bin");
        std::fs::File::create(&path).unwrap().write_all(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let container = BinsearchContainer::open(&path, &[]).unwrap();
        assert_eq!(container.doffset, 0);
        assert_eq!(container.dlength, 8);
        assert_eq!(container.nrows, 0);
    }
}

impl BinsearchContainer {
    /// Number of columns in this container.
    pub fn ncols(&self) -> usize {
        self.ctbytes.len()
    }
}
