//! Non-Reversible VariantKey (NRVK) side table.
//!
//! Some REF+ALT combinations can't be packed reversibly into the 31 bits
//! VariantKey spares for them (too long, or outside the 2-bit DNA alphabet),
//! so those variants are hashed instead and their true REF/ALT strings are
//! looked up here: a three-column [`BinsearchContainer`] of sorted
//! VariantKeys, per-row byte offsets into a packed allele blob, and the blob
//! itself (`[sizeref, sizealt, ref_bytes..., alt_bytes...]` per row).

use std::path::Path;

use super::binsearch::{col_find_first, BinsearchContainer};
use super::error::{NrvkError, NrvkResult};
use super::variantkey::{
    decode_chrom, decode_refalt, extract_variantkey_chrom, extract_variantkey_pos, extract_variantkey_refalt,
    VKMASK_CHROM, VKSHIFT_POS,
};

/// Maximum allele length this table stores per row.
pub const ALLELE_MAXSIZE: usize = 256;

/// Decoded VariantKey plus its REF/ALT strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantKeyRev {
    pub chrom: String,
    pub pos: u32,
    pub r#ref: String,
    pub alt: String,
}

/// A memory-mapped NRVK side table.
pub struct NrvkTable {
    container: BinsearchContainer,
}

impl NrvkTable {
    /// Opens the three-column (`vk`, `offset`, `data`) NRVK container at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> NrvkResult<Self> {
        let container = BinsearchContainer::open(path, &[8, 8, 1])?;
        Ok(NrvkTable { container })
    }

    fn vk_at(&self, row: u64) -> NrvkResult<u64> {
        Ok(self.container.get(0, row)?)
    }

    fn offset_at(&self, row: u64) -> NrvkResult<u64> {
        Ok(self.container.get(1, row)?)
    }

    fn data(&self) -> NrvkResult<&[u8]> {
        // Column 2 is a variable-length byte blob (each row contributes a
        // differently sized [sizeref, sizealt, ref.., alt..] record), so it
        // can't be read through `column()`'s fixed-width*nrows slicing; take
        // everything from its start to the end of the data region instead.
        if self.container.index.len() < 3 {
            return Err(NrvkError::Container(super::error::BinsearchError::ColumnOutOfRange { index: 2, ncols: self.container.ctbytes.len() as u8 }));
        }
        let start = self.container.index[2] as usize;
        let end = (self.container.doffset + self.container.dlength) as usize;
        self.container.raw().get(start..end).ok_or_else(|| NrvkError::OffsetOutOfRange {
            row: 0,
            offset: start as u64,
            blob_len: self.container.raw().len() as u64,
        })
    }

    fn row_ref_alt(&self, row: u64) -> NrvkResult<(String, String)> {
        let data = self.data()?;
        let offset = self.offset_at(row)? as usize;
        let blob_len = data.len() as u64;
        if offset as u64 + 2 > blob_len {
            return Err(NrvkError::OffsetOutOfRange { row, offset: offset as u64, blob_len });
        }
        let sizeref = data[offset] as usize;
        let sizealt = data[offset + 1] as usize;
        if sizeref > ALLELE_MAXSIZE || sizealt > ALLELE_MAXSIZE {
            return Err(NrvkError::AlleleTooLong { len: sizeref.max(sizealt), max: ALLELE_MAXSIZE });
        }
        let ref_start = offset + 2;
        let alt_start = ref_start + sizeref;
        let alt_end = alt_start + sizealt;
        if alt_end as u64 > blob_len {
            return Err(NrvkError::OffsetOutOfRange { row, offset: offset as u64, blob_len });
        }
        let r#ref = String::from_utf8_lossy(&data[ref_start..alt_start]).into_owned();
        let alt = String::from_utf8_lossy(&data[alt_start..alt_end]).into_owned();
        Ok((r#ref, alt))
    }

    fn find_row(&self, vk: u64) -> NrvkResult<Option<u64>> {
        let nrows = self.container.nrows;
        if nrows == 0 {
            return Ok(None);
        }
        let get = |i: u64| self.vk_at(i).unwrap_or(u64::MAX);
        let found = col_find_first(get, 0, nrows, vk);
        if found < nrows && self.vk_at(found)? == vk {
            Ok(Some(found))
        } else {
            Ok(None)
        }
    }

    /// Looks up REF/ALT for `vk`. Returns `(ref_len + alt_len, ref, alt)`,
    /// or `0`-length strings if not found.
    pub fn find_ref_alt_by_variantkey(&self, vk: u64) -> NrvkResult<(usize, String, String)> {
        match self.find_row(vk)? {
            Some(row) => {
                let (r#ref, alt) = self.row_ref_alt(row)?;
                let len = r#ref.len() + alt.len();
                Ok((len, r#ref, alt))
            }
            None => Ok((0, String::new(), String::new())),
        }
    }

    /// Fully reverses `vk`: decodes CHROM/POS directly, and REF/ALT either
    /// from the reversible bit-packed form or (falling back) from this table.
    pub fn reverse_variantkey(&self, vk: u64) -> NrvkResult<VariantKeyRev> {
        let chrom = decode_chrom(extract_variantkey_chrom(vk));
        let pos = extract_variantkey_pos(vk);
        if let Some((r#ref, alt)) = decode_refalt(extract_variantkey_refalt(vk)) {
            return Ok(VariantKeyRev { chrom, pos, r#ref, alt });
        }
        let (_, r#ref, alt) = self.find_ref_alt_by_variantkey(vk)?;
        Ok(VariantKeyRev { chrom, pos, r#ref, alt })
    }

    /// Returns the REF allele length for `vk`, consulting this table only
    /// when the REF+ALT code isn't reversibly packed.
    pub fn get_variantkey_ref_length(&self, vk: u64) -> NrvkResult<usize> {
        if vk & 0x1 == 0 {
            return Ok(((vk & 0x0000_0000_7800_0000) >> 27) as usize);
        }
        match self.find_row(vk)? {
            Some(row) => {
                let data = self.data()?;
                let offset = self.offset_at(row)? as usize;
                Ok(data[offset] as usize)
            }
            None => Ok(0),
        }
    }

    /// Returns `pos + ref_length`.
    pub fn get_variantkey_endpos(&self, vk: u64) -> NrvkResult<u32> {
        Ok(extract_variantkey_pos(vk) + self.get_variantkey_ref_length(vk)? as u32)
    }

    /// Returns the CHROM+STARTPOS bit prefix shared with RegionKey encoding.
    pub fn get_variantkey_chrom_startpos(vk: u64) -> u64 {
        vk >> VKSHIFT_POS
    }

    /// Returns the CHROM+ENDPOS bit prefix (CHROM bits unchanged, low bits
    /// replaced with the computed end position).
    pub fn get_variantkey_chrom_endpos(&self, vk: u64) -> NrvkResult<u64> {
        Ok(((vk & VKMASK_CHROM) >> VKSHIFT_POS) | self.get_variantkey_endpos(vk)? as u64)
    }

    /// Writes every row as `vk_hex\tref\talt\n` to `path`. Returns the
    /// number of bytes written.
    ///
    /// Streams through a buffered writer rather than mmap: unlike the
    /// random-access lookups above, this walks every row once in order.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> NrvkResult<usize> {
        use std::io::Write;
        use std::io::BufWriter;

        let file = std::fs::File::create(path)?;
        let mut out = BufWriter::with_capacity(super::io::DEFAULT_BUFFER_SIZE, file);
        let mut written = 0;
        for row in 0..self.container.nrows {
            let vk = self.vk_at(row)?;
            let (r#ref, alt) = self.row_ref_alt(row)?;
            let line = format!("{vk:016x}\t{ref}\t{alt}\n");
            out.write_all(line.as_bytes())?;
            written += line.len();
        }
        out.flush()?;
        Ok(written)
    }
}
