//! RSID <-> VariantKey lookup tables.
//!
//! Two sibling binary-search containers over the same data, sorted by
//! different keys: `rsvk.bin` (RSID -> VariantKey, sorted by RSID) and
//! `vkrs.bin` (VariantKey -> RSID, sorted by VariantKey). Both store rows of
//! duplicates (a multi-allelic RSID maps to several VariantKeys and vice
//! versa), hence the `find_first`/`get_next` cursor pattern: a caller walks
//! forward through a run of matching rows one call at a time.

use std::path::Path;

use super::binsearch::{col_find_first, col_find_first_sub, col_find_last_sub, col_has_next, BinsearchContainer};
use super::error::RsidVarResult;

/// Clamps a failed lower-bound search into `[.., last)` so a caller's cursor
/// always lands on a valid row even when the search key exceeds every
/// stored value.
fn clamp_not_found(pos: u64, last: u64) -> u64 {
    if pos >= last {
        last.saturating_sub(1)
    } else {
        pos
    }
}

/// `rsvk.bin`: RSID-sorted lookup from RSID to VariantKey.
pub struct RsVkTable {
    container: BinsearchContainer,
}

impl RsVkTable {
    /// Opens an RSID-sorted (`rs`, `vk`) container.
    pub fn open<P: AsRef<Path>>(path: P) -> RsidVarResult<Self> {
        let container = BinsearchContainer::open(path, &[4, 8])?;
        Ok(RsVkTable { container })
    }

    fn rs_at(&self, row: u64) -> u32 {
        self.container.get(0, row).unwrap_or(u32::MAX as u64) as u32
    }

    fn vk_at(&self, row: u64) -> u64 {
        self.container.get(1, row).unwrap_or(0)
    }

    /// Finds the first VariantKey associated with `rsid` within
    /// `[*first, last)`, updating `*first` to that row's index on success.
    /// Returns `0` if not found.
    pub fn find_rv_variantkey_by_rsid(&self, first: &mut u64, last: u64, rsid: u32) -> u64 {
        let get = |i: u64| self.rs_at(i) as u64;
        let found = col_find_first(get, *first, last, rsid as u64);
        if found < last && self.rs_at(found) == rsid {
            *first = found;
            return self.vk_at(found);
        }
        *first = clamp_not_found(found, last);
        0
    }

    /// Advances `*pos` to the next row sharing `rsid` (after a prior
    /// [`find_rv_variantkey_by_rsid`] call) and returns its VariantKey, or
    /// `0` if the run of duplicates has ended.
    pub fn get_next_rv_variantkey_by_rsid(&self, pos: &mut u64, last: u64, rsid: u32) -> u64 {
        let get = |i: u64| self.rs_at(i) as u64;
        match col_has_next(get, *pos, last, rsid as u64) {
            Some(next) => {
                *pos = next;
                self.vk_at(next)
            }
            None => 0,
        }
    }

    /// Total row count.
    pub fn nrows(&self) -> u64 {
        self.container.nrows
    }
}

/// `vkrs.bin`: VariantKey-sorted lookup from VariantKey to RSID.
pub struct VkRsTable {
    container: BinsearchContainer,
}

impl VkRsTable {
    /// Opens a VariantKey-sorted (`vk`, `rs`) container.
    pub fn open<P: AsRef<Path>>(path: P) -> RsidVarResult<Self> {
        let container = BinsearchContainer::open(path, &[8, 4])?;
        Ok(VkRsTable { container })
    }

    fn vk_at(&self, row: u64) -> u64 {
        self.container.get(0, row).unwrap_or(0)
    }

    fn rs_at(&self, row: u64) -> u32 {
        self.container.get(1, row).unwrap_or(0) as u32
    }

    /// Finds the first rsID associated with `vk` within `[*first, last)`,
    /// updating `*first` to that row's index on success. Returns `0` if not found.
    pub fn find_vr_rsid_by_variantkey(&self, first: &mut u64, last: u64, vk: u64) -> u32 {
        let get = |i: u64| self.vk_at(i);
        let found = col_find_first(get, *first, last, vk);
        if found < last && self.vk_at(found) == vk {
            *first = found;
            return self.rs_at(found);
        }
        *first = clamp_not_found(found, last);
        0
    }

    /// Advances `*pos` to the next row sharing `vk` and returns its rsID,
    /// or `0` if the run of duplicates has ended.
    pub fn get_next_vr_rsid_by_variantkey(&self, pos: &mut u64, last: u64, vk: u64) -> u32 {
        let get = |i: u64| self.vk_at(i);
        match col_has_next(get, *pos, last, vk) {
            Some(next) => {
                *pos = next;
                self.rs_at(next)
            }
            None => 0,
        }
    }

    /// Narrows `[*first, *last)` to the rows whose VariantKey falls within
    /// `chrom:[pos_min, pos_max]` (inclusive), returning the first matching
    /// rsID, or `0` if none fall in range.
    pub fn find_vr_chrompos_range(
        &self,
        first: &mut u64,
        last: &mut u64,
        chrom: u8,
        pos_min: u32,
        pos_max: u32,
    ) -> u32 {
        let get = |i: u64| self.vk_at(i);
        let ckey = (chrom as u64) << 59;
        let min_value = (ckey | ((pos_min as u64) << 31)) >> 31;
        let max_value = (ckey | ((pos_max as u64) << 31)) >> 31;

        let start = col_find_first_sub(get, *first, *last, min_value, 31, 33);
        // The lower-bound position may fall on a row belonging to a
        // different (e.g. nonexistent) chromosome when nothing in this
        // chromosome's range exists; reject that before trusting `start`.
        let found_chrom = start < *last && crate::core::variantkey::extract_variantkey_chrom(self.vk_at(start)) == chrom;
        if !found_chrom {
            *first = *last;
            return 0;
        }
        *first = start;
        let mut end = col_find_last_sub(get, *first, *last, max_value, 31, 33);
        if end < *last {
            end += 1;
        }
        *last = end;
        self.rs_at(*first)
    }

    /// Total row count.
    pub fn nrows(&self) -> u64 {
        self.container.nrows
    }
}
