//! Core codec and lookup functionality for VariantKey.
//!
//! This module contains the key encodings (VariantKey, RegionKey, ESID),
//! the columnar binary-search container format shared by the on-disk lookup
//! tables (NRVK, RSID<->VariantKey), the genome-reference normalization
//! service, and the low-level set/sort utilities used to prepare sorted
//! `u64` key arrays for those tables.

pub mod binsearch;
pub mod dna;
mod error;
pub mod esid;
pub mod genoref;
pub mod hex;
pub mod io;
pub mod nrvk;
pub mod regionkey;
pub mod rsidvar;
pub mod set;
pub mod variantkey;

pub use binsearch::{
    col_find_first, col_find_first_sub, col_find_last, col_find_last_sub, col_has_next,
    BinsearchContainer,
};
pub use error::{
    BinsearchError, BinsearchResult, EsidError, EsidResult, GenorefError, GenorefResult,
    NrvkError, NrvkResult, Result, RsidVarError, RsidVarResult, VariantKeyCrateError,
};
pub use esid::{decode_string_id, encode_string_id, encode_string_num_id, hash_string_id};
pub use genoref::{norm, GenorefTable, ReferenceMatch};
pub use hex::{hex_uint64_t, parse_hex_uint64_t};
pub use io::{
    ByteLineIterator, IoStrategy, LineIterator, MappedReader, SmartReader, DEFAULT_BUFFER_SIZE,
    LARGE_BUFFER_SIZE, MMAP_THRESHOLD,
};
pub use nrvk::{NrvkTable, VariantKeyRev, ALLELE_MAXSIZE};
pub use regionkey::{
    are_overlapping_region_regionkey, are_overlapping_regionkeys, are_overlapping_regions,
    are_overlapping_variantkey_regionkey, decode_regionkey, encode_regionkey, extend_regionkey,
    regionkey, regionkey_chrom_str, variantkey_to_regionkey, RegionKeyComponents, RK_MAX_POS,
    RKSHIFT_CHROM, RKSHIFT_ENDPOS, RKSHIFT_STARTPOS, RKSHIFT_STRAND,
};
pub use rsidvar::{RsVkTable, VkRsTable};
pub use set::{
    intersection_uint64_t, order_uint64_t, reverse_uint64_t, sort_uint64_t, union_uint64_t,
    unique_uint64_t,
};
pub use variantkey::{
    compare_uint64_t, compare_variantkey_chrom, compare_variantkey_chrom_pos, decode_chrom,
    decode_refalt, decode_refalt_rev, decode_variantkey, encode_chrom,
    encode_variantkeys_parallel, encode_refalt, encode_refalt_hash, encode_refalt_rev,
    encode_variantkey, extract_variantkey_chrom, extract_variantkey_pos,
    extract_variantkey_refalt, parse_variantkey_hex, variantkey, variantkey_hex,
    variantkey_range, VariantKeyComponents, VariantKeyRange, VKMASK_CHROM, VKMASK_CHROMPOS,
    VKMASK_POS, VKMASK_REFALT, VKSHIFT_CHROM, VKSHIFT_POS,
};
