//! variantkey - compact, sortable, partially-reversible genetic variant keys
//!
//! A 64-bit encoding for human genetic variants (CHROM, POS, REF, ALT) that
//! sorts the same way VCF files do, plus the companion lookup services built
//! on top of it:
//!
//! - A codec core ([`core::variantkey`], [`core::regionkey`], [`core::esid`])
//!   for packing/unpacking keys without any file I/O.
//! - A columnar binary-search container format ([`core::binsearch`]) shared
//!   by the on-disk lookup tables.
//! - [`core::nrvk`], a side table that recovers REF/ALT for VariantKeys whose
//!   alleles were too long to pack reversibly into the key itself.
//! - [`core::rsidvar`], bidirectional RSID<->VariantKey lookup tables.
//! - [`core::genoref`], a reference-genome-backed normalization service that
//!   left-trims/left-extends/swaps/flips a variant into its canonical form.
//!
//! # Example
//!
//! ```
//! use variantkey::core::variantkey::{variantkey, decode_variantkey};
//!
//! let vk = variantkey("chr1", 41275, "AC", "A");
//! let components = decode_variantkey(vk);
//! assert_eq!(components.pos, 41275);
//! ```

pub mod core;

pub use core::{
    are_overlapping_region_regionkey, are_overlapping_regionkeys, are_overlapping_regions,
    are_overlapping_variantkey_regionkey, decode_chrom, decode_refalt, decode_regionkey,
    decode_string_id, decode_variantkey, encode_chrom, encode_refalt, encode_regionkey,
    encode_string_id, encode_string_num_id, encode_variantkey, encode_variantkeys_parallel,
    extend_regionkey, extract_variantkey_chrom, extract_variantkey_pos,
    extract_variantkey_refalt, hash_string_id, regionkey, variantkey, variantkey_range,
    variantkey_to_regionkey, BinsearchContainer, BinsearchError, GenorefTable, NrvkTable,
    ReferenceMatch, Result, RsVkTable, VariantKeyComponents, VariantKeyCrateError,
    VariantKeyRange, VariantKeyRev, VkRsTable,
};
