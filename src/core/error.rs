//! Error types for the variantkey crate
//!
//! Defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Umbrella error type for variantkey operations
#[derive(Debug, Error)]
pub enum VariantKeyCrateError {
    /// ESID codec errors
    #[error("ESID error: {0}")]
    Esid(#[from] EsidError),

    /// Binary-search container errors
    #[error("binsearch error: {0}")]
    Binsearch(#[from] BinsearchError),

    /// NRVK side table errors
    #[error("NRVK error: {0}")]
    Nrvk(#[from] NrvkError),

    /// Genoref / normalization errors
    #[error("genoref error: {0}")]
    Genoref(#[from] GenorefError),

    /// RSID<->VariantKey table errors
    #[error("rsidvar error: {0}")]
    RsidVar(#[from] RsidVarError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while encoding/decoding an ESID
#[derive(Debug, Error)]
pub enum EsidError {
    /// Input string is empty once the start offset is applied
    #[error("start offset {start} is past the end of a {len}-byte string")]
    StartPastEnd { start: usize, len: usize },

    /// Decimal tail does not fit in the reserved 24-bit field
    #[error("numeric tail {value} exceeds the 24-bit field (max {max})")]
    TailOverflow { value: u64, max: u64 },
}

/// Errors that can occur while memory-mapping a columnar binsearch file
#[derive(Debug, Error)]
pub enum BinsearchError {
    /// File does not exist or could not be opened
    #[error("cannot open binsearch file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is empty (zero-length fstat)
    #[error("binsearch file {0} is empty")]
    EmptyFile(PathBuf),

    /// Leading magic bytes did not match any known container
    #[error("unrecognized container magic {magic:02x?} in {path}")]
    UnrecognizedMagic { path: PathBuf, magic: [u8; 8] },

    /// File is smaller than the header it claims to have
    #[error("{path}: header claims {claimed} bytes but file is only {actual} bytes")]
    Truncated {
        path: PathBuf,
        claimed: u64,
        actual: u64,
    },

    /// Arrow/Feather footer could not be parsed at the expected offsets
    #[error("{path}: malformed {container} footer: {message}")]
    MalformedFooter {
        path: PathBuf,
        container: &'static str,
        message: String,
    },

    /// Requested column index is out of range
    #[error("column index {index} out of range (ncols={ncols})")]
    ColumnOutOfRange { index: u8, ncols: u8 },

    /// Underlying mmap call failed
    #[error("mmap failed for {path}: {source}")]
    Mmap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while reading the NRVK side table
#[derive(Debug, Error)]
pub enum NrvkError {
    /// Underlying container could not be opened
    #[error("NRVK container error: {0}")]
    Container(#[from] BinsearchError),

    /// Row offset points outside the data blob
    #[error("row {row} offset {offset} is outside the {blob_len}-byte data blob")]
    OffsetOutOfRange {
        row: u64,
        offset: u64,
        blob_len: u64,
    },

    /// Stored allele length exceeds ALLELE_MAXSIZE
    #[error("allele length {len} exceeds ALLELE_MAXSIZE ({max})")]
    AlleleTooLong { len: usize, max: usize },

    /// I/O error while writing the TSV dump
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while accessing a mapped reference genome
#[derive(Debug, Error)]
pub enum GenorefError {
    /// Underlying mmap failed
    #[error("cannot open genoref file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Chromosome code is outside 1..=25
    #[error("chromosome code {0} is out of the valid 1..=25 range")]
    InvalidChrom(u8),

    /// File is too small to hold the 26-entry offset table
    #[error("genoref file {path} ({size} bytes) is smaller than the 104-byte offset table")]
    Truncated { path: PathBuf, size: u64 },
}

/// Errors that can occur while reading the RSID<->VariantKey tables
#[derive(Debug, Error)]
pub enum RsidVarError {
    /// Underlying container could not be opened
    #[error("rsidvar container error: {0}")]
    Container(#[from] BinsearchError),
}

/// Result type alias for variantkey crate operations
pub type Result<T> = std::result::Result<T, VariantKeyCrateError>;

/// Result type alias for ESID operations
pub type EsidResult<T> = std::result::Result<T, EsidError>;

/// Result type alias for binsearch container operations
pub type BinsearchResult<T> = std::result::Result<T, BinsearchError>;

/// Result type alias for NRVK operations
pub type NrvkResult<T> = std::result::Result<T, NrvkError>;

/// Result type alias for genoref operations
pub type GenorefResult<T> = std::result::Result<T, GenorefError>;

/// Result type alias for RSID<->VariantKey table operations
pub type RsidVarResult<T> = std::result::Result<T, RsidVarError>;
