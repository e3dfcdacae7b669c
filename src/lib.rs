//! Quality check of paired-end fastq files.
//!
//! Two (possibly compressed) fastq files are read in lockstep with
//! [`PairedReader`]. The ascii offset of the quality values is detected from
//! the data unless it is given, and [`run_qc`] counts the pairs in which at
//! least one mate has too many low quality bases.
//!
//! # Examples
//!
//! ```rust,no_run
//! use readqc::{run_qc, QcConfig};
//!
//! let report = run_qc("reads_1.fq.gz", "reads_2.fq.gz", &QcConfig::default())
//!     .expect("Invalid fastq files");
//! println!("{}", report);
//! ```

mod buffer;
pub mod cache;
pub mod encoding;
pub mod error;
pub mod paired;
pub mod qc;
pub mod records;

pub use crate::encoding::QualityEncoding;
pub use crate::error::{Error, FormatErrorKind, Result};
pub use crate::paired::{PairedReader, RecordPair};
pub use crate::qc::{check_pairs, run_qc, QcConfig, QcReport, QualityFilter};
pub use crate::records::{OwnedRecord, Record, RecordReader};
