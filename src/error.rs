use std::fmt;
use std::io;

use thiserror::Error;

use crate::encoding::QualityEncoding;

pub type Result<T> = std::result::Result<T, Error>;


/// The structural problem found in a fastq record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    MissingHeaderMarker,
    EmptyName,
    EmptySequence,
    MissingSeparator,
    LengthMismatch,
    Truncated,
    Unpaired,
    LineTooLong,
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match *self {
            FormatErrorKind::MissingHeaderMarker => "'@' is expected",
            FormatErrorKind::EmptyName => "unexpected empty read name",
            FormatErrorKind::EmptySequence => "unexpected empty sequence",
            FormatErrorKind::MissingSeparator => "'+' is expected",
            FormatErrorKind::LengthMismatch => "sequence and quality length mismatch",
            FormatErrorKind::Truncated => "truncated fastq record",
            FormatErrorKind::Unpaired => "read has no mate in the other file",
            FormatErrorKind::LineTooLong => "fastq line is too long",
        };
        f.write_str(msg)
    }
}


#[derive(Debug, Error)]
pub enum Error {
    #[error("can not open read file '{name}'")]
    Open {
        name: String,
        #[source]
        source: niffler::Error,
    },

    #[error("read file '{name}' is not in fastq format")]
    NotFastq { name: String },

    #[error("failed to read '{name}'")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{kind} in line {line} of file '{name}'")]
    Format {
        name: String,
        line: u64,
        kind: FormatErrorKind,
    },

    #[error("invalid base quality value: {0} (in ascii)")]
    QualityBelowMinimum(u8),

    #[error("invalid base quality value: {0} (in ascii)")]
    QualityAboveMaximum(u8),

    #[error("invalid base quality range: {min} - {max} (in ascii)")]
    QualityRange { min: u8, max: u8 },

    #[error("bad quality string in line {line} of file '{name}'")]
    Encoding {
        name: String,
        line: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("unexpected base quality in line {line} of file '{name}': \
             expected {expected}, found {found}")]
    EncodingConflict {
        name: String,
        line: u64,
        expected: QualityEncoding,
        found: QualityEncoding,
    },

    #[error("reader stopped after an earlier error")]
    SessionFailed,

    #[error("reader is closed")]
    Closed,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Return the structural problem if this is a format error.
    pub fn format_kind(&self) -> Option<FormatErrorKind> {
        match *self {
            Error::Format { kind, .. } => Some(kind),
            _ => None,
        }
    }
}
