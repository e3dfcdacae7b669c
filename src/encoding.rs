//! Detection of the ascii offset used for base qualities.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Lowest printable quality character.
pub const QUAL_MIN: u8 = 33;
/// Highest printable quality character.
pub const QUAL_MAX: u8 = 126;
/// Lowest character a 64-based file plausibly contains.
pub const PHRED64_FLOOR: u8 = 59;
/// Highest character a 33-based file plausibly contains.
pub const PHRED33_CEILING: u8 = 74;


/// The offset subtracted from a quality character to get its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityEncoding {
    /// Sanger, Illumina 1.8+
    Phred33,
    /// Solexa, Illumina 1.3+ and 1.5+
    Phred64,
}

impl QualityEncoding {
    #[inline]
    pub fn offset(self) -> u8 {
        match self {
            QualityEncoding::Phred33 => 33,
            QualityEncoding::Phred64 => 64,
        }
    }

    /// Classify a single quality string.
    ///
    /// Returns `Ok(None)` if the characters are valid under both encodings,
    /// so that more records have to be sampled before deciding. Characters
    /// outside of the printable range, or a range that neither encoding can
    /// produce, are an error.
    pub fn detect(qual: &[u8]) -> Result<Option<QualityEncoding>> {
        let (min, max) = match qual.iter().copied().fold(None, |acc, c| match acc {
            None => Some((c, c)),
            Some((lo, hi)) => Some((lo.min(c), hi.max(c))),
        }) {
            None => return Ok(None),
            Some(range) => range,
        };

        if min < QUAL_MIN {
            return Err(Error::QualityBelowMinimum(min));
        }
        if max > QUAL_MAX {
            return Err(Error::QualityAboveMaximum(max));
        }
        if min < PHRED64_FLOOR && max > PHRED33_CEILING {
            return Err(Error::QualityRange { min, max });
        }

        if max > PHRED33_CEILING {
            Ok(Some(QualityEncoding::Phred64))
        } else if min < PHRED64_FLOOR {
            Ok(Some(QualityEncoding::Phred33))
        } else {
            Ok(None)
        }
    }
}

impl fmt::Display for QualityEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.offset())
    }
}

impl FromStr for QualityEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<QualityEncoding> {
        match s.trim() {
            "33" => Ok(QualityEncoding::Phred33),
            "64" => Ok(QualityEncoding::Phred64),
            other => Err(Error::InvalidConfig(
                format!("quality base value should be 33 or 64, got '{}'", other))),
        }
    }
}
