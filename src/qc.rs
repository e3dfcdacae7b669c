//! Count low quality read pairs.

use std::fmt;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};

use crate::encoding::QualityEncoding;
use crate::error::{Error, Result};
use crate::paired::{PairedReader, RecordPair};
use crate::records::Record;

pub const DEFAULT_LOW_QUALITY: i32 = 5;
pub const DEFAULT_BAD_BASES: f64 = 0.5;
pub const DEFAULT_MAX_PAIRS: u64 = 1_000_000;
pub const MIN_MAX_PAIRS: u64 = 10_000;


/// Settings of a quality check run.
#[derive(Debug, Clone, PartialEq)]
pub struct QcConfig {
    /// Quality encoding of the input, detected if `None`.
    pub encoding: Option<QualityEncoding>,
    /// Bases with a score up to this value are low quality.
    pub low_quality: i32,
    /// Low quality bases a read may have. Values of 1 and above are a count,
    /// smaller values a fraction of the read length.
    pub bad_bases: f64,
    /// Stop after this many pairs.
    pub max_pairs: u64,
}

impl Default for QcConfig {
    fn default() -> QcConfig {
        QcConfig {
            encoding: None,
            low_quality: DEFAULT_LOW_QUALITY,
            bad_bases: DEFAULT_BAD_BASES,
            max_pairs: DEFAULT_MAX_PAIRS,
        }
    }
}

impl QcConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.bad_bases.is_finite() || self.bad_bases < 0.0 {
            return Err(Error::InvalidConfig(
                format!("bad base threshold must be a non-negative number, got {}", self.bad_bases)));
        }
        if self.max_pairs < MIN_MAX_PAIRS {
            return Err(Error::InvalidConfig(
                format!("maximum pairs to check should be at least {}", MIN_MAX_PAIRS)));
        }
        Ok(())
    }
}


/// Decides whether single reads are of low quality.
#[derive(Debug, Clone, Copy)]
pub struct QualityFilter {
    offset: i32,
    low_quality: i32,
    bad_bases: f64,
}

impl QualityFilter {
    pub fn new(encoding: QualityEncoding, low_quality: i32, bad_bases: f64) -> QualityFilter {
        QualityFilter {
            offset: encoding.offset() as i32,
            low_quality,
            bad_bases,
        }
    }

    /// Number of bases with a score of at most `low_quality`.
    pub fn count_low_bases(&self, qual: &[u8]) -> usize {
        qual.iter()
            .filter(|&&c| c as i32 - self.offset <= self.low_quality)
            .count()
    }

    #[inline]
    fn exceeds(&self, low_bases: usize, total_bases: usize) -> bool {
        if self.bad_bases >= 1.0 {
            low_bases as f64 > self.bad_bases
        } else {
            low_bases as f64 > total_bases as f64 * self.bad_bases
        }
    }

    pub fn is_low_quality<T: Record>(&self, record: &T) -> bool {
        let qual = record.qual();
        self.exceeds(self.count_low_bases(qual), qual.len())
    }

    /// A pair is low quality if either mate is.
    pub fn is_low_quality_pair(&self, pair: &RecordPair) -> bool {
        self.is_low_quality(&pair.r1) || self.is_low_quality(&pair.r2)
    }
}


/// Result of a quality check run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QcReport {
    pub low_quality_pairs: u64,
    pub total_pairs: u64,
}

impl fmt::Display for QcReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}", self.low_quality_pairs, self.total_pairs)
    }
}


/// Classify up to `config.max_pairs` pairs of an open reader.
///
/// The reader is closed afterwards, also on error.
pub fn check_pairs<R: Read>(reader: &mut PairedReader<R>, config: &QcConfig) -> Result<QcReport> {
    let result = count_pairs(reader, config);
    reader.close();
    result
}

fn count_pairs<R: Read>(reader: &mut PairedReader<R>, config: &QcConfig) -> Result<QcReport> {
    let mut report = QcReport::default();
    let mut filter = reader.encoding()
        .map(|encoding| QualityFilter::new(encoding, config.low_quality, config.bad_bases));

    while report.total_pairs < config.max_pairs {
        let pair = match reader.read_pair()? {
            Some(pair) => pair,
            None => break,
        };
        report.total_pairs += 1;

        let current = match filter {
            Some(current) => current,
            None => {
                let encoding = reader.encoding().unwrap_or_else(|| {
                    warn!("Can not tell the quality base from the data, assuming {}",
                          QualityEncoding::Phred33);
                    QualityEncoding::Phred33
                });
                let current = QualityFilter::new(encoding, config.low_quality, config.bad_bases);
                filter = Some(current);
                current
            }
        };
        if current.is_low_quality_pair(&pair) {
            report.low_quality_pairs += 1;
        }
    }

    if report.total_pairs == config.max_pairs {
        debug!("Stopped after the maximum of {} pairs", config.max_pairs);
    }
    Ok(report)
}


/// Run the quality check on two fastq files.
pub fn run_qc<P, Q>(path1: P, path2: Q, config: &QcConfig) -> Result<QcReport>
    where P: AsRef<Path>, Q: AsRef<Path>
{
    let mut reader = PairedReader::open(path1, path2, config.encoding)?;
    check_pairs(&mut reader, config)
}
