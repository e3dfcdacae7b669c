//! Read two fastq files of a paired-end run in lockstep.

use std::io::Read;
use std::path::Path;

use log::{debug, info, warn};

use crate::cache::RecordCache;
use crate::encoding::QualityEncoding;
use crate::error::{Error, FormatErrorKind, Result};
use crate::records::{OwnedRecord, Record, RecordReader};


/// The two mates of one sequenced fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPair {
    pub r1: OwnedRecord,
    pub r2: OwnedRecord,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Streaming,
    Failed,
    Closed,
}


/// Paired fastq reader with quality encoding detection.
///
/// If the encoding is not given, records are read ahead until one of them
/// settles it. Those records are cached and returned first by `read_pair`,
/// so the look-ahead is invisible to the caller.
pub struct PairedReader<R: Read> {
    streams: Option<(RecordReader<R>, RecordReader<R>)>,
    encoding: Option<QualityEncoding>,
    cache: RecordCache,
    state: State,
    pairs_read: u64,
}


fn open_stream<P: AsRef<Path>>(path: P) -> Result<RecordReader<Box<dyn Read>>> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let (reader, format) = niffler::from_path(path).map_err(|e| Error::Open {
        name: name.clone(),
        source: e,
    })?;
    debug!("Opened '{}' ({:?} compression)", name, format);
    let reader: Box<dyn Read> = reader;
    Ok(RecordReader::new(reader, name))
}


impl PairedReader<Box<dyn Read>> {
    /// Open two (possibly compressed) fastq files.
    ///
    /// With `encoding` set to `None` the quality encoding is detected from
    /// the data.
    pub fn open<P, Q>(path1: P, path2: Q, encoding: Option<QualityEncoding>)
        -> Result<PairedReader<Box<dyn Read>>>
        where P: AsRef<Path>, Q: AsRef<Path>
    {
        let stream1 = open_stream(path1)?;
        let stream2 = open_stream(path2)?;
        PairedReader::from_record_readers(stream1, stream2, encoding)
    }
}


impl<R: Read> PairedReader<R> {
    /// Build a reader from two uncompressed fastq streams.
    pub fn from_readers(reader1: R, reader2: R, encoding: Option<QualityEncoding>)
        -> Result<PairedReader<R>>
    {
        PairedReader::from_record_readers(
            RecordReader::new(reader1, "<read 1>"),
            RecordReader::new(reader2, "<read 2>"),
            encoding,
        )
    }

    fn from_record_readers(mut stream1: RecordReader<R>, mut stream2: RecordReader<R>,
                           encoding: Option<QualityEncoding>) -> Result<PairedReader<R>> {
        check_fastq_start(&mut stream1)?;
        check_fastq_start(&mut stream2)?;

        let mut reader = PairedReader {
            streams: Some((stream1, stream2)),
            encoding,
            cache: RecordCache::new(),
            state: State::Streaming,
            pairs_read: 0,
        };
        if encoding.is_none() {
            reader.detect_encoding()?;
        }
        Ok(reader)
    }

    fn detect_encoding(&mut self) -> Result<()> {
        let mut sampled = 0u64;
        while self.encoding.is_none() {
            match self.read_fresh_pair()? {
                Some(pair) => {
                    self.cache.append(pair.r1);
                    self.cache.append(pair.r2);
                    sampled += 1;
                }
                None => break,
            }
        }
        match self.encoding {
            Some(encoding) => {
                debug!("Quality base settled after {} pairs", sampled);
                info!("Quality base value detected: {}", encoding);
            }
            None => debug!("Quality base still unknown after all {} pairs", sampled),
        }
        Ok(())
    }

    /// Check a quality string against the encoding seen so far.
    fn check_encoding(&mut self, record: &OwnedRecord, name: &str, line: u64) -> Result<()> {
        let found = QualityEncoding::detect(record.qual()).map_err(|e| Error::Encoding {
            name: name.to_string(),
            line,
            source: Box::new(e),
        })?;
        match (self.encoding, found) {
            (None, Some(found)) => self.encoding = Some(found),
            (Some(expected), Some(found)) if expected != found => {
                return Err(Error::EncodingConflict {
                    name: name.to_string(),
                    line,
                    expected,
                    found,
                })
            }
            _ => {},
        }
        Ok(())
    }

    fn read_fresh_pair(&mut self) -> Result<Option<RecordPair>> {
        let result = self.parse_pair();
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    fn parse_pair(&mut self) -> Result<Option<RecordPair>> {
        let (stream1, stream2) = match self.streams.as_mut() {
            Some(streams) => streams,
            None => return Err(Error::Closed),
        };

        let r1 = match stream1.next_record()? {
            Some(record) => record,
            None => {
                if stream2.peek_byte()?.is_some() {
                    warn!("'{}' ended, ignoring the rest of '{}' from line {}",
                          stream1.name(), stream2.name(), stream2.line() + 1);
                }
                return Ok(None);
            }
        };
        let r2 = match stream2.next_record()? {
            Some(record) => record,
            None => {
                return Err(Error::Format {
                    name: stream1.name().to_string(),
                    line: stream1.line() - 3,
                    kind: FormatErrorKind::Unpaired,
                })
            }
        };

        let (name1, line1) = (stream1.name().to_string(), stream1.line());
        let (name2, line2) = (stream2.name().to_string(), stream2.line());
        self.check_encoding(&r1, &name1, line1)?;
        self.check_encoding(&r2, &name2, line2)?;
        Ok(Some(RecordPair { r1, r2 }))
    }

    /// Return the next pair of records, or `None` at the end of the input.
    ///
    /// Once an error was returned, every further call fails as well.
    pub fn read_pair(&mut self) -> Result<Option<RecordPair>> {
        match self.state {
            State::Failed => return Err(Error::SessionFailed),
            State::Closed => return Err(Error::Closed),
            State::Streaming => {},
        }

        let pair = match self.cache.next_pair() {
            Some((r1, r2)) => Some(RecordPair { r1, r2 }),
            None => self.read_fresh_pair()?,
        };
        if pair.is_some() {
            self.pairs_read += 1;
        }
        Ok(pair)
    }

    /// The quality encoding, if it is known by now.
    pub fn encoding(&self) -> Option<QualityEncoding> {
        self.encoding
    }

    /// True once any read on this reader has failed.
    pub fn has_error(&self) -> bool {
        self.state == State::Failed
    }

    /// Number of pairs returned by `read_pair` so far.
    pub fn pairs_read(&self) -> u64 {
        self.pairs_read
    }

    /// Release both streams and the cache. Calling this again is a no-op.
    pub fn close(&mut self) {
        self.cache.clear();
        self.streams = None;
        if self.state != State::Failed {
            self.state = State::Closed;
        }
    }
}


fn check_fastq_start<R: Read>(stream: &mut RecordReader<R>) -> Result<()> {
    match stream.peek_byte()? {
        Some(b'@') => Ok(()),
        _ => Err(Error::NotFastq { name: stream.name().to_string() }),
    }
}


impl<R: Read> Iterator for PairedReader<R> {
    type Item = Result<RecordPair>;

    fn next(&mut self) -> Option<Result<RecordPair>> {
        match self.state {
            State::Streaming => self.read_pair().transpose(),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    fn fastq(records: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut data = Vec::new();
        for (name, qual) in records {
            let seq = "A".repeat(qual.len());
            data.extend_from_slice(format!("@{}\n{}\n+\n{}\n", name, seq, qual).as_bytes());
        }
        Cursor::new(data)
    }

    fn names(pair: &RecordPair) -> (String, String) {
        (String::from_utf8_lossy(pair.r1.head()).into_owned(),
         String::from_utf8_lossy(pair.r2.head()).into_owned())
    }

    #[test]
    fn detection_is_replayed() {
        let r1 = fastq(&[("a/1", "@@@@"), ("b/1", "JJJJ"), ("c/1", "####"), ("d/1", "IIII")]);
        let r2 = fastq(&[("a/2", "@@@@"), ("b/2", "JJJJ"), ("c/2", "IIII"), ("d/2", "IIII")]);
        let mut reader = PairedReader::from_readers(r1, r2, None).unwrap();
        assert_eq!(reader.encoding(), Some(QualityEncoding::Phred33));

        let got: Vec<_> = reader.by_ref().map(|p| names(&p.unwrap())).collect();
        assert_eq!(got, vec![
            ("a/1".to_string(), "a/2".to_string()),
            ("b/1".to_string(), "b/2".to_string()),
            ("c/1".to_string(), "c/2".to_string()),
            ("d/1".to_string(), "d/2".to_string()),
        ]);
        assert!(!reader.has_error());
        assert_eq!(reader.pairs_read(), 4);
    }

    #[test]
    fn second_mate_settles_encoding() {
        let r1 = fastq(&[("a/1", "@@@@")]);
        let r2 = fastq(&[("a/2", "hhhh")]);
        let reader = PairedReader::from_readers(r1, r2, None).unwrap();
        assert_eq!(reader.encoding(), Some(QualityEncoding::Phred64));
    }

    #[test]
    fn known_encoding_skips_detection() {
        let r1 = fastq(&[("a/1", "@@@@"), ("b/1", "####")]);
        let r2 = fastq(&[("a/2", "@@@@"), ("b/2", "####")]);
        let mut reader = PairedReader::from_readers(r1, r2, Some(QualityEncoding::Phred64)).unwrap();
        assert!(reader.read_pair().unwrap().is_some());
        match reader.read_pair() {
            Err(Error::EncodingConflict { expected, found, line, .. }) => {
                assert_eq!(expected, QualityEncoding::Phred64);
                assert_eq!(found, QualityEncoding::Phred33);
                assert_eq!(line, 8);
            },
            other => panic!("unexpected {:?}", other),
        }
        assert!(reader.has_error());
        assert!(matches!(reader.read_pair(), Err(Error::SessionFailed)));
        assert!(reader.next().is_none());
    }

    #[test]
    fn conflict_during_detection() {
        let r1 = fastq(&[("a/1", "####")]);
        let r2 = fastq(&[("a/2", "hhhh")]);
        match PairedReader::from_readers(r1, r2, None) {
            Err(Error::EncodingConflict { .. }) => {},
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn unresolved_encoding_replays_everything() {
        let r1 = fastq(&[("a/1", "@@@@"), ("b/1", "JJJJ")]);
        let r2 = fastq(&[("a/2", "@@@@"), ("b/2", ";;;;")]);
        let mut reader = PairedReader::from_readers(r1, r2, None).unwrap();
        assert_eq!(reader.encoding(), None);
        assert!(reader.read_pair().unwrap().is_some());
        assert!(reader.read_pair().unwrap().is_some());
        assert!(reader.read_pair().unwrap().is_none());
        assert!(!reader.has_error());
    }

    #[test]
    fn not_fastq() {
        let r1 = Cursor::new(b">a\nACGT\n".to_vec());
        let r2 = fastq(&[("a/2", "IIII")]);
        assert!(matches!(PairedReader::from_readers(r1, r2, None), Err(Error::NotFastq { .. })));
        let r1 = fastq(&[("a/1", "IIII")]);
        let r2 = Cursor::new(Vec::new());
        assert!(matches!(PairedReader::from_readers(r1, r2, None), Err(Error::NotFastq { .. })));
    }

    #[test]
    fn unequal_files() {
        let r1 = fastq(&[("a/1", "IIII"), ("b/1", "IIII")]);
        let r2 = fastq(&[("a/2", "IIII")]);
        let mut reader = PairedReader::from_readers(r1, r2, Some(QualityEncoding::Phred33)).unwrap();
        reader.read_pair().unwrap().unwrap();
        match reader.read_pair() {
            Err(Error::Format { name, line, kind }) => {
                assert_eq!((name.as_str(), line, kind), ("<read 1>", 5, FormatErrorKind::Unpaired));
            },
            other => panic!("unexpected {:?}", other),
        }
        assert!(reader.has_error());
    }

    #[test]
    fn shorter_first_file_ends_the_run() {
        let r1 = fastq(&[("a/1", "IIII")]);
        let r2 = fastq(&[("a/2", "IIII"), ("b/2", "IIII")]);
        let mut reader = PairedReader::from_readers(r1, r2, Some(QualityEncoding::Phred33)).unwrap();
        reader.read_pair().unwrap().unwrap();
        assert!(reader.read_pair().unwrap().is_none());
        assert!(!reader.has_error());
        assert_eq!(reader.pairs_read(), 1);
    }

    #[test]
    fn windows_line_endings_fail_the_quality_check() {
        let r1 = Cursor::new(b"@a\r\nAC\r\n+\r\nII\r\n".to_vec());
        let r2 = Cursor::new(b"@a\r\nAC\r\n+\r\nII\r\n".to_vec());
        match PairedReader::from_readers(r1, r2, None) {
            Err(Error::Encoding { line: 4, source, .. }) => {
                assert!(matches!(*source, Error::QualityBelowMinimum(13)));
            },
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }

        let r1 = Cursor::new(b"@a\r\nAC\r\n+\r\nII\r\n".to_vec());
        let r2 = Cursor::new(b"@a\r\nAC\r\n+\r\nII\r\n".to_vec());
        let mut reader = PairedReader::from_readers(r1, r2, Some(QualityEncoding::Phred33)).unwrap();
        assert!(matches!(reader.read_pair(), Err(Error::Encoding { .. })));
        assert!(reader.has_error());
    }

    #[test]
    fn range_error_is_sticky() {
        let r1 = fastq(&[("a/1", "####"), ("b/1", "#h##")]);
        let r2 = fastq(&[("a/2", "IIII"), ("b/2", "IIII")]);
        let mut reader = PairedReader::from_readers(r1, r2, None).unwrap();
        reader.read_pair().unwrap().unwrap();
        assert!(matches!(reader.read_pair(), Err(Error::Encoding { line: 8, .. })));
        assert!(reader.has_error());
        assert!(matches!(reader.read_pair(), Err(Error::SessionFailed)));
    }

    #[test]
    fn close_twice() {
        let r1 = fastq(&[("a/1", "IIII")]);
        let r2 = fastq(&[("a/2", "IIII")]);
        let mut reader = PairedReader::from_readers(r1, r2, None).unwrap();
        reader.close();
        reader.close();
        assert!(matches!(reader.read_pair(), Err(Error::Closed)));
        assert!(!reader.has_error());
    }
}
