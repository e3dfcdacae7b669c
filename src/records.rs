use std::io::Read;

use crate::buffer::Buffer;
use crate::error::{Error, FormatErrorKind, Result};

const BUFSIZE: usize = 64 * 1024;
const MAX_BUFSIZE: usize = 64 * 1024 * 1024;


/// Trait to be implemented by types that represent fastq records.
pub trait Record {
    /// Return the fastq sequence as byte slice
    fn seq(&self) -> &[u8];
    /// Return the id-line of the record without the leading '@'
    fn head(&self) -> &[u8];
    /// Return the quality of the bases as byte slice
    fn qual(&self) -> &[u8];

    /// Number of bases in the read.
    fn len(&self) -> usize {
        self.seq().len()
    }

    fn is_empty(&self) -> bool {
        self.seq().is_empty()
    }
}


/// A fastq record that owns its data arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedRecord {
    pub head: Vec<u8>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl Record for OwnedRecord {
    fn head(&self) -> &[u8] {
        &self.head
    }

    fn seq(&self) -> &[u8] {
        &self.seq
    }

    fn qual(&self) -> &[u8] {
        &self.qual
    }
}


/// Reads four-line fastq records from a single stream.
pub struct RecordReader<R: Read> {
    reader: R,
    buffer: Buffer,
    name: String,
    line: u64,
    eof: bool,
}

impl<R: Read> RecordReader<R> {
    /// `name` identifies the stream in error messages.
    pub fn new(reader: R, name: impl Into<String>) -> RecordReader<R> {
        RecordReader::with_capacity(reader, name, BUFSIZE)
    }

    pub fn with_capacity(reader: R, name: impl Into<String>, bufsize: usize) -> RecordReader<R> {
        RecordReader::with_buffer(reader, name, bufsize, MAX_BUFSIZE)
    }

    /// Lines longer than `max_bufsize` are rejected as `LineTooLong`.
    pub fn with_buffer(reader: R, name: impl Into<String>, bufsize: usize, max_bufsize: usize)
        -> RecordReader<R>
    {
        RecordReader {
            reader,
            buffer: Buffer::new(bufsize, max_bufsize),
            name: name.into(),
            line: 0,
            eof: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Look at the first byte of the stream without consuming it.
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        while self.buffer.is_empty() && !self.eof {
            self.fill()?;
        }
        Ok(self.buffer.data().first().copied())
    }

    fn fill(&mut self) -> Result<()> {
        if self.buffer.n_free() == 0 && self.buffer.clean() == 0 && !self.buffer.grow() {
            return Err(self.format_error(self.line + 1, FormatErrorKind::LineTooLong));
        }
        let n_read = self.buffer.read_into(&mut self.reader).map_err(|e| Error::Io {
            name: self.name.clone(),
            source: e,
        })?;
        if n_read == 0 {
            self.eof = true;
        }
        Ok(())
    }

    /// Return the next line without its '\n', or `None` at the end of the
    /// stream. A last line without '\n' is returned as is.
    fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(pos) = self.buffer.find_newline() {
                let line = self.buffer.data()[..pos].to_vec();
                self.buffer.consume(pos + 1);
                self.line += 1;
                return Ok(Some(line));
            }
            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let n = self.buffer.len();
                let line = self.buffer.data().to_vec();
                self.buffer.consume(n);
                self.line += 1;
                return Ok(Some(line));
            }
            self.fill()?;
        }
    }

    fn format_error(&self, line: u64, kind: FormatErrorKind) -> Error {
        Error::Format { name: self.name.clone(), line, kind }
    }

    fn expect_line(&mut self) -> Result<Vec<u8>> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(self.format_error(self.line + 1, FormatErrorKind::Truncated)),
        }
    }

    /// Parse the next record.
    ///
    /// `Ok(None)` means the stream ended cleanly before a new record. Running
    /// out of lines inside a record is an error.
    pub fn next_record(&mut self) -> Result<Option<OwnedRecord>> {
        let start = self.line;

        let head = match self.next_line()? {
            None => return Ok(None),
            Some(line) => line,
        };
        match head.split_first() {
            Some((&b'@', name)) if !name.is_empty() => {},
            Some((&b'@', _)) => {
                return Err(self.format_error(start + 1, FormatErrorKind::EmptyName))
            },
            _ => return Err(self.format_error(start + 1, FormatErrorKind::MissingHeaderMarker)),
        }

        let seq = self.expect_line()?;
        if seq.is_empty() {
            return Err(self.format_error(start + 2, FormatErrorKind::EmptySequence));
        }

        let sep = self.expect_line()?;
        if sep.first() != Some(&b'+') {
            return Err(self.format_error(start + 3, FormatErrorKind::MissingSeparator));
        }

        let qual = self.expect_line()?;
        if qual.len() != seq.len() {
            return Err(self.format_error(start + 4, FormatErrorKind::LengthMismatch));
        }

        let mut head = head;
        head.remove(0);
        Ok(Some(OwnedRecord { head, seq, qual }))
    }
}
