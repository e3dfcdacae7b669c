use std::io::{Read, Result, ErrorKind};

use memchr::memchr;


/// A refillable window over the bytes of a reader.
///
/// Lines are cut out of the window in place. The window grows only if a
/// single line does not fit, up to `max_size`.
pub struct Buffer {
    data: Box<[u8]>,
    start: usize,
    end: usize,
    max_size: usize,
}


impl Buffer {
    pub fn new(size: usize, max_size: usize) -> Buffer {
        Buffer {
            data: vec![0u8; size.max(1)].into_boxed_slice(),
            start: 0,
            end: 0,
            max_size: max_size.max(size),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn n_free(&self) -> usize {
        self.data.len() - self.end
    }

    /// Move data to the start of the buffer, freeing space at the end.
    ///
    /// Return the amount of *additional* free space.
    pub fn clean(&mut self) -> usize {
        if self.start == 0 {
            return 0
        }

        let moved = self.start;
        self.data.copy_within(self.start..self.end, 0);
        self.end -= moved;
        self.start = 0;
        moved
    }

    /// Double the capacity. Return false once `max_size` is reached.
    pub fn grow(&mut self) -> bool {
        let size = self.data.len();
        if size >= self.max_size {
            return false
        }
        let new_size = (size * 2).min(self.max_size);
        let mut data = vec![0u8; new_size].into_boxed_slice();
        data[..self.len()].copy_from_slice(&self.data[self.start..self.end]);
        self.end = self.len();
        self.start = 0;
        self.data = data;
        true
    }

    pub fn read_into<R: Read>(&mut self, reader: &mut R) -> Result<usize> {
        let dest = &mut self.data[self.end..];

        let n_read;
        loop {
            match reader.read(dest) {
                Err(e) => {
                    if e.kind() != ErrorKind::Interrupted {
                        return Err(e)
                    }
                },
                Ok(val) => { n_read = val; break }
            }
        };
        self.end += n_read;
        Ok(n_read)
    }

    /// Position of the next newline, relative to the window start.
    #[inline]
    pub fn find_newline(&self) -> Option<usize> {
        memchr(b'\n', self.data())
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    #[inline]
    pub fn consume(&mut self, count: usize) {
        self.start += count;
        debug_assert!(self.start <= self.end);
    }
}
