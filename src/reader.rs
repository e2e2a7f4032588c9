//! L1: a bounded big-endian cursor over a borrowed byte slice.
//!
//! Mirrors the shape of the original `BinaryReader`: a view over `[start, end)` of
//! some backing buffer with a current position, from which non-copying sub-readers
//! can be carved for length-prefixed sections.

use crate::error::{Error, Result};

/// A bounded, big-endian cursor. Borrows its buffer; never copies.
pub struct Reader<'a> {
    buf: &'a [u8],
    start: usize,
    end: usize,
    pos: usize,
}

impl<'a> Reader<'a> {
    /// A reader over the whole slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Reader {
            buf,
            start: 0,
            end: buf.len(),
            pos: 0,
        }
    }

    /// Current absolute offset from the start of this reader's view.
    pub fn tell(&self) -> usize {
        self.pos - self.start
    }

    /// Bytes left to read in this view.
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Total size of this reader's own view, from its start to its end,
    /// independent of the current position. Used to carve a sub-reader that
    /// runs to the end of the buffer from an absolute offset already read out
    /// of the header, without the current cursor position shrinking it.
    pub fn view_len(&self) -> usize {
        self.end - self.start
    }

    fn require(&self, n: usize) -> Result<()> {
        if self.pos + n > self.end {
            Err(Error::Truncated {
                requested: n,
                offset: self.tell(),
                remaining: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Seek to an offset relative to this reader's own start.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        let target = self.start + offset;
        if target > self.end {
            return Err(Error::Truncated {
                requested: 0,
                offset,
                remaining: 0,
            });
        }
        self.pos = target;
        Ok(())
    }

    /// Skip N bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.require(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read N raw bytes, returning a borrowed slice (no copy).
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read N bytes and interpret them as ASCII, stripping trailing NUL bytes.
    pub fn read_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        let trimmed = match bytes.iter().position(|&b| b == 0) {
            Some(idx) => &bytes[..idx],
            None => bytes,
        };
        Ok(trimmed.iter().map(|&b| b as char).collect())
    }

    pub fn u8(&mut self) -> Result<u8> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Carve a non-copying sub-reader over `[offset, offset+length)` of the
    /// parent's backing buffer. Bounds are validated against the parent's view,
    /// not the whole underlying slice, so a sub-reader can never read past its
    /// parent's own end.
    pub fn sub_reader(&self, offset: usize, length: usize) -> Result<Reader<'a>> {
        let abs_start = self.start + offset;
        let abs_end = abs_start + length;
        if abs_end > self.end {
            return Err(Error::Truncated {
                requested: length,
                offset,
                remaining: self.end.saturating_sub(abs_start),
            });
        }
        Ok(Reader {
            buf: self.buf,
            start: abs_start,
            end: abs_end,
            pos: abs_start,
        })
    }

    /// Verify that at least `n` bytes remain without consuming them.
    pub fn require_at_least(&self, n: usize) -> Result<()> {
        self.require(n)
    }
}
