//! Bit-level packing shared by the header and the payload.
//!
//! Bit `i` of a stream lives in byte `i / 8` at position `i % 8`, counted from
//! the least-significant bit. Multi-bit fields (the byte value stored in a
//! header leaf) are written most-significant bit first.

use std::io::{self, Write};

use log::trace;

use crate::BUFFER_SIZE;

/// Packs bits into a byte buffer and hands full buffers to the underlying writer.
pub struct BitWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
    capacity: usize,
    bits_in_buffer: usize,
    total_bits: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, BUFFER_SIZE)
    }

    /// `capacity` is the number of whole bytes buffered before a flush.
    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            writer,
            buffer: Vec::with_capacity(capacity),
            capacity,
            bits_in_buffer: 0,
            total_bits: 0,
        }
    }

    /// Number of bits written so far, flushed or not.
    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        let byte_index = self.bits_in_buffer / 8;
        if byte_index == self.buffer.len() {
            self.buffer.push(0);
        }
        if bit {
            self.buffer[byte_index] |= 1 << (self.bits_in_buffer % 8);
        }
        self.bits_in_buffer += 1;
        self.total_bits += 1;

        if self.bits_in_buffer == self.capacity * 8 {
            self.flush_buffer()?;
        }
        Ok(())
    }

    pub fn write_code(&mut self, code: &[bool]) -> io::Result<()> {
        for &bit in code {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Write the eight bits of `value`, most-significant first.
    pub fn write_byte_msb(&mut self, value: u8) -> io::Result<()> {
        for shift in (0..8).rev() {
            self.write_bit((value >> shift) & 1 == 1)?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            trace!("Flushing {} bytes", self.buffer.len());
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        self.bits_in_buffer = 0;
        Ok(())
    }

    /// Flush everything, zero-padding the last byte, and return the writer
    /// together with the number of padding bits in that byte (0..=7).
    pub fn finish(mut self) -> io::Result<(W, u8)> {
        let padding = ((8 - self.total_bits % 8) % 8) as u8;
        self.flush_buffer()?;
        self.writer.flush()?;
        Ok((self.writer, padding))
    }
}

/// Sequential bit reader over an in-memory slice.
pub struct BitCursor<'a> {
    bytes: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> BitCursor<'a> {
    /// Read at most `limit` bits from `bytes`.
    pub fn new(bytes: &'a [u8], limit: usize) -> Self {
        Self {
            bytes,
            position: 0,
            limit: limit.min(bytes.len() * 8),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        if self.position >= self.limit {
            return None;
        }
        let bit = bit_at(self.bytes[self.position / 8], self.position % 8);
        self.position += 1;
        Some(bit)
    }

    /// Read eight bits as a byte, most-significant first.
    pub fn read_byte_msb(&mut self) -> Option<u8> {
        if self.remaining() < 8 {
            return None;
        }
        let mut value = 0u8;
        for _ in 0..8 {
            value = (value << 1) | self.read_bit()? as u8;
        }
        Some(value)
    }
}

#[inline]
pub fn bit_at(byte: u8, index: usize) -> bool {
    (byte >> index) & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(pattern: &str) -> Vec<bool> {
        pattern.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_bits_fill_from_lsb() {
        let mut writer = BitWriter::new(Vec::<u8>::new());
        writer.write_code(&bits("0010110")).unwrap();
        let (out, padding) = writer.finish().unwrap();

        assert_eq!(out, vec![0b0011_0100]);
        assert_eq!(padding, 1);
    }

    #[test]
    fn test_byte_msb_first() {
        let mut writer = BitWriter::new(Vec::<u8>::new());
        writer.write_bit(true).unwrap();
        writer.write_byte_msb(0x41).unwrap();
        let (out, padding) = writer.finish().unwrap();

        // stream: 1 0 1 0 0 0 0 0 | 1
        assert_eq!(out, vec![0b0000_0101, 0b0000_0001]);
        assert_eq!(padding, 7);
    }

    #[test]
    fn test_exact_byte_boundary_has_no_padding() {
        let mut writer = BitWriter::new(Vec::<u8>::new());
        writer.write_byte_msb(0xFF).unwrap();
        writer.write_byte_msb(0x00).unwrap();
        assert_eq!(writer.total_bits(), 16);
        let (out, padding) = writer.finish().unwrap();

        assert_eq!(out, vec![0xFF, 0x00]);
        assert_eq!(padding, 0);
    }

    #[test]
    fn test_flushes_at_capacity() {
        let mut writer = BitWriter::with_capacity(Vec::<u8>::new(), 2);
        for _ in 0..17 {
            writer.write_bit(true).unwrap();
        }
        // Two full bytes already handed to the sink.
        assert_eq!(writer.writer, vec![0xFF, 0xFF]);
        let (out, padding) = writer.finish().unwrap();
        assert_eq!(out, vec![0xFF, 0xFF, 0x01]);
        assert_eq!(padding, 7);
    }

    #[test]
    fn test_empty_writer() {
        let (out, padding) = BitWriter::new(Vec::<u8>::new()).finish().unwrap();
        assert!(out.is_empty());
        assert_eq!(padding, 0);
    }

    #[test]
    fn test_cursor_reads_back() {
        let mut writer = BitWriter::new(Vec::<u8>::new());
        writer.write_code(&bits("110")).unwrap();
        writer.write_byte_msb(0xA5).unwrap();
        let (out, _) = writer.finish().unwrap();

        let mut cursor = BitCursor::new(&out, 11);
        assert_eq!(cursor.read_bit(), Some(true));
        assert_eq!(cursor.read_bit(), Some(true));
        assert_eq!(cursor.read_bit(), Some(false));
        assert_eq!(cursor.read_byte_msb(), Some(0xA5));
        assert_eq!(cursor.read_bit(), None);
    }

    #[test]
    fn test_cursor_limit_respects_slice() {
        let data = [0u8; 1];
        let mut cursor = BitCursor::new(&data, 100);
        assert_eq!(cursor.remaining(), 8);
        assert_eq!(cursor.read_byte_msb(), Some(0));
        assert_eq!(cursor.read_byte_msb(), None);
    }
}
