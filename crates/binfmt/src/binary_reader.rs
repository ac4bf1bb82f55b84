/* Copyright 2018 Mozilla Foundation
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::error::bail;
use crate::{leb128, Error, ErrorCode, Result};
use std::ops::Range;
use std::str;

/// The four bytes every WebAssembly module starts with.
pub const WASM_MAGIC_NUMBER: &[u8; 4] = b"\0asm";

/// A binary reader over a window of a WebAssembly module.
///
/// The reader never copies the bytes it is given; everything it returns is a
/// view borrowing from the caller's buffer.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct BinaryReader<'a> {
    buffer: &'a [u8],
    position: usize,
    original_offset: usize,
}

impl<'a> BinaryReader<'a> {
    /// Creates a new binary reader which will parse the `data` provided.
    ///
    /// The `original_offset` provided is used for byte offsets in errors that
    /// are generated. That offset is added to the current position in `data`.
    /// This is how readers for a single section report offsets relative to
    /// the start of the whole module.
    pub fn new(data: &'a [u8], original_offset: usize) -> BinaryReader<'a> {
        BinaryReader {
            buffer: data,
            position: 0,
            original_offset,
        }
    }

    /// Gets the original position of the binary reader.
    #[inline]
    pub fn original_position(&self) -> usize {
        self.original_offset + self.position
    }

    /// Returns a range from the starting offset to the end of the buffer.
    pub fn range(&self) -> Range<usize> {
        self.original_offset..self.original_offset + self.buffer.len()
    }

    /// Returns the bytes which have not been read yet.
    pub fn remaining_buffer(&self) -> &'a [u8] {
        &self.buffer[self.position..]
    }

    /// Returns whether the `BinaryReader` has reached the end of the file.
    #[inline]
    pub fn eof(&self) -> bool {
        self.position >= self.buffer.len()
    }

    /// Returns the `BinaryReader`'s current position.
    #[inline]
    pub fn current_position(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes remaining in the `BinaryReader`.
    #[inline]
    pub fn bytes_remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    fn ensure_has_bytes(&self, len: usize) -> Result<()> {
        if len <= self.bytes_remaining() {
            Ok(())
        } else {
            Err(Error::eof(self.original_position()))
        }
    }

    /// Advances the `BinaryReader` `size` bytes, and returns a slice from the
    /// current position of `size` length.
    ///
    /// # Errors
    /// If `size` exceeds the remaining length in `BinaryReader`.
    pub fn read_bytes(&mut self, size: usize) -> Result<&'a [u8]> {
        self.ensure_has_bytes(size)?;
        let start = self.position;
        self.position += size;
        Ok(&self.buffer[start..self.position])
    }

    /// Splits the next `size` bytes off into their own reader and advances
    /// past them.
    pub fn split(&mut self, size: usize) -> Result<BinaryReader<'a>> {
        let offset = self.original_position();
        let data = self.read_bytes(size)?;
        Ok(BinaryReader::new(data, offset))
    }

    /// Reads a length-prefixed list of bytes from this reader and returns a
    /// new `BinaryReader` to read that list of bytes.
    pub fn read_reader(&mut self) -> Result<BinaryReader<'a>> {
        let size = self.read_var_u32()? as usize;
        self.split(size)
    }

    /// Advances the `BinaryReader` a single byte.
    ///
    /// # Errors
    ///
    /// If `BinaryReader` has no bytes remaining.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let b = match self.buffer.get(self.position) {
            Some(b) => *b,
            None => return Err(Error::eof(self.original_position())),
        };
        self.position += 1;
        Ok(b)
    }

    /// Advances the `BinaryReader` four bytes and returns a little-endian
    /// `u32`.
    ///
    /// # Errors
    /// If `BinaryReader` has less than four bytes remaining.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_leb<T>(
        &mut self,
        decode: fn(&[u8]) -> Result<(T, usize), leb128::LebError>,
    ) -> Result<T> {
        match decode(self.remaining_buffer()) {
            Ok((value, len)) => {
                self.position += len;
                Ok(value)
            }
            Err(status) => Err(Error::leb(status, self.original_position())),
        }
    }

    /// Parses a variable length integer as a `u32`.
    ///
    /// # Errors
    ///
    /// If the input ends before the integer does, or the integer is larger
    /// than 32 bits. The error's selector carries the decoder status.
    #[inline]
    pub fn read_var_u32(&mut self) -> Result<u32> {
        self.read_leb(leb128::read_u32)
    }

    /// Parses a variable length integer as a `u64`.
    pub fn read_var_u64(&mut self) -> Result<u64> {
        self.read_leb(leb128::read_u64)
    }

    /// Parses a variable length integer as an `i32`.
    pub fn read_var_i32(&mut self) -> Result<i32> {
        self.read_leb(leb128::read_i32)
    }

    /// Parses a variable length integer as an `i64`.
    pub fn read_var_i64(&mut self) -> Result<i64> {
        self.read_leb(leb128::read_i64)
    }

    /// Reads a length-prefixed byte string without interpreting it.
    ///
    /// This is how custom section names are read: the bytes are returned as
    /// an opaque view and are not checked for UTF-8 validity.
    pub fn read_name_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_var_u32()? as usize;
        self.read_bytes(len)
    }

    /// Reads a WebAssembly string from the module.
    ///
    /// # Errors
    ///
    /// If the length prefix can't be read, the string's length exceeds the
    /// remaining bytes, or the string contains invalid utf-8.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let bytes = self.read_name_bytes()?;
        str::from_utf8(bytes).map_err(|_| {
            Error::new(ErrorCode::MalformedUtf8, self.original_position() - bytes.len())
        })
    }

    /// Fails with [`ErrorCode::TrailingData`] unless everything in this
    /// reader has been consumed.
    pub fn finish(&self, what: &str) -> Result<()> {
        if !self.eof() {
            bail!(
                TrailingData,
                self.original_position(),
                "{} unread bytes at the end of the {what}",
                self.bytes_remaining()
            );
        }
        Ok(())
    }

    /// Reads the module header and returns the declared version.
    pub(crate) fn read_header_version(&mut self) -> Result<u32> {
        let magic_number = self
            .read_bytes(4)
            .map_err(|_| Error::new(ErrorCode::IllegalWasmFileFormat, self.original_position()))?;
        if magic_number != WASM_MAGIC_NUMBER {
            bail!(
                IllegalWasmFileFormat,
                self.original_position() - 4,
                "magic header not detected: bad magic number - expected={WASM_MAGIC_NUMBER:#x?} actual={magic_number:#x?}"
            );
        }
        self.read_u32()
            .map_err(|_| Error::new(ErrorCode::IllegalWasmFileFormat, self.original_position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LebError, Selector};

    #[test]
    fn offsets_are_relative_to_the_module() {
        let mut reader = BinaryReader::new(&[0x03, b'a', b'b', b'c', 0x80], 10);
        assert_eq!(reader.read_string().unwrap(), "abc");
        assert_eq!(reader.original_position(), 14);
        let err = reader.read_var_u32().unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnexpectedEof);
        assert_eq!(err.offset(), 14);
        assert_eq!(err.selector(), Some(&Selector::Leb(LebError::UnexpectedEof)));
    }

    #[test]
    fn sub_readers_stay_in_bounds() {
        let mut reader = BinaryReader::new(&[0x02, 0xaa, 0xbb, 0xcc], 0);
        let sub = reader.read_reader().unwrap();
        assert_eq!(sub.range(), 1..3);
        assert_eq!(sub.remaining_buffer(), &[0xaa, 0xbb]);
        assert_eq!(reader.bytes_remaining(), 1);

        let mut reader = BinaryReader::new(&[0x05, 0xaa], 0);
        let err = reader.read_reader().unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnexpectedEof);
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn strings_must_be_utf8() {
        let mut reader = BinaryReader::new(&[0x02, 0xff, 0xfe], 4);
        let err = reader.read_string().unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedUtf8);
        assert_eq!(err.offset(), 5);

        let mut reader = BinaryReader::new(&[0x02, 0xff, 0xfe], 4);
        assert_eq!(reader.read_name_bytes().unwrap(), &[0xff, 0xfe]);
    }

    #[test]
    fn header() {
        let mut reader = BinaryReader::new(b"\0asm\x01\0\0\0", 0);
        assert_eq!(reader.read_header_version().unwrap(), 1);

        let mut reader = BinaryReader::new(b"\0wasm\x01\0\0", 0);
        let err = reader.read_header_version().unwrap_err();
        assert_eq!(err.code(), ErrorCode::IllegalWasmFileFormat);
        assert_eq!(err.offset(), 0);
    }
}
