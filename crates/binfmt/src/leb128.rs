//! LEB128 decoding primitives.
//!
//! Each function decodes one value from the start of `bytes` and returns it
//! together with the number of bytes the encoding occupied. Nothing here
//! panics or allocates: failures come back as a [`LebError`] status which the
//! caller turns into a positioned error.

/// Status of a failed LEB128 decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum LebError {
    /// The input ended before the terminating byte of the encoding.
    #[error("unexpected end-of-file")]
    UnexpectedEof,
    /// The continuation bit is still set on the last byte the destination
    /// type can hold.
    #[error("integer representation too long")]
    TooLong,
    /// The last byte carries bits the destination type cannot represent.
    #[error("integer too large")]
    TooLarge,
}

/// Decodes an unsigned 32-bit LEB128 integer.
#[inline]
pub fn read_u32(bytes: &[u8]) -> Result<(u32, usize), LebError> {
    // Optimization for single byte u32.
    match bytes.first() {
        Some(&byte) if byte & 0x80 == 0 => return Ok((u32::from(byte), 1)),
        Some(_) => {}
        None => return Err(LebError::UnexpectedEof),
    }
    let mut result = 0;
    let mut shift = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        result |= u32::from(byte & 0x7f) << shift;
        if shift >= 25 && (byte >> (32 - shift)) != 0 {
            return Err(overflow(byte));
        }
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(LebError::UnexpectedEof)
}

/// Decodes an unsigned 64-bit LEB128 integer.
pub fn read_u64(bytes: &[u8]) -> Result<(u64, usize), LebError> {
    let mut result = 0;
    let mut shift = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        result |= u64::from(byte & 0x7f) << shift;
        if shift >= 57 && (byte >> (64 - shift)) != 0 {
            return Err(overflow(byte));
        }
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(LebError::UnexpectedEof)
}

/// Decodes a signed 32-bit LEB128 integer.
pub fn read_i32(bytes: &[u8]) -> Result<(i32, usize), LebError> {
    let mut result: i32 = 0;
    let mut shift = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        result |= i32::from(byte & 0x7f) << shift;
        if shift >= 25 {
            // The fifth byte holds four payload bits; everything above them,
            // minus the continuation bit, must be a sign extension.
            let continuation_bit = (byte & 0x80) != 0;
            let sign_and_unused_bit = ((byte << 1) as i8) >> (32 - shift);
            if continuation_bit {
                return Err(LebError::TooLong);
            }
            if sign_and_unused_bit != 0 && sign_and_unused_bit != -1 {
                return Err(LebError::TooLarge);
            }
            return Ok((result, i + 1));
        }
        shift += 7;
        if byte & 0x80 == 0 {
            let ashift = 32 - shift;
            return Ok(((result << ashift) >> ashift, i + 1));
        }
    }
    Err(LebError::UnexpectedEof)
}

/// Decodes a signed 64-bit LEB128 integer.
pub fn read_i64(bytes: &[u8]) -> Result<(i64, usize), LebError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        result |= i64::from(byte & 0x7f) << shift;
        if shift >= 57 {
            let continuation_bit = (byte & 0x80) != 0;
            let sign_and_unused_bit = ((byte << 1) as i8) >> (64 - shift);
            if continuation_bit {
                return Err(LebError::TooLong);
            }
            if sign_and_unused_bit != 0 && sign_and_unused_bit != -1 {
                return Err(LebError::TooLarge);
            }
            return Ok((result, i + 1));
        }
        shift += 7;
        if byte & 0x80 == 0 {
            let ashift = 64 - shift;
            return Ok(((result << ashift) >> ashift, i + 1));
        }
    }
    Err(LebError::UnexpectedEof)
}

#[cold]
fn overflow(byte: u8) -> LebError {
    if byte & 0x80 != 0 {
        LebError::TooLong
    } else {
        LebError::TooLarge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned() {
        assert_eq!(read_u32(&[0x00]), Ok((0, 1)));
        assert_eq!(read_u32(&[0xe5, 0x8e, 0x26]), Ok((624485, 3)));
        assert_eq!(read_u32(&[0x80, 0x00]), Ok((0, 2)));
        assert_eq!(read_u32(&[0xff, 0xff, 0xff, 0xff, 0x0f]), Ok((u32::MAX, 5)));
        assert_eq!(read_u32(&[0x2a, 0xff]), Ok((42, 1)));
        assert_eq!(
            read_u64(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]),
            Ok((u64::MAX, 10))
        );
    }

    #[test]
    fn unsigned_errors() {
        assert_eq!(read_u32(&[]), Err(LebError::UnexpectedEof));
        assert_eq!(read_u32(&[0x80, 0x80]), Err(LebError::UnexpectedEof));
        assert_eq!(
            read_u32(&[0xff, 0xff, 0xff, 0xff, 0x1f]),
            Err(LebError::TooLarge)
        );
        assert_eq!(
            read_u32(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]),
            Err(LebError::TooLong)
        );
        assert_eq!(
            read_u64(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02]),
            Err(LebError::TooLarge)
        );
    }

    #[test]
    fn signed() {
        assert_eq!(read_i32(&[0x7f]), Ok((-1, 1)));
        assert_eq!(read_i32(&[0xc0, 0xbb, 0x78]), Ok((-123456, 3)));
        assert_eq!(read_i32(&[0x80, 0x80, 0x80, 0x80, 0x78]), Ok((i32::MIN, 5)));
        assert_eq!(read_i32(&[0xff, 0xff, 0xff, 0xff, 0x07]), Ok((i32::MAX, 5)));
        assert_eq!(read_i64(&[0x7f]), Ok((-1, 1)));
        assert_eq!(read_i64(&[0x3f]), Ok((63, 1)));
    }

    #[test]
    fn signed_errors() {
        assert_eq!(read_i32(&[0xff]), Err(LebError::UnexpectedEof));
        assert_eq!(
            read_i32(&[0xff, 0xff, 0xff, 0xff, 0x4f]),
            Err(LebError::TooLarge)
        );
        assert_eq!(
            read_i32(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x7f]),
            Err(LebError::TooLong)
        );
    }
}
