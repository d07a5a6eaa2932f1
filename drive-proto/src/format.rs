//! No-std decimal formatting for status line serialization.
//!
//! These functions write numbers directly to byte buffers without heap
//! allocation or `core::fmt` machinery.

/// Longest decimal `u32` ("4294967295").
pub const MAX_U32_DIGITS: usize = 10;

/// Longest decimal `i16` ("-32768").
pub const MAX_I16_DIGITS: usize = 6;

/// Write a u32 as an unsigned decimal string.
///
/// Returns the number of bytes written (1-10 bytes).
///
/// # Panics
///
/// Panics if `buf` is shorter than the formatted number.
#[inline]
pub fn write_u32(buf: &mut [u8], value: u32) -> usize {
    if value == 0 {
        buf[0] = b'0';
        return 1;
    }

    // Digits come out least significant first
    let mut temp = [0u8; MAX_U32_DIGITS];
    let mut n = value;
    let mut len = 0;
    while n > 0 {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }

    for (dst, &digit) in buf[..len].iter_mut().zip(temp[..len].iter().rev()) {
        *dst = digit;
    }
    len
}

/// Write an i16 as a signed decimal string.
///
/// Returns the number of bytes written (1-6 bytes).
///
/// # Panics
///
/// Panics if `buf` is shorter than the formatted number.
#[inline]
pub fn write_i16(buf: &mut [u8], value: i16) -> usize {
    if value < 0 {
        buf[0] = b'-';
        // unsigned_abs handles i16::MIN without overflow
        1 + write_u32(&mut buf[1..], value.unsigned_abs() as u32)
    } else {
        write_u32(buf, value as u32)
    }
}
