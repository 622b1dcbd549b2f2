//! Helpers for explicit network byte-order conversions.
//!
//! These helpers keep Clippy expectations scoped to the conversion points so
//! the envelope codec can remain explicit about wire endianness without
//! repeating lint annotations. The 24-bit helpers cover the metadata and
//! frame length prefixes.

/// Largest value representable by a 24-bit length field.
pub const U24_MAX: u32 = 0x00FF_FFFF;

/// Serialise a `u16` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use reframe::byte_order::write_network_u16;
///
/// assert_eq!(write_network_u16(0x1234), [0x12, 0x34]);
/// ```
#[must_use]
pub fn write_network_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use reframe::byte_order::read_network_u16;
///
/// assert_eq!(read_network_u16([0x12, 0x34]), 0x1234);
/// ```
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u16::from_be_bytes(bytes)
}

/// Serialise the low 24 bits of `value` in network byte order.
///
/// Bits above [`U24_MAX`] are discarded; callers validate the range first.
///
/// # Examples
///
/// ```
/// use reframe::byte_order::write_network_u24;
///
/// assert_eq!(write_network_u24(0x12_3456), [0x12, 0x34, 0x56]);
/// ```
#[must_use]
pub fn write_network_u24(value: u32) -> [u8; 3] {
    let [_, high, mid, low] = write_network_u32(value & U24_MAX);
    [high, mid, low]
}

/// Parse a network-order 24-bit unsigned integer.
///
/// # Examples
///
/// ```
/// use reframe::byte_order::read_network_u24;
///
/// assert_eq!(read_network_u24([0x12, 0x34, 0x56]), 0x12_3456);
/// ```
#[must_use]
pub fn read_network_u24(bytes: [u8; 3]) -> u32 {
    let [high, mid, low] = bytes;
    read_network_u32([0, high, mid, low])
}

/// Serialise a `u32` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use reframe::byte_order::write_network_u32;
///
/// assert_eq!(write_network_u32(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use reframe::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    //! Round-trip tests for network byte-order conversion helpers.

    use rstest::rstest;

    use super::{
        U24_MAX,
        read_network_u16,
        read_network_u24,
        read_network_u32,
        write_network_u16,
        write_network_u24,
        write_network_u32,
    };

    /// Verify that each network-order write/read pair round-trips correctly.
    #[rstest]
    #[case::u16(
        0x1234u32,
        &write_network_u16(0x1234)[..],
        &[0x12, 0x34],
        u32::from(read_network_u16([0x12, 0x34]))
    )]
    #[case::u24(
        0x12_3456u32,
        &write_network_u24(0x12_3456)[..],
        &[0x12, 0x34, 0x56],
        read_network_u24([0x12, 0x34, 0x56])
    )]
    #[case::u32(
        0x1234_5678u32,
        &write_network_u32(0x1234_5678)[..],
        &[0x12, 0x34, 0x56, 0x78],
        read_network_u32([0x12, 0x34, 0x56, 0x78])
    )]
    fn network_byte_order_round_trip(
        #[case] value: u32,
        #[case] written: &[u8],
        #[case] expected_bytes: &[u8],
        #[case] read_back: u32,
    ) {
        assert_eq!(written, expected_bytes);
        assert_eq!(read_back, value);
    }

    #[test]
    fn u24_writer_masks_high_byte() {
        assert_eq!(write_network_u24(0xAB12_3456), [0x12, 0x34, 0x56]);
        assert_eq!(read_network_u24(write_network_u24(U24_MAX)), U24_MAX);
    }
}
