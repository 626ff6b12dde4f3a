//! # CRC-16/XMODEM Implementation
//!
//! CRC-16/XMODEM checksum calculation for logger packets.
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0x0000
//! **Reflection**: none, **Final XOR**: none

/// CRC-16/XMODEM polynomial
const CRC16_POLY: u16 = 0x1021;

/// Precomputed CRC16 lookup table, indexed by the high byte of the accumulator
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate CRC-16/XMODEM checksum using lookup table (fast)
///
/// # Arguments
///
/// * `data` - Byte slice to calculate CRC for (the packet payload, never the CRC bytes)
///
/// # Returns
///
/// * `u16` - Calculated CRC16 checksum
///
/// # Examples
///
/// ```
/// use gpslog::codec::crc::crc16_xmodem;
///
/// assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
/// ```
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        let index = ((crc >> 8) as u8 ^ byte) as usize;
        crc = (crc << 8) ^ CRC16_TABLE[index];
    }

    crc
}

/// Calculate CRC-16/XMODEM checksum bit by bit (slow, for verification)
///
/// This is the reference algorithm the logger firmware runs. Used to check
/// the lookup table implementation.
#[allow(dead_code)]
fn crc16_xmodem_slow(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc ^= (byte as u16) << 8;

        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_empty() {
        let data = [];
        assert_eq!(crc16_xmodem(&data), 0x0000);
        assert_eq!(crc16_xmodem_slow(&data), 0x0000);
    }

    #[test]
    fn test_crc16_check_string() {
        // Canonical check value for CRC-16/XMODEM
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
        assert_eq!(crc16_xmodem_slow(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_crc16_known_vectors() {
        assert_eq!(crc16_xmodem(b"A"), 0x58E5);
        assert_eq!(crc16_xmodem(&[0x00]), 0x0000);
        assert_eq!(crc16_xmodem(&[0xFF]), 0x1EF0);
    }

    #[test]
    fn test_crc16_zero_payload_is_zero() {
        // Zero init and no final XOR: any run of zero bytes checksums to zero
        assert_eq!(crc16_xmodem(&[0u8; 38]), 0x0000);
        assert_eq!(crc16_xmodem(&[0u8; 36]), 0x0000);
    }

    #[test]
    fn test_crc16_lookup_table_matches_slow() {
        let test_data = [
            vec![0x01, 0x02, 0x03],
            vec![0xFF, 0xFE, 0xFD],
            vec![0x10, 0x21, 0x80, 0x00],
            vec![0x00; 40],
            vec![0xFF; 38],
            (0u8..=255).collect::<Vec<u8>>(),
        ];

        for data in test_data.iter() {
            assert_eq!(
                crc16_xmodem(data),
                crc16_xmodem_slow(data),
                "CRC mismatch for data: {:?}",
                data
            );
        }
    }

    #[test]
    fn test_crc16_changes_with_data() {
        let data1 = [0x68, 0x65, 0x6C, 0x6C, 0x6F];
        let data2 = [0x68, 0x65, 0x6C, 0x6C, 0x6E];

        assert_ne!(
            crc16_xmodem(&data1),
            crc16_xmodem(&data2),
            "CRC should change when data changes"
        );
    }
}
