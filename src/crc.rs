use crc::{Crc, CRC_16_XMODEM};

/// Polynomial 0x1021, zero initial value, no reflection and no final xor.
const NASA_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Compute the frame CRC over `len` bytes of `dat` starting at `start`.
///
/// # Panics
/// If `start + len` is beyond the end of `dat`.
#[must_use]
pub fn crc16(dat: &[u8], start: usize, len: usize) -> u16 {
    NASA_CRC.checksum(&dat[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bitwise reference, one byte into the high half then eight shift rounds.
    fn reference(dat: &[u8]) -> u16 {
        let mut crc: u16 = 0;
        for b in dat {
            crc ^= u16::from(*b) << 8;
            for _ in 0..8 {
                if crc & 0x8000 != 0 {
                    crc = (crc << 1) ^ 0x1021;
                } else {
                    crc <<= 1;
                }
            }
        }
        crc
    }

    #[test]
    fn check_value() {
        assert_eq!(crc16(b"123456789", 0, 9), 0x31c3);
    }

    #[test]
    fn empty_range_is_zero() {
        assert_eq!(crc16(&[0xde, 0xad], 1, 0), 0);
        assert_eq!(crc16(&[], 0, 0), 0);
    }

    #[test]
    fn all_zero_is_zero() {
        assert_eq!(crc16(&[0u8; 32], 0, 32), 0);
    }

    #[test]
    fn matches_bitwise_reference() {
        let dat: Vec<u8> = (0..=255u8).collect();
        for start in [0, 3, 17] {
            for len in [1, 12, 100, 200] {
                assert_eq!(
                    crc16(&dat, start, len),
                    reference(&dat[start..start + len]),
                    "start:{start} len:{len}"
                );
            }
        }
    }
}
