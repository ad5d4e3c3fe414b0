//! Mode-S parity.
//!
//! The last 24 bits of every message carry a CRC over the preceding bits. For
//! extended squitters the parity field is the plain CRC, for DF11 replies it is
//! overlaid with the interrogator code.
use crate::constants;

const MODES_CHECKSUM_TABLE: [u32; 112] = [
    0x3935ea, 0x1c9af5, 0xf1b77e, 0x78dbbf, 0xc397db, 0x9e31e9, 0xb0e2f0, 0x587178,
    0x2c38bc, 0x161c5e, 0x0b0e2f, 0xfa7d13, 0x82c48d, 0xbe9842, 0x5f4c21, 0xd05c14,
    0x682e0a, 0x341705, 0xe5f186, 0x72f8c3, 0xc68665, 0x9cb936, 0x4e5c9b, 0xd8d449,
    0x939020, 0x49c810, 0x24e408, 0x127204, 0x093902, 0x049c81, 0xfdb444, 0x7eda22,
    0x3f6d11, 0xe04c8c, 0x702646, 0x381323, 0xe3f395, 0x8e03ce, 0x4701e7, 0xdc7af7,
    0x91c77f, 0xb719bb, 0xa476d9, 0xadc168, 0x56e0b4, 0x2b705a, 0x15b82d, 0xf52612,
    0x7a9309, 0xc2b380, 0x6159c0, 0x30ace0, 0x185670, 0x0c2b38, 0x06159c, 0x030ace,
    0x018567, 0xff38b7, 0x80665f, 0xbfc92b, 0xa01e91, 0xaff54c, 0x57faa6, 0x2bfd53,
    0xea04ad, 0x8af852, 0x457c29, 0xdd4410, 0x6ea208, 0x375104, 0x1ba882, 0x0dd441,
    0xf91024, 0x7c8812, 0x3e4409, 0xe0d800, 0x706c00, 0x383600, 0x1c1b00, 0x0e0d80,
    0x0706c0, 0x038360, 0x01c1b0, 0x00e0d8, 0x00706c, 0x003836, 0x001c1b, 0xfff409,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000
];

/// CRC over every bit of `msg` except the trailing parity field.
pub fn compute(msg: &[u8]) -> u32 {
    let bits = msg.len() * 8;
    let offset = constants::MODES_LONG_MSG_BITS - bits;

    let mut crc = 0u32;
    for j in 0..bits - 24 {
        let mask = 1u8 << (7 - j % 8);
        if msg[j / 8] & mask != 0 {
            crc ^= MODES_CHECKSUM_TABLE[offset + j];
        }
    }

    crc & 0xffffff
}

/// Computed CRC xor the transmitted parity field. Zero for an intact extended squitter.
pub fn syndrome(msg: &[u8]) -> u32 {
    let n = msg.len();
    let parity = ((msg[n - 3] as u32) << 16) | ((msg[n - 2] as u32) << 8) | msg[n - 1] as u32;
    (compute(msg) ^ parity) & 0xffffff
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bytes(hex: &str) -> Vec<u8> {
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
            .collect()
    }

    #[rstest]
    #[case("8D4840D6202CC371C32CE0576098")]
    #[case("8D40621D58C382D690C8AC2863A7")]
    #[case("8D485020994409940838175B284F")]
    #[case("8DA05F219B06B6AF189400CBC33F")]
    #[case("5D40621D4F94D0")]
    fn test_intact_messages(#[case] hex: &str) {
        assert_eq!(syndrome(&bytes(hex)), 0);
    }

    #[test]
    fn test_flipped_bit_is_detected() {
        let mut msg = bytes("8D4840D6202CC371C32CE0576098");
        msg[6] ^= 0x10;
        assert_ne!(syndrome(&msg), 0);
    }

    #[test]
    fn test_compute_matches_parity_field() {
        let msg = bytes("8D485020994409940838175B284F");
        assert_eq!(compute(&msg), 0x5B284F);
    }
}
