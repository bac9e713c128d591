/// Length of the temperature and pressure trimming block at 0x88
pub const TEMP_PRESS_CALIB_LEN: usize = 24;
/// Length of the humidity trimming block at 0xE1
pub const HUMIDITY_CALIB_LEN: usize = 7;

/// Factory trimming parameters, read once after reset
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le_i16(buf: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([buf[at], buf[at + 1]])
}

/// Decodes the three trimming reads: the 0x88 block, the lone 0xA1 byte and the 0xE1 block.
///
/// H4 and H5 share register 0xE5: its low nibble completes H4 (`0xE4 << 4`)
/// and its high nibble completes H5 (`0xE6 << 4`). The high halves are signed.
pub fn parse_calibration(
    temp_press: &[u8; TEMP_PRESS_CALIB_LEN],
    h1: u8,
    humidity: &[u8; HUMIDITY_CALIB_LEN],
) -> Calibration {
    let shared = humidity[4];

    Calibration {
        t1: le_u16(temp_press, 0),
        t2: le_i16(temp_press, 2),
        t3: le_i16(temp_press, 4),
        p1: le_u16(temp_press, 6),
        p2: le_i16(temp_press, 8),
        p3: le_i16(temp_press, 10),
        p4: le_i16(temp_press, 12),
        p5: le_i16(temp_press, 14),
        p6: le_i16(temp_press, 16),
        p7: le_i16(temp_press, 18),
        p8: le_i16(temp_press, 20),
        p9: le_i16(temp_press, 22),
        h1,
        h2: le_i16(humidity, 0),
        h3: humidity[2],
        h4: ((humidity[3] as i8 as i16) << 4) | (shared & 0x0F) as i16,
        h5: ((humidity[5] as i8 as i16) << 4) | (shared >> 4) as i16,
        h6: humidity[6] as i8,
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) const TEMP_PRESS_BLOCK: [u8; TEMP_PRESS_CALIB_LEN] = [
        0x70, 0x6b, 0x43, 0x67, 0x18, 0xfc, 0x7d, 0x8e, 0x43, 0xd6, 0xd0, 0x0b, 0x27, 0x0b,
        0x8c, 0x00, 0xf9, 0xff, 0x8c, 0x3c, 0xf8, 0xc6, 0x70, 0x17,
    ];
    pub(crate) const H1: u8 = 75;
    pub(crate) const HUMIDITY_BLOCK: [u8; HUMIDITY_CALIB_LEN] =
        [0x6a, 0x01, 0x00, 0x13, 0x91, 0x03, 0x1e];

    pub(crate) fn golden() -> Calibration {
        parse_calibration(&TEMP_PRESS_BLOCK, H1, &HUMIDITY_BLOCK)
    }

    #[test]
    fn golden_block() {
        assert_eq!(
            golden(),
            Calibration {
                t1: 27504,
                t2: 26435,
                t3: -1000,
                p1: 36477,
                p2: -10685,
                p3: 3024,
                p4: 2855,
                p5: 140,
                p6: -7,
                p7: 15500,
                p8: -14600,
                p9: 6000,
                h1: 75,
                h2: 362,
                h3: 0,
                h4: 305,
                h5: 57,
                h6: 30,
            }
        );
    }

    #[test]
    fn nibble_packing_keeps_sign() {
        // 0xE4 = -16, 0xE5 = 0xA1, 0xE6 = -2
        let humidity = [0x00, 0x00, 0x00, 0xF0, 0xA1, 0xFE, 0xFF];
        let calib = parse_calibration(&[0; TEMP_PRESS_CALIB_LEN], 0, &humidity);

        assert_eq!(calib.h4, -255);
        assert_eq!(calib.h5, -22);
        assert_eq!(calib.h6, -1);
    }

    #[test]
    fn nibbles_do_not_bleed() {
        let humidity = [0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00];
        let calib = parse_calibration(&[0; TEMP_PRESS_CALIB_LEN], 0, &humidity);

        assert_eq!(calib.h4, 0x0F);
        assert_eq!(calib.h5, 0x0F);
    }
}
