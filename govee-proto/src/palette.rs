//! Shades of white used by white mode
//!
//! Ordered warm to cool. The bulb has no colour temperature command; the
//! official app picks one of these shades from its slider instead.

/// Number of shades in [`SHADES_OF_WHITE`]
pub const SHADES: usize = 142;

pub static SHADES_OF_WHITE: [[u8; 3]; SHADES] = [
    [0xff, 0x8d, 0x0b],
    [0xff, 0x89, 0x12],
    [0xff, 0x92, 0x1d],
    [0xff, 0x8e, 0x21],
    [0xff, 0x98, 0x29],
    [0xff, 0x93, 0x2c],
    [0xff, 0x9d, 0x33],
    [0xff, 0x98, 0x36],
    [0xff, 0xa2, 0x3c],
    [0xff, 0x9d, 0x3f],
    [0xff, 0xa6, 0x45],
    [0xff, 0xa1, 0x48],
    [0xff, 0xaa, 0x4d],
    [0xff, 0xa5, 0x4f],
    [0xff, 0xae, 0x54],
    [0xff, 0xa9, 0x57],
    [0xff, 0xb2, 0x5b],
    [0xff, 0xad, 0x5e],
    [0xff, 0xb6, 0x62],
    [0xff, 0xb1, 0x65],
    [0xff, 0xb9, 0x69],
    [0xff, 0xb4, 0x6b],
    [0xff, 0xbd, 0x6f],
    [0xff, 0xb8, 0x72],
    [0xff, 0xc0, 0x76],
    [0xff, 0xbb, 0x78],
    [0xff, 0xc3, 0x7c],
    [0xff, 0xbe, 0x7e],
    [0xff, 0xc6, 0x82],
    [0xff, 0xc1, 0x84],
    [0xff, 0xc9, 0x87],
    [0xff, 0xc4, 0x89],
    [0xff, 0xcb, 0x8d],
    [0xff, 0xc7, 0x8f],
    [0xff, 0xce, 0x92],
    [0xff, 0xc9, 0x94],
    [0xff, 0xd0, 0x97],
    [0xff, 0xcc, 0x99],
    [0xff, 0xd3, 0x9c],
    [0xff, 0xce, 0x9f],
    [0xff, 0xd5, 0xa1],
    [0xff, 0xd1, 0xa3],
    [0xff, 0xd7, 0xa6],
    [0xff, 0xd3, 0xa8],
    [0xff, 0xd9, 0xab],
    [0xff, 0xd5, 0xad],
    [0xff, 0xdb, 0xaf],
    [0xff, 0xd7, 0xb1],
    [0xff, 0xdd, 0xb4],
    [0xff, 0xd9, 0xb6],
    [0xff, 0xdf, 0xb8],
    [0xff, 0xdb, 0xba],
    [0xff, 0xe1, 0xbc],
    [0xff, 0xdd, 0xbe],
    [0xff, 0xe2, 0xc0],
    [0xff, 0xdf, 0xc2],
    [0xff, 0xe4, 0xc4],
    [0xff, 0xe1, 0xc6],
    [0xff, 0xe5, 0xc8],
    [0xff, 0xe3, 0xca],
    [0xff, 0xe7, 0xcc],
    [0xff, 0xe4, 0xce],
    [0xff, 0xe8, 0xd0],
    [0xff, 0xe6, 0xd2],
    [0xff, 0xea, 0xd3],
    [0xff, 0xe8, 0xd5],
    [0xff, 0xeb, 0xd7],
    [0xff, 0xe9, 0xd9],
    [0xff, 0xed, 0xda],
    [0xff, 0xeb, 0xdc],
    [0xff, 0xee, 0xde],
    [0xff, 0xec, 0xe0],
    [0xff, 0xef, 0xe1],
    [0xff, 0xee, 0xe3],
    [0xff, 0xf0, 0xe4],
    [0xff, 0xef, 0xe6],
    [0xff, 0xf1, 0xe7],
    [0xff, 0xf0, 0xe9],
    [0xff, 0xf3, 0xea],
    [0xff, 0xf2, 0xec],
    [0xff, 0xf4, 0xed],
    [0xff, 0xf3, 0xef],
    [0xff, 0xf5, 0xf0],
    [0xff, 0xf4, 0xf2],
    [0xff, 0xf6, 0xf3],
    [0xff, 0xf5, 0xf5],
    [0xff, 0xf7, 0xf7],
    [0xff, 0xf6, 0xf8],
    [0xff, 0xf8, 0xf8],
    [0xff, 0xf8, 0xfb],
    [0xff, 0xf9, 0xfb],
    [0xff, 0xf9, 0xfd],
    [0xff, 0xf9, 0xfd],
    [0xfe, 0xf9, 0xff],
    [0xfe, 0xfa, 0xff],
    [0xfc, 0xf7, 0xff],
    [0xfc, 0xf8, 0xff],
    [0xf9, 0xf6, 0xff],
    [0xfa, 0xf7, 0xff],
    [0xf7, 0xf5, 0xff],
    [0xf7, 0xf5, 0xff],
    [0xf5, 0xf3, 0xff],
    [0xf5, 0xf4, 0xff],
    [0xf3, 0xf2, 0xff],
    [0xf3, 0xf3, 0xff],
    [0xf0, 0xf1, 0xff],
    [0xf1, 0xf1, 0xff],
    [0xef, 0xf0, 0xff],
    [0xef, 0xf0, 0xff],
    [0xed, 0xef, 0xff],
    [0xee, 0xef, 0xff],
    [0xeb, 0xee, 0xff],
    [0xec, 0xee, 0xff],
    [0xe9, 0xed, 0xff],
    [0xea, 0xed, 0xff],
    [0xe7, 0xec, 0xff],
    [0xe9, 0xec, 0xff],
    [0xe6, 0xeb, 0xff],
    [0xe7, 0xea, 0xff],
    [0xe4, 0xea, 0xff],
    [0xe5, 0xe9, 0xff],
    [0xe3, 0xe9, 0xff],
    [0xe4, 0xe9, 0xff],
    [0xe1, 0xe8, 0xff],
    [0xe3, 0xe8, 0xff],
    [0xe0, 0xe7, 0xff],
    [0xe1, 0xe7, 0xff],
    [0xde, 0xe6, 0xff],
    [0xe0, 0xe6, 0xff],
    [0xdd, 0xe6, 0xff],
    [0xdf, 0xe5, 0xff],
    [0xdc, 0xe5, 0xff],
    [0xdd, 0xe4, 0xff],
    [0xda, 0xe4, 0xff],
    [0xdc, 0xe3, 0xff],
    [0xd9, 0xe3, 0xff],
    [0xdb, 0xe2, 0xff],
    [0xd8, 0xe3, 0xff],
    [0xda, 0xe2, 0xff],
    [0xd7, 0xe2, 0xff],
    [0xd9, 0xe1, 0xff],
    [0xd6, 0xe1, 0xff],
];

/// Map a 0-255 warmth intensity onto a palette index.
///
/// `round(intensity / 255 * (SHADES - 1))`
pub fn white_index(intensity: u8) -> usize {
    let scaled = f64::from(intensity) / 255.0 * (SHADES - 1) as f64;
    scaled.round() as usize
}

/// Shade at `index`, clamped to the coolest shade
pub fn shade(index: usize) -> [u8; 3] {
    SHADES_OF_WHITE[index.min(SHADES - 1)]
}

/// Index of the first palette entry equal to `rgb`
pub fn find_shade(rgb: [u8; 3]) -> Option<usize> {
    SHADES_OF_WHITE.iter().position(|s| *s == rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_mapping() {
        assert_eq!(white_index(0), 0);
        assert_eq!(white_index(100), 55);
        assert_eq!(white_index(255), SHADES - 1);
        assert_eq!(white_index(128), 71);
    }

    #[test]
    fn palette_ends() {
        assert_eq!(shade(0), [0xff, 0x8d, 0x0b]);
        assert_eq!(shade(SHADES - 1), [0xd6, 0xe1, 0xff]);
        assert_eq!(shade(10_000), [0xd6, 0xe1, 0xff]);
    }

    #[test]
    fn lookup_by_rgb() {
        assert_eq!(find_shade([0xd6, 0xe1, 0xff]), Some(SHADES - 1));
        assert_eq!(find_shade([0xff, 0x89, 0x12]), Some(1));
        assert_eq!(find_shade([0, 0, 0]), None);
    }
}
