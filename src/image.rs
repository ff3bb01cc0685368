//! RGB5A3 texture decoding.
//!
//! Textures are stored as 4x4 pixel tiles, tiles in row-major order, each
//! pixel a big-endian 16-bit code. With the top bit set the code is 5-5-5
//! opaque RGB, otherwise it is 3-4-4-4 ARGB. Alpha is dropped on decode.

use std::io::Write;

use byteorder::{BigEndian, ByteOrder};

/// Decode a tiled RGB5A3 block into a packed RGB raster (3 bytes per pixel).
///
/// `data` must hold at least `width * height * 2` bytes.
pub fn decode_rgb5a3(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(width * height * 3);

    for y in 0..height {
        for x in 0..width {
            let off = (x & 3) + 4 * (y & 3) + 16 * (x >> 2) + 4 * width * (y >> 2);
            let raw = BigEndian::read_u16(&data[2 * off..]);
            out.extend_from_slice(&rgb5a3_to_rgb(raw));
        }
    }

    out
}

pub fn rgb5a3_to_rgb(raw: u16) -> [u8; 3] {
    if raw & 0x8000 != 0 {
        [
            ((raw >> 7) & 0xf8) as u8,
            ((raw >> 2) & 0xf8) as u8,
            ((raw << 3) & 0xf8) as u8,
        ]
    } else {
        [
            ((raw >> 4) & 0xf0) as u8,
            (raw & 0xf0) as u8,
            ((raw << 4) & 0xf0) as u8,
        ]
    }
}

/// Write a binary PPM (`P6`) image.
pub fn write_ppm<W: Write>(mut w: W, width: usize, height: usize, rgb: &[u8]) -> std::io::Result<()> {
    writeln!(w, "P6 {width} {height} 255")?;
    w.write_all(rgb)?;
    w.flush()
}
