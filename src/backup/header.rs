use std::{fs, io::Read, path::Path};

use byteorder::{BigEndian, ByteOrder};

use crate::{
    crypt::{self, KeySet},
    error::{Error, IoContext, Result},
    image,
};

pub const HEADER_SIZE: usize = 0xf0c0;

const MD5_OFFSET: usize = 0x0e;
const PERM_OFFSET: usize = 0x0c;
const TITLE_OFFSET: usize = 0x40;
const TITLE_SIZE: usize = 0x80;
const BANNER_OFFSET: usize = 0xc0;
const BANNER_WIDTH: usize = 192;
const BANNER_HEIGHT: usize = 64;
const ICON_OFFSET: usize = 0x60c0;
const ICON_SIZE: usize = 48;
const ICON_STRIDE: usize = 0x1200;

const MIN_DECLARED_SIZE: u32 = 0x72a0;
const MAX_DECLARED_SIZE: u32 = 0xf0a0;

/// The decrypted, digest-checked file header.
pub struct FileHeader {
    pub title_id: u64,
    pub header_size: u32,
    buf: Vec<u8>,
}

impl FileHeader {
    pub fn read<R: Read>(reader: &mut R, keys: &KeySet) -> Result<Self> {
        let mut buf = vec![0u8; HEADER_SIZE];
        reader
            .read_exact(&mut buf)
            .at(|| "read file header".to_string())?;

        Self::decode(buf, keys)
    }

    /// Decrypt `buf` (exactly [`HEADER_SIZE`] bytes) and validate it.
    pub fn decode(mut buf: Vec<u8>, keys: &KeySet) -> Result<Self> {
        crypt::aes_cbc_decrypt(&keys.sd_key, &keys.sd_iv, &mut buf)
            .at(|| "decrypt file header".to_string())?;

        let mut stored = [0u8; 16];
        stored.copy_from_slice(&buf[MD5_OFFSET..MD5_OFFSET + 16]);
        buf[MD5_OFFSET..MD5_OFFSET + 16].copy_from_slice(&keys.md5_blanker);
        if crypt::md5(&buf) != stored {
            return Err(Error::DigestMismatch);
        }

        let header_size = BigEndian::read_u32(&buf[8..12]);
        check_header_size(header_size)?;

        Ok(Self {
            title_id: BigEndian::read_u64(&buf[..8]),
            header_size,
            buf,
        })
    }

    /// Output directory name: the title id as 16 hex digits.
    pub fn dir_name(&self) -> String {
        format!("{:016x}", self.title_id)
    }

    pub fn icon_count(&self) -> usize {
        icon_count(self.header_size)
    }

    /// Packed permission byte for the extraction root.
    pub fn root_perm(&self) -> u8 {
        self.buf[PERM_OFFSET]
    }

    pub fn title(&self) -> &[u8] {
        &self.buf[TITLE_OFFSET..TITLE_OFFSET + TITLE_SIZE]
    }

    pub fn banner_rgb(&self) -> Vec<u8> {
        image::decode_rgb5a3(&self.buf[BANNER_OFFSET..], BANNER_WIDTH, BANNER_HEIGHT)
    }

    pub fn icon_rgb(&self, index: usize) -> Vec<u8> {
        let off = ICON_OFFSET + ICON_STRIDE * index;
        image::decode_rgb5a3(&self.buf[off..off + ICON_STRIDE], ICON_SIZE, ICON_SIZE)
    }

    /// Write `###title###`, `###banner###.ppm` and the icon images into `dir`.
    pub fn write_assets(&self, dir: &Path) -> Result<()> {
        let path = dir.join("###title###");
        fs::write(&path, self.title()).at(|| format!("write {}", path.display()))?;

        write_image(
            &dir.join("###banner###.ppm"),
            BANNER_WIDTH,
            BANNER_HEIGHT,
            &self.banner_rgb(),
        )?;

        let count = self.icon_count();
        for i in 0..count {
            let name = if count == 1 {
                "###icon###.ppm".to_string()
            } else {
                format!("###icon{i}###.ppm")
            };
            write_image(&dir.join(name), ICON_SIZE, ICON_SIZE, &self.icon_rgb(i))?;
        }

        Ok(())
    }
}

fn write_image(path: &Path, width: usize, height: usize, rgb: &[u8]) -> Result<()> {
    let file = fs::File::create(path).at(|| format!("open {}", path.display()))?;
    image::write_ppm(std::io::BufWriter::new(file), width, height, rgb)
        .at(|| format!("write {}", path.display()))
}

pub fn check_header_size(size: u32) -> Result<()> {
    if !(MIN_DECLARED_SIZE..=MAX_DECLARED_SIZE).contains(&size)
        || (size - 0x60a0) % ICON_STRIDE as u32 != 0
    {
        return Err(Error::BadHeaderSize(size));
    }
    Ok(())
}

/// Number of icons carried by a header of a valid declared size.
pub fn icon_count(size: u32) -> usize {
    (size as usize - 0x60a0) / ICON_STRIDE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_rules() {
        assert!(check_header_size(0x72a0).is_ok());
        assert!(check_header_size(0x84a0).is_ok());
        assert!(check_header_size(0xf0a0).is_ok());
        assert!(matches!(check_header_size(0x7300), Err(Error::BadHeaderSize(0x7300))));
        assert!(matches!(check_header_size(0xf0a4), Err(Error::BadHeaderSize(_))));
        assert!(matches!(check_header_size(0x60a0), Err(Error::BadHeaderSize(_))));
        assert!(matches!(check_header_size(0), Err(Error::BadHeaderSize(_))));
    }

    #[test]
    fn icon_counts() {
        assert_eq!(icon_count(0x72a0), 1);
        assert_eq!(icon_count(0x84a0), 2);
        assert_eq!(icon_count(0xf0a0), 8);
        // the last icon still fits inside the header
        assert!(ICON_OFFSET + ICON_STRIDE * icon_count(0xf0a0) <= HEADER_SIZE);
    }
}
