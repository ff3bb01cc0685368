use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, info};

use crate::error::{Error, IoContext, Result};

pub const MANIFEST_SIZE: usize = 0x80;

/// The `Bk` header that follows the file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub ng_id: u32,
    pub file_count: u32,
    pub files_size: u32,
    pub total_size: u32,
}

impl Manifest {
    const HEADER_SIZE: u32 = 0x70;
    const MAGIC: u32 = 0x426b0001;

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; MANIFEST_SIZE];
        reader
            .read_exact(&mut raw)
            .at(|| "read backup header".to_string())?;

        let manifest = Self::parse(&raw)?;
        info!("NG id: {:08x}", manifest.ng_id);
        info!("{} files", manifest.file_count);
        debug!(
            "files size {:#x}, total size {:#x}",
            manifest.files_size, manifest.total_size
        );

        Ok(manifest)
    }

    pub fn parse(raw: &[u8; MANIFEST_SIZE]) -> Result<Self> {
        let field = |off: usize| BigEndian::read_u32(&raw[off..off + 4]);

        let magic = field(0x04);
        if magic != Self::MAGIC {
            return Err(Error::BadManifestMagic(magic));
        }
        let size = field(0x00);
        if size != Self::HEADER_SIZE {
            return Err(Error::BadManifestSize(size));
        }

        Ok(Self {
            ng_id: field(0x08),
            file_count: field(0x0c),
            files_size: field(0x10),
            total_size: field(0x1c),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(size: u32, magic: u32) -> [u8; MANIFEST_SIZE] {
        let mut raw = [0u8; MANIFEST_SIZE];
        raw[0..4].copy_from_slice(&size.to_be_bytes());
        raw[4..8].copy_from_slice(&magic.to_be_bytes());
        raw[0x08..0x0c].copy_from_slice(&0x0403ac68u32.to_be_bytes());
        raw[0x0c..0x10].copy_from_slice(&3u32.to_be_bytes());
        raw[0x10..0x14].copy_from_slice(&0x1c0u32.to_be_bytes());
        raw[0x1c..0x20].copy_from_slice(&0x580u32.to_be_bytes());
        raw
    }

    #[test]
    fn parses_fields() {
        let m = Manifest::parse(&raw(0x70, 0x426b0001)).unwrap();
        assert_eq!(
            m,
            Manifest {
                ng_id: 0x0403ac68,
                file_count: 3,
                files_size: 0x1c0,
                total_size: 0x580,
            }
        );
    }

    #[test]
    fn rejects_bad_magic_and_size() {
        assert!(matches!(
            Manifest::parse(&raw(0x70, 0x426b0002)),
            Err(Error::BadManifestMagic(0x426b0002))
        ));
        assert!(matches!(
            Manifest::parse(&raw(0x80, 0x426b0001)),
            Err(Error::BadManifestSize(0x80))
        ));
    }
}
