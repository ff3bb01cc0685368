use std::{fs, io, path::Path};

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use md5::{Digest, Md5};

use crate::error::{IoContext, Result};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Keys used to open an SD backup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySet {
    pub sd_key: [u8; 16],
    pub sd_iv: [u8; 16],
    /// Substituted for the stored MD5 before the header digest is recomputed.
    pub md5_blanker: [u8; 16],
}

impl KeySet {
    const SD_KEY: [u8; 16] = [
        0xab, 0x01, 0xb9, 0xd8, 0xe1, 0x62, 0x2b, 0x08, 0xaf, 0xba, 0xd8, 0x4d, 0xbf, 0xc2, 0xa5,
        0x5d,
    ];
    const SD_IV: [u8; 16] = [
        0x21, 0x67, 0x12, 0xe6, 0xaa, 0x1f, 0x68, 0x9f, 0x95, 0xc5, 0xa2, 0x23, 0x24, 0xdc, 0x6a,
        0x98,
    ];
    const MD5_BLANKER: [u8; 16] = [
        0x0e, 0x65, 0x37, 0x81, 0x99, 0xbe, 0x45, 0x17, 0xab, 0x06, 0xec, 0x22, 0x45, 0x1a, 0x57,
        0x93,
    ];

    /// Load `sd-key`, `sd-iv` and `md5-blanker` (16 raw bytes each) from `dir`.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            sd_key: read_key(dir, "sd-key")?,
            sd_iv: read_key(dir, "sd-iv")?,
            md5_blanker: read_key(dir, "md5-blanker")?,
        })
    }
}

impl Default for KeySet {
    fn default() -> Self {
        Self {
            sd_key: Self::SD_KEY,
            sd_iv: Self::SD_IV,
            md5_blanker: Self::MD5_BLANKER,
        }
    }
}

fn read_key(dir: &Path, name: &str) -> Result<[u8; 16]> {
    let path = dir.join(name);
    let bytes = fs::read(&path).at(|| format!("read key {}", path.display()))?;
    <[u8; 16]>::try_from(bytes.as_slice())
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected 16 bytes, found {}", bytes.len()),
            )
        })
        .at(|| format!("read key {}", path.display()))
}

/// AES-128-CBC decrypt in place. `data` must be a multiple of 16 bytes.
pub fn aes_cbc_decrypt(key: &[u8; 16], iv: &[u8; 16], data: &mut [u8]) -> io::Result<()> {
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(data)
        .map_err(|e| io::Error::other(format!("cbc decrypt failed: {e}")))?;

    Ok(())
}

pub fn md5(data: &[u8]) -> [u8; 16] {
    Md5::digest(data).into()
}

pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = sha1_smol::Sha1::new();
    hasher.update(data);
    hasher.digest().bytes()
}
