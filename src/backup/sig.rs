use std::io::{Read, Seek, SeekFrom};

use crate::{
    crypt,
    ec::{SignatureCheck, CERT_SIZE, SIG_SIZE},
    error::{Error, IoContext, Result},
};

use super::{header::HEADER_SIZE, manifest::Manifest};

pub const SIG_BLOCK_SIZE: usize = SIG_SIZE + 2 * CERT_SIZE;

/// The trailing signature and certificate pair.
pub struct SigBlock {
    pub sig: [u8; SIG_SIZE],
    pub ng_cert: [u8; CERT_SIZE],
    pub ap_cert: [u8; CERT_SIZE],
}

impl SigBlock {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut block = Self {
            sig: [0; SIG_SIZE],
            ng_cert: [0; CERT_SIZE],
            ap_cert: [0; CERT_SIZE],
        };
        reader
            .read_exact(&mut block.sig)
            .at(|| "read signature".to_string())?;
        reader
            .read_exact(&mut block.ng_cert)
            .at(|| "read NG cert".to_string())?;
        reader
            .read_exact(&mut block.ap_cert)
            .at(|| "read AP cert".to_string())?;

        Ok(block)
    }
}

/// Length of the signed region, which starts right after the file header.
pub fn signed_len(manifest: &Manifest) -> Result<u64> {
    (manifest.total_size as u64)
        .checked_sub(SIG_BLOCK_SIZE as u64)
        .ok_or(Error::BadTotalSize(manifest.total_size))
}

/// SHA-1 of SHA-1 over `len` bytes starting at the backup header.
pub fn payload_digest<R: Read + Seek>(reader: &mut R, len: u64) -> Result<[u8; 20]> {
    reader
        .seek(SeekFrom::Start(HEADER_SIZE as u64))
        .at(|| "seek to signed data".to_string())?;

    let mut hasher = sha1_smol::Sha1::new();
    let mut chunk = vec![0u8; 0x10000];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(chunk.len() as u64) as usize;
        reader
            .read_exact(&mut chunk[..n])
            .at(|| "read data for sig check".to_string())?;
        hasher.update(&chunk[..n]);
        remaining -= n as u64;
    }

    Ok(crypt::sha1(&hasher.digest().bytes()))
}

/// Check the archive signature. Only I/O and size problems are errors; a bad
/// signature is reported as `false`.
pub fn check<R: Read + Seek, C: SignatureCheck>(
    reader: &mut R,
    manifest: &Manifest,
    checker: &C,
) -> Result<bool> {
    let len = signed_len(manifest)?;
    let hash = payload_digest(reader, len)?;

    // the block is taken at 0xF0C0 + total - 0x340, not wherever the last entry ended
    let block = SigBlock::read(reader)?;

    Ok(checker.check(&block.ng_cert, &block.ap_cert, &block.sig, &hash))
}
