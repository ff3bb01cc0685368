use std::{
    fs,
    io::{self, Read},
    path::{Component, Path, PathBuf},
};

#[cfg(unix)]
use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

use byteorder::{BigEndian, ReadBytesExt};
use tracing::debug;

use crate::{
    crypt::{self, KeySet},
    error::{Error, IoContext, Result},
    perm,
};

use super::set_mode;

pub const ENTRY_HEADER_SIZE: usize = 0x80;

const NAME_OFFSET: usize = 0x0b;
const IV_OFFSET: usize = 0x50;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntryType {
    File,
    Directory,
}

impl TryFrom<u8> for EntryType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::File),
            2 => Ok(Self::Directory),
            x => Err(Error::UnsupportedEntry(x)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntryHeader {
    pub size: u32,
    pub perm: u8,
    pub attr: u8,
    pub entry_type: EntryType,
    /// Name bytes up to the first NUL, exactly as stored.
    pub name: Vec<u8>,
    pub iv: [u8; 16],
}

struct RawEntry {
    magic: u32,
    size: u32,
    perm: u8,
    attr: u8,
    entry_type: u8,
}

impl RawEntry {
    fn try_from_reader<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            magic: r.read_u32::<BigEndian>()?,
            size: r.read_u32::<BigEndian>()?,
            perm: r.read_u8()?,
            attr: r.read_u8()?,
            entry_type: r.read_u8()?,
        })
    }
}

impl EntryHeader {
    const MAGIC: u32 = 0x03adf17e;

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; ENTRY_HEADER_SIZE];
        reader
            .read_exact(&mut raw)
            .at(|| "read file header".to_string())?;

        Self::parse(&raw)
    }

    pub fn parse(raw: &[u8; ENTRY_HEADER_SIZE]) -> Result<Self> {
        let fields = RawEntry::try_from_reader(&mut &raw[..])
            .at(|| "parse file header".to_string())?;
        if fields.magic != Self::MAGIC {
            return Err(Error::BadEntryMagic(fields.magic));
        }

        let name_field = &raw[NAME_OFFSET..IV_OFFSET];
        let end = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(name_field.len());
        let name = name_field[..end].to_vec();

        debug!(
            "file: size={:08x} perm={:02x} attr={:02x} type={:02x} name={}",
            fields.size,
            fields.perm,
            fields.attr,
            fields.entry_type,
            name.escape_ascii()
        );

        let mut iv = [0u8; 16];
        iv.copy_from_slice(&raw[IV_OFFSET..IV_OFFSET + 16]);

        Ok(Self {
            size: fields.size,
            perm: fields.perm,
            attr: fields.attr,
            entry_type: EntryType::try_from(fields.entry_type)?,
            name,
            iv,
        })
    }

    /// Payload length on disk: `size` rounded up to 64 bytes.
    pub fn stored_size(&self) -> usize {
        (self.size as usize + 63) & !63
    }

    fn display_name(&self) -> String {
        self.name.escape_ascii().to_string()
    }

    /// Path of this entry below `root`. Only plain relative names are accepted.
    pub fn target(&self, root: &Path) -> Result<PathBuf> {
        let plain = name_path(&self.name).filter(|rel| {
            !self.name.is_empty()
                && rel
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)))
        });
        match plain {
            Some(rel) => Ok(root.join(rel)),
            None => Err(Error::InvalidName(self.display_name())),
        }
    }

    /// Materialize this entry under `root`, consuming its payload from `reader`.
    pub fn extract<R: Read>(&self, reader: &mut R, keys: &KeySet, root: &Path) -> Result<()> {
        let path = self.target(root)?;

        match self.entry_type {
            EntryType::File => {
                // grows with the stream, not with the declared size
                let stored = self.stored_size();
                let mut data = Vec::new();
                Read::take(&mut *reader, stored as u64)
                    .read_to_end(&mut data)
                    .and_then(|n| {
                        if n == stored {
                            Ok(())
                        } else {
                            Err(io::ErrorKind::UnexpectedEof.into())
                        }
                    })
                    .at(|| format!("read file data for {}", self.display_name()))?;
                crypt::aes_cbc_decrypt(&keys.sd_key, &self.iv, &mut data)
                    .at(|| format!("decrypt {}", self.display_name()))?;

                fs::write(&path, &data[..self.size as usize])
                    .at(|| format!("write {}", path.display()))?;
                set_mode(&path, perm::file_mode(self.perm))
            }
            EntryType::Directory => {
                fs::create_dir(&path).at(|| format!("mkdir {}", path.display()))?;
                set_mode(&path, perm::dir_mode(self.perm))
            }
        }
    }
}

/// Entry names are raw bytes; on unix they map onto the path unchanged.
#[cfg(unix)]
fn name_path(name: &[u8]) -> Option<&Path> {
    Some(Path::new(OsStr::from_bytes(name)))
}

#[cfg(not(unix))]
fn name_path(name: &[u8]) -> Option<&Path> {
    std::str::from_utf8(name).ok().map(Path::new)
}
