//! SD backup (`data.bin`) extraction.
//!
//! An archive is laid out as:
//!
//! | offset | size | contents |
//! |---|---|---|
//! | 0 | 0xF0C0 | encrypted file header (title, banner, icons) |
//! | 0xF0C0 | 0x80 | backup (`Bk`) header |
//! | 0xF140 | ... | file entries, each a 0x80 header plus encrypted payload |
//! | ... | 0x340 | signature, NG certificate, AP certificate |

use std::{
    fs,
    io::{Read, Seek},
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{
    crypt::KeySet,
    ec::{Sect233r1, SignatureCheck},
    error::{IoContext, Result},
    perm,
};

use self::{entry::EntryHeader, header::FileHeader, keys::ConsoleKeys, manifest::Manifest};

pub mod entry;
pub mod header;
pub mod keys;
pub mod manifest;
pub mod sig;


/// Outcome of a completed extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title_id: u64,
    pub file_count: u32,
    /// Result of the payload signature check. A failed check is not fatal.
    pub signature_ok: bool,
}

/// Drives one archive through header, manifest, entries, signature and key dump.
pub struct Extractor<R, C = Sect233r1> {
    reader: R,
    keys: KeySet,
    checker: C,
    out_root: PathBuf,
}

impl<R: Read + Seek> Extractor<R> {
    pub fn new<P: Into<PathBuf>>(reader: R, keys: KeySet, out_root: P) -> Self {
        Self {
            reader,
            keys,
            checker: Sect233r1,
            out_root: out_root.into(),
        }
    }
}

impl<R: Read + Seek, C: SignatureCheck> Extractor<R, C> {
    pub fn with_checker<D: SignatureCheck>(self, checker: D) -> Extractor<R, D> {
        Extractor {
            reader: self.reader,
            keys: self.keys,
            checker,
            out_root: self.out_root,
        }
    }

    pub fn run(mut self) -> Result<Report> {
        let header = FileHeader::read(&mut self.reader, &self.keys)?;
        let dir = self.out_root.join(header.dir_name());
        fs::create_dir(&dir).at(|| format!("mkdir {}", dir.display()))?;
        header.write_assets(&dir)?;

        let manifest = Manifest::read(&mut self.reader)?;
        for _ in 0..manifest.file_count {
            let entry = EntryHeader::read(&mut self.reader)?;
            entry.extract(&mut self.reader, &self.keys, &dir)?;
        }
        set_mode(&dir, perm::dir_mode(header.root_perm()))?;

        let signature_ok = sig::check(&mut self.reader, &manifest, &self.checker)?;
        if !signature_ok {
            warn!("signature check failed");
        }

        ConsoleKeys::read(&mut self.reader)?.write(self.out_root.join("default"))?;

        Ok(Report {
            title_id: header.title_id,
            file_count: manifest.file_count,
            signature_ok,
        })
    }
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .at(|| format!("chmod {}", path.display()))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let mut perms = fs::metadata(path)
        .at(|| format!("stat {}", path.display()))?
        .permissions();
    perms.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, perms).at(|| format!("chmod {}", path.display()))
}
