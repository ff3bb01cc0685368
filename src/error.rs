use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("MD5 mismatch")]
    DigestMismatch,
    #[error("bad file header size: {0:#x}")]
    BadHeaderSize(u32),
    #[error("wrong Bk header size: {0:#x}")]
    BadManifestSize(u32),
    #[error("no Bk header (found {0:#010x})")]
    BadManifestMagic(u32),
    #[error("bad file header magic: {0:#010x}")]
    BadEntryMagic(u32),
    #[error("bad total archive size: {0:#x}")]
    BadTotalSize(u32),
    #[error("invalid entry name {0:?}")]
    InvalidName(String),
    #[error("unhandled file type {0}")]
    UnsupportedEntry(u8),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

/// Coarse grouping used when reporting a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Integrity,
    Io,
    UnsupportedEntry,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Io { .. } => ErrorClass::Io,
            Error::UnsupportedEntry(_) => ErrorClass::UnsupportedEntry,
            _ => ErrorClass::Integrity,
        }
    }
}

pub(crate) trait IoContext<T> {
    fn at<F: FnOnce() -> String>(self, context: F) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at<F: FnOnce() -> String>(self, context: F) -> Result<T> {
        self.map_err(|source| Error::Io {
            context: context(),
            source,
        })
    }
}
