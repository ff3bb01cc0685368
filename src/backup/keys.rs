use std::{
    fs,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};

use tracing::info;

use crate::error::{IoContext, Result};

const MAC_OFFSET: u64 = 0xf128;
const CERT_WINDOW_FROM_END: i64 = -768;
const CERT_WINDOW_SIZE: usize = 640;

/// Console identity taken from the backup after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleKeys {
    pub mac: [u8; 6],
    /// Raw NG id bytes as stored in the certificate name (`NG` + 8 hex digits).
    pub ng_id: [u8; 8],
    pub ng_key_id: [u8; 4],
    pub ng_sig: [u8; 60],
}

impl ConsoleKeys {
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut mac = [0u8; 6];
        reader
            .seek(SeekFrom::Start(MAC_OFFSET))
            .and_then(|_| reader.read_exact(&mut mac))
            .at(|| "read NG-mac".to_string())?;

        let mut cert = [0u8; CERT_WINDOW_SIZE];
        reader
            .seek(SeekFrom::End(CERT_WINDOW_FROM_END))
            .and_then(|_| reader.read_exact(&mut cert))
            .at(|| "read NG certificate".to_string())?;

        Ok(Self::from_parts(mac, &cert))
    }

    pub fn from_parts(mac: [u8; 6], cert: &[u8; CERT_WINDOW_SIZE]) -> Self {
        let mut keys = Self {
            mac,
            ng_id: [0; 8],
            ng_key_id: [0; 4],
            ng_sig: [0; 60],
        };
        keys.ng_id.copy_from_slice(&cert[198..206]);
        keys.ng_key_id.copy_from_slice(&cert[260..264]);
        keys.ng_sig.copy_from_slice(&cert[4..64]);
        keys
    }

    /// Write `NG-mac`, `NG-id`, `NG-key-id` and `NG-sig` into `dir`, creating it if needed.
    pub fn write<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        match fs::create_dir(dir) {
            Err(e) if e.kind() != io::ErrorKind::AlreadyExists => {
                return Err(e).at(|| format!("mkdir {}", dir.display()));
            }
            _ => {}
        }

        let ng_id = decode_ng_id(&self.ng_id);
        let artifacts: [(&str, &[u8]); 4] = [
            ("NG-mac", &self.mac),
            ("NG-id", &ng_id),
            ("NG-key-id", &self.ng_key_id),
            ("NG-sig", &self.ng_sig),
        ];

        for (name, data) in artifacts {
            fs::write(dir.join(name), data).at(|| format!("write {name}"))?;
            info!("saved {name}");
        }

        Ok(())
    }
}

/// Turn the NG id text into 4 bytes.
///
/// The source is handled as a C string, so decoding stops at the first zero
/// byte; unfilled output bytes stay zero. Non-hex input decodes to whatever
/// the digit arithmetic yields.
pub fn decode_ng_id(raw: &[u8; 8]) -> [u8; 4] {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let nibble = |c: u8| (c % 32 + 9) % 25;

    let mut out = [0u8; 4];
    for (o, pair) in out.iter_mut().zip(raw[..len].chunks_exact(2)) {
        *o = nibble(pair[0]).wrapping_mul(16).wrapping_add(nibble(pair[1]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_text() {
        assert_eq!(decode_ng_id(b"0403ac68"), [0x04, 0x03, 0xac, 0x68]);
        assert_eq!(decode_ng_id(b"0403AC68"), [0x04, 0x03, 0xac, 0x68]);
        assert_eq!(decode_ng_id(b"ffffffff"), [0xff; 4]);
    }

    #[test]
    fn stops_at_embedded_zero() {
        assert_eq!(decode_ng_id(b"04\0\0ac68"), [0x04, 0, 0, 0]);
        assert_eq!(decode_ng_id(b"040\0ac68"), [0x04, 0, 0, 0]);
        assert_eq!(decode_ng_id(&[0; 8]), [0; 4]);
    }

    #[test]
    fn binary_input_is_not_hex_decoded() {
        // raw bytes go through the digit arithmetic unchanged
        assert_eq!(decode_ng_id(&[0x04, 0x03, 0xac, 0x68, 1, 2, 3, 4]), [0xdc, 0x61, 0xab, 0xcd]);
    }

    #[test]
    fn picks_fixed_offsets() {
        let mut cert = [0u8; CERT_WINDOW_SIZE];
        cert[4..64].fill(0x11);
        cert[198..206].copy_from_slice(b"0403ac68");
        cert[260..264].copy_from_slice(&[1, 2, 3, 4]);

        let keys = ConsoleKeys::from_parts([9; 6], &cert);
        assert_eq!(keys.ng_sig, [0x11; 60]);
        assert_eq!(&keys.ng_id, b"0403ac68");
        assert_eq!(keys.ng_key_id, [1, 2, 3, 4]);
        assert_eq!(keys.mac, [9; 6]);
    }
}
