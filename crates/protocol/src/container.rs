//! Binary container codec
//!
//! Layout:
//!
//! ```text
//! [magic "OTDF" (4)][version (1)][manifest length (LEB128)][manifest][payload]
//! ```
//!
//! No length field is trusted beyond the bytes actually present.

use crate::binary::{read_array, read_u8, read_varint, varint_len, write_bytes, write_u8, write_varint};
use crate::binary::{BinaryRead, BinaryWrite};
use crate::manifest::{Manifest, ManifestError};
use std::io::{self, Cursor, Read, Write};
use thiserror::Error;

/// Container magic bytes
pub const MAGIC: [u8; 4] = *b"OTDF";

/// Container format version written and accepted
pub const FORMAT_VERSION: u8 = 0x01;

/// Magic plus version byte
pub const MIN_HEADER_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Container is truncated")]
    Truncated,

    #[error("Unsupported container format or version")]
    UnsupportedVersion,

    #[error("Payload is {actual} bytes but the manifest declares {declared}")]
    TrailingBytes { declared: u64, actual: u64 },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to encode container: {0}")]
    Encode(String),
}

// Reads only ever run over an in-memory slice, so every I/O failure is
// input that ended early or a length field that cannot be honored.
impl From<io::Error> for ContainerError {
    fn from(_: io::Error) -> Self {
        ContainerError::Truncated
    }
}

/// Fixed container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u8,
    pub manifest_length: u64,
}

impl ContainerHeader {
    pub fn new(manifest_length: u64) -> Self {
        Self {
            version: FORMAT_VERSION,
            manifest_length,
        }
    }
}

impl BinaryRead for ContainerHeader {
    type Error = ContainerError;

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let magic: [u8; 4] = read_array(reader)?;
        let version = read_u8(reader)?;
        if magic != MAGIC || version != FORMAT_VERSION {
            return Err(ContainerError::UnsupportedVersion);
        }
        let manifest_length = read_varint(reader)?;
        Ok(Self {
            version,
            manifest_length,
        })
    }
}

impl BinaryWrite for ContainerHeader {
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_bytes(writer, &MAGIC)?;
        write_u8(writer, self.version)?;
        write_varint(writer, self.manifest_length)
    }

    fn serialized_size(&self) -> usize {
        MIN_HEADER_LEN + varint_len(self.manifest_length)
    }
}

/// A decoded container borrowing its payload from the input
#[derive(Debug)]
pub struct DecodedContainer<'a> {
    pub header: ContainerHeader,
    pub manifest: Manifest,
    pub payload: &'a [u8],
}

/// Encode a signed manifest and its payload
pub fn encode(manifest: &Manifest, payload: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let manifest_bytes = manifest.to_canonical_bytes()?;
    let header = ContainerHeader::new(manifest_bytes.len() as u64);

    let mut out =
        Vec::with_capacity(header.serialized_size() + manifest_bytes.len() + payload.len());
    header
        .write_to(&mut out)
        .map_err(|e| ContainerError::Encode(e.to_string()))?;
    out.extend_from_slice(&manifest_bytes);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Decode container bytes, validating the header and manifest
pub fn decode(bytes: &[u8]) -> Result<DecodedContainer<'_>, ContainerError> {
    if bytes.len() < MIN_HEADER_LEN {
        return Err(ContainerError::Truncated);
    }

    let mut cursor = Cursor::new(bytes);
    let header = ContainerHeader::read_from(&mut cursor)?;
    let rest = &bytes[cursor.position() as usize..];

    let manifest_len =
        usize::try_from(header.manifest_length).map_err(|_| ContainerError::Truncated)?;
    if manifest_len > rest.len() {
        return Err(ContainerError::Truncated);
    }
    let (manifest_bytes, payload) = rest.split_at(manifest_len);
    let manifest = Manifest::from_canonical_bytes(manifest_bytes)?;

    let declared = manifest.payload.length;
    let actual = payload.len() as u64;
    if actual < declared {
        return Err(ContainerError::Truncated);
    }
    if actual > declared {
        return Err(ContainerError::TrailingBytes { declared, actual });
    }

    Ok(DecodedContainer {
        header,
        manifest,
        payload,
    })
}
