//! Framed-JSON bundle encoding and decoding
//!
//! Layout: one length-prefixed JSON header `{"fileCount": n}`, then per
//! entry a length-prefixed JSON metadata record
//! `{"fileName": …, "size": …, "digest": …}` immediately followed by
//! `size` raw payload bytes. Every length prefix is a 4-byte big-endian
//! u32, so each record self-describes its own boundaries with no cap on
//! metadata size.

use serde::{Deserialize, Serialize};

use stowage_core::error::{StowageError, StowageResult};
use stowage_core::hash;

/// One named payload inside a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Logical file name, restored verbatim on decode
    pub name: String,
    /// Raw payload bytes
    pub bytes: Vec<u8>,
}

impl Entry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveHeader {
    #[serde(rename = "fileCount")]
    file_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    #[serde(rename = "fileName")]
    file_name: String,
    size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

/// Encode a list of named payloads into one opaque blob.
///
/// Entries keep their order; each metadata record carries the payload's
/// SHA-1 digest so `decode` can detect corruption.
pub fn encode(entries: &[Entry]) -> StowageResult<Vec<u8>> {
    let header = ArchiveHeader {
        file_count: u32::try_from(entries.len()).map_err(|_| StowageError::ArchiveFormat {
            message: format!("too many entries to encode: {}", entries.len()),
        })?,
    };

    let mut out = Vec::new();
    write_json(&mut out, &header)?;

    for entry in entries {
        let meta = EntryMeta {
            file_name: entry.name.clone(),
            size: entry.bytes.len() as u64,
            digest: Some(hash::digest(&entry.bytes)),
        };
        write_json(&mut out, &meta)?;
        out.extend_from_slice(&entry.bytes);
    }

    Ok(out)
}

/// Decode a blob produced by [`encode`] back into its named payloads.
///
/// Fails with `ArchiveFormat` on truncated input, malformed metadata, or a
/// payload whose digest no longer matches its metadata record.
pub fn decode(blob: &[u8]) -> StowageResult<Vec<Entry>> {
    let mut cursor = Cursor::new(blob);
    let header: ArchiveHeader = cursor.read_json("archive header")?;

    // The header is untrusted input; every entry needs at least a 4-byte
    // metadata prefix, so an honest count is bounded by the bytes that
    // remain. A forged count fails on its first entry read.
    let capacity_hint = (header.file_count as usize).min(cursor.remaining() / 4);
    let mut entries = Vec::with_capacity(capacity_hint);
    for index in 0..header.file_count {
        let meta: EntryMeta = cursor.read_json("entry metadata")?;
        let size = usize::try_from(meta.size).map_err(|_| StowageError::ArchiveFormat {
            message: format!("entry {} declares an unaddressable size {}", index, meta.size),
        })?;
        let payload = cursor.read_bytes(size, &meta.file_name)?;

        if let Some(expected) = &meta.digest {
            if !hash::verify(payload, expected) {
                return Err(StowageError::ArchiveFormat {
                    message: format!("digest mismatch for entry '{}'", meta.file_name),
                });
            }
        }

        entries.push(Entry {
            name: meta.file_name,
            bytes: payload.to_vec(),
        });
    }

    if !cursor.is_empty() {
        return Err(StowageError::ArchiveFormat {
            message: format!("{} trailing bytes after the last entry", cursor.remaining()),
        });
    }

    Ok(entries)
}

fn write_json<T: Serialize>(out: &mut Vec<u8>, value: &T) -> StowageResult<()> {
    let json = serde_json::to_vec(value).map_err(|e| StowageError::ArchiveFormat {
        message: format!("failed to serialize metadata: {}", e),
    })?;
    let len = u32::try_from(json.len()).map_err(|_| StowageError::ArchiveFormat {
        message: format!("metadata record of {} bytes exceeds the frame limit", json.len()),
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&json);
    Ok(())
}

/// Forward-only reader over the blob being decoded
struct Cursor<'a> {
    blob: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(blob: &'a [u8]) -> Self {
        Self { blob, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.blob.len() - self.offset
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read_bytes(&mut self, len: usize, what: &str) -> StowageResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(StowageError::ArchiveFormat {
                message: format!(
                    "truncated archive: '{}' needs {} bytes, {} remain",
                    what,
                    len,
                    self.remaining()
                ),
            });
        }
        let slice = &self.blob[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&mut self, what: &str) -> StowageResult<T> {
        let prefix = self.read_bytes(4, what)?;
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let json = self.read_bytes(len, what)?;
        serde_json::from_slice(json).map_err(|e| StowageError::ArchiveFormat {
            message: format!("malformed {}: {}", what, e),
        })
    }
}
