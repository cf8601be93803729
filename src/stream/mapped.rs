//! Memory-mapped stream capture
//!
//! File berisi satu stream wire-encoded (header + body) di-mmap langsung:
//! - Zero-copy read: entry dibaca langsung dari page cache
//! - Read-only mapping: file tidak pernah diubah lewat mapping ini

use std::fs::File;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::error::{MessageError, Result};
use crate::protocol::{MessageSchema, StreamHeader, STREAM_HEADER_SIZE};

use super::read_only::{MessageSource, StreamSlice};

/// Stream read-only yang body-nya tinggal di file ter-mmap
pub struct MappedStream {
    mmap: Mmap,
    header: StreamHeader,
}

impl MappedStream {
    /// Buka dan validasi header sebuah capture file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| MessageError::from_io(e, format!("open {}", path.display())))?;

        let len = file
            .metadata()
            .map_err(|e| MessageError::from_io(e, format!("stat {}", path.display())))?
            .len();
        if len < STREAM_HEADER_SIZE as u64 {
            return Err(MessageError::truncated(0, STREAM_HEADER_SIZE, len as usize));
        }

        // SAFETY: mapping read-only; caller tidak boleh memotong file selama mapping hidup
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .map_err(|e| MessageError::from_io(e, format!("mmap {}", path.display())))?;

        let (header, _) = StreamHeader::decode(&mmap)?;
        tracing::debug!(
            path = %path.display(),
            schema = ?header.schema,
            count = header.count,
            "mapped stream capture"
        );

        Ok(Self { mmap, header })
    }

    /// Pinjam body sebagai slice
    #[inline(always)]
    pub fn as_slice(&self) -> StreamSlice<'_> {
        StreamSlice::new(
            self.header.schema,
            self.header.count,
            &self.mmap[STREAM_HEADER_SIZE..],
        )
    }
}

impl<'m> MessageSource for &'m MappedStream {
    fn schema(&self) -> Option<MessageSchema> {
        self.header.schema
    }

    fn count(&self) -> u32 {
        self.header.count
    }

    fn as_bytes(&self) -> &[u8] {
        &self.mmap[STREAM_HEADER_SIZE..]
    }
}
