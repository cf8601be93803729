//! Read-only message streams
//!
//! Prinsip desain:
//! - Copy-on-freeze: read-only stream selalu MEMILIKI bytes-nya (Arc),
//!   jadi writer asal boleh terus menulis dan reader tidak butuh lock.
//! - Immutable: count dan schema tetap sejak konstruksi.
//! - `StreamSlice` adalah versi pinjaman untuk sub-stream inline dan
//!   file yang di-mmap (zero-copy).

use std::sync::Arc;

use crate::error::{MessageError, Result};
use crate::protocol::{Message, MessageSchema, StreamHeader};

/// Sumber bytes yang bisa dibaca oleh message views
pub trait MessageSource {
    /// Schema stream, `None` bila belum pernah di-set
    fn schema(&self) -> Option<MessageSchema>;

    /// Jumlah entry
    fn count(&self) -> u32;

    /// Seluruh body stream
    fn as_bytes(&self) -> &[u8];

    /// Validasi (atau set, untuk writable stream) schema sebuah view
    fn bind_schema(&mut self, schema: MessageSchema) -> Result<()> {
        match self.schema() {
            Some(actual) if actual != schema => Err(MessageError::SchemaMismatch {
                expected: schema,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

/// Snapshot immutable sebuah stream, murah di-clone dan aman dibagi antar thread
#[derive(Debug, Clone)]
pub struct ReadOnlyMessageStream {
    bytes: Arc<[u8]>,
    schema: Option<MessageSchema>,
    count: u32,
    version_id: u32,
}

impl ReadOnlyMessageStream {
    pub(crate) fn from_parts(
        schema: Option<MessageSchema>,
        count: u32,
        version_id: u32,
        bytes: Arc<[u8]>,
    ) -> Self {
        Self {
            bytes,
            schema,
            count,
            version_id,
        }
    }

    /// Bangun dari bytes eksternal (body saja, tanpa wire header)
    pub fn from_bytes(schema: MessageSchema, count: u32, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::from_parts(Some(schema), count, 0, bytes.into())
    }

    /// Decode stream lengkap dengan wire header
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        Ok(StreamSlice::from_wire(bytes)?.to_read_only())
    }

    /// Encode header + body ke buffer baru
    pub fn to_wire(&self) -> Vec<u8> {
        self.as_slice().to_wire()
    }

    /// Pinjam sebagai slice
    #[inline(always)]
    pub fn as_slice(&self) -> StreamSlice<'_> {
        StreamSlice::new(self.schema, self.count, &self.bytes)
    }

    #[inline(always)]
    pub fn schema(&self) -> Option<MessageSchema> {
        self.schema
    }

    #[inline(always)]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline(always)]
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn version_id(&self) -> u32 {
        self.version_id
    }

    pub fn is<M: Message>(&self) -> bool {
        self.schema == Some(M::schema())
    }

    pub fn is_or_empty<M: Message>(&self) -> bool {
        self.count == 0 || self.is::<M>()
    }
}

/// Stream pinjaman: `{schema, count, bytes}` tanpa kepemilikan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSlice<'a> {
    schema: Option<MessageSchema>,
    count: u32,
    bytes: &'a [u8],
}

impl<'a> StreamSlice<'a> {
    #[inline(always)]
    pub fn new(schema: Option<MessageSchema>, count: u32, bytes: &'a [u8]) -> Self {
        Self {
            schema,
            count,
            bytes,
        }
    }

    /// Decode wire header; body tetap dipinjam dari `bytes`
    pub fn from_wire(bytes: &'a [u8]) -> Result<Self> {
        let (header, body) = StreamHeader::decode(bytes)?;
        tracing::debug!(
            schema = ?header.schema,
            count = header.count,
            bytes = body.len(),
            "decoded stream header"
        );
        Ok(Self::new(header.schema, header.count, body))
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(crate::protocol::STREAM_HEADER_SIZE + self.bytes.len());
        StreamHeader {
            schema: self.schema,
            count: self.count,
        }
        .encode(&mut out);
        out.extend_from_slice(self.bytes);
        out
    }

    /// Salin menjadi read-only stream yang berdiri sendiri
    pub fn to_read_only(&self) -> ReadOnlyMessageStream {
        ReadOnlyMessageStream::from_parts(self.schema, self.count, 0, Arc::from(self.bytes))
    }

    #[inline(always)]
    pub fn schema(&self) -> Option<MessageSchema> {
        self.schema
    }

    #[inline(always)]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<'a> MessageSource for StreamSlice<'a> {
    fn schema(&self) -> Option<MessageSchema> {
        self.schema
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn as_bytes(&self) -> &[u8] {
        self.bytes
    }
}

impl MessageSource for ReadOnlyMessageStream {
    fn schema(&self) -> Option<MessageSchema> {
        self.schema
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<'s> MessageSource for &'s ReadOnlyMessageStream {
    fn schema(&self) -> Option<MessageSchema> {
        self.schema
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SchemaKind;

    fn sample() -> ReadOnlyMessageStream {
        let schema = MessageSchema::new(SchemaKind::Static, 3);
        ReadOnlyMessageStream::from_bytes(schema, 2, vec![1u8, 0, 2, 0])
    }

    #[test]
    fn test_wire_roundtrip() {
        let stream = sample();
        let wire = stream.to_wire();
        assert_eq!(wire.len(), 9 + 4);

        let decoded = ReadOnlyMessageStream::from_wire(&wire).unwrap();
        assert_eq!(decoded.schema(), stream.schema());
        assert_eq!(decoded.count(), 2);
        assert_eq!(decoded.as_bytes(), stream.as_bytes());
    }

    #[test]
    fn test_slice_borrows_body() {
        let stream = sample();
        let wire = stream.to_wire();
        let slice = StreamSlice::from_wire(&wire).unwrap();
        assert_eq!(slice.as_bytes().as_ptr(), wire[9..].as_ptr());
    }

    #[test]
    fn test_bind_schema_rejects_foreign_view() {
        let mut stream = sample();
        assert!(stream
            .bind_schema(MessageSchema::new(SchemaKind::Static, 3))
            .is_ok());
        assert!(matches!(
            stream.bind_schema(MessageSchema::new(SchemaKind::Dynamic, 3)),
            Err(MessageError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_clone_shares_buffer_across_threads() {
        let stream = sample();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stream = stream.clone();
                std::thread::spawn(move || stream.as_bytes().iter().map(|&b| b as u32).sum::<u32>())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
    }
}
