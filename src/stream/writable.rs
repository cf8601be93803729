//! Writable message stream
//!
//! Satu owner, count naik monoton setiap alokasi. Setelah selesai diisi,
//! stream dibekukan menjadi `ReadOnlyMessageStream` untuk dibagi ke reader.

use std::sync::Arc;

use crate::config::StreamConfig;
use crate::core::ByteStorage;
use crate::error::{MessageError, Result};
use crate::protocol::{EntryMut, Message, MessageSchema};

use super::read_only::{MessageSource, ReadOnlyMessageStream};

/// Stream yang bisa ditulisi
#[derive(Debug, Clone, Default)]
pub struct MessageStream {
    storage: ByteStorage,
    schema: Option<MessageSchema>,
    count: u32,
    version_id: u32,
}

impl MessageStream {
    /// Stream kosong tanpa schema
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            storage: ByteStorage::with_config(config),
            schema: None,
            count: 0,
            version_id: 0,
        }
    }

    /// Stream kosong dengan schema yang sudah terkunci (config default)
    pub fn with_schema(schema: MessageSchema) -> Self {
        Self::with_schema_and_config(schema, StreamConfig::default())
    }

    pub fn with_schema_and_config(schema: MessageSchema, config: StreamConfig) -> Self {
        Self {
            schema: Some(schema),
            ..Self::with_config(config)
        }
    }

    /// Set schema bila belum ada; bila sudah ada harus sama.
    pub fn get_or_set_schema(&mut self, schema: MessageSchema) -> Result<MessageSchema> {
        match self.schema {
            Some(current) if current != schema => Err(MessageError::SchemaMismatch {
                expected: schema,
                actual: current,
            }),
            Some(current) => Ok(current),
            None => {
                tracing::debug!(%schema, "binding stream schema");
                self.schema = Some(schema);
                Ok(schema)
            }
        }
    }

    /// Append `byte_size` bytes nol sebagai satu entry baru.
    ///
    /// Handle yang dikembalikan invalid setelah alokasi berikutnya.
    pub fn allocate(&mut self, byte_size: usize) -> EntryMut<'_> {
        let offset = self.allocate_offset(byte_size);
        EntryMut::new(self.storage.bytes_mut(offset, byte_size))
    }

    /// Seperti `allocate`, tapi hanya mengembalikan offset logis
    pub(crate) fn allocate_offset(&mut self, byte_size: usize) -> usize {
        let offset = self.storage.allocate(byte_size);
        self.count += 1;
        offset
    }

    pub(crate) fn entry_mut(&mut self, offset: usize, byte_size: usize) -> EntryMut<'_> {
        EntryMut::new(self.storage.bytes_mut(offset, byte_size))
    }

    #[inline(always)]
    pub fn schema(&self) -> Option<MessageSchema> {
        self.schema
    }

    /// Apakah stream ini menampung `M`
    pub fn is<M: Message>(&self) -> bool {
        self.schema == Some(M::schema())
    }

    /// Apakah stream ini menampung `M`, atau masih kosong
    pub fn is_or_empty<M: Message>(&self) -> bool {
        self.count == 0 || self.is::<M>()
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
        self.storage.len()
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_bytes()
    }

    pub fn storage(&self) -> &ByteStorage {
        &self.storage
    }

    pub fn version_id(&self) -> u32 {
        self.version_id
    }

    pub fn set_version_id(&mut self, version_id: u32) {
        self.version_id = version_id;
    }

    /// Hapus semua entry, schema tetap
    pub fn clear(&mut self) {
        self.storage.clear();
        self.count = 0;
    }

    /// Tukar isi dengan stream lain; schema harus cocok atau diwarisi
    pub fn swap(&mut self, other: &mut MessageStream) -> Result<()> {
        if let Some(schema) = other.schema {
            self.get_or_set_schema(schema)?;
        }
        if other.schema.is_none() {
            other.schema = self.schema;
        }

        std::mem::swap(&mut self.storage, &mut other.storage);
        std::mem::swap(&mut self.count, &mut other.count);
        Ok(())
    }

    /// Bekukan dengan menyalin bytes; stream ini tetap bisa ditulisi
    pub fn to_read_only(&self) -> ReadOnlyMessageStream {
        tracing::debug!(
            count = self.count,
            bytes = self.storage.len(),
            "freezing message stream (copy)"
        );
        ReadOnlyMessageStream::from_parts(
            self.schema,
            self.count,
            self.version_id,
            Arc::from(self.storage.as_bytes()),
        )
    }

    /// Bekukan tanpa menyalin; stream ini dikonsumsi
    pub fn into_read_only(self) -> ReadOnlyMessageStream {
        tracing::debug!(
            count = self.count,
            bytes = self.storage.len(),
            "freezing message stream (move)"
        );
        ReadOnlyMessageStream::from_parts(
            self.schema,
            self.count,
            self.version_id,
            Arc::from(self.storage.into_vec()),
        )
    }
}

impl<'s> MessageSource for &'s MessageStream {
    fn schema(&self) -> Option<MessageSchema> {
        self.schema
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn as_bytes(&self) -> &[u8] {
        self.storage.as_bytes()
    }
}

impl<'s> MessageSource for &'s mut MessageStream {
    fn schema(&self) -> Option<MessageSchema> {
        self.schema
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn as_bytes(&self) -> &[u8] {
        self.storage.as_bytes()
    }

    /// Writable stream mengadopsi schema view pertama yang mengikatnya
    fn bind_schema(&mut self, schema: MessageSchema) -> Result<()> {
        self.get_or_set_schema(schema).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SchemaKind;

    #[test]
    fn test_schema_set_once() {
        let mut stream = MessageStream::new();
        let schema = MessageSchema::new(SchemaKind::Static, 1);

        assert_eq!(stream.get_or_set_schema(schema).unwrap(), schema);
        assert_eq!(stream.get_or_set_schema(schema).unwrap(), schema);

        let other = MessageSchema::new(SchemaKind::Dynamic, 1);
        match stream.get_or_set_schema(other) {
            Err(MessageError::SchemaMismatch { expected, actual }) => {
                assert_eq!(expected, other);
                assert_eq!(actual, schema);
            }
            result => panic!("unexpected result: {:?}", result),
        }
        assert_eq!(stream.schema(), Some(schema));
    }

    #[test]
    fn test_allocate_counts_entries() {
        let mut stream = MessageStream::new();
        stream.allocate(4).write::<u32>(0, 7);
        stream.allocate(2);

        assert_eq!(stream.count(), 2);
        assert_eq!(stream.byte_size(), 6);
        assert_eq!(&stream.as_bytes()[..4], &7u32.to_le_bytes());
    }

    #[test]
    fn test_clear_keeps_schema() {
        let schema = MessageSchema::new(SchemaKind::Static, 2);
        let mut stream = MessageStream::with_schema(schema);
        stream.allocate(8);
        stream.clear();

        assert!(stream.is_empty());
        assert_eq!(stream.byte_size(), 0);
        assert_eq!(stream.schema(), Some(schema));
    }

    #[test]
    fn test_swap_inherits_schema() {
        let schema = MessageSchema::new(SchemaKind::Static, 2);
        let mut source = MessageStream::with_schema(schema);
        source.allocate(4);

        let mut target = MessageStream::new();
        target.swap(&mut source).unwrap();

        assert_eq!(target.schema(), Some(schema));
        assert_eq!(target.count(), 1);
        assert_eq!(source.count(), 0);

        let mut foreign = MessageStream::with_schema(MessageSchema::new(SchemaKind::Dynamic, 9));
        assert!(target.swap(&mut foreign).is_err());
        assert_eq!(target.count(), 1);
    }

    #[test]
    fn test_copy_freeze_keeps_writer_usable() {
        let mut stream = MessageStream::with_schema(MessageSchema::new(SchemaKind::Static, 1));
        stream.set_version_id(4);
        stream.allocate(4).write::<u32>(0, 1);

        let frozen = stream.to_read_only();
        stream.allocate(4).write::<u32>(0, 2);

        assert_eq!(frozen.count(), 1);
        assert_eq!(frozen.as_bytes(), &1u32.to_le_bytes());
        assert_eq!(frozen.version_id(), 4);
        assert_eq!(stream.count(), 2);
    }

    #[test]
    fn test_schema_with_custom_config() {
        let schema = MessageSchema::new(SchemaKind::Static, 3);
        let config = StreamConfig::default().with_initial_capacity(1024);
        let mut stream = MessageStream::with_schema_and_config(schema, config);

        assert_eq!(stream.schema(), Some(schema));
        assert!(stream.storage().capacity() >= 1024);
        assert!(stream.get_or_set_schema(MessageSchema::new(SchemaKind::Static, 4)).is_err());
    }
}
