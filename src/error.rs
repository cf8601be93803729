//! Error types untuk message streams
//!
//! Offset di luar batas storage BUKAN error di sini: itu bug library,
//! jadi storage dan entry handle langsung panic (fail fast).

use crate::protocol::MessageSchema;

/// Result type alias untuk operasi msgstream
pub type Result<T> = std::result::Result<T, MessageError>;

/// Semua error yang bisa dikembalikan ke caller
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Stream sudah punya schema lain
    #[error("schema mismatch: stream is {actual}, requested {expected}")]
    SchemaMismatch {
        expected: MessageSchema,
        actual: MessageSchema,
    },

    /// Header atau payload melewati akhir buffer
    #[error("truncated stream at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Entry mendeklarasikan ukuran lebih kecil dari header-nya sendiri
    #[error("malformed entry at offset {offset}: declared byte size {byte_size}")]
    MalformedEntry { offset: usize, byte_size: usize },

    /// Jumlah entry yang di-decode tidak sama dengan count stream
    #[error("count mismatch: stream declares {expected} entries, decoded {actual}")]
    CountMismatch { expected: u32, actual: u32 },

    /// Nilai schema kind tidak dikenal di wire header
    #[error("unknown schema kind {0}")]
    UnknownSchemaKind(u32),

    /// Inline string bukan UTF-8 valid
    #[error("inline string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    /// I/O saat memetakan file stream
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl MessageError {
    /// Bungkus std::io::Error dengan konteks
    pub fn from_io(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Error truncation untuk pembacaan `needed` bytes di `offset`
    pub(crate) fn truncated(offset: usize, needed: usize, len: usize) -> Self {
        Self::Truncated {
            offset,
            needed,
            available: len.saturating_sub(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SchemaKind;

    #[test]
    fn test_error_display() {
        let err = MessageError::SchemaMismatch {
            expected: MessageSchema::new(SchemaKind::Static, 1),
            actual: MessageSchema::new(SchemaKind::Dynamic, 2),
        };
        assert_eq!(
            err.to_string(),
            "schema mismatch: stream is Dynamic#2, requested Static#1"
        );

        let err = MessageError::truncated(10, 8, 12);
        assert_eq!(
            err.to_string(),
            "truncated stream at offset 10: need 8 bytes, 2 available"
        );
    }

    #[test]
    fn test_io_source_preserved() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MessageError::from_io(io, "open capture.bin");
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "I/O error: open capture.bin");
    }
}
