//! Wire header sebuah stream
//!
//! Layout (little-endian):
//! ┌──────────┬──────────┬───────────┬──────────────────────┐
//! │ kind u8  │ id u32   │ count u32 │ entries (per layout) │
//! └──────────┴──────────┴───────────┴──────────────────────┘
//!
//! Kind 0 = schema belum di-set (stream kosong).

use crate::core::Scalar;
use crate::error::{MessageError, Result};

use super::schema::{MessageSchema, SchemaKind};

/// Ukuran header stream dalam bytes
pub const STREAM_HEADER_SIZE: usize = 9;

/// Header stream yang sudah di-decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub schema: Option<MessageSchema>,
    pub count: u32,
}

impl StreamHeader {
    /// Append header ke `out`
    pub fn encode(&self, out: &mut Vec<u8>) {
        let mut raw = [0u8; STREAM_HEADER_SIZE];
        let (kind, id) = match self.schema {
            Some(schema) => (schema.kind as u8, schema.id),
            None => (0, 0),
        };
        raw[0] = kind;
        id.write_le(&mut raw[1..5]);
        self.count.write_le(&mut raw[5..9]);
        out.extend_from_slice(&raw);
    }

    /// Decode header dari awal `bytes`, return header + sisa body
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        if bytes.len() < STREAM_HEADER_SIZE {
            return Err(MessageError::truncated(0, STREAM_HEADER_SIZE, bytes.len()));
        }

        let kind = bytes[0];
        let id = u32::read_le(&bytes[1..5]);
        let count = u32::read_le(&bytes[5..9]);

        let schema = match kind {
            0 => None,
            raw => {
                let kind = SchemaKind::from_u32(u32::from(raw))
                    .ok_or(MessageError::UnknownSchemaKind(u32::from(raw)))?;
                Some(MessageSchema::new(kind, id))
            }
        };

        Ok((Self { schema, count }, &bytes[STREAM_HEADER_SIZE..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = StreamHeader {
            schema: Some(MessageSchema::new(SchemaKind::Dynamic, 0x0102_0304)),
            count: 3,
        };
        let mut out = Vec::new();
        header.encode(&mut out);

        assert_eq!(out, [2, 4, 3, 2, 1, 3, 0, 0, 0]);

        let (decoded, body) = StreamHeader::decode(&out).unwrap();
        assert_eq!(decoded, header);
        assert!(body.is_empty());
    }

    #[test]
    fn test_unset_schema() {
        let mut out = Vec::new();
        StreamHeader { schema: None, count: 0 }.encode(&mut out);
        let (decoded, _) = StreamHeader::decode(&out).unwrap();
        assert_eq!(decoded.schema, None);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            StreamHeader::decode(&[1, 0, 0]),
            Err(MessageError::Truncated { needed: 9, available: 3, .. })
        ));
        assert!(matches!(
            StreamHeader::decode(&[9, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(MessageError::UnknownSchemaKind(9))
        ));
    }
}
