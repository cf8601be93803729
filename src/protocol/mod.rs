//! Protocol Layer: schema, entry layout, wire header
//!
//! Prinsip desain:
//! - Flat Binary: field dibaca langsung dari bytes entry tanpa parsing
//! - Fixed-size headers: layout tiap kind bisa dihitung dari depan
//! - Schema = (kind, id): satu stream hanya menampung satu schema

mod containers;
mod message;
mod schema;
mod wire;

pub use containers::{InlineArray, ARRAY_HEADER_SIZE, SUB_STREAM_HEADER_SIZE};
pub use message::{
    ChunkedMessage, DynamicMessage, EntryMut, EntryRef, Message, StaticMessage,
    CHUNKED_HEADER_SIZE, DYNAMIC_HEADER_SIZE, ORDERED_HEADER_SIZE,
};
pub use schema::{MessageSchema, SchemaKind, ORDERED_SCHEMA_ID};
pub use wire::{StreamHeader, STREAM_HEADER_SIZE};
