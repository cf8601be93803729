//! msgstream - Schema-Tagged Zero-Copy Message Streams
//!
//! Arsitektur:
//! - Byte Storage: buffer growable, offset logis, little-endian fields
//! - Schema: `{kind, id}` dikunci sekali per stream
//! - Views: Static (O(1) index), Chunked, Dynamic, Ordered (multi-type)
//! - Enumerators: unchecked / checked / `Iterator`, hasil identik
//! - Single writer, lalu freeze ke `ReadOnlyMessageStream` untuk banyak reader
//!
//! ```ignore
//! let mut stream = MessageStream::new();
//! let mut view = StaticView::<_, Counter>::new(&mut stream)?;
//! view.add().write::<u32>(0, 42);
//!
//! let frozen = stream.into_read_only();
//! for counter in &StaticView::<_, Counter>::new(&frozen)? {
//!     println!("{}", counter.value());
//! }
//! ```

pub mod config;
pub mod core;
pub mod enumerator;
pub mod error;
pub mod protocol;
pub mod stream;
pub mod view;

pub use crate::config::StreamConfig;
pub use crate::error::{MessageError, Result};
pub use crate::protocol::{
    ChunkedMessage, DynamicMessage, EntryMut, EntryRef, Message, MessageSchema, SchemaKind,
    StaticMessage,
};
pub use crate::stream::{
    MappedStream, MessageSource, MessageStream, ReadOnlyMessageStream, StreamSlice,
};
pub use crate::view::{
    AllocationRequest, ChunkedEntry, ChunkedView, DynamicView, FixedRequest, OrderedDispatch,
    OrderedMessage, OrderedView, StaticView,
};
