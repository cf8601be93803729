//! Stream layer: writable streams, frozen snapshots, borrowed slices
//!
//! Single writer, multi reader:
//! - Writer mengisi `MessageStream` di satu thread
//! - `to_read_only()` / `into_read_only()` membekukan isinya
//! - Hanya `ReadOnlyMessageStream` yang dibagi antar thread

mod mapped;
mod read_only;
mod writable;

pub use mapped::MappedStream;
pub use read_only::{MessageSource, ReadOnlyMessageStream, StreamSlice};
pub use writable::MessageStream;
