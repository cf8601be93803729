//! View layer: akses bertipe ke stream per layout kind
//!
//! Setiap view mengikat schema ke stream saat dibuat (`new`), lalu:
//! - Writable stream (`&mut MessageStream`): `add*` untuk append entry
//! - Sumber apa pun (`MessageSource`): `iter`, `checked`, `unchecked`

mod allocation;
mod chunked;
mod dynamic;
mod ordered;
mod static_view;

pub use allocation::{AllocationRequest, FixedRequest, PendingEntry};
pub use chunked::{ChunkedEntry, ChunkedEntryMut, ChunkedView};
pub use dynamic::DynamicView;
pub use ordered::{OrderedDispatch, OrderedMessage, OrderedView};
pub use static_view::StaticView;
