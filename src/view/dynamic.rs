//! Dynamic view: entry dengan ukuran bebas, akses sekuensial
//!
//! ```text
//! [size u32][payload (size)][size u32][payload (size)]...
//! ```

use std::marker::PhantomData;

use crate::enumerator::{CheckedEnumerator, DynamicLayout, MessageIter, UncheckedEnumerator};
use crate::error::Result;
use crate::protocol::{DynamicMessage, EntryMut, DYNAMIC_HEADER_SIZE};
use crate::stream::{MessageSource, MessageStream};

use super::allocation::{AllocationRequest, PendingEntry};

/// View bertipe atas stream dynamic milik `M`
pub struct DynamicView<S, M> {
    source: S,
    _message: PhantomData<fn() -> M>,
}

impl<S: MessageSource, M: DynamicMessage> DynamicView<S, M> {
    pub fn new(mut source: S) -> Result<Self> {
        source.bind_schema(M::schema())?;
        Ok(Self {
            source,
            _message: PhantomData,
        })
    }

    #[inline(always)]
    pub fn count(&self) -> u32 {
        self.source.count()
    }

    pub fn iter(&self) -> MessageIter<'_, DynamicLayout<M>> {
        MessageIter::new(self.source.as_bytes(), self.source.count())
    }

    pub fn checked(&self) -> CheckedEnumerator<'_, DynamicLayout<M>> {
        CheckedEnumerator::new(self.source.as_bytes(), self.source.count())
    }

    /// # Safety
    /// Body harus berisi entry `{size, payload}` utuh
    pub unsafe fn unchecked(&self) -> UncheckedEnumerator<'_, DynamicLayout<M>> {
        UncheckedEnumerator::new(self.source.as_bytes())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<'s, M: DynamicMessage> DynamicView<&'s mut MessageStream, M> {
    /// Append entry dengan payload `byte_size` bytes (nol)
    pub fn add(&mut self, byte_size: usize) -> EntryMut<'_> {
        assert!(
            u32::try_from(byte_size).is_ok(),
            "dynamic entry of {} bytes exceeds u32 size prefix",
            byte_size
        );

        let offset = self.source.allocate_offset(DYNAMIC_HEADER_SIZE + byte_size);
        self.source
            .entry_mut(offset, DYNAMIC_HEADER_SIZE)
            .write::<u32>(0, byte_size as u32);
        self.source
            .entry_mut(offset + DYNAMIC_HEADER_SIZE, byte_size)
    }

    /// Append entry berukuran `request.byte_size()` lewat allocation request
    pub fn add_with<'r, R>(&mut self, request: &'r R) -> PendingEntry<'_, 'r, R>
    where
        R: AllocationRequest<Target = M>,
    {
        let entry = self.add(request.byte_size());
        PendingEntry::new(entry, request)
    }

    /// Append payload opaque apa adanya
    pub fn add_bytes(&mut self, payload: &[u8]) {
        self.add(payload.len())
            .bytes_mut(0, payload.len())
            .copy_from_slice(payload);
    }
}

impl<'v, S: MessageSource, M: DynamicMessage> IntoIterator for &'v DynamicView<S, M> {
    type Item = M::View<'v>;
    type IntoIter = MessageIter<'v, DynamicLayout<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
