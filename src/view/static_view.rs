//! Static view: entry fixed-size, random access O(1)
//!
//! ```text
//! [entry 0][entry 1]...[entry N-1]     offset(i) = i * BYTE_SIZE
//! ```

use std::marker::PhantomData;

use crate::enumerator::{CheckedEnumerator, MessageIter, StaticLayout, UncheckedEnumerator};
use crate::error::Result;
use crate::protocol::{EntryMut, EntryRef, StaticMessage};
use crate::stream::{MessageSource, MessageStream};

use super::allocation::{AllocationRequest, PendingEntry};

/// View bertipe atas stream static milik `M`
pub struct StaticView<S, M> {
    source: S,
    _message: PhantomData<fn() -> M>,
}

impl<S: MessageSource, M: StaticMessage> StaticView<S, M> {
    /// Ikat view ke stream; gagal bila stream milik schema lain
    pub fn new(mut source: S) -> Result<Self> {
        assert!(M::BYTE_SIZE > 0, "static message must have a non-zero size");
        source.bind_schema(M::schema())?;
        Ok(Self {
            source,
            _message: PhantomData,
        })
    }

    /// Jumlah entry, dihitung dari ukuran storage
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.source.as_bytes().len() / M::BYTE_SIZE
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry ke-`index`, tanpa scan entry sebelumnya
    #[inline(always)]
    pub fn entry_at(&self, index: usize) -> Option<M::View<'_>> {
        let start = index.checked_mul(M::BYTE_SIZE)?;
        let end = start.checked_add(M::BYTE_SIZE)?;
        let raw = self.source.as_bytes().get(start..end)?;
        Some(M::bind(EntryRef::new(raw)))
    }

    pub fn iter(&self) -> MessageIter<'_, StaticLayout<M>> {
        MessageIter::new(self.source.as_bytes(), self.source.count())
    }

    pub fn checked(&self) -> CheckedEnumerator<'_, StaticLayout<M>> {
        CheckedEnumerator::new(self.source.as_bytes(), self.source.count())
    }

    /// # Safety
    /// Panjang body harus kelipatan `M::BYTE_SIZE`
    pub unsafe fn unchecked(&self) -> UncheckedEnumerator<'_, StaticLayout<M>> {
        UncheckedEnumerator::new(self.source.as_bytes())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<'s, M: StaticMessage> StaticView<&'s mut MessageStream, M> {
    /// Append satu entry nol dan kembalikan handle tulisnya
    pub fn add(&mut self) -> EntryMut<'_> {
        self.source.allocate(M::BYTE_SIZE)
    }

    /// Append lewat allocation request (mis. `FixedRequest<M>`).
    ///
    /// # Panics
    /// Jika `request.byte_size()` bukan `M::BYTE_SIZE`
    pub fn add_with<'r, R>(&mut self, request: &'r R) -> PendingEntry<'_, 'r, R>
    where
        R: AllocationRequest<Target = M>,
    {
        assert_eq!(
            request.byte_size(),
            M::BYTE_SIZE,
            "static request size differs from the message size"
        );
        PendingEntry::new(self.add(), request)
    }
}

impl<'v, S: MessageSource, M: StaticMessage> IntoIterator for &'v StaticView<S, M> {
    type Item = M::View<'v>;
    type IntoIter = MessageIter<'v, StaticLayout<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
