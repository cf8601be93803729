//! Allocation request protocol untuk message dengan field variabel
//!
//! Alur `add_with(request)`:
//! 1. allocate `request.byte_size()` bytes (nol)
//! 2. `default_fields` → field variabel terbaca kosong
//! 3. `patch` → offset table pertama kali
//! 4. caller mengisi field
//! 5. `patch` lagi saat `PendingEntry` di-commit atau di-drop

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::protocol::{EntryMut, Message, StaticMessage};

/// Companion value yang menghitung ukuran entry sebuah message type
pub trait AllocationRequest {
    /// Message type yang dialokasikan
    type Target: Message;

    /// Ukuran payload total: bagian tetap + semua field variabel
    fn byte_size(&self) -> usize;

    /// Inisialisasi field variabel ke nilai "kosong".
    ///
    /// Memory baru selalu nol, jadi default-nya tidak melakukan apa-apa.
    fn default_fields(&self, _entry: &mut EntryMut<'_>) {}

    /// Perbaiki offset table yang bergantung pada layout final entry
    fn patch(&self, _entry: &mut EntryMut<'_>) {}

    /// Id yang ditulis ke header entry ordered
    #[inline(always)]
    fn id(&self) -> u32 {
        <Self::Target as Message>::ID
    }
}

/// Request untuk message fixed-size (tanpa field variabel)
pub struct FixedRequest<M>(PhantomData<fn() -> M>);

impl<M: StaticMessage> FixedRequest<M> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M: StaticMessage> Default for FixedRequest<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: StaticMessage> AllocationRequest for FixedRequest<M> {
    type Target = M;

    #[inline(always)]
    fn byte_size(&self) -> usize {
        M::BYTE_SIZE
    }
}

/// Entry yang sedang diisi; `patch` dijalankan saat commit atau drop
pub struct PendingEntry<'e, 'r, R: AllocationRequest> {
    entry: EntryMut<'e>,
    request: &'r R,
}

impl<'e, 'r, R: AllocationRequest> PendingEntry<'e, 'r, R> {
    pub(crate) fn new(mut entry: EntryMut<'e>, request: &'r R) -> Self {
        debug_assert_eq!(entry.len(), request.byte_size());
        request.default_fields(&mut entry);
        request.patch(&mut entry);
        Self { entry, request }
    }

    /// Selesaikan entry (sama dengan drop, tapi eksplisit di call site)
    pub fn commit(self) {}
}

impl<'e, 'r, R: AllocationRequest> Deref for PendingEntry<'e, 'r, R> {
    type Target = EntryMut<'e>;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

impl<'e, 'r, R: AllocationRequest> DerefMut for PendingEntry<'e, 'r, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entry
    }
}

impl<'e, 'r, R: AllocationRequest> Drop for PendingEntry<'e, 'r, R> {
    fn drop(&mut self) {
        self.request.patch(&mut self.entry);
    }
}
