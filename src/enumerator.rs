//! Enumerator tiers: unchecked, checked, native iterator
//!
//! Prinsip desain:
//! - Satu decoder per layout (`EntryLayout`), dipakai ulang oleh ketiga tier
//! - `UncheckedEnumerator`: zero-overhead, hanya debug assertions
//! - `CheckedEnumerator`: validasi tiap header lalu delegasi ke unchecked
//! - `MessageIter`: `Iterator` standar di atas tier checked
//!
//! Hasil ketiga tier identik untuk stream yang valid; tier checked hanya
//! menambah pemeriksaan.

use std::marker::PhantomData;

use crate::core::read_u32_unchecked;
use crate::error::{MessageError, Result};
use crate::protocol::{
    ChunkedMessage, DynamicMessage, EntryRef, StaticMessage, CHUNKED_HEADER_SIZE,
    DYNAMIC_HEADER_SIZE, ORDERED_HEADER_SIZE,
};
use crate::view::OrderedMessage;

/// Cara membaca satu jenis layout entry
pub trait EntryLayout {
    /// Hasil decode satu entry
    type Item<'a>;

    /// Bytes yang harus ada sebelum ukuran entry bisa diketahui
    const HEADER_SIZE: usize;

    /// Ukuran total entry (header + payload) yang dimulai di `offset`.
    ///
    /// # Safety
    /// `offset + HEADER_SIZE <= bytes.len()`
    unsafe fn entry_size(bytes: &[u8], offset: usize) -> usize;

    /// Validasi tambahan atas entry utuh (dipakai tier checked)
    #[inline(always)]
    fn validate(_entry: &[u8]) -> bool {
        true
    }

    /// Bungkus bytes entry utuh menjadi item
    fn decode<'a>(entry: &'a [u8]) -> Self::Item<'a>;
}

/// Layout static: `BYTE_SIZE` bytes per entry, tanpa header
pub struct StaticLayout<M>(PhantomData<fn() -> M>);

impl<M: StaticMessage> EntryLayout for StaticLayout<M> {
    type Item<'a> = M::View<'a>;
    const HEADER_SIZE: usize = 0;

    #[inline(always)]
    unsafe fn entry_size(_bytes: &[u8], _offset: usize) -> usize {
        M::BYTE_SIZE
    }

    #[inline(always)]
    fn decode<'a>(entry: &'a [u8]) -> Self::Item<'a> {
        M::bind(EntryRef::new(entry))
    }
}

/// Layout chunked: `{declared_byte_size, mask, base, chunks}`
pub struct ChunkedLayout<M>(PhantomData<fn() -> M>);

impl<M: ChunkedMessage> EntryLayout for ChunkedLayout<M> {
    type Item<'a> = M::View<'a>;
    const HEADER_SIZE: usize = CHUNKED_HEADER_SIZE;

    #[inline(always)]
    unsafe fn entry_size(bytes: &[u8], offset: usize) -> usize {
        read_u32_unchecked(bytes, offset) as usize
    }

    fn validate(entry: &[u8]) -> bool {
        let mask = u32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]);
        let declared = M::CHUNK_SIZES.len() as u32;
        mask.checked_shr(declared).unwrap_or(0) == 0 && M::runtime_byte_size(mask) == entry.len()
    }

    #[inline(always)]
    fn decode<'a>(entry: &'a [u8]) -> Self::Item<'a> {
        M::bind(EntryRef::new(entry))
    }
}

/// Layout dynamic: `{byte_size, payload}`
pub struct DynamicLayout<M>(PhantomData<fn() -> M>);

impl<M: DynamicMessage> EntryLayout for DynamicLayout<M> {
    type Item<'a> = M::View<'a>;
    const HEADER_SIZE: usize = DYNAMIC_HEADER_SIZE;

    #[inline(always)]
    unsafe fn entry_size(bytes: &[u8], offset: usize) -> usize {
        DYNAMIC_HEADER_SIZE.saturating_add(read_u32_unchecked(bytes, offset) as usize)
    }

    #[inline(always)]
    fn decode<'a>(entry: &'a [u8]) -> Self::Item<'a> {
        M::bind(EntryRef::new(&entry[DYNAMIC_HEADER_SIZE..]))
    }
}

/// Layout ordered: `{id, byte_size, payload}`
pub struct OrderedLayout;

impl EntryLayout for OrderedLayout {
    type Item<'a> = OrderedMessage<'a>;
    const HEADER_SIZE: usize = ORDERED_HEADER_SIZE;

    #[inline(always)]
    unsafe fn entry_size(bytes: &[u8], offset: usize) -> usize {
        ORDERED_HEADER_SIZE.saturating_add(read_u32_unchecked(bytes, offset + 4) as usize)
    }

    #[inline(always)]
    fn decode<'a>(entry: &'a [u8]) -> Self::Item<'a> {
        let id = u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]);
        OrderedMessage::new(id, EntryRef::new(&entry[ORDERED_HEADER_SIZE..]))
    }
}

/// Tier tercepat: tidak ada bounds check di release build
pub struct UncheckedEnumerator<'a, L> {
    bytes: &'a [u8],
    offset: usize,
    _layout: PhantomData<fn() -> L>,
}

impl<'a, L: EntryLayout> UncheckedEnumerator<'a, L> {
    /// # Safety
    /// `bytes` harus berisi rangkaian entry utuh dengan layout `L`, mis.
    /// body stream yang ditulis lewat view crate ini dan tidak diubah sejak itu.
    #[inline(always)]
    pub unsafe fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            _layout: PhantomData,
        }
    }

    /// Decode entry berikutnya
    #[inline(always)]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<L::Item<'a>> {
        if self.offset >= self.bytes.len() {
            return None;
        }

        debug_assert!(self.offset + L::HEADER_SIZE <= self.bytes.len());
        // SAFETY: dijamin kontrak `new`
        let size = unsafe { L::entry_size(self.bytes, self.offset) };
        debug_assert!(size >= L::HEADER_SIZE && size > 0);
        debug_assert!(self.offset + size <= self.bytes.len());

        // SAFETY: dijamin kontrak `new`
        let entry = unsafe { self.bytes.get_unchecked(self.offset..self.offset + size) };
        self.offset += size;
        Some(L::decode(entry))
    }

    /// Offset entry berikutnya
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }
}

/// Tier checked: header tiap entry divalidasi sebelum didecode
pub struct CheckedEnumerator<'a, L> {
    inner: UncheckedEnumerator<'a, L>,
    bytes: &'a [u8],
    expected: u32,
    decoded: u32,
    failed: bool,
}

impl<'a, L: EntryLayout> CheckedEnumerator<'a, L> {
    /// `expected_count` = count yang dideklarasikan stream
    pub fn new(bytes: &'a [u8], expected_count: u32) -> Self {
        Self {
            // SAFETY: setiap entry divalidasi di `validate_next` sebelum
            // `inner.next()` menyentuhnya
            inner: unsafe { UncheckedEnumerator::new(bytes) },
            bytes,
            expected: expected_count,
            decoded: 0,
            failed: false,
        }
    }

    /// Entry berikutnya, `Ok(None)` di akhir stream.
    ///
    /// Setelah error pertama, semua panggilan berikutnya `Ok(None)`.
    pub fn next_checked(&mut self) -> Result<Option<L::Item<'a>>> {
        if self.failed {
            return Ok(None);
        }

        match self.validate_next() {
            Ok(true) => {
                self.decoded += 1;
                Ok(self.inner.next())
            }
            Ok(false) => Ok(None),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    /// Cek entry di posisi `inner` tanpa maju; `false` = akhir stream
    fn validate_next(&self) -> Result<bool> {
        let offset = self.inner.offset();
        let available = self.bytes.len().saturating_sub(offset);

        if available == 0 {
            if self.decoded != self.expected {
                return Err(MessageError::CountMismatch {
                    expected: self.expected,
                    actual: self.decoded,
                });
            }
            return Ok(false);
        }

        // Bytes tersisa padahal count sudah tercapai
        if self.decoded == self.expected {
            return Err(MessageError::CountMismatch {
                expected: self.expected,
                actual: self.decoded.saturating_add(1),
            });
        }

        if available < L::HEADER_SIZE {
            return Err(MessageError::truncated(offset, L::HEADER_SIZE, self.bytes.len()));
        }

        // SAFETY: header lengkap sudah dicek di atas
        let size = unsafe { L::entry_size(self.bytes, offset) };
        if size < L::HEADER_SIZE || size == 0 {
            return Err(MessageError::MalformedEntry {
                offset,
                byte_size: size,
            });
        }
        if size > available {
            return Err(MessageError::truncated(offset, size, self.bytes.len()));
        }
        if !L::validate(&self.bytes[offset..offset + size]) {
            return Err(MessageError::MalformedEntry {
                offset,
                byte_size: size,
            });
        }

        Ok(true)
    }

    /// Jumlah entry yang sudah didecode
    pub fn decoded(&self) -> u32 {
        self.decoded
    }
}

/// Tier native: `Iterator` di atas tier checked.
///
/// Stream rusak menghentikan iterasi (dengan `warn!`); error lengkapnya
/// tersedia lewat `CheckedEnumerator`.
pub struct MessageIter<'a, L> {
    inner: CheckedEnumerator<'a, L>,
}

impl<'a, L: EntryLayout> MessageIter<'a, L> {
    pub fn new(bytes: &'a [u8], expected_count: u32) -> Self {
        Self {
            inner: CheckedEnumerator::new(bytes, expected_count),
        }
    }
}

impl<'a, L: EntryLayout> Iterator for MessageIter<'a, L> {
    type Item = L::Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next_checked() {
            Ok(item) => item,
            Err(error) => {
                tracing::warn!(
                    %error,
                    decoded = self.inner.decoded(),
                    "stopping iteration over malformed stream"
                );
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.inner.expected.saturating_sub(self.inner.decoded) as usize;
        (0, Some(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Message, SchemaKind};

    struct Blob;

    impl Message for Blob {
        const ID: u32 = 1;
        const KIND: SchemaKind = SchemaKind::Dynamic;
        type View<'a> = &'a [u8];

        fn bind<'a>(entry: EntryRef<'a>) -> Self::View<'a> {
            entry.as_bytes()
        }
    }

    impl DynamicMessage for Blob {}

    fn encode(payloads: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for payload in payloads {
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    #[test]
    fn test_tiers_agree_on_valid_stream() {
        let bytes = encode(&[b"ab", b"", b"xyz"]);

        let mut unchecked = unsafe { UncheckedEnumerator::<DynamicLayout<Blob>>::new(&bytes) };
        let mut fast = Vec::new();
        while let Some(item) = unchecked.next() {
            fast.push(item);
        }

        let mut checked = CheckedEnumerator::<DynamicLayout<Blob>>::new(&bytes, 3);
        let mut guarded = Vec::new();
        while let Some(item) = checked.next_checked().unwrap() {
            guarded.push(item);
        }

        let native: Vec<_> = MessageIter::<DynamicLayout<Blob>>::new(&bytes, 3).collect();

        assert_eq!(fast, vec![&b"ab"[..], &b""[..], &b"xyz"[..]]);
        assert_eq!(fast, guarded);
        assert_eq!(fast, native);
        assert_eq!(unchecked.remaining(), 0);
    }

    #[test]
    fn test_truncated_payload_detected() {
        let mut bytes = encode(&[b"ab", b"xyz"]);
        bytes.pop();

        let mut checked = CheckedEnumerator::<DynamicLayout<Blob>>::new(&bytes, 2);
        assert_eq!(checked.next_checked().unwrap(), Some(&b"ab"[..]));
        match checked.next_checked() {
            Err(MessageError::Truncated {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 6);
                assert_eq!(needed, 7);
                assert_eq!(available, 6);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // Setelah gagal, enumerator berhenti
        assert_eq!(checked.next_checked().unwrap(), None);
    }

    #[test]
    fn test_count_mismatch_detected() {
        let bytes = encode(&[b"ab"]);

        let mut short = CheckedEnumerator::<DynamicLayout<Blob>>::new(&bytes, 2);
        assert!(short.next_checked().unwrap().is_some());
        assert!(matches!(
            short.next_checked(),
            Err(MessageError::CountMismatch {
                expected: 2,
                actual: 1
            })
        ));

        let mut long = CheckedEnumerator::<DynamicLayout<Blob>>::new(&bytes, 0);
        assert!(matches!(
            long.next_checked(),
            Err(MessageError::CountMismatch { expected: 0, .. })
        ));
    }

    #[test]
    fn test_truncated_header_detected() {
        let bytes = [1u8, 0];
        let mut checked = CheckedEnumerator::<OrderedLayout>::new(&bytes, 1);
        assert!(matches!(
            checked.next_checked(),
            Err(MessageError::Truncated { needed: 8, .. })
        ));
    }

    #[test]
    fn test_native_iter_stops_on_error() {
        let mut bytes = encode(&[b"ok"]);
        bytes.extend_from_slice(&[9, 0, 0, 0, 1]);

        let items: Vec<_> = MessageIter::<DynamicLayout<Blob>>::new(&bytes, 2).collect();
        assert_eq!(items, vec![&b"ok"[..]]);
    }

    #[test]
    fn test_ordered_layout_decodes_id() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[5, 6]);

        let mut checked = CheckedEnumerator::<OrderedLayout>::new(&bytes, 1);
        let message = checked.next_checked().unwrap().unwrap();
        assert_eq!(message.id(), 7);
        assert_eq!(message.payload().as_bytes(), &[5, 6]);
        assert!(checked.next_checked().unwrap().is_none());
    }
}
