//! Chunked view: base record + optional chunks
//!
//! ```text
//! ┌─────────────────┬──────────┬──────┬─────────┬─────────┐
//! │ declared_size   │ mask u32 │ base │ chunk a │ chunk c │  (b absent)
//! └─────────────────┴──────────┴──────┴─────────┴─────────┘
//! ```
//!
//! Chunk hadir disusun menurut urutan deklarasi; offset sebuah chunk =
//! header + base + ukuran semua chunk hadir yang urutannya lebih rendah.

use std::fmt;
use std::marker::PhantomData;

use crate::enumerator::{CheckedEnumerator, ChunkedLayout, MessageIter, UncheckedEnumerator};
use crate::error::Result;
use crate::protocol::{ChunkedMessage, EntryMut, EntryRef, CHUNKED_HEADER_SIZE};
use crate::stream::{MessageSource, MessageStream};

/// Index chunk dari flag satu-bit
#[inline(always)]
fn chunk_index<M: ChunkedMessage>(flag: u32) -> usize {
    assert!(flag.is_power_of_two(), "chunk flag must be a single bit");
    let index = flag.trailing_zeros() as usize;
    assert!(
        index < M::CHUNK_SIZES.len(),
        "chunk flag {:#x} is not declared",
        flag
    );
    index
}

/// Offset chunk ke-`index` untuk `mask` tertentu
#[inline(always)]
fn chunk_offset<M: ChunkedMessage>(mask: u32, index: usize) -> usize {
    let lower: usize = M::CHUNK_SIZES[..index]
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, size)| size)
        .sum();
    CHUNKED_HEADER_SIZE + M::BASE_SIZE + lower
}

/// Read handle sebuah entry chunked (termasuk header)
pub struct ChunkedEntry<'a, M> {
    entry: EntryRef<'a>,
    _message: PhantomData<fn() -> M>,
}

// Manual impl: tidak butuh `M: Clone`
impl<'a, M> Clone for ChunkedEntry<'a, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, M> Copy for ChunkedEntry<'a, M> {}

impl<'a, M> fmt::Debug for ChunkedEntry<'a, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedEntry")
            .field("bytes", &self.entry.len())
            .finish()
    }
}

impl<'a, M: ChunkedMessage> ChunkedEntry<'a, M> {
    #[inline(always)]
    pub fn new(entry: EntryRef<'a>) -> Self {
        Self {
            entry,
            _message: PhantomData,
        }
    }

    /// Ukuran entry yang tercatat di header
    #[inline(always)]
    pub fn declared_byte_size(&self) -> u32 {
        self.entry.read(0)
    }

    #[inline(always)]
    pub fn mask(&self) -> u32 {
        self.entry.read(4)
    }

    /// `true` bila semua bit `flag` ada di mask
    #[inline(always)]
    pub fn has_chunk(&self, flag: u32) -> bool {
        flag != 0 && self.mask() & flag == flag
    }

    /// Base fields, offset 0 = field pertama setelah header
    #[inline(always)]
    pub fn base(&self) -> EntryRef<'a> {
        EntryRef::new(self.entry.bytes(CHUNKED_HEADER_SIZE, M::BASE_SIZE))
    }

    /// Payload chunk `flag`, `None` bila tidak hadir
    pub fn chunk(&self, flag: u32) -> Option<EntryRef<'a>> {
        let index = chunk_index::<M>(flag);
        if !self.has_chunk(flag) {
            return None;
        }
        let offset = chunk_offset::<M>(self.mask(), index);
        Some(EntryRef::new(
            self.entry.bytes(offset, M::CHUNK_SIZES[index]),
        ))
    }

    #[inline(always)]
    pub fn entry(&self) -> EntryRef<'a> {
        self.entry
    }
}

/// Write handle sebuah entry chunked yang baru dialokasikan
pub struct ChunkedEntryMut<'a, M> {
    entry: EntryMut<'a>,
    _message: PhantomData<fn() -> M>,
}

impl<'a, M: ChunkedMessage> ChunkedEntryMut<'a, M> {
    #[inline(always)]
    pub fn mask(&self) -> u32 {
        self.entry.read(4)
    }

    #[inline(always)]
    pub fn has_chunk(&self, flag: u32) -> bool {
        flag != 0 && self.mask() & flag == flag
    }

    /// Base fields untuk ditulis
    pub fn base_mut(&mut self) -> EntryMut<'_> {
        EntryMut::new(self.entry.bytes_mut(CHUNKED_HEADER_SIZE, M::BASE_SIZE))
    }

    /// Payload chunk `flag` untuk ditulis, `None` bila tidak dialokasikan
    pub fn chunk_mut(&mut self, flag: u32) -> Option<EntryMut<'_>> {
        let index = chunk_index::<M>(flag);
        if !self.has_chunk(flag) {
            return None;
        }
        let offset = chunk_offset::<M>(self.mask(), index);
        Some(EntryMut::new(
            self.entry.bytes_mut(offset, M::CHUNK_SIZES[index]),
        ))
    }

    /// Baca kembali sebagai entry chunked
    pub fn as_entry(&self) -> ChunkedEntry<'_, M> {
        ChunkedEntry::new(self.entry.as_entry_ref())
    }
}

/// View bertipe atas stream chunked milik `M`
pub struct ChunkedView<S, M> {
    source: S,
    _message: PhantomData<fn() -> M>,
}

impl<S: MessageSource, M: ChunkedMessage> ChunkedView<S, M> {
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

    pub fn iter(&self) -> MessageIter<'_, ChunkedLayout<M>> {
        MessageIter::new(self.source.as_bytes(), self.source.count())
    }

    pub fn checked(&self) -> CheckedEnumerator<'_, ChunkedLayout<M>> {
        CheckedEnumerator::new(self.source.as_bytes(), self.source.count())
    }

    /// # Safety
    /// Body harus berisi entry chunked utuh milik `M`
    pub unsafe fn unchecked(&self) -> UncheckedEnumerator<'_, ChunkedLayout<M>> {
        UncheckedEnumerator::new(self.source.as_bytes())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<'s, M: ChunkedMessage> ChunkedView<&'s mut MessageStream, M> {
    /// Append entry dengan chunk-chunk di `mask`.
    ///
    /// Ukuran dihitung di muka (`runtime_byte_size`), header ditulis, lalu
    /// caller mengisi base dan chunk lewat handle.
    pub fn add(&mut self, mask: u32) -> ChunkedEntryMut<'_, M> {
        let declared = M::CHUNK_SIZES.len() as u32;
        assert!(
            mask.checked_shr(declared).unwrap_or(0) == 0,
            "chunk mask {:#x} names undeclared chunks",
            mask
        );

        let byte_size = M::runtime_byte_size(mask);
        let mut entry = self.source.allocate(byte_size);
        entry.write::<u32>(0, byte_size as u32);
        entry.write::<u32>(4, mask);

        ChunkedEntryMut {
            entry,
            _message: PhantomData,
        }
    }
}

impl<'v, S: MessageSource, M: ChunkedMessage> IntoIterator for &'v ChunkedView<S, M> {
    type Item = M::View<'v>;
    type IntoIter = MessageIter<'v, ChunkedLayout<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MessageError;
    use crate::protocol::{Message, SchemaKind};
    use crate::stream::ReadOnlyMessageStream;

    const TOKEN: u32 = 1 << 0;
    const RANGE: u32 = 1 << 1;
    const FLAGS: u32 = 1 << 2;

    struct Dispatch;

    impl Message for Dispatch {
        const ID: u32 = 21;
        const KIND: SchemaKind = SchemaKind::Chunked;
        type View<'a> = ChunkedEntry<'a, Dispatch>;

        fn bind<'a>(entry: EntryRef<'a>) -> Self::View<'a> {
            ChunkedEntry::new(entry)
        }
    }

    impl ChunkedMessage for Dispatch {
        const BASE_SIZE: usize = 4;
        const CHUNK_SIZES: &'static [usize] = &[8, 4, 2];
    }

    fn write(stream: &mut MessageStream, thread: u32, mask: u32) {
        let mut view = ChunkedView::<_, Dispatch>::new(stream).unwrap();
        let mut entry = view.add(mask);
        entry.base_mut().write::<u32>(0, thread);
        if let Some(mut token) = entry.chunk_mut(TOKEN) {
            token.write::<u64>(0, 0xdead_beef);
        }
        if let Some(mut range) = entry.chunk_mut(RANGE) {
            range.write::<u32>(0, thread * 10);
        }
        if let Some(mut flags) = entry.chunk_mut(FLAGS) {
            flags.write::<u16>(0, 0x55);
        }
    }

    #[test]
    fn test_chunk_offsets_skip_absent_chunks() {
        let mut stream = MessageStream::new();
        write(&mut stream, 1, RANGE | FLAGS);

        // header 8 + base 4 + range 4 + flags 2
        assert_eq!(stream.byte_size(), 18);
        let frozen = stream.into_read_only();
        let view = ChunkedView::<_, Dispatch>::new(&frozen).unwrap();
        let entry = view.iter().next().unwrap();

        assert_eq!(entry.declared_byte_size(), 18);
        assert!(!entry.has_chunk(TOKEN));
        assert!(entry.has_chunk(RANGE));
        assert!(entry.chunk(TOKEN).is_none());
        assert_eq!(entry.chunk(RANGE).unwrap().read::<u32>(0), 10);
        assert_eq!(entry.chunk(FLAGS).unwrap().read::<u16>(0), 0x55);
    }

    #[test]
    fn test_mixed_masks_roundtrip() {
        let masks = [0, TOKEN, TOKEN | RANGE | FLAGS, FLAGS];
        let mut stream = MessageStream::new();
        for (thread, &mask) in masks.iter().enumerate() {
            write(&mut stream, thread as u32, mask);
        }

        let frozen = stream.into_read_only();
        let view = ChunkedView::<_, Dispatch>::new(&frozen).unwrap();
        let mut thread = 0;
        for entry in &view {
            assert_eq!(entry.mask(), masks[thread]);
            assert_eq!(entry.base().read::<u32>(0), thread as u32);
            assert_eq!(
                entry.chunk(TOKEN).map(|token| token.read::<u64>(0)),
                (masks[thread] & TOKEN != 0).then_some(0xdead_beef)
            );
            thread += 1;
        }
        assert_eq!(thread, masks.len());
    }

    #[test]
    fn test_checked_rejects_wrong_declared_size() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&16u32.to_le_bytes());
        raw.extend_from_slice(&TOKEN.to_le_bytes());
        raw.extend_from_slice(&[0u8; 8]);
        let frozen = ReadOnlyMessageStream::from_bytes(Dispatch::schema(), 1, raw);

        let view = ChunkedView::<_, Dispatch>::new(&frozen).unwrap();
        assert!(matches!(
            view.checked().next_checked(),
            Err(MessageError::MalformedEntry {
                offset: 0,
                byte_size: 16
            })
        ));
    }

    #[test]
    #[should_panic(expected = "undeclared chunks")]
    fn test_undeclared_mask_panics() {
        let mut stream = MessageStream::new();
        write(&mut stream, 0, 1 << 5);
    }
}
