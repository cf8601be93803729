//! Message traits dan entry handles
//!
//! Sebuah message type tidak menyimpan data sendiri: ia hanya tahu
//! id-nya, layout-nya, dan cara membungkus bytes sebuah entry menjadi
//! view bertipe. Field diakses lewat byte offset (little-endian).
//!
//! ```text
//! Static   : [payload (BYTE_SIZE)]
//! Chunked  : [declared_byte_size u32][chunk_mask u32][base...][chunks...]
//! Dynamic  : [byte_size u32][payload (byte_size)]
//! Ordered  : [id u32][byte_size u32][payload (byte_size)]
//! ```

use crate::core::Scalar;

use super::schema::{MessageSchema, SchemaKind};

/// Header entry chunked: declared byte size + chunk mask
pub const CHUNKED_HEADER_SIZE: usize = 8;
/// Header entry dynamic: byte size
pub const DYNAMIC_HEADER_SIZE: usize = 4;
/// Header entry ordered: id + byte size
pub const ORDERED_HEADER_SIZE: usize = 8;

/// Trait dasar semua message type
pub trait Message {
    /// Id unik tipe pesan
    const ID: u32;

    /// Layout stream bila tipe ini berdiri sendiri
    const KIND: SchemaKind;

    /// View bertipe atas bytes satu entry
    type View<'a>;

    /// Bungkus bytes entry menjadi view.
    ///
    /// Untuk message chunked `entry` mencakup header entry (offset 0 =
    /// declared byte size); untuk layout lain hanya payload.
    fn bind<'a>(entry: EntryRef<'a>) -> Self::View<'a>;

    /// Schema stream single-type untuk tipe ini
    #[inline(always)]
    fn schema() -> MessageSchema {
        MessageSchema::new(Self::KIND, Self::ID)
    }
}

/// Message dengan ukuran tetap, tanpa field variabel
pub trait StaticMessage: Message {
    /// Ukuran entry dalam bytes (harus > 0)
    const BYTE_SIZE: usize;
}

/// Message dengan ukuran ditentukan caller (string, blob, inline arrays)
pub trait DynamicMessage: Message {}

/// Message base + optional chunks.
///
/// Chunk ke-`i` dipilih lewat bit `1 << i` di mask, dan selalu ditata
/// menurut urutan deklarasi di `CHUNK_SIZES`.
pub trait ChunkedMessage: Message {
    /// Ukuran base fields, setelah header entry
    const BASE_SIZE: usize;

    /// Ukuran tiap chunk, urut sesuai deklarasi
    const CHUNK_SIZES: &'static [usize];

    /// Ukuran entry total (header + base + chunk yang ada)
    fn runtime_byte_size(mask: u32) -> usize {
        let chunks: usize = Self::CHUNK_SIZES
            .iter()
            .enumerate()
            .filter(|(index, _)| mask & (1 << index) != 0)
            .map(|(_, size)| size)
            .sum();
        CHUNKED_HEADER_SIZE + Self::BASE_SIZE + chunks
    }
}

/// Read handle atas bytes satu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef<'a> {
    bytes: &'a [u8],
}

impl<'a> EntryRef<'a> {
    #[inline(always)]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Baca field di `offset`.
    ///
    /// # Panics
    /// Jika field melewati akhir entry
    #[inline(always)]
    pub fn read<T: Scalar>(&self, offset: usize) -> T {
        T::read_le(self.bytes(offset, T::SIZE))
    }

    /// Slice `len` bytes di `offset`, hidup selama stream-nya
    #[inline(always)]
    pub fn bytes(&self, offset: usize, len: usize) -> &'a [u8] {
        check_range(self.bytes.len(), offset, len);
        &self.bytes[offset..offset + len]
    }

    /// Sub-entry mulai `offset` sampai akhir
    #[inline(always)]
    pub fn slice_from(&self, offset: usize) -> EntryRef<'a> {
        check_range(self.bytes.len(), offset, 0);
        EntryRef::new(&self.bytes[offset..])
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Write handle atas bytes satu entry yang baru dialokasikan
#[derive(Debug)]
pub struct EntryMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> EntryMut<'a> {
    #[inline(always)]
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    #[inline(always)]
    pub fn read<T: Scalar>(&self, offset: usize) -> T {
        T::read_le(self.bytes(offset, T::SIZE))
    }

    /// Tulis field di `offset`.
    ///
    /// # Panics
    /// Jika field melewati akhir entry
    #[inline(always)]
    pub fn write<T: Scalar>(&mut self, offset: usize, value: T) {
        value.write_le(self.bytes_mut(offset, T::SIZE));
    }

    #[inline(always)]
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        check_range(self.bytes.len(), offset, len);
        &self.bytes[offset..offset + len]
    }

    #[inline(always)]
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        check_range(self.bytes.len(), offset, len);
        &mut self.bytes[offset..offset + len]
    }

    /// Isi range dengan satu nilai byte
    pub fn fill(&mut self, offset: usize, len: usize, value: u8) {
        self.bytes_mut(offset, len).fill(value);
    }

    /// Reborrow sebagai read handle
    #[inline(always)]
    pub fn as_entry_ref(&self) -> EntryRef<'_> {
        EntryRef::new(&*self.bytes)
    }

    /// Reborrow pendek, berguna untuk mengoper handle ke helper
    #[inline(always)]
    pub fn reborrow(&mut self) -> EntryMut<'_> {
        EntryMut::new(&mut *self.bytes)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[inline(always)]
fn check_range(len: usize, offset: usize, width: usize) {
    assert!(
        offset.checked_add(width).map_or(false, |end| end <= len),
        "entry access out of bounds: offset {} + {} > entry size {}",
        offset,
        width,
        len
    );
}

/// Implement `Message` + `StaticMessage` untuk tipe fixed-size.
///
/// ```ignore
/// static_message!(CounterMessage, id = 1, size = 4, view = CounterView);
/// ```
#[macro_export]
macro_rules! static_message {
    ($ty:ty, id = $id:expr, size = $size:expr, view = $view:ident) => {
        impl $crate::protocol::Message for $ty {
            const ID: u32 = $id;
            const KIND: $crate::protocol::SchemaKind = $crate::protocol::SchemaKind::Static;
            type View<'a> = $view<'a>;

            #[inline(always)]
            fn bind<'a>(entry: $crate::protocol::EntryRef<'a>) -> Self::View<'a> {
                $view(entry)
            }
        }

        impl $crate::protocol::StaticMessage for $ty {
            const BYTE_SIZE: usize = $size;
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PairMessage;
    struct PairView<'a>(EntryRef<'a>);

    impl<'a> PairView<'a> {
        fn left(&self) -> u32 {
            self.0.read(0)
        }
        fn right(&self) -> u16 {
            self.0.read(4)
        }
    }

    crate::static_message!(PairMessage, id = 5, size = 6, view = PairView);

    struct DetailMessage;

    impl Message for DetailMessage {
        const ID: u32 = 6;
        const KIND: SchemaKind = SchemaKind::Chunked;
        type View<'a> = EntryRef<'a>;

        fn bind<'a>(entry: EntryRef<'a>) -> Self::View<'a> {
            entry
        }
    }

    impl ChunkedMessage for DetailMessage {
        const BASE_SIZE: usize = 4;
        const CHUNK_SIZES: &'static [usize] = &[8, 16, 2];
    }

    #[test]
    fn test_static_macro_binds_view() {
        let mut raw = [0u8; 6];
        {
            let mut entry = EntryMut::new(&mut raw);
            entry.write::<u32>(0, 77);
            entry.write::<u16>(4, 3);
        }
        let view = PairMessage::bind(EntryRef::new(&raw));
        assert_eq!(view.left(), 77);
        assert_eq!(view.right(), 3);
        assert_eq!(PairMessage::schema(), MessageSchema::new(SchemaKind::Static, 5));
        assert_eq!(PairMessage::BYTE_SIZE, 6);
    }

    #[test]
    fn test_runtime_byte_size_counts_present_chunks() {
        assert_eq!(DetailMessage::runtime_byte_size(0), 12);
        assert_eq!(DetailMessage::runtime_byte_size(0b001), 20);
        assert_eq!(DetailMessage::runtime_byte_size(0b110), 30);
        assert_eq!(DetailMessage::runtime_byte_size(0b111), 38);
    }

    #[test]
    fn test_entry_slices_keep_stream_lifetime() {
        let raw = vec![1u8, 2, 3, 4, 5];
        let tail = {
            let entry = EntryRef::new(&raw);
            entry.slice_from(2).as_bytes()
        };
        assert_eq!(tail, &[3, 4, 5]);
    }

    #[test]
    #[should_panic(expected = "entry access out of bounds")]
    fn test_entry_write_past_end_panics() {
        let mut raw = [0u8; 3];
        EntryMut::new(&mut raw).write::<u32>(0, 1);
    }
}
