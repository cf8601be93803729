//! Inline containers untuk field variabel di dalam satu entry
//!
//! ```text
//! Array     : [data_offset u32][count u32]           (8 bytes)
//! String    : array of UTF-8 bytes                    (8 bytes)
//! SubStream : [kind u32][id u32][count u32][array]    (20 bytes)
//! ```
//!
//! `data_offset` relatif terhadap posisi header array itu sendiri, jadi
//! entry bisa dipindah (mis. saat storage tumbuh) tanpa di-patch ulang.
//! Header bernilai nol = container kosong.

use std::marker::PhantomData;

use crate::core::Scalar;
use crate::error::{MessageError, Result};
use crate::stream::{MessageSource, StreamSlice};

use super::message::{EntryMut, EntryRef};
use super::schema::{MessageSchema, SchemaKind};

/// Ukuran header inline array/string
pub const ARRAY_HEADER_SIZE: usize = 8;
/// Ukuran header inline sub-stream
pub const SUB_STREAM_HEADER_SIZE: usize = 12 + ARRAY_HEADER_SIZE;

/// Array inline bertipe, dipinjam dari entry
#[derive(Debug, Clone, Copy)]
pub struct InlineArray<'a, T> {
    bytes: &'a [u8],
    _element: PhantomData<T>,
}

impl<'a, T: Scalar + 'a> InlineArray<'a, T> {
    /// Bytes data untuk `count` elemen
    pub const fn data_size(count: usize) -> usize {
        count * T::SIZE
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len() / T::SIZE
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(T::SIZE)?;
        let end = start.checked_add(T::SIZE)?;
        self.bytes.get(start..end).map(T::read_le)
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        self.bytes.chunks_exact(T::SIZE).map(T::read_le)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> EntryRef<'a> {
    /// Field header `u32` di `offset`; entry terlalu pendek = `Truncated`
    fn header_u32(&self, offset: usize) -> Result<u32> {
        offset
            .checked_add(4)
            .and_then(|end| self.as_bytes().get(offset..end))
            .map(u32::read_le)
            .ok_or_else(|| MessageError::truncated(offset, 4, self.len()))
    }

    /// Region data array yang header-nya ada di `field_offset`.
    ///
    /// Header berasal dari bytes eksternal (wire, mmap), jadi region yang
    /// keluar dari entry dikembalikan sebagai `Truncated`, bukan panic.
    fn array_region(&self, field_offset: usize, element_size: usize) -> Result<&'a [u8]> {
        let relative = self.header_u32(field_offset)? as usize;
        let count = self.header_u32(field_offset.saturating_add(4))? as usize;
        if count == 0 {
            return Ok(&[]);
        }

        let start = field_offset.saturating_add(relative);
        let size = count.saturating_mul(element_size);
        start
            .checked_add(size)
            .and_then(|end| self.as_bytes().get(start..end))
            .ok_or_else(|| MessageError::truncated(start, size, self.len()))
    }

    /// Baca inline array di `field_offset`
    pub fn array<T: Scalar>(&self, field_offset: usize) -> Result<InlineArray<'a, T>> {
        Ok(InlineArray {
            bytes: self.array_region(field_offset, T::SIZE)?,
            _element: PhantomData,
        })
    }

    /// Baca inline string di `field_offset`; header nol = string kosong
    pub fn string(&self, field_offset: usize) -> Result<&'a str> {
        let raw = self.array_region(field_offset, 1)?;
        std::str::from_utf8(raw).map_err(|_| MessageError::InvalidUtf8 {
            offset: field_offset,
        })
    }

    /// Baca inline sub-stream; `None` bila belum pernah di-store
    pub fn sub_stream(&self, field_offset: usize) -> Result<Option<StreamSlice<'a>>> {
        let kind = self.header_u32(field_offset)?;
        if kind == 0 {
            return Ok(None);
        }

        let kind = SchemaKind::from_u32(kind).ok_or(MessageError::UnknownSchemaKind(kind))?;
        let id = self.header_u32(field_offset.saturating_add(4))?;
        let count = self.header_u32(field_offset.saturating_add(8))?;
        let data = self.array_region(field_offset.saturating_add(12), 1)?;

        Ok(Some(StreamSlice::new(
            Some(MessageSchema::new(kind, id)),
            count,
            data,
        )))
    }
}

impl<'a> EntryMut<'a> {
    /// Tulis header array: data di `data_offset` (absolut dalam entry)
    pub fn patch_array(&mut self, field_offset: usize, data_offset: usize, count: u32) {
        assert!(
            data_offset >= field_offset,
            "array data must follow its header"
        );
        self.write::<u32>(field_offset, (data_offset - field_offset) as u32);
        self.write::<u32>(field_offset + 4, count);
    }

    /// Region data array (mutable) berdasarkan header yang sudah di-patch
    pub fn array_bytes_mut<T: Scalar>(&mut self, field_offset: usize) -> &mut [u8] {
        let relative = self.read::<u32>(field_offset) as usize;
        let count = self.read::<u32>(field_offset + 4) as usize;
        self.bytes_mut(field_offset + relative, count * T::SIZE)
    }

    /// Set elemen ke-`index` array di `field_offset`
    pub fn set_array<T: Scalar>(&mut self, field_offset: usize, index: usize, value: T) {
        let data = self.array_bytes_mut::<T>(field_offset);
        value.write_le(&mut data[index * T::SIZE..(index + 1) * T::SIZE]);
    }

    /// Salin isi string ke region yang sudah dialokasikan.
    ///
    /// # Panics
    /// Jika panjang string berbeda dari panjang yang di-patch
    pub fn write_string(&mut self, field_offset: usize, value: &str) {
        let data = self.array_bytes_mut::<u8>(field_offset);
        assert_eq!(
            data.len(),
            value.len(),
            "string length differs from its allocation"
        );
        data.copy_from_slice(value.as_bytes());
    }

    /// Siapkan header sub-stream dengan `byte_size` bytes data di `data_offset`
    pub fn patch_sub_stream(&mut self, field_offset: usize, data_offset: usize, byte_size: u32) {
        self.patch_array(field_offset + 12, data_offset, byte_size);
    }

    /// Simpan stream lain ke sub-stream inline (schema, count, bytes).
    ///
    /// Stream kosong dilewati sehingga field tetap terbaca `None`.
    ///
    /// # Panics
    /// Jika ukuran bytes berbeda dari ukuran yang di-patch
    pub fn store_sub_stream<S: MessageSource>(&mut self, field_offset: usize, source: &S) {
        if source.count() == 0 {
            return;
        }
        let Some(schema) = source.schema() else {
            return;
        };

        self.write::<u32>(field_offset, schema.kind as u32);
        self.write::<u32>(field_offset + 4, schema.id);
        self.write::<u32>(field_offset + 8, source.count());

        let data = self.array_bytes_mut::<u8>(field_offset + 12);
        assert_eq!(
            data.len(),
            source.as_bytes().len(),
            "sub-stream size differs from its allocation"
        );
        data.copy_from_slice(source.as_bytes());
    }
}
