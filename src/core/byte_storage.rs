//! Growable byte storage untuk writable streams
//!
//! Semua akses bertipe lewat offset logis. Offset tetap valid setelah
//! buffer tumbuh; hanya raw pointer/slice lama yang invalid.

use super::scalar::Scalar;
use crate::config::StreamConfig;

/// Owned, contiguous, growable byte region
#[derive(Debug, Clone, Default)]
pub struct ByteStorage {
    buffer: Vec<u8>,
    growth_factor: usize,
}

impl ByteStorage {
    /// Membuat storage kosong dengan konfigurasi default
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            buffer: Vec::with_capacity(config.initial_capacity),
            growth_factor: config.effective_growth(),
        }
    }

    /// Append `n` bytes bernilai nol, return offset awalnya.
    ///
    /// Tidak pernah gagal; tumbuh geometris saat kapasitas habis.
    #[inline(always)]
    pub fn allocate(&mut self, n: usize) -> usize {
        let offset = self.buffer.len();
        let required = offset + n;

        if required > self.buffer.capacity() {
            self.grow(required);
        }

        self.buffer.resize(required, 0);
        offset
    }

    fn grow(&mut self, required: usize) {
        let factor = self.growth_factor.max(2);
        let mut target = self.buffer.capacity().max(64);
        while target < required {
            target = target.saturating_mul(factor);
        }

        tracing::trace!(
            from = self.buffer.capacity(),
            to = target,
            "growing message storage"
        );
        self.buffer.reserve_exact(target - self.buffer.len());
    }

    /// Baca nilai fixed-width di `offset`.
    ///
    /// # Panics
    /// Jika `offset + T::SIZE > len()`
    #[inline(always)]
    pub fn read<T: Scalar>(&self, offset: usize) -> T {
        T::read_le(self.bytes(offset, T::SIZE))
    }

    /// Tulis nilai fixed-width di `offset`.
    ///
    /// # Panics
    /// Jika `offset + T::SIZE > len()`
    #[inline(always)]
    pub fn write<T: Scalar>(&mut self, offset: usize, value: T) {
        value.write_le(self.bytes_mut(offset, T::SIZE));
    }

    /// Slice `len` bytes mulai `offset`
    #[inline(always)]
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        self.check_range(offset, len);
        &self.buffer[offset..offset + len]
    }

    #[inline(always)]
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        self.check_range(offset, len);
        &mut self.buffer[offset..offset + len]
    }

    #[inline(always)]
    fn check_range(&self, offset: usize, len: usize) {
        assert!(
            offset.checked_add(len).map_or(false, |end| end <= self.buffer.len()),
            "storage access out of bounds: offset {} + {} > length {}",
            offset,
            len,
            self.buffer.len()
        );
    }

    /// Region yang sudah terpakai
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Kosongkan, kapasitas dipertahankan
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_returns_offsets() {
        let mut storage = ByteStorage::new();
        assert_eq!(storage.allocate(4), 0);
        assert_eq!(storage.allocate(8), 4);
        assert_eq!(storage.len(), 12);
        assert!(storage.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_write_roundtrip() {
        let mut storage = ByteStorage::new();
        let offset = storage.allocate(12);
        storage.write::<u32>(offset, 42);
        storage.write::<u64>(offset + 4, u64::MAX - 1);

        assert_eq!(storage.read::<u32>(offset), 42);
        assert_eq!(storage.read::<u64>(offset + 4), u64::MAX - 1);
    }

    #[test]
    fn test_offsets_survive_growth() {
        let mut storage = ByteStorage::with_config(StreamConfig::default().with_initial_capacity(8));
        let first = storage.allocate(4);
        storage.write::<u32>(first, 0xDEAD_BEEF);

        // Paksa beberapa kali realokasi
        for _ in 0..100 {
            storage.allocate(32);
        }

        assert!(storage.capacity() >= storage.len());
        assert_eq!(storage.read::<u32>(first), 0xDEAD_BEEF);
    }

    #[test]
    fn test_growth_is_geometric() {
        let mut storage = ByteStorage::with_config(StreamConfig::default().with_growth_factor(4));
        storage.allocate(65);
        // 64 * 4
        assert!(storage.capacity() >= 256);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut storage = ByteStorage::new();
        storage.allocate(100);
        let capacity = storage.capacity();
        storage.clear();
        assert!(storage.is_empty());
        assert_eq!(storage.capacity(), capacity);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_read_past_end_panics() {
        let mut storage = ByteStorage::new();
        storage.allocate(3);
        let _ = storage.read::<u32>(0);
    }
}
