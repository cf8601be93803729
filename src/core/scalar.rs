//! Fixed-width little-endian scalar codec
//!
//! Semua field dibaca/ditulis lewat byte offset, bukan struct overlay,
//! supaya layout identik di semua platform.

/// Nilai fixed-width yang bisa dibaca/ditulis little-endian
pub trait Scalar: Copy {
    /// Lebar dalam bytes
    const SIZE: usize;

    /// Decode dari `bytes[..SIZE]`
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode ke `bytes[..SIZE]`
    fn write_le(self, bytes: &mut [u8]);
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline(always)]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline(always)]
                fn write_le(self, bytes: &mut [u8]) {
                    bytes[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Baca u32 tanpa bounds check.
///
/// # Safety
/// `offset + 4 <= bytes.len()`
#[inline(always)]
pub(crate) unsafe fn read_u32_unchecked(bytes: &[u8], offset: usize) -> u32 {
    debug_assert!(offset + 4 <= bytes.len());
    let raw = std::ptr::read_unaligned(bytes.as_ptr().add(offset) as *const [u8; 4]);
    u32::from_le_bytes(raw)
}
