//! Core module: byte storage primitives
//!
//! Prinsip desain:
//! - Offset logis, bukan pointer: tetap valid setelah buffer tumbuh
//! - Fixed-width little-endian codec untuk semua field
//! - Akses di luar batas = bug library, langsung panic

mod byte_storage;
mod scalar;

pub use byte_storage::ByteStorage;
pub use scalar::Scalar;

pub(crate) use scalar::read_u32_unchecked;
