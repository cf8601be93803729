//! Message schema: `{layout kind, message id}`

use std::fmt;

/// Layout fisik entry di dalam stream
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// Fixed-size entries, random access
    Static = 1,
    /// Entry dengan ukuran bebas, `{byte_size, bytes}`
    Dynamic = 2,
    /// Campuran beberapa tipe, `{id, byte_size, payload}`
    Ordered = 3,
    /// Base record + optional chunks lewat presence mask
    Chunked = 4,
}

impl SchemaKind {
    #[inline(always)]
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::Static),
            2 => Some(Self::Dynamic),
            3 => Some(Self::Ordered),
            4 => Some(Self::Chunked),
            _ => None,
        }
    }
}

/// Id schema untuk stream ordered (tidak terikat satu tipe)
pub const ORDERED_SCHEMA_ID: u32 = u32::MAX;

/// Tag yang menentukan layout dan tipe pesan sebuah stream.
///
/// Identitas = kesamaan nilai kedua field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageSchema {
    pub kind: SchemaKind,
    pub id: u32,
}

impl MessageSchema {
    #[inline(always)]
    pub const fn new(kind: SchemaKind, id: u32) -> Self {
        Self { kind, id }
    }

    #[inline(always)]
    pub const fn ordered() -> Self {
        Self::new(SchemaKind::Ordered, ORDERED_SCHEMA_ID)
    }

    pub fn is_static(&self, id: u32) -> bool {
        self.kind == SchemaKind::Static && self.id == id
    }

    pub fn is_dynamic(&self, id: u32) -> bool {
        self.kind == SchemaKind::Dynamic && self.id == id
    }

    pub fn is_chunked(&self, id: u32) -> bool {
        self.kind == SchemaKind::Chunked && self.id == id
    }

    pub fn is_ordered(&self) -> bool {
        self.kind == SchemaKind::Ordered
    }
}

impl fmt::Display for MessageSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ordered() {
            write!(f, "Ordered")
        } else {
            write!(f, "{:?}#{}", self.kind, self.id)
        }
    }
}
