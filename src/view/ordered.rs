//! Ordered view: campuran beberapa message type dalam satu stream
//!
//! ```text
//! [id u32][size u32][payload][id u32][size u32][payload]...
//! ```
//!
//! Reader dispatch berdasarkan `id` dulu, baru membaca payload sebagai
//! tipe yang cocok. `OrderedDispatch` + `ordered_dispatch!` membungkus
//! pola ini menjadi enum bertipe; id yang tidak dikenal dilewati.

use crate::enumerator::{CheckedEnumerator, MessageIter, OrderedLayout, UncheckedEnumerator};
use crate::error::Result;
use crate::protocol::{
    EntryMut, EntryRef, Message, MessageSchema, StaticMessage, ORDERED_HEADER_SIZE,
};
use crate::stream::{MessageSource, MessageStream};

use super::allocation::{AllocationRequest, PendingEntry};

/// Satu entry ordered yang sudah di-decode: `{id, payload}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedMessage<'a> {
    id: u32,
    payload: EntryRef<'a>,
}

impl<'a> OrderedMessage<'a> {
    #[inline(always)]
    pub(crate) fn new(id: u32, payload: EntryRef<'a>) -> Self {
        Self { id, payload }
    }

    #[inline(always)]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Payload mentah, tanpa header entry
    #[inline(always)]
    pub fn payload(&self) -> EntryRef<'a> {
        self.payload
    }

    #[inline(always)]
    pub fn is<M: Message>(&self) -> bool {
        self.id == M::ID
    }

    /// Baca sebagai `M` bila id cocok
    #[inline(always)]
    pub fn try_get<M: Message>(&self) -> Option<M::View<'a>> {
        if self.is::<M>() {
            Some(M::bind(self.payload))
        } else {
            None
        }
    }

    /// Baca sebagai `M` tanpa cek id di release build.
    ///
    /// Caller harus sudah dispatch berdasarkan `id()`; id yang salah
    /// menghasilkan view atas bytes tipe lain.
    #[inline(always)]
    pub fn get<M: Message>(&self) -> M::View<'a> {
        debug_assert_eq!(
            self.id,
            M::ID,
            "ordered entry read as the wrong message type"
        );
        M::bind(self.payload)
    }
}

/// Tipe hasil dispatch sebuah entry ordered (biasanya enum dari `ordered_dispatch!`)
pub trait OrderedDispatch<'a>: Sized {
    /// `None` = id tidak ditangani oleh consumer ini
    fn dispatch(message: OrderedMessage<'a>) -> Option<Self>;
}

/// View atas stream ordered
pub struct OrderedView<S> {
    source: S,
}

impl<S: MessageSource> OrderedView<S> {
    pub fn new(mut source: S) -> Result<Self> {
        source.bind_schema(MessageSchema::ordered())?;
        Ok(Self { source })
    }

    #[inline(always)]
    pub fn count(&self) -> u32 {
        self.source.count()
    }

    pub fn iter(&self) -> MessageIter<'_, OrderedLayout> {
        MessageIter::new(self.source.as_bytes(), self.source.count())
    }

    pub fn checked(&self) -> CheckedEnumerator<'_, OrderedLayout> {
        CheckedEnumerator::new(self.source.as_bytes(), self.source.count())
    }

    /// # Safety
    /// Body harus berisi entry `{id, size, payload}` utuh
    pub unsafe fn unchecked(&self) -> UncheckedEnumerator<'_, OrderedLayout> {
        UncheckedEnumerator::new(self.source.as_bytes())
    }

    /// Iterasi entry yang dikenali `D`; id lain dilewati diam-diam
    pub fn dispatch<'v, D>(&'v self) -> impl Iterator<Item = D> + 'v
    where
        D: OrderedDispatch<'v> + 'v,
    {
        self.iter().filter_map(D::dispatch)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<'s> OrderedView<&'s mut MessageStream> {
    /// Append message fixed-size `M`
    pub fn add<M: StaticMessage>(&mut self) -> EntryMut<'_> {
        self.allocate_entry(M::ID, M::BYTE_SIZE)
    }

    /// Append message berukuran variabel lewat allocation request
    pub fn add_with<'r, R: AllocationRequest>(&mut self, request: &'r R) -> PendingEntry<'_, 'r, R> {
        let entry = self.allocate_entry(request.id(), request.byte_size());
        PendingEntry::new(entry, request)
    }

    /// Tulis header `{id, size}` dan kembalikan region payload
    fn allocate_entry(&mut self, id: u32, byte_size: usize) -> EntryMut<'_> {
        assert!(
            u32::try_from(byte_size).is_ok(),
            "ordered entry of {} bytes exceeds u32 size field",
            byte_size
        );

        let offset = self.source.allocate_offset(ORDERED_HEADER_SIZE + byte_size);
        let mut header = self.source.entry_mut(offset, ORDERED_HEADER_SIZE);
        header.write::<u32>(0, id);
        header.write::<u32>(4, byte_size as u32);

        self.source.entry_mut(offset + ORDERED_HEADER_SIZE, byte_size)
    }
}

impl<'v, S: MessageSource> IntoIterator for &'v OrderedView<S> {
    type Item = OrderedMessage<'v>;
    type IntoIter = MessageIter<'v, OrderedLayout>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Bangun enum dispatch untuk stream ordered.
///
/// ```ignore
/// ordered_dispatch! {
///     #[derive(Debug)]
///     pub enum Event<'a> {
///         Launch(LaunchMessage),
///         Label(LabelMessage),
///     }
/// }
///
/// for event in view.dispatch::<Event>() {
///     match event {
///         Event::Launch(launch) => ...,
///         Event::Label(label) => ...,
///     }
/// }
/// ```
#[macro_export]
macro_rules! ordered_dispatch {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident<$lt:lifetime> {
            $($variant:ident($message:ty)),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name<$lt> {
            $($variant(<$message as $crate::protocol::Message>::View<$lt>),)*
        }

        impl<$lt> $crate::view::OrderedDispatch<$lt> for $name<$lt> {
            fn dispatch(message: $crate::view::OrderedMessage<$lt>) -> Option<Self> {
                $(
                    if message.id() == <$message as $crate::protocol::Message>::ID {
                        return Some($name::$variant(message.get::<$message>()));
                    }
                )*
                None
            }
        }
    };
}
