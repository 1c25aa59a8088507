//! Shared behavior of generated size records.

use crate::extent::Extent;

/// A record of named extent slots with a companion element-count type.
///
/// Implementations come from `shape_record!` and from
/// `#[derive(TensorRecord)]`; slot order always matches the declaring
/// record's tensor-field order. Size records compare slot-wise against
/// their own type and broadcast against a bare [`Extent`].
///
/// ```
/// use tensor_record::{extent, shape_record, KeyedSize};
///
/// shape_record!(struct MySize(MyInfo) { a, b });
///
/// let size = MySize::new((1, 4), (1, 5));
/// assert_eq!(size.numel(), MyInfo { a: 4, b: 5 });
/// assert!(MySize::new((1, 4), (1, 4)) == extent((1, 4)));
/// ```
pub trait KeyedSize: Sized {
    /// Companion record holding one element count per slot.
    type Info;

    /// Slot names, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Extent slots, in declaration order.
    fn extents(&self) -> Vec<&Extent>;

    /// Reduces every slot to its element count.
    fn numel(&self) -> Self::Info;

    /// True when every slot equals the given extent.
    ///
    /// Backs the generated `PartialEq<Extent>` impls. Vacuously true
    /// for a zero-slot record.
    fn broadcast_eq(&self, extent: &Extent) -> bool {
        self.extents().into_iter().all(|slot| slot == extent)
    }
}
