//! Record-level capability traits and reconstruction errors.

use thiserror::Error;

use crate::extent::Extent;
use crate::size::KeyedSize;

/// Field bookkeeping and shape derivation for a record of tensors.
///
/// Implemented by `#[derive(TensorRecord)]`, which fixes the declared
/// field order at expansion time, classifies each field as tensor or
/// plain, and generates the companion [`Size`](Self::Size) and
/// [`Info`](Self::Info) types scoped to the record.
pub trait TensorRecord {
    /// Companion size record: one extent slot per tensor field.
    type Size: KeyedSize<Info = Self::Info>;
    /// Companion info record: one element count per tensor field.
    type Info;

    /// Declared field names, in declaration order.
    const FIELDS: &'static [&'static str];
    /// Tensor-typed field names: an ordered subsequence of
    /// [`FIELDS`](Self::FIELDS).
    const TENSOR_FIELDS: &'static [&'static str];

    /// Current `(name, extent)` pairs of the tensor fields, in
    /// declaration order.
    fn keyed_extents(&self) -> Vec<(&'static str, Extent)>;

    /// Builds a fresh size record from the current tensor extents.
    fn size(&self) -> Self::Size;

    /// The record's current shape; identical to [`size`](Self::size).
    fn shape(&self) -> Self::Size {
        self.size()
    }
}

/// Uniform access to the tensor payload of a record.
///
/// Derived alongside [`TensorRecord`] whenever the record has at least
/// one tensor field and every tensor field shares one declared type.
pub trait KeyedTensors: TensorRecord + Sized {
    /// The shared declared type of the record's tensor fields.
    type Tensor;

    /// Tensor field values, in declaration order.
    fn tensors(&self) -> Vec<&Self::Tensor>;

    /// `(name, value)` pairs of the tensor fields, in declaration order.
    fn keyedtensors(&self) -> Vec<(&'static str, &Self::Tensor)>;

    /// Rebuilds a record from name-keyed tensors.
    ///
    /// Every tensor field must appear exactly once; non-tensor fields
    /// are filled from `Default`.
    fn from_keyedtensors<'a, I>(pairs: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (&'a str, Self::Tensor)>;
}

/// Errors surfaced when rebuilding a record or size from keyed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing field `{field}`")]
    MissingField { field: &'static str },
    #[error("unexpected field `{field}`")]
    UnexpectedField { field: String },
    #[error("duplicate field `{field}`")]
    DuplicateField { field: String },
}

/// Declares a record extending another derived record's fields.
///
/// Expands through the field schema `#[derive(TensorRecord)]` emits for
/// the parent: ancestor fields come first, newly declared fields after,
/// and the result is re-derived, so the extending record gets fresh
/// companion types of its own. The parent's field types must be in
/// scope at the extension site.
///
/// ```
/// use tensor_record::ndarray::ArrayD;
/// use tensor_record::{extend_record, TensorRecord};
///
/// #[derive(TensorRecord)]
/// struct Example {
///     x: ArrayD<f32>,
///     y: ArrayD<f32>,
/// }
///
/// extend_record! {
///     struct ChildExample: Example {
///         z: ArrayD<f32>,
///     }
/// }
///
/// assert_eq!(ChildExample::FIELDS, ["x", "y", "z"]);
/// ```
#[macro_export]
macro_rules! extend_record {
    ($(#[$meta:meta])* $vis:vis struct $name:ident : $parent:ident { $($body:tt)* }) => {
        $parent! { @extend [$(#[$meta])* $vis struct $name] { $($body)* } }
    };
}
