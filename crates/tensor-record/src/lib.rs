//! Derived shape bookkeeping for records of tensors.
//!
//! A struct of `ndarray` values annotated with `#[derive(TensorRecord)]`
//! keeps its declared field order as type-level metadata and gains a
//! pair of companion records: a size record holding one [`Extent`] per
//! tensor field and an info record holding the matching element counts.
//! Shapes are never stored; they are read from the current field values
//! on demand.
//!
//! ```
//! use tensor_record::ndarray::ArrayD;
//! use tensor_record::{extent, KeyedSize, TensorRecord};
//!
//! #[derive(TensorRecord)]
//! struct Batch {
//!     images: ArrayD<f32>,
//!     labels: ArrayD<f32>,
//! }
//!
//! let batch = Batch {
//!     images: ArrayD::zeros(extent((8, 28, 28))),
//!     labels: ArrayD::zeros(extent((8,))),
//! };
//!
//! assert_eq!(Batch::FIELDS, ["images", "labels"]);
//! assert_eq!(batch.shape(), BatchSize::new((8, 28, 28), (8,)));
//! assert_eq!(
//!     batch.size().numel(),
//!     BatchInfo { images: 8 * 28 * 28, labels: 8 },
//! );
//! ```
//!
//! Standalone size/info pairs can be declared with [`shape_record!`],
//! and records can be extended field-for-field with [`extend_record!`].

extern crate self as tensor_record;

pub use ndarray;

mod extent;
mod record;
mod size;

pub use extent::{extent, numel, Extent, HasExtent};
pub use record::{KeyedTensors, RecordError, TensorRecord};
pub use size::KeyedSize;
pub use tensor_record_macros::{shape_record, TensorRecord};
