//! Extent plumbing over the array library.

use ndarray::{ArrayBase, Dimension, IntoDimension, IxDyn, RawData};

/// Dimensional extent of a tensor: one axis length per dimension.
pub type Extent = IxDyn;

/// Coerces a shape description into an [`Extent`].
///
/// Accepts an already-built extent as well as plain integer sequences
/// (tuples, arrays, slices, and `Vec`s of axis lengths).
pub fn extent<D: IntoDimension>(dims: D) -> Extent {
    dims.into_dimension().into_dyn()
}

/// Total number of elements implied by an extent.
pub fn numel(extent: &Extent) -> usize {
    extent.size()
}

/// Read access to a value's current extent.
///
/// Blanket-implemented for every `ndarray` array flavor, owned or
/// borrowed; a record field participates in shape derivation exactly
/// when its type implements this trait.
pub trait HasExtent {
    /// Returns the extent describing the value's current dimensions.
    fn extent(&self) -> Extent;
}

impl<S, D> HasExtent for ArrayBase<S, D>
where
    S: RawData,
    D: Dimension,
{
    fn extent(&self) -> Extent {
        self.raw_dim().into_dyn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, ArrayD};

    #[test]
    fn extent_coerces_sequences_and_extents() {
        assert_eq!(extent((2, 3)), IxDyn(&[2, 3]));
        assert_eq!(extent([2, 3]), IxDyn(&[2, 3]));
        assert_eq!(extent(vec![2, 3]), IxDyn(&[2, 3]));
        assert_eq!(extent(&[2, 3][..]), IxDyn(&[2, 3]));
        assert_eq!(extent(IxDyn(&[2, 3])), IxDyn(&[2, 3]));
    }

    #[test]
    fn numel_is_the_axis_product() {
        assert_eq!(numel(&extent((2, 3, 4))), 24);
        assert_eq!(numel(&extent(())), 1);
        assert_eq!(numel(&extent((5, 0))), 0);
    }

    #[test]
    fn arrays_and_views_expose_their_extent() {
        let owned = ArrayD::<f32>::zeros(IxDyn(&[2, 3]));
        assert_eq!(owned.extent(), IxDyn(&[2, 3]));

        let fixed = arr2(&[[1.0_f32, 2.0], [3.0, 4.0]]);
        assert_eq!(fixed.extent(), IxDyn(&[2, 2]));
        assert_eq!(fixed.view().extent(), IxDyn(&[2, 2]));
    }
}
