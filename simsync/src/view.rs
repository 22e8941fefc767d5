use std::ffi::c_void;

use ndarray::{Array2, ArrayView2};

/// Scalar type of the elements in a `BufferView`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 32-bit floating point values
    Float32,
    /// 64-bit floating point values
    Float64,
    /// 32-bit signed integers
    Int32,
    /// 64-bit signed integers
    Int64,
}

mod private {
    #[derive(Debug, Clone, Copy)]
    pub enum Data<'a> {
        Float32(&'a [f32]),
        Float64(&'a [f64]),
        Int32(&'a [i32]),
        Int64(&'a [i64]),
    }

    pub trait Sealed: Sized {
        fn wrap(data: &[Self]) -> Data<'_>;
        fn unwrap(data: Data<'_>) -> Option<&[Self]>;
    }
}

use self::private::Data;

/// Scalar types which can be stored in a `BufferView`. This trait is sealed,
/// and implemented for `f32`, `f64`, `i32` and `i64`.
pub trait ViewScalar: private::Sealed + Copy {
    /// The corresponding `ScalarKind`
    const KIND: ScalarKind;
}

macro_rules! impl_view_scalar {
    ($type:ty, $variant:ident) => {
        impl private::Sealed for $type {
            fn wrap(data: &[$type]) -> Data<'_> {
                Data::$variant(data)
            }

            fn unwrap(data: Data<'_>) -> Option<&[$type]> {
                match data {
                    Data::$variant(data) => Some(data),
                    _ => None,
                }
            }
        }

        impl ViewScalar for $type {
            const KIND: ScalarKind = ScalarKind::$variant;
        }
    };
}

impl_view_scalar!(f32, Float32);
impl_view_scalar!(f64, Float64);
impl_view_scalar!(i32, Int32);
impl_view_scalar!(i64, Int64);

/// A non-owning, read-only view of a contiguous buffer of numbers, grouped in
/// elements of `components()` values each.
///
/// The memory behind a view is owned either by the simulation engine or by
/// the `SimulationHandle` scratch buffers, and the lifetime `'a` ties the view
/// to a borrow of the handle. An empty view has a null pointer and no
/// elements, but still knows its scalar kind.
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    data: Data<'a>,
    components: usize,
}

impl<'a> BufferView<'a> {
    /// Create a view over `data`, where each element has `components`
    /// values. The length of `data` must be a multiple of `components`.
    pub fn new<T: ViewScalar>(data: &'a [T], components: usize) -> BufferView<'a> {
        assert!(components > 0, "views must have at least one component");
        assert!(
            data.len() % components == 0,
            "view length ({}) must be a multiple of the number of components ({})",
            data.len(), components
        );

        BufferView {
            data: T::wrap(data),
            components,
        }
    }

    /// Create an empty view for values of type `T`
    pub fn empty<T: ViewScalar + 'a>(components: usize) -> BufferView<'a> {
        BufferView::new::<T>(&[], components)
    }

    /// Is this view empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a pointer to the first value in this view, or a null pointer if
    /// the view is empty
    pub fn as_ptr(&self) -> *const c_void {
        if self.is_empty() {
            return std::ptr::null();
        }

        match self.data {
            Data::Float32(data) => data.as_ptr().cast(),
            Data::Float64(data) => data.as_ptr().cast(),
            Data::Int32(data) => data.as_ptr().cast(),
            Data::Int64(data) => data.as_ptr().cast(),
        }
    }

    fn len(&self) -> usize {
        match self.data {
            Data::Float32(data) => data.len(),
            Data::Float64(data) => data.len(),
            Data::Int32(data) => data.len(),
            Data::Int64(data) => data.len(),
        }
    }

    /// Get the total number of scalar values in this view
    pub fn element_count(&self) -> usize {
        self.len()
    }

    /// Get the number of values per element
    pub fn components(&self) -> usize {
        self.components
    }

    /// Get the number of elements in this view, i.e. `element_count() /
    /// components()`
    pub fn count(&self) -> usize {
        self.len() / self.components
    }

    /// Get the kind of scalar in this view
    pub fn scalar_kind(&self) -> ScalarKind {
        match self.data {
            Data::Float32(_) => ScalarKind::Float32,
            Data::Float64(_) => ScalarKind::Float64,
            Data::Int32(_) => ScalarKind::Int32,
            Data::Int64(_) => ScalarKind::Int64,
        }
    }

    /// Get the values as a slice of `T`, or `None` if `T` does not match the
    /// scalar kind of this view
    pub fn as_slice<T: ViewScalar>(&self) -> Option<&'a [T]> {
        T::unwrap(self.data)
    }

    /// Get the values as `f32`, if this view contains `f32`
    pub fn as_f32(&self) -> Option<&'a [f32]> {
        self.as_slice()
    }

    /// Get the values as `f64`, if this view contains `f64`
    pub fn as_f64(&self) -> Option<&'a [f64]> {
        self.as_slice()
    }

    /// Get the values as `i32`, if this view contains `i32`
    pub fn as_i32(&self) -> Option<&'a [i32]> {
        self.as_slice()
    }

    /// Get the values as `i64`, if this view contains `i64`
    pub fn as_i64(&self) -> Option<&'a [i64]> {
        self.as_slice()
    }

    /// Copy the values in this view to an owned array, with one row per
    /// element. This returns `None` if `T` does not match the scalar kind of
    /// this view.
    pub fn to_array<T: ViewScalar>(&self) -> Option<Array2<T>> {
        let data = self.as_slice::<T>()?;
        let view = ArrayView2::from_shape((self.count(), self.components), data)
            .expect("view length is a multiple of the number of components");
        return Some(view.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn views() {
        let data = [1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let view = BufferView::new(&data, 3);

        assert!(!view.is_empty());
        assert_eq!(view.element_count(), 6);
        assert_eq!(view.components(), 3);
        assert_eq!(view.count(), 2);
        assert_eq!(view.scalar_kind(), ScalarKind::Float32);
        assert_eq!(view.as_ptr(), data.as_ptr().cast());

        assert_eq!(view.as_f32(), Some(&data[..]));
        assert_eq!(view.as_f64(), None);
        assert_eq!(view.as_i32(), None);
    }

    #[test]
    fn empty() {
        let view = BufferView::empty::<i64>(1);
        assert!(view.is_empty());
        assert!(view.as_ptr().is_null());
        assert_eq!(view.element_count(), 0);
        assert_eq!(view.count(), 0);
        assert_eq!(view.scalar_kind(), ScalarKind::Int64);
        assert_eq!(view.as_i64(), Some(&[][..]));
    }

    #[test]
    fn empty_borrowed() {
        fn positions<'a>(data: &'a [f32]) -> BufferView<'a> {
            if data.is_empty() {
                BufferView::empty::<f32>(3)
            } else {
                BufferView::new(data, 3)
            }
        }

        let data = vec![1.0_f32, 2.0, 3.0];
        assert_eq!(positions(&data).count(), 1);
        assert_eq!(positions(&data[..0]).count(), 0);
        assert_eq!(positions(&data[..0]).components(), 3);
    }

    #[test]
    fn to_array() {
        let data = [1_i32, 2, 3, 4, 5, 6];
        let view = BufferView::new(&data, 2);
        assert_eq!(view.to_array::<i32>().unwrap(), array![[1, 2], [3, 4], [5, 6]]);
        assert!(view.to_array::<f64>().is_none());

        let view = BufferView::empty::<f64>(3);
        assert_eq!(view.to_array::<f64>().unwrap().shape(), [0, 3]);
    }

    #[test]
    #[should_panic(expected = "view length (5) must be a multiple of the number of components (3)")]
    fn bad_length() {
        let data = [0.0_f64; 5];
        let _ = BufferView::new(&data, 3);
    }
}
