//! Lazy, finite frame iterators over a primary array.

use crate::afs_ricm::read_frame_metadata;
use crate::{Error, Result};
use biostack_core::FrameMetadata;
use hdf5::{Dataset, H5Type};
use ndarray::{Array2, ArrayD, IxDyn, SliceInfo, SliceInfoElem};
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Selection fixing `axis` to `index` and spanning every other axis.
pub(crate) fn axis_selection(
    rank: usize,
    axis: usize,
    index: usize,
) -> Result<SliceInfo<Vec<SliceInfoElem>, IxDyn, IxDyn>> {
    let index = isize::try_from(index)
        .map_err(|_| Error::InvalidFormat(format!("frame index {index} exceeds isize")))?;
    let elems: Vec<SliceInfoElem> = (0..rank)
        .map(|a| {
            if a == axis {
                SliceInfoElem::Index(index)
            } else {
                SliceInfoElem::from(..)
            }
        })
        .collect();
    Ok(SliceInfo::try_from(elems)?)
}

/// Sub-arrays obtained by fixing one axis to each index in ascending order.
///
/// Each item is read from the file only when the iterator reaches it.
/// Borrowing the stack keeps it open for the iterator's lifetime.
pub struct AxisFrames<'a, T> {
    data: Dataset,
    rank: usize,
    axis: usize,
    next: usize,
    len: usize,
    _marker: PhantomData<(&'a (), fn() -> T)>,
}

impl<T: H5Type> AxisFrames<'_, T> {
    pub(crate) fn new(data: Dataset, axis: usize) -> Self {
        let shape = data.shape();
        Self {
            rank: shape.len(),
            len: shape.get(axis).copied().unwrap_or(0),
            axis,
            next: 0,
            data,
            _marker: PhantomData,
        }
    }

    fn read_at(&self, index: usize) -> Result<ArrayD<T>> {
        let selection = axis_selection(self.rank, self.axis, index)?;
        Ok(self.data.read_slice::<T, _, IxDyn>(selection)?)
    }
}

impl<T: H5Type> Iterator for AxisFrames<'_, T> {
    type Item = Result<ArrayD<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.read_at(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl<T: H5Type> ExactSizeIterator for AxisFrames<'_, T> {}

impl<T: H5Type> FusedIterator for AxisFrames<'_, T> {}

/// Frames of an AFS-RICM stack paired with their per-frame metadata.
pub struct RicmFrames<'a, T> {
    data: Dataset,
    time: Dataset,
    acoustic_power: Dataset,
    next: usize,
    len: usize,
    _marker: PhantomData<(&'a (), fn() -> T)>,
}

impl<T: H5Type> RicmFrames<'_, T> {
    pub(crate) fn new(data: Dataset, time: Dataset, acoustic_power: Dataset) -> Self {
        let len = data.shape().first().copied().unwrap_or(0);
        Self {
            data,
            time,
            acoustic_power,
            next: 0,
            len,
            _marker: PhantomData,
        }
    }

    fn read_at(&self, index: usize) -> Result<(Array2<T>, FrameMetadata)> {
        let frame = self.data.read_slice::<T, _, _>((index, .., ..))?;
        let metadata = read_frame_metadata(&self.time, &self.acoustic_power, index)?;
        Ok((frame, metadata))
    }
}

impl<T: H5Type> Iterator for RicmFrames<'_, T> {
    type Item = Result<(Array2<T>, FrameMetadata)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.read_at(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl<T: H5Type> ExactSizeIterator for RicmFrames<'_, T> {}

impl<T: H5Type> FusedIterator for RicmFrames<'_, T> {}
