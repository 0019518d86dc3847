//! Chunked N-dimensional image stack with per-axis coordinate arrays.

use crate::dtype::with_element_type;
use crate::frames::AxisFrames;
use crate::file::StackFile;
use crate::h5::{
    axis_indices_attr, create_chunked_dataset, delete_attr_if_present, read_axes_attr,
    remove_dataset_if_present, replace_attr_str, set_axes_attr, set_axis_indices, SIGNAL_ATTR,
};
use crate::stack::ArrayStack;
use crate::{Error, Result};
use biostack_core::{
    check_size_budget, AxisLabel, ElementType, OpenMode, StackOptions, DATA_DATASET,
};
use hdf5::{Dataset, H5Type};
use ndarray::{Array1, ArrayD, ArrayView1};
use std::path::Path;

/// HDF5-backed 3D (or 4D) image stack with lazy slice access.
///
/// Layout of the file:
///
/// ```text
/// /data        primary array, chunked, optionally compressed
///   @axes      one label per axis ("z", "y", "x", "t")
/// /z /y /x /t  coordinate array per axis, 0..extent by default
/// @signal      "data"
/// @z_indices   axis of /data described by /z (likewise y, x, t)
/// ```
#[derive(Debug)]
pub struct ImageStack {
    file: StackFile,
}

impl ImageStack {
    /// Opens or creates the backing file.
    ///
    /// # Errors
    /// Returns [`Error::Access`] if `path` cannot be opened in `mode`.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Ok(Self {
            file: StackFile::open(path, mode)?,
        })
    }

    /// Creates the primary array, replacing any existing one.
    ///
    /// Without an explicit chunk in `options` the array is chunked one
    /// leading index at a time. A coordinate array `0..extent` is created
    /// for every axis and labelled z, y, x, t in axis order.
    ///
    /// Not atomic: existing arrays are unlinked before the new ones are
    /// written, so a failure part-way leaves the file without a stack.
    ///
    /// # Errors
    /// Returns `UnsupportedRank` for rank 0 or rank above 4 (the file is left
    /// untouched), `ChunkRankMismatch` for a chunk of the wrong rank, or the
    /// HDF5 error if the file is read-only.
    pub fn create(
        &mut self,
        shape: &[usize],
        element_type: ElementType,
        options: &StackOptions,
    ) -> Result<Dataset> {
        let labels = AxisLabel::labels_for_rank(shape.len())?;
        let chunk = options.resolve_chunk(shape)?;
        let file = self.file.file()?;

        remove_dataset_if_present(file, DATA_DATASET)?;
        for label in AxisLabel::ORDER {
            remove_dataset_if_present(file, label.as_str())?;
            delete_attr_if_present(file, &axis_indices_attr(label))?;
        }

        let data = with_element_type!(element_type, T => create_chunked_dataset::<T>(
            file,
            DATA_DATASET,
            shape,
            &chunk,
            options.compression,
            options.shuffle,
        ))?;
        set_axes_attr(&data, labels)?;
        replace_attr_str(file, SIGNAL_ATTR, DATA_DATASET)?;

        for (&label, &extent) in labels.iter().zip(shape) {
            let len = i64::try_from(extent)
                .map_err(|_| Error::InvalidFormat(format!("axis {label} too long: {extent}")))?;
            let coords: Vec<i64> = (0..len).collect();
            let dataset = file.new_dataset::<i64>().shape(extent).create(label.as_str())?;
            if !coords.is_empty() {
                dataset.write(ArrayView1::from(coords.as_slice()))?;
            }
            set_axis_indices(file, label)?;
        }

        log::info!(
            "created {} stack {:?} (chunk {:?}, {}) in {}",
            element_type,
            shape,
            chunk,
            options.compression,
            self.file.path().display()
        );
        Ok(data)
    }

    /// Axis labels recorded for the primary array, in axis order.
    ///
    /// # Errors
    /// Returns an error if no array was created or the label attribute is
    /// malformed.
    pub fn axes(&self) -> Result<Vec<AxisLabel>> {
        read_axes_attr(&self.data()?)
    }

    /// Label of `axis`, checked against the current rank.
    fn axis_label(&self, axis: usize) -> Result<(AxisLabel, usize)> {
        let shape = self.shape()?;
        let extent = shape.get(axis).copied().ok_or(biostack_core::Error::InvalidAxis {
            axis,
            rank: shape.len(),
        })?;
        Ok((AxisLabel::for_axis(axis)?, extent))
    }

    fn coordinate_dataset(&self, label: AxisLabel) -> Result<Dataset> {
        Ok(self.file.file()?.dataset(label.as_str())?)
    }

    /// Coordinate values of `axis`.
    ///
    /// # Errors
    /// Returns `InvalidAxis` if `axis` is not below the rank.
    pub fn axis_coordinates<T: H5Type>(&self, axis: usize) -> Result<Array1<T>> {
        let (label, _) = self.axis_label(axis)?;
        Ok(self.coordinate_dataset(label)?.read_1d::<T>()?)
    }

    /// Overwrites the coordinate values of `axis`.
    ///
    /// # Errors
    /// Returns `InvalidAxis` if `axis` is not below the rank and
    /// `ShapeMismatch` if `values` does not have one entry per index.
    pub fn set_axis_coordinates<T: H5Type>(&self, axis: usize, values: &[T]) -> Result<()> {
        let (label, extent) = self.axis_label(axis)?;
        if values.len() != extent {
            return Err(Error::ShapeMismatch {
                name: label.as_str().to_string(),
                expected: extent,
                actual: values.len(),
            });
        }
        self.coordinate_dataset(label)?
            .write(ArrayView1::from(values))?;
        Ok(())
    }

    /// Number of indices along `axis`.
    ///
    /// # Errors
    /// Returns `InvalidAxis` if `axis` is not below the rank.
    pub fn frame_count(&self, axis: usize) -> Result<usize> {
        self.axis_label(axis).map(|(_, extent)| extent)
    }

    /// Iterates the sub-arrays obtained by fixing `axis` to each index.
    ///
    /// Frames are read on demand; calling this again restarts from index 0.
    ///
    /// # Errors
    /// Returns `InvalidAxis` if `axis` is not below the rank.
    pub fn frames<T: H5Type>(&self, axis: usize) -> Result<AxisFrames<'_, T>> {
        let data = self.data()?;
        let rank = data.ndim();
        if axis >= rank {
            return Err(biostack_core::Error::InvalidAxis { axis, rank }.into());
        }
        Ok(AxisFrames::new(data, axis))
    }

    /// Loads the whole primary array if it fits in `max_size_mb`.
    ///
    /// # Errors
    /// Returns `TooLarge` if the array exceeds `max_size_mb`; slice instead.
    pub fn to_array<T: H5Type>(&self, max_size_mb: f64) -> Result<ArrayD<T>> {
        let data = self.data()?;
        check_size_budget(&data.shape(), data.dtype()?.size(), max_size_mb)?;
        Ok(data.read_dyn::<T>()?)
    }
}

impl ArrayStack for ImageStack {
    fn stack_file(&self) -> &StackFile {
        &self.file
    }

    fn stack_file_mut(&mut self) -> &mut StackFile {
        &mut self.file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biostack_core::{Compression, DEFAULT_MAX_SIZE_MB};
    use hdf5::filters::Filter;
    use ndarray::{s, Array2, Array3};
    use tempfile::tempdir;

    fn new_stack(dir: &tempfile::TempDir, shape: &[usize], ty: ElementType) -> ImageStack {
        let mut stack = ImageStack::open(dir.path().join("stack.h5"), OpenMode::Append).unwrap();
        stack.create(shape, ty, &StackOptions::default()).unwrap();
        stack
    }

    #[test]
    fn test_create_reports_shape_and_type() {
        let dir = tempdir().unwrap();
        for (shape, ty) in [
            (vec![5, 10, 10], ElementType::Int8),
            (vec![2, 3, 4, 6], ElementType::Float32),
            (vec![7], ElementType::UInt64),
        ] {
            let stack = new_stack(&dir, &shape, ty);
            assert_eq!(stack.shape().unwrap(), shape);
            assert_eq!(stack.element_type().unwrap(), ty);
            assert_eq!(stack.element_size().unwrap(), ty.size());
        }
    }

    #[test]
    fn test_default_chunk_is_one_slice() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[5, 10, 12], ElementType::UInt16);
        assert_eq!(stack.chunk().unwrap(), Some(vec![1, 10, 12]));
    }

    #[test]
    fn test_explicit_chunk_and_no_compression() {
        let dir = tempdir().unwrap();
        let mut stack = ImageStack::open(dir.path().join("stack.h5"), OpenMode::Append).unwrap();
        let options = StackOptions::default()
            .with_chunk(vec![2, 5, 5])
            .with_compression(Compression::None);
        stack.create(&[4, 10, 10], ElementType::UInt8, &options).unwrap();
        assert_eq!(stack.chunk().unwrap(), Some(vec![2, 5, 5]));
        assert!(stack.data().unwrap().filters().is_empty());
    }

    #[test]
    fn test_default_compression_is_gzip_4() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[3, 8, 8], ElementType::UInt16);
        assert_eq!(stack.data().unwrap().filters(), vec![Filter::Deflate(4)]);
    }

    #[test]
    fn test_shuffle_and_gzip_level() {
        let dir = tempdir().unwrap();
        let mut stack = ImageStack::open(dir.path().join("stack.h5"), OpenMode::Append).unwrap();
        let options = StackOptions::default()
            .with_compression(Compression::Gzip(9))
            .with_shuffle(true);
        stack.create(&[3, 8, 8], ElementType::Float32, &options).unwrap();

        let filters = stack.data().unwrap().filters();
        assert_eq!(filters.len(), 2);
        assert!(filters.contains(&Filter::Shuffle));
        assert!(filters.contains(&Filter::Deflate(9)));
    }

    #[test]
    fn test_default_coordinates() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[5, 10, 10], ElementType::Int8);
        assert_eq!(
            stack.axis_coordinates::<i64>(0).unwrap().to_vec(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(stack.axis_coordinates::<i64>(2).unwrap().len(), 10);
        assert_eq!(
            stack.axes().unwrap(),
            vec![AxisLabel::Z, AxisLabel::Y, AxisLabel::X]
        );
    }

    #[test]
    fn test_set_coordinates() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[3, 4, 4], ElementType::Int8);
        stack.set_axis_coordinates(0, &[10_i64, 20, 30]).unwrap();
        assert_eq!(
            stack.axis_coordinates::<i64>(0).unwrap().to_vec(),
            vec![10, 20, 30]
        );
    }

    #[test]
    fn test_set_coordinates_length_mismatch() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[3, 4, 4], ElementType::Int8);
        let err = stack.set_axis_coordinates(1, &[0_i64, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch { expected: 4, actual: 3, .. }
        ));
        let err = stack.axis_coordinates::<i64>(3).unwrap_err();
        assert!(matches!(
            err,
            Error::Core(biostack_core::Error::InvalidAxis { axis: 3, rank: 3 })
        ));
    }

    #[test]
    fn test_rank_above_four_rejected_without_touching_file() {
        let dir = tempdir().unwrap();
        let mut stack = new_stack(&dir, &[2, 2, 2], ElementType::Int8);
        let err = stack
            .create(&[1, 2, 3, 4, 5], ElementType::Int8, &StackOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(biostack_core::Error::UnsupportedRank(5))
        ));
        assert_eq!(stack.shape().unwrap(), vec![2, 2, 2]);
    }

    #[test]
    fn test_recreate_replaces_array_and_axes() {
        let dir = tempdir().unwrap();
        let mut stack = new_stack(&dir, &[2, 3, 4, 5], ElementType::Int8);
        stack
            .create(&[6, 7], ElementType::Float64, &StackOptions::default())
            .unwrap();
        assert_eq!(stack.shape().unwrap(), vec![6, 7]);
        assert_eq!(stack.element_type().unwrap(), ElementType::Float64);
        assert_eq!(stack.axes().unwrap(), vec![AxisLabel::Z, AxisLabel::Y]);
        assert_eq!(stack.axis_coordinates::<i64>(1).unwrap().len(), 7);
    }

    #[test]
    fn test_slice_roundtrip() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[4, 6, 8], ElementType::UInt16);
        let frame = Array2::from_shape_fn((6, 8), |(y, x)| u16::try_from(y * 8 + x).unwrap());

        stack.write(&frame, (2, .., ..)).unwrap();
        let back: Array2<u16> = stack.read((2, .., ..)).unwrap();
        assert_eq!(back, frame);

        let untouched: Array2<u16> = stack.read((1, .., ..)).unwrap();
        assert!(untouched.iter().all(|&v| v == 0));

        let block: Array3<u16> = stack.read(s![2..3, 1..3, 0..2]).unwrap();
        assert_eq!(block.shape(), &[1, 2, 2]);
        assert_eq!(block[[0, 1, 1]], frame[[2, 1]]);
    }

    #[test]
    fn test_frames_iterate_in_order_and_restart() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[3, 2, 2], ElementType::Int32);
        for z in 0..3_usize {
            let value = i32::try_from(z).unwrap();
            stack
                .write(&Array2::from_elem((2, 2), value), (z, .., ..))
                .unwrap();
        }

        let frames = stack.frames::<i32>(0).unwrap();
        assert_eq!(frames.len(), 3);
        let first: Vec<i32> = frames.map(|f| f.unwrap()[[0, 0]]).collect();
        assert_eq!(first, vec![0, 1, 2]);

        let second: Vec<i32> = stack
            .frames::<i32>(0)
            .unwrap()
            .map(|f| f.unwrap()[[1, 1]])
            .collect();
        assert_eq!(second, first);
    }

    #[test]
    fn test_frames_along_inner_axis() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[2, 3, 4], ElementType::Int8);
        let frames: Vec<_> = stack
            .frames::<i8>(2)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].shape(), &[2, 3]);
        assert!(stack.frames::<i8>(3).is_err());
    }

    #[test]
    fn test_to_array_respects_budget() {
        let dir = tempdir().unwrap();
        let stack = new_stack(&dir, &[10, 100, 100], ElementType::UInt16);
        // 10 * 100 * 100 * 2 bytes = 0.2 MB
        let err = stack.to_array::<u16>(0.1).unwrap_err();
        assert!(matches!(
            err,
            Error::Core(biostack_core::Error::TooLarge { .. })
        ));

        let full = stack.to_array::<u16>(0.2).unwrap();
        assert_eq!(full.shape(), &[10, 100, 100]);
        assert!(stack.to_array::<u16>(DEFAULT_MAX_SIZE_MB).is_ok());
    }

    #[test]
    fn test_closed_stack_rejects_access() {
        let dir = tempdir().unwrap();
        let mut stack = new_stack(&dir, &[2, 2, 2], ElementType::Int8);
        stack.close().unwrap();
        stack.close().unwrap();
        assert!(!stack.is_open());
        assert!(matches!(stack.shape(), Err(Error::Closed { .. })));
    }

    #[test]
    fn test_close_invalidates_returned_dataset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack.h5");
        let mut stack = ImageStack::open(&path, OpenMode::Append).unwrap();
        let data = stack
            .create(&[2, 3, 3], ElementType::UInt8, &StackOptions::default())
            .unwrap();
        data.write_slice(&Array2::<u8>::ones((3, 3)), s![0, .., ..])
            .unwrap();

        stack.close().unwrap();
        assert!(!data.is_valid());
        assert!(data
            .write_slice(&Array2::<u8>::ones((3, 3)), s![1, .., ..])
            .is_err());
        drop(data);

        let reopened = ImageStack::open(&path, OpenMode::Read).unwrap();
        let frame: Array2<u8> = reopened.read(s![0, .., ..]).unwrap();
        assert_eq!(frame, Array2::ones((3, 3)));
        let frame: Array2<u8> = reopened.read(s![1, .., ..]).unwrap();
        assert_eq!(frame, Array2::zeros((3, 3)));
    }
}
