//! Behaviour shared by every stack backed by a `data` dataset.

use crate::dtype::dataset_element_type;
use crate::file::StackFile;
use crate::Result;
use biostack_core::{size_mb, ElementType, OpenMode, DATA_DATASET};
use hdf5::{Dataset, H5Type, Selection};
use ndarray::{Array, ArrayView, Dimension};
use std::path::Path;

/// A stack whose primary array lives in the `data` dataset of one file.
///
/// Reads and writes address a region of the primary array and only touch
/// the chunks that region overlaps.
pub trait ArrayStack {
    /// Backing file.
    fn stack_file(&self) -> &StackFile;

    /// Backing file, mutably.
    fn stack_file_mut(&mut self) -> &mut StackFile;

    /// Path of the backing file.
    fn path(&self) -> &Path {
        self.stack_file().path()
    }

    /// Mode the backing file was opened with.
    fn mode(&self) -> OpenMode {
        self.stack_file().mode()
    }

    /// Returns true until the stack is closed.
    fn is_open(&self) -> bool {
        self.stack_file().is_open()
    }

    /// Handle to the primary array.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no array was created.
    fn data(&self) -> Result<Dataset> {
        Ok(self.stack_file().file()?.dataset(DATA_DATASET)?)
    }

    /// Shape of the primary array.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no array was created.
    fn shape(&self) -> Result<Vec<usize>> {
        Ok(self.data()?.shape())
    }

    /// Element type of the primary array.
    ///
    /// # Errors
    /// Returns an error if no array was created or its type is unsupported.
    fn element_type(&self) -> Result<ElementType> {
        dataset_element_type(&self.data()?)
    }

    /// Size of one stored element in bytes.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no array was created.
    fn element_size(&self) -> Result<usize> {
        Ok(self.data()?.dtype()?.size())
    }

    /// Chunk shape of the primary array (`None` for contiguous storage).
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no array was created.
    fn chunk(&self) -> Result<Option<Vec<usize>>> {
        Ok(self.data()?.chunk())
    }

    /// Size of the whole primary array in megabytes.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no array was created.
    fn size_mb(&self) -> Result<f64> {
        let data = self.data()?;
        Ok(size_mb(&data.shape(), data.dtype()?.size()))
    }

    /// Reads a region of the primary array.
    ///
    /// `selection` is any HDF5 selection: a tuple of indices and ranges
    /// (`(3, .., ..)`), an `ndarray::s![]` slice, or a `Selection`. Values
    /// are converted from the stored element type to `T`.
    ///
    /// # Errors
    /// Returns an error if the selection is out of bounds or incompatible
    /// with `D`.
    fn read<T, S, D>(&self, selection: S) -> Result<Array<T, D>>
    where
        T: H5Type,
        S: TryInto<Selection>,
        hdf5::Error: From<S::Error>,
        D: Dimension,
    {
        Ok(self.data()?.read_slice(selection)?)
    }

    /// Writes `values` into a region of the primary array.
    ///
    /// # Errors
    /// Returns an error if the file is read-only, or the selection is out of
    /// bounds or does not match the shape of `values`.
    fn write<'a, A, T, S, D>(&self, values: A, selection: S) -> Result<()>
    where
        A: Into<ArrayView<'a, T, D>>,
        T: H5Type + 'a,
        S: TryInto<Selection>,
        hdf5::Error: From<S::Error>,
        D: Dimension,
    {
        self.data()?.write_slice(values, selection)?;
        Ok(())
    }

    /// Flushes and releases the backing file. No-op if already closed.
    ///
    /// # Errors
    /// Returns an error if flushing pending writes fails.
    fn close(&mut self) -> Result<()> {
        self.stack_file_mut().close()
    }
}
