//! Image stack specialised for AFS-RICM experiments.

use crate::dtype::with_element_type;
use crate::file::StackFile;
use crate::frames::RicmFrames;
use crate::h5::{
    create_chunked_dataset, create_vector_dataset, delete_attr_if_present, read_attr_opt,
    read_attr_opt_string, read_element, remove_dataset_if_present, replace_attr_scalar,
    replace_attr_str, write_element,
};
use crate::stack::ArrayStack;
use crate::Result;
use biostack_core::{
    Compression, ElementType, FrameMetadata, GlobalMetadata, OpenMode, ACOUSTIC_POWER_DATASET,
    DATA_DATASET, ORIGINAL_FILE_ATTR, POSITION_ATTR, RESOLUTION_ATTR, TIME_DATASET,
};
use hdf5::{Dataset, H5Type};
use ndarray::{Array1, Array2, ArrayView2};
use std::path::Path;

/// Reads the metadata of frame `index` from the two per-frame tracks.
pub(crate) fn read_frame_metadata(
    time: &Dataset,
    acoustic_power: &Dataset,
    index: usize,
) -> Result<FrameMetadata> {
    Ok(FrameMetadata::new(
        read_element::<f64>(time, index)?,
        f64::from(read_element::<f32>(acoustic_power, index)?),
    ))
}

/// 3D stack (frames × height × width) with per-frame acquisition metadata.
///
/// Layout of the file:
///
/// ```text
/// /data             image stack [frames, y, x], one chunk per frame
/// /time             per-frame acquisition time [s], float64
/// /acoustic_power   per-frame acoustic power [%], float32
/// @resolution       µm/pixel
/// @original_file    original raw filename
/// @position         chamber position label
/// ```
///
/// Root attributes are only present when they were supplied at creation.
#[derive(Debug)]
pub struct AfsRicmStack {
    file: StackFile,
}

impl AfsRicmStack {
    /// Element type used when none is specified.
    pub const DEFAULT_ELEMENT_TYPE: ElementType = ElementType::UInt16;

    /// Opens or creates the backing file.
    ///
    /// # Errors
    /// Returns [`crate::Error::Access`] if `path` cannot be opened in `mode`.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Ok(Self {
            file: StackFile::open(path, mode)?,
        })
    }

    /// Creates a new stack of `n_frames` frames of `height` × `width`.
    ///
    /// Replaces any existing primary array and per-frame tracks. The tracks
    /// start zero-filled. Attributes left `None` in `metadata` are removed
    /// from the file rather than written.
    ///
    /// Not atomic: existing arrays are unlinked before the new ones are
    /// written.
    ///
    /// # Errors
    /// Returns an error if the file is read-only or HDF5 creation fails.
    pub fn create(
        &mut self,
        n_frames: usize,
        height: usize,
        width: usize,
        element_type: ElementType,
        metadata: &GlobalMetadata,
    ) -> Result<Dataset> {
        let file = self.file.file()?;
        for name in [DATA_DATASET, TIME_DATASET, ACOUSTIC_POWER_DATASET] {
            remove_dataset_if_present(file, name)?;
        }

        let shape = [n_frames, height, width];
        let chunk = [1, height, width];
        let data = with_element_type!(element_type, T => create_chunked_dataset::<T>(
            file,
            DATA_DATASET,
            &shape,
            &chunk,
            Compression::default(),
            false,
        ))?;

        create_vector_dataset::<f64>(file, TIME_DATASET, n_frames)?;
        create_vector_dataset::<f32>(file, ACOUSTIC_POWER_DATASET, n_frames)?;

        match metadata.resolution {
            Some(resolution) => replace_attr_scalar(file, RESOLUTION_ATTR, &resolution)?,
            None => delete_attr_if_present(file, RESOLUTION_ATTR)?,
        }
        for (name, value) in [
            (ORIGINAL_FILE_ATTR, metadata.original_file.as_deref()),
            (POSITION_ATTR, metadata.position.as_deref()),
        ] {
            match value {
                Some(value) => replace_attr_str(file, name, value)?,
                None => delete_attr_if_present(file, name)?,
            }
        }

        log::info!(
            "created AFS-RICM stack {n_frames}x{height}x{width} {element_type} in {}",
            self.file.path().display()
        );
        Ok(data)
    }

    fn track(&self, name: &str) -> Result<Dataset> {
        Ok(self.file.file()?.dataset(name)?)
    }

    /// Number of frames.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no array was created.
    pub fn frame_count(&self) -> Result<usize> {
        Ok(self.shape()?.first().copied().unwrap_or(0))
    }

    /// Reads frame `index`.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range.
    pub fn read_frame<T: H5Type>(&self, index: usize) -> Result<Array2<T>> {
        self.read((index, .., ..))
    }

    /// Overwrites frame `index`.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range, the frame shape differs,
    /// or the file is read-only.
    pub fn write_frame<'a, A, T>(&self, index: usize, frame: A) -> Result<()>
    where
        A: Into<ArrayView2<'a, T>>,
        T: H5Type + 'a,
    {
        self.write(frame, (index, .., ..))
    }

    /// Sets the metadata of frame `index`. `None` arguments keep the stored value.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range or the file is read-only.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_frame_metadata(
        &self,
        index: usize,
        time: Option<f64>,
        acoustic_power: Option<f64>,
    ) -> Result<()> {
        if let Some(time) = time {
            write_element(&self.track(TIME_DATASET)?, index, &time)?;
        }
        if let Some(power) = acoustic_power {
            write_element(&self.track(ACOUSTIC_POWER_DATASET)?, index, &(power as f32))?;
        }
        Ok(())
    }

    /// Metadata of frame `index`, widened to `f64`.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range.
    pub fn frame_metadata(&self, index: usize) -> Result<FrameMetadata> {
        read_frame_metadata(
            &self.track(TIME_DATASET)?,
            &self.track(ACOUSTIC_POWER_DATASET)?,
            index,
        )
    }

    /// Acquisition time of every frame.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no stack was created.
    pub fn frame_times(&self) -> Result<Array1<f64>> {
        Ok(self.track(TIME_DATASET)?.read_1d::<f64>()?)
    }

    /// Acoustic power of every frame.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no stack was created.
    pub fn acoustic_powers(&self) -> Result<Array1<f64>> {
        let powers = self.track(ACOUSTIC_POWER_DATASET)?.read_1d::<f32>()?;
        Ok(powers.mapv(f64::from))
    }

    /// File-level attributes; unset attributes are `None`.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or an attribute has an
    /// unreadable type.
    pub fn global_metadata(&self) -> Result<GlobalMetadata> {
        let file = self.file.file()?;
        Ok(GlobalMetadata {
            resolution: read_attr_opt::<f64>(file, RESOLUTION_ATTR)?,
            original_file: read_attr_opt_string(file, ORIGINAL_FILE_ATTR)?,
            position: read_attr_opt_string(file, POSITION_ATTR)?,
        })
    }

    /// Iterates `(frame, metadata)` pairs in frame order.
    ///
    /// Frames are read on demand; calling this again restarts from frame 0.
    ///
    /// # Errors
    /// Returns an error if the stack is closed or no stack was created.
    pub fn frames<T: H5Type>(&self) -> Result<RicmFrames<'_, T>> {
        Ok(RicmFrames::new(
            self.data()?,
            self.track(TIME_DATASET)?,
            self.track(ACOUSTIC_POWER_DATASET)?,
        ))
    }
}

impl ArrayStack for AfsRicmStack {
    fn stack_file(&self) -> &StackFile {
        &self.file
    }

    fn stack_file_mut(&mut self) -> &mut StackFile {
        &mut self.file
    }
}
