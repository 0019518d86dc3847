//! Dataset and attribute helpers shared by the stack types.

use crate::{Error, Result};
use biostack_core::{AxisLabel, Compression};
use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, Group, Location};
use ndarray::ArrayView1;
use std::str::FromStr;

/// Attribute naming the signal dataset of the file root.
pub(crate) const SIGNAL_ATTR: &str = "signal";
/// Attribute on the primary array listing one axis label per dimension.
pub(crate) const AXES_ATTR: &str = "axes";

/// Unlinks `name` from `group` if it exists.
pub(crate) fn remove_dataset_if_present(group: &Group, name: &str) -> Result<()> {
    if group.link_exists(name) {
        group.unlink(name)?;
        log::debug!("removed existing dataset /{name}");
    }
    Ok(())
}

/// Creates a fixed-size chunked dataset.
pub(crate) fn create_chunked_dataset<T: H5Type>(
    group: &Group,
    name: &str,
    shape: &[usize],
    chunk: &[usize],
    compression: Compression,
    shuffle: bool,
) -> Result<Dataset> {
    let mut builder = group
        .new_dataset::<T>()
        .shape(shape.to_vec())
        .chunk(chunk.to_vec());

    if shuffle {
        builder = builder.shuffle();
    }

    if let Some(level) = compression.level() {
        builder = builder.deflate(level);
    }

    Ok(builder.create(name)?)
}

/// Creates a contiguous 1-D dataset of `len` zero-filled values.
pub(crate) fn create_vector_dataset<T: H5Type>(
    group: &Group,
    name: &str,
    len: usize,
) -> Result<Dataset> {
    Ok(group.new_dataset::<T>().shape(len).create(name)?)
}

fn out_of_range(dataset: &Dataset, index: usize) -> Error {
    Error::InvalidFormat(format!(
        "index {index} out of range for {}",
        dataset.name()
    ))
}

/// Reads one element of a 1-D dataset.
pub(crate) fn read_element<T: H5Type + Copy>(dataset: &Dataset, index: usize) -> Result<T> {
    let end = index
        .checked_add(1)
        .ok_or_else(|| out_of_range(dataset, index))?;
    let values = dataset.read_slice_1d::<T, _>(index..end)?;
    values
        .first()
        .copied()
        .ok_or_else(|| out_of_range(dataset, index))
}

/// Overwrites one element of a 1-D dataset.
pub(crate) fn write_element<T: H5Type>(dataset: &Dataset, index: usize, value: &T) -> Result<()> {
    let end = index
        .checked_add(1)
        .ok_or_else(|| out_of_range(dataset, index))?;
    let view = ArrayView1::from(std::slice::from_ref(value));
    dataset.write_slice(view, index..end)?;
    Ok(())
}

fn has_attr(location: &Location, name: &str) -> Result<bool> {
    Ok(location.attr_names()?.iter().any(|existing| existing == name))
}

/// Deletes attribute `name` if present.
pub(crate) fn delete_attr_if_present(location: &Location, name: &str) -> Result<()> {
    if has_attr(location, name)? {
        location.delete_attr(name)?;
    }
    Ok(())
}

/// Writes a scalar attribute, replacing any previous value.
pub(crate) fn replace_attr_scalar<T: H5Type>(location: &Location, name: &str, value: &T) -> Result<()> {
    delete_attr_if_present(location, name)?;
    location.new_attr::<T>().create(name)?.write_scalar(value)?;
    Ok(())
}

/// Writes a UTF-8 string attribute, replacing any previous value.
pub(crate) fn replace_attr_str(location: &Location, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    replace_attr_scalar(location, name, &value)
}

/// Writes the `axes` attribute on the primary array.
pub(crate) fn set_axes_attr(dataset: &Dataset, axes: &[AxisLabel]) -> Result<()> {
    let values: Vec<VarLenUnicode> = axes
        .iter()
        .map(|axis| to_var_len_unicode(axis.as_str()))
        .collect::<Result<Vec<_>>>()?;
    delete_attr_if_present(dataset, AXES_ATTR)?;
    let attr = dataset
        .new_attr::<VarLenUnicode>()
        .shape((values.len(),))
        .create(AXES_ATTR)?;
    attr.write(ArrayView1::from(values.as_slice()))?;
    Ok(())
}

/// Reads the `axes` attribute of the primary array.
pub(crate) fn read_axes_attr(dataset: &Dataset) -> Result<Vec<AxisLabel>> {
    let values = dataset.attr(AXES_ATTR)?.read_raw::<VarLenUnicode>()?;
    values
        .iter()
        .map(|value| AxisLabel::from_str(value.as_str()).map_err(Error::from))
        .collect()
}

/// Name of the root attribute mapping a label to its axis index.
pub(crate) fn axis_indices_attr(label: AxisLabel) -> String {
    format!("{}_indices", label.as_str())
}

/// Records which axis of the primary array `label` describes.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) fn set_axis_indices(location: &Location, label: AxisLabel) -> Result<()> {
    let index = label.index() as i32;
    replace_attr_scalar(location, &axis_indices_attr(label), &index)
}

/// Reads a scalar attribute; `None` only when the attribute was never written.
pub(crate) fn read_attr_opt<T: H5Type + Clone>(location: &Location, name: &str) -> Result<Option<T>> {
    if !has_attr(location, name)? {
        return Ok(None);
    }
    Ok(Some(location.attr(name)?.read_scalar::<T>()?))
}

pub(crate) fn read_attr_opt_string(location: &Location, name: &str) -> Result<Option<String>> {
    if !has_attr(location, name)? {
        return Ok(None);
    }
    let value: VarLenUnicode = location.attr(name)?.read_scalar()?;
    Ok(Some(value.to_string()))
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 attribute: {e}")))
}
