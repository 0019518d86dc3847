//! Mapping between `ElementType` and HDF5 datatypes.

use crate::{Error, Result};
use biostack_core::ElementType;
use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
use hdf5::Dataset;

/// Runs `$body` with `$T` bound to the Rust type of an `ElementType`.
macro_rules! with_element_type {
    ($ty:expr, $T:ident => $body:expr) => {
        match $ty {
            ::biostack_core::ElementType::Int8 => {
                type $T = i8;
                $body
            }
            ::biostack_core::ElementType::UInt8 => {
                type $T = u8;
                $body
            }
            ::biostack_core::ElementType::Int16 => {
                type $T = i16;
                $body
            }
            ::biostack_core::ElementType::UInt16 => {
                type $T = u16;
                $body
            }
            ::biostack_core::ElementType::Int32 => {
                type $T = i32;
                $body
            }
            ::biostack_core::ElementType::UInt32 => {
                type $T = u32;
                $body
            }
            ::biostack_core::ElementType::Int64 => {
                type $T = i64;
                $body
            }
            ::biostack_core::ElementType::UInt64 => {
                type $T = u64;
                $body
            }
            ::biostack_core::ElementType::Float32 => {
                type $T = f32;
                $body
            }
            ::biostack_core::ElementType::Float64 => {
                type $T = f64;
                $body
            }
        }
    };
}

pub(crate) use with_element_type;

/// Element type of an HDF5 type descriptor.
///
/// # Errors
/// Returns `UnsupportedType` for non-numeric or half-precision types.
pub fn element_type_from_descriptor(descriptor: &TypeDescriptor) -> Result<ElementType> {
    let element_type = match descriptor {
        TypeDescriptor::Integer(IntSize::U1) => ElementType::Int8,
        TypeDescriptor::Integer(IntSize::U2) => ElementType::Int16,
        TypeDescriptor::Integer(IntSize::U4) => ElementType::Int32,
        TypeDescriptor::Integer(IntSize::U8) => ElementType::Int64,
        TypeDescriptor::Unsigned(IntSize::U1) => ElementType::UInt8,
        TypeDescriptor::Unsigned(IntSize::U2) => ElementType::UInt16,
        TypeDescriptor::Unsigned(IntSize::U4) => ElementType::UInt32,
        TypeDescriptor::Unsigned(IntSize::U8) => ElementType::UInt64,
        TypeDescriptor::Float(FloatSize::U4) => ElementType::Float32,
        TypeDescriptor::Float(FloatSize::U8) => ElementType::Float64,
        other => return Err(Error::UnsupportedType(format!("{other:?}"))),
    };
    Ok(element_type)
}

/// Element type stored in a dataset.
///
/// # Errors
/// Returns an error if the datatype cannot be read or is not supported.
pub fn dataset_element_type(dataset: &Dataset) -> Result<ElementType> {
    let descriptor = dataset.dtype()?.to_descriptor()?;
    element_type_from_descriptor(&descriptor)
}
