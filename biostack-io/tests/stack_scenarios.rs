#![allow(clippy::float_cmp, clippy::cast_precision_loss)]
use approx::assert_relative_eq;
use biostack_io::{
    AfsRicmStack, ArrayStack, ElementType, Error, GlobalMetadata, ImageStack, OpenMode,
    StackOptions,
};
use ndarray::{Array2, Array3};
use std::path::Path;
use tempfile::tempdir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_ricm_fixture(path: &Path) {
    let mut stack = AfsRicmStack::open(path, OpenMode::Append).unwrap();
    let metadata = GlobalMetadata::default().with_resolution(0.1);
    stack
        .create(10, 64, 64, ElementType::UInt16, &metadata)
        .unwrap();
    stack
        .write_frame(3, &Array2::<u16>::ones((64, 64)))
        .unwrap();
    stack.set_frame_metadata(3, Some(5.0), Some(12.5)).unwrap();
    stack.close().unwrap();
}

#[test]
fn test_ricm_reopen_read_only() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("afs_ricm.h5");
    write_ricm_fixture(&path);

    let stack = AfsRicmStack::open(&path, OpenMode::Read).unwrap();
    let frame: Array2<u16> = stack.read_frame(3).unwrap();
    assert_eq!(frame, Array2::<u16>::ones((64, 64)));

    let meta = stack.frame_metadata(3).unwrap();
    assert_eq!(meta.time, 5.0);
    assert_eq!(meta.acoustic_power, 12.5);

    let global = stack.global_metadata().unwrap();
    assert_eq!(global.resolution, Some(0.1));
    assert_eq!(global.original_file, None);
    assert_eq!(global.position, None);

    // Neighbouring frames were never written.
    let other: Array2<u16> = stack.read_frame(2).unwrap();
    assert!(other.iter().all(|&v| v == 0));
}

#[test]
fn test_ricm_read_only_rejects_writes() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("afs_ricm.h5");
    write_ricm_fixture(&path);

    let mut stack = AfsRicmStack::open(&path, OpenMode::Read).unwrap();
    assert!(stack.set_frame_metadata(0, Some(1.0), None).is_err());
    assert!(stack
        .write_frame(0, &Array2::<u16>::zeros((64, 64)))
        .is_err());
    assert!(stack
        .create(2, 2, 2, ElementType::UInt8, &GlobalMetadata::default())
        .is_err());
    stack.close().unwrap();
}

#[test]
fn test_ricm_iteration_yields_every_frame() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("afs_ricm.h5");
    write_ricm_fixture(&path);

    let stack = AfsRicmStack::open(&path, OpenMode::ReadWrite).unwrap();
    let frames = stack.frames::<u16>().unwrap();
    assert_eq!(frames.len(), 10);

    let metas: Vec<_> = frames.map(|item| item.unwrap().1).collect();
    assert_eq!(metas.len(), 10);
    assert_eq!(metas[3].time, 5.0);
    assert_eq!(metas[4].time, 0.0);
}

#[test]
fn test_generic_default_coordinates() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut stack = ImageStack::open(dir.path().join("stack.h5"), OpenMode::Append).unwrap();
    stack
        .create(&[5, 10, 10], ElementType::Int8, &StackOptions::default())
        .unwrap();

    let z = stack.axis_coordinates::<i64>(0).unwrap();
    assert_eq!(z.to_vec(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_generic_coordinates_survive_reopen() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("stack.h5");
    {
        let mut stack = ImageStack::open(&path, OpenMode::Append).unwrap();
        stack
            .create(&[3, 4, 4], ElementType::Float32, &StackOptions::default())
            .unwrap();
        stack.set_axis_coordinates(0, &[-2_i32, 0, 2]).unwrap();
        // Dropped here without an explicit close.
    }

    let stack = ImageStack::open(&path, OpenMode::Read).unwrap();
    // Coordinate arrays are stored as int64 and converted on write.
    assert_eq!(
        stack.axis_coordinates::<i64>(0).unwrap().to_vec(),
        vec![-2, 0, 2]
    );
    assert_eq!(
        stack.axis_coordinates::<f64>(0).unwrap().to_vec(),
        vec![-2.0, 0.0, 2.0]
    );
    assert_eq!(stack.shape().unwrap(), vec![3, 4, 4]);
}

#[test]
fn test_generic_4d_roundtrip_per_frame() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut stack = ImageStack::open(dir.path().join("stack4d.h5"), OpenMode::Append).unwrap();
    stack
        .create(&[3, 2, 4, 5], ElementType::Float64, &StackOptions::default())
        .unwrap();
    assert_eq!(stack.chunk().unwrap(), Some(vec![1, 2, 4, 5]));
    assert_eq!(stack.axis_coordinates::<i64>(3).unwrap().len(), 5);

    for z in 0..3_usize {
        let volume = Array3::from_shape_fn((2, 4, 5), |(y, x, t)| (z * 100 + y * 10 + x + t) as f64);
        stack.write(&volume, (z, .., .., ..)).unwrap();
    }
    for (z, volume) in stack.frames::<f64>(0).unwrap().enumerate() {
        let volume = volume.unwrap();
        assert_eq!(volume.shape(), &[2, 4, 5]);
        assert_relative_eq!(volume[[1, 3, 4]], (z * 100 + 10 + 3 + 4) as f64);
    }
}

#[test]
fn test_materialize_threshold() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut stack = ImageStack::open(dir.path().join("stack.h5"), OpenMode::Append).unwrap();
    stack
        .create(&[4, 250, 250], ElementType::UInt32, &StackOptions::default())
        .unwrap();
    // 4 * 250 * 250 * 4 bytes = 1.0 MB
    assert_relative_eq!(stack.size_mb().unwrap(), 1.0);
    assert!(stack.to_array::<u32>(1.0).is_ok());
    assert!(matches!(
        stack.to_array::<u32>(0.99),
        Err(Error::Core(biostack_core::Error::TooLarge { .. }))
    ));
}

#[test]
fn test_open_missing_file_read_only() {
    init_logging();
    let dir = tempdir().unwrap();
    let err = ImageStack::open(dir.path().join("nope.h5"), OpenMode::Read).unwrap_err();
    assert!(matches!(err, Error::Access { .. }));
    let err = AfsRicmStack::open(dir.path().join("nope.h5"), OpenMode::ReadWrite).unwrap_err();
    assert!(matches!(err, Error::Access { .. }));
}

#[test]
fn test_shape_before_create_fails() {
    init_logging();
    let dir = tempdir().unwrap();
    let stack = ImageStack::open(dir.path().join("empty.h5"), OpenMode::Append).unwrap();
    assert!(matches!(stack.shape(), Err(Error::Hdf5(_))));
}
